//! Network Tests: keeping the wallet on the sale chain
//!
//! These tests verify:
//! 1. Chain checks (on target, mismatched, unreadable, no wallet)
//! 2. Switch with one registration fallback for unknown chains
//! 3. chainChanged events re-run the check and update the status bar

mod common;

use common::*;
use presale::core::status::StatusState;
use presale::wallet::{NetworkReconciler, ProviderError, ProviderEvent, WalletProvider};
use presale::{ChainSpec, NetworkStatus, Notification, WalletChoice, WalletError};

fn reconciler() -> NetworkReconciler {
    NetworkReconciler::new(ChainSpec::bsc())
}

// ============================================================================
// Reconciler
// ============================================================================

/// Test: Check compares the wallet chain against the target
#[tokio::test]
async fn check_reports_chain_position() {
    let on_bsc = MockProvider::metamask();
    let on_eth = MockProvider::metamask().on_chain(ETHEREUM);
    let broken = MockProvider::metamask();
    broken.chain_read_fails.set(true);

    let r = reconciler();
    let on_bsc: &dyn WalletProvider = on_bsc.as_ref();
    let on_eth: &dyn WalletProvider = on_eth.as_ref();
    let broken: &dyn WalletProvider = broken.as_ref();
    assert_eq!(r.check(Some(on_bsc)).await, NetworkStatus::OnTarget);
    assert_eq!(r.check(Some(on_eth)).await, NetworkStatus::Mismatched { actual: ETHEREUM });
    assert_eq!(r.check(Some(broken)).await, NetworkStatus::NotApplicable);
    assert_eq!(r.check(None).await, NetworkStatus::NotApplicable);
}

/// Test: Unknown chain triggers exactly one registration, then one retried switch
#[tokio::test]
async fn unknown_chain_is_registered_then_switched() {
    let wallet = MockProvider::metamask().on_chain(ETHEREUM);
    wallet
        .switch_results
        .borrow_mut()
        .push_back(Err(ProviderError::from_rpc(Some(4902), "Unrecognized chain ID \"0x38\"")));

    let provider: &dyn WalletProvider = wallet.as_ref();
    reconciler().switch_to_target(Some(provider)).await.expect("switch");

    assert_eq!(wallet.calls(), vec!["switch:56", "add:56", "switch:56"]);
    assert_eq!(wallet.chain.get(), BSC);
}

/// Test: A second failure after registration is reported, not assumed
#[tokio::test]
async fn failed_retry_after_registration() {
    let wallet = MockProvider::metamask().on_chain(ETHEREUM);
    {
        let mut results = wallet.switch_results.borrow_mut();
        results.push_back(Err(ProviderError::UnrecognizedChain));
        results.push_back(Err(ProviderError::UnrecognizedChain));
    }

    let provider: &dyn WalletProvider = wallet.as_ref();
    let err = reconciler().switch_to_target(Some(provider)).await.unwrap_err();

    assert_eq!(
        err,
        WalletError::NetworkMismatch("Please add/switch to BNB Smart Chain manually in your wallet".into())
    );
    assert_eq!(wallet.count("add:56"), 1);
    assert_eq!(wallet.count("switch:56"), 2);
}

/// Test: Failed registration stops before a second switch
#[tokio::test]
async fn failed_registration_stops() {
    let wallet = MockProvider::metamask().on_chain(ETHEREUM);
    wallet.switch_results.borrow_mut().push_back(Err(ProviderError::UnrecognizedChain));
    *wallet.add_result.borrow_mut() = Err(ProviderError::UserRejected);

    let provider: &dyn WalletProvider = wallet.as_ref();
    assert!(reconciler().switch_to_target(Some(provider)).await.is_err());
    assert_eq!(wallet.calls(), vec!["switch:56", "add:56"]);
}

/// Test: Other switch errors ask the user to switch manually
#[tokio::test]
async fn rejected_switch_asks_for_manual_switch() {
    let wallet = MockProvider::metamask().on_chain(ETHEREUM);
    wallet.switch_results.borrow_mut().push_back(Err(ProviderError::UserRejected));

    let provider: &dyn WalletProvider = wallet.as_ref();
    let err = reconciler().switch_to_target(Some(provider)).await.unwrap_err();

    assert_eq!(err.to_string(), "Please switch to BNB Smart Chain in your wallet");
    assert_eq!(wallet.count("add:56"), 0);
}

/// Test: Switching with no wallet fails with NotConnected
#[tokio::test]
async fn switch_without_wallet() {
    assert_eq!(reconciler().switch_to_target(None).await, Err(WalletError::NotConnected));
}

// ============================================================================
// Through the presale
// ============================================================================

/// Test: Connecting on the wrong chain shows the switch prompt, switching clears it
#[tokio::test]
async fn wrong_network_then_switch() {
    let wallet = MockProvider::metamask().on_chain(ETHEREUM);
    let presale = presale_for(wallet.clone());
    let mut rx = presale.watch();

    presale.connect(WalletChoice::MetaMask).await.expect("connect");
    assert_eq!(presale.network_status(), NetworkStatus::Mismatched { actual: ETHEREUM });
    let seen = drain(&mut rx);
    assert!(seen.iter().any(|n| matches!(
        n,
        Notification::Status(line) if line.state == StatusState::WrongNetwork && line.message == "Please switch to BNB Smart Chain"
    )));

    let status = presale.switch_network().await.expect("switch");
    assert_eq!(status, NetworkStatus::OnTarget);
    assert!(drain(&mut rx).contains(&Notification::Network(NetworkStatus::OnTarget)));
}

/// Test: Switch while disconnected reports NotConnected
#[tokio::test]
async fn switch_while_disconnected() {
    let presale = presale_for(MockProvider::metamask());
    assert_eq!(presale.switch_network().await, Err(WalletError::NotConnected));
}

/// Test: chainChanged re-runs the check and nothing else
#[tokio::test]
async fn chain_changed_rechecks() {
    let wallet = MockProvider::metamask();
    let presale = presale_for(wallet.clone());
    presale.connect(WalletChoice::MetaMask).await.expect("connect");
    assert!(presale.network_status().is_on_target());

    wallet.chain.set(ETHEREUM);
    wallet.emit(ProviderEvent::ChainChanged(ETHEREUM));
    presale.pump_events().await;

    assert_eq!(presale.network_status(), NetworkStatus::Mismatched { actual: ETHEREUM });
    assert!(presale.connection().is_connected());
    assert_eq!(wallet.count("eth_requestAccounts"), 1);
}

/// Test: Unreadable chain id leaves the network unverified
#[tokio::test]
async fn unreadable_chain_is_not_applicable() {
    let wallet = MockProvider::metamask();
    wallet.chain_read_fails.set(true);
    let presale = presale_for(wallet);

    presale.connect(WalletChoice::MetaMask).await.expect("connect");
    assert_eq!(presale.network_status(), NetworkStatus::NotApplicable);
}
