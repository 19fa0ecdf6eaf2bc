//! Presale - one widget instance: wallet gate plus sale ledger
//!
//! Owns the [`ConnectionManager`] and the [`SaleLedger`] and routes every
//! state change to the same [`Notifier`], so a UI binds to one stream.

use futures::channel::mpsc;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::config::{ConfigError, SaleConfig};
use crate::core::amount::{sanitize_input, Amount, AmountError};
use crate::core::ledger::{LedgerSnapshot, SaleLedger, SaleRejection};
use crate::core::notify::{Notification, Notifier};
use crate::core::status::{StatusLine, StatusState, Tone};
use crate::wallet::{
    ConnectOutcome, ConnectionManager, ConnectionState, InjectedHost, NetworkStatus, RelayConnector,
    SessionStore, WalletChoice, WalletError,
};

/// Fraction digits shown for amounts on the page.
const DISPLAY_DIGITS: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Wrong network: expected chain {expected}, wallet is on {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("Network not verified yet")]
    NetworkUnknown,
    #[error(transparent)]
    Rejected(#[from] SaleRejection),
}

/// What the amount box shows while the visitor types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePreview {
    /// Sanitized input, written back into the text box.
    pub input: String,
    pub amount: Option<Amount>,
    pub quoted: Option<Amount>,
    /// Empty while there is no input.
    pub quoted_display: String,
    pub rejection: Option<SaleRejection>,
    pub hint: String,
    pub tone: Tone,
    pub can_buy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub paid: Amount,
    pub received: Amount,
    pub remaining: Amount,
}

pub struct Presale {
    config: SaleConfig,
    manager: ConnectionManager,
    ledger: RefCell<SaleLedger>,
    notifier: Notifier<Notification>,
}

impl Presale {
    pub fn new(
        config: SaleConfig,
        host: Rc<dyn InjectedHost>,
        relay: Rc<dyn RelayConnector>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let notifier = Notifier::new();
        let sessions = SessionStore::new(relay, config.relay.clone());
        let manager = ConnectionManager::new(host, sessions, config.chain.clone(), notifier.clone());
        let ledger = SaleLedger::new(config.total_supply, config.price, config.minimum);

        tracing::info!(
            token = %config.token_symbol,
            supply = %config.total_supply,
            chain = config.chain.id(),
            "presale ready"
        );
        Ok(Self { config, manager, ledger: RefCell::new(ledger), notifier })
    }

    pub fn config(&self) -> &SaleConfig {
        &self.config
    }

    pub fn watch(&self) -> mpsc::UnboundedReceiver<Notification> {
        self.notifier.watch()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn network_status(&self) -> NetworkStatus {
        self.manager.network_status()
    }

    pub fn ledger(&self) -> LedgerSnapshot {
        self.ledger.borrow().snapshot()
    }

    // ------------------------------------------------------------------
    // Wallet
    // ------------------------------------------------------------------

    pub async fn connect(&self, choice: WalletChoice) -> Result<ConnectOutcome, WalletError> {
        self.manager.connect(choice).await
    }

    pub async fn restore_session(&self) -> ConnectOutcome {
        self.manager.restore_session().await
    }

    /// User-initiated: also closes the relay pairing.
    pub async fn disconnect(&self) {
        self.manager.disconnect(true).await
    }

    pub async fn switch_network(&self) -> Result<NetworkStatus, WalletError> {
        self.manager.switch_network().await
    }

    pub async fn pump_events(&self) -> usize {
        self.manager.pump_events().await
    }

    pub async fn run_events(&self) {
        self.manager.run_events().await
    }

    // ------------------------------------------------------------------
    // Sale
    // ------------------------------------------------------------------

    /// Payment that buys the whole remaining supply.
    pub fn max_purchase(&self) -> Amount {
        self.ledger.borrow().max_purchase()
    }

    pub fn set_purchase_amount_input(&self, raw: &str) -> PurchasePreview {
        let input = sanitize_input(raw);
        // still typing: digits past the 18th are dropped, not refused
        let parsed = Amount::parse_truncating(&input);
        let amount = parsed.as_ref().ok().copied().filter(|a| !a.is_zero());
        let ledger = self.ledger.borrow();

        let quoted = amount.and_then(|a| ledger.quote(a));
        let quoted_display = match (&quoted, input.is_empty()) {
            (_, true) => String::new(),
            (Some(q), false) => q.format_display(DISPLAY_DIGITS),
            (None, false) => Amount::ZERO.format_display(DISPLAY_DIGITS),
        };

        let verdict = match parsed {
            Ok(a) => ledger.validate(a),
            Err(err) => Err(self.rejection_for(err)),
        };
        let (rejection, hint, tone) = match &verdict {
            Ok(_) => (None, "Valid amount".to_string(), Tone::Good),
            Err(SaleRejection::NoAmount) => (Some(SaleRejection::NoAmount), "Ready".to_string(), Tone::Neutral),
            Err(r @ SaleRejection::BelowMinimum { minimum }) => (
                Some(*r),
                format!("Minimum is {} {}", minimum.format_display(DISPLAY_DIGITS), self.config.payment_symbol),
                Tone::Bad,
            ),
            Err(r @ SaleRejection::ExceedsRemaining { .. }) => (Some(*r), r.to_string(), Tone::Bad),
        };
        let can_buy = verdict.is_ok() && self.manager.is_connected() && self.network_status().is_on_target();

        PurchasePreview { input, amount, quoted, quoted_display, rejection, hint, tone, can_buy }
    }

    /// Submit the text of the amount box. Only a plain non-negative decimal
    /// is accepted; `"-5"` or `"1e3"` are refused, never cleaned up.
    pub fn submit_purchase_input(&self, raw: &str) -> Result<PurchaseReceipt, PurchaseError> {
        let amount = raw.parse::<Amount>().map_err(|err| {
            tracing::debug!(input = raw, error = %err, "unparsable purchase amount");
            PurchaseError::Rejected(self.rejection_for(err))
        })?;
        self.submit_purchase(amount)
    }

    /// Too large to represent is still a number, just more than is left.
    fn rejection_for(&self, err: AmountError) -> SaleRejection {
        match err {
            AmountError::Overflow => SaleRejection::ExceedsRemaining {
                requested: Amount::MAX,
                remaining: self.ledger.borrow().remaining(),
            },
            _ => SaleRejection::NoAmount,
        }
    }

    /// Simulated purchase. The wallet must be connected and on the sale chain
    /// before the ledger is consulted.
    pub fn submit_purchase(&self, amount_in: Amount) -> Result<PurchaseReceipt, PurchaseError> {
        if !self.manager.is_connected() {
            return Err(PurchaseError::NotConnected);
        }
        match self.network_status() {
            NetworkStatus::OnTarget => {}
            NetworkStatus::Mismatched { actual } => {
                return Err(PurchaseError::WrongNetwork { expected: self.config.chain.id(), actual })
            }
            NetworkStatus::NotApplicable => return Err(PurchaseError::NetworkUnknown),
        }

        let (receipt, snapshot) = {
            let mut ledger = self.ledger.borrow_mut();
            let before = ledger.committed();
            let remaining = ledger.apply(amount_in).map_err(|rejection| {
                tracing::debug!(%amount_in, %rejection, "purchase rejected");
                rejection
            })?;
            let received = ledger.committed().saturating_sub(before);
            (PurchaseReceipt { paid: amount_in, received, remaining }, ledger.snapshot())
        };

        tracing::info!(paid = %receipt.paid, received = %receipt.received, remaining = %receipt.remaining, "demo purchase");
        self.notifier.notify(Notification::Ledger(snapshot));
        self.notifier.notify(Notification::Status(StatusLine::new(
            StatusState::Connected,
            "Demo purchase successful (UI only) ✅",
        )));
        Ok(receipt)
    }

    /// Remaining supply as the page shows it, e.g. `"49,970 WESEE"`.
    pub fn remaining_display(&self) -> String {
        format!("{} {}", self.ledger.borrow().remaining().format_display(DISPLAY_DIGITS), self.config.token_symbol)
    }
}
