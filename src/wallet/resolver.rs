//! Provider lookup among whatever the host page injected.

use std::rc::Rc;

use super::provider::{HostProviders, InjectedKind, ProviderFlags, WalletProvider};

/// Anything that can report identity flags.
pub trait Identified {
    fn identity_flags(&self) -> ProviderFlags;
}

impl Identified for Rc<dyn WalletProvider> {
    fn identity_flags(&self) -> ProviderFlags {
        self.flags()
    }
}

/// Pick the provider for `kind`.
///
/// With several providers injected (co-existing extensions) the first one
/// whose flags match wins. A lone provider must match too, unless no specific
/// kind was asked for. `None` means the wallet is not installed.
pub fn resolve<P: Identified + Clone>(host: &HostProviders<P>, kind: Option<InjectedKind>) -> Option<P> {
    let accepts = |p: &P| kind.map_or(true, |k| p.identity_flags().matches(k));
    match host {
        HostProviders::Absent => None,
        HostProviders::Single(provider) => accepts(provider).then(|| provider.clone()),
        HostProviders::Many(list) => list.iter().find(|p| accepts(*p)).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Fake(&'static str, ProviderFlags);

    impl Identified for Fake {
        fn identity_flags(&self) -> ProviderFlags {
            self.1
        }
    }

    fn metamask() -> Fake {
        Fake("mm", ProviderFlags { is_metamask: true, ..Default::default() })
    }

    fn trust() -> Fake {
        Fake("trust", ProviderFlags { is_trust_wallet: true, ..Default::default() })
    }

    #[test]
    fn absent_host_is_not_found() {
        let host: HostProviders<Fake> = HostProviders::Absent;
        assert_eq!(resolve(&host, Some(InjectedKind::MetaMask)), None);
        assert_eq!(resolve(&host, None), None);
    }

    #[test]
    fn array_picks_first_match() {
        let host = HostProviders::Many(vec![trust(), metamask(), Fake("mm2", metamask().1)]);
        assert_eq!(resolve(&host, Some(InjectedKind::MetaMask)), Some(metamask()));
        assert_eq!(resolve(&host, Some(InjectedKind::Trust)), Some(trust()));
        assert_eq!(resolve(&host, None), Some(trust()));
    }

    #[test]
    fn single_must_match_requested_kind() {
        let host = HostProviders::Single(metamask());
        assert_eq!(resolve(&host, Some(InjectedKind::MetaMask)), Some(metamask()));
        assert_eq!(resolve(&host, Some(InjectedKind::Trust)), None);
    }

    #[test]
    fn single_accepted_without_kind() {
        let host = HostProviders::Single(Fake("generic", ProviderFlags::default()));
        assert!(resolve(&host, None).is_some());
    }
}
