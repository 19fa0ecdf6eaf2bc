//! Outbound notifications to the UI projection.

use futures::channel::mpsc;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

use super::ledger::LedgerSnapshot;
use super::status::StatusLine;
use crate::wallet::{ConnectionState, NetworkStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Connection(ConnectionState),
    Network(NetworkStatus),
    Ledger(LedgerSnapshot),
    Status(StatusLine),
}

/// Fan-out to every live watcher. Closed receivers are dropped on the next send.
pub struct Notifier<T> {
    watchers: Rc<RefCell<Vec<mpsc::UnboundedSender<T>>>>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self { watchers: self.watchers.clone() }
    }
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self { watchers: Rc::new(RefCell::new(Vec::new())) }
    }
}

impl<T: Clone> Notifier<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded();
        self.watchers.borrow_mut().push(tx);
        rx
    }

    pub fn notify(&self, value: T) {
        self.watchers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(value.clone()).is_ok());
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fans_out_and_prunes_closed() {
        let notifier: Notifier<u32> = Notifier::new();
        let mut a = notifier.watch();
        let b = notifier.watch();
        drop(b);

        notifier.notify(7);
        assert_eq!(a.try_recv().ok(), Some(7));
        assert_eq!(notifier.watcher_count(), 1);
    }
}
