//! Connectivity signals.
//!
//! The engine never asks the platform whether it is online. It is handed a
//! [`ConnectivityObserver`] and reacts to the values published on the
//! returned watch channel.

use tokio::sync::watch;

/// Source of online/offline transitions.
pub trait ConnectivityObserver: Send + Sync {
    /// Returns a receiver holding the current state (`true` = online).
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// A connectivity signal driven by the application.
///
/// Platform hooks (network-change callbacks, a health probe, a toggle in a
/// test) call [`set_online`](Self::set_online).
#[derive(Debug)]
pub struct ManualConnectivity {
    sender: watch::Sender<bool>,
}

impl ManualConnectivity {
    /// Creates a signal with the given initial state.
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self { sender }
    }

    /// Publishes a new state. Subscribers are only woken on a real change.
    pub fn set_online(&self, online: bool) {
        self.sender.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
    }

    /// Returns the last published state.
    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }
}

impl ConnectivityObserver for ManualConnectivity {
    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// A signal that is always online, for one-shot tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOnline;

impl ConnectivityObserver for AlwaysOnline {
    fn subscribe(&self) -> watch::Receiver<bool> {
        // The dropped sender leaves the value fixed; `changed()` never fires.
        let (_, receiver) = watch::channel(true);
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_latest_value() {
        let signal = ManualConnectivity::new(false);
        let receiver = signal.subscribe();
        assert!(!*receiver.borrow());

        signal.set_online(true);
        assert!(*receiver.borrow());
        assert!(signal.is_online());
    }

    #[test]
    fn repeated_values_do_not_notify() {
        let signal = ManualConnectivity::new(true);
        let mut receiver = signal.subscribe();
        signal.set_online(true);
        assert!(!receiver.has_changed().unwrap());

        signal.set_online(false);
        assert!(receiver.has_changed().unwrap());
        assert!(!*receiver.borrow_and_update());
    }

    #[test]
    fn always_online() {
        assert!(*AlwaysOnline.subscribe().borrow());
    }
}
