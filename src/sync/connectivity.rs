use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// The connectivity signal the queue and submit path observe. Two inputs:
/// the runtime-reported network state, and a manual override that forces
/// offline regardless of the network (used for testing and demos). The
/// effective value is published on a watch channel so the replay engine can
/// wake on the offline-to-online edge.
pub struct Connectivity {
    network_online: AtomicBool,
    forced_offline: AtomicBool,
    online_tx: watch::Sender<bool>,
}

impl Connectivity {
    pub fn new(network_online: bool) -> Self {
        let (online_tx, _rx) = watch::channel(network_online);
        Self {
            network_online: AtomicBool::new(network_online),
            forced_offline: AtomicBool::new(false),
            online_tx,
        }
    }

    /// Feed a network-state event from the runtime.
    pub fn set_network(&self, online: bool) {
        self.network_online.store(online, Ordering::SeqCst);
        self.publish();
    }

    /// Manual override: while set, the signal reads offline no matter what
    /// the network says.
    pub fn force_offline(&self, forced: bool) {
        self.forced_offline.store(forced, Ordering::SeqCst);
        self.publish();
    }

    fn publish(&self) {
        self.online_tx.send_replace(self.effective());
    }

    fn effective(&self) -> bool {
        self.network_online.load(Ordering::SeqCst) && !self.forced_offline.load(Ordering::SeqCst)
    }

    pub fn is_online(&self) -> bool {
        *self.online_tx.borrow()
    }

    pub fn network_online(&self) -> bool {
        self.network_online.load(Ordering::SeqCst)
    }

    pub fn forced_offline(&self) -> bool {
        self.forced_offline.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.online_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::Connectivity;

    #[test]
    fn override_wins_over_network_state() {
        let signal = Connectivity::new(true);
        assert!(signal.is_online());

        signal.force_offline(true);
        assert!(!signal.is_online());
        assert!(signal.network_online());

        signal.set_network(false);
        signal.force_offline(false);
        assert!(!signal.is_online());

        signal.set_network(true);
        assert!(signal.is_online());
    }

    #[tokio::test]
    async fn subscribers_see_the_online_edge() {
        let signal = Connectivity::new(true);
        let mut rx = signal.subscribe();

        signal.force_offline(true);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());

        signal.force_offline(false);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
    }
}
