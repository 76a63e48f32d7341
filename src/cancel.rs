//! @acp:module "Cancellation"
//! @acp:summary "Cooperative cancellation channel checked between requests"
//! @acp:domain cli
//! @acp:layer service
//!
//! Cooperative cancellation
//!
//! A watch channel carries a single "cancelled" flag from the host (for
//! example a Ctrl-C handler) to the invoker, which checks it only between
//! pages.

use tokio::sync::watch;

/// Sending half, held by whoever may interrupt the invocation
#[derive(Debug)]
pub struct CancelTrigger {
    tx: watch::Sender<bool>,
}

/// Receiving half, passed explicitly into the invoker
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger/signal pair
pub fn channel() -> (CancelTrigger, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelTrigger { tx }, CancelSignal { rx })
}

impl CancelTrigger {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_observes_trigger() {
        let (trigger, signal) = channel();
        let late = trigger.signal();
        assert!(!signal.is_cancelled());

        trigger.cancel();
        assert!(signal.is_cancelled());
        assert!(late.is_cancelled());
        assert!(signal.clone().is_cancelled());
    }

    #[test]
    fn test_signal_survives_dropped_trigger() {
        let (trigger, signal) = channel();
        drop(trigger);
        assert!(!signal.is_cancelled());
    }
}
