//! Cancellation side channel for in-flight fetches.
//!
//! An `AbortController` hands out any number of `AbortSignal`s. The fetch
//! client races the transport against the signal at its suspension point;
//! once aborted, a signal stays aborted.

use tokio::sync::watch;

#[derive(Debug)]
pub struct AbortController {
    sender: watch::Sender<bool>,
}

impl AbortController {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Abort every signal handed out by this controller. Idempotent.
    pub fn abort(&self) {
        self.sender.send_replace(true);
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct AbortSignal {
    receiver: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the signal is aborted. Never resolves if the controller
    /// is dropped without aborting.
    pub async fn aborted(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
