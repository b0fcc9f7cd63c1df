use std::fmt::Debug;
use tokio::sync::mpsc;
use tracing::warn;

/// Reason a subscriber's broadcast send was dropped.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DropReason {
    /// The subscriber's bounded queue was full (a slow consumer).
    QueueFull,
    /// The subscriber's receiver has been dropped.
    Disconnected,
}

/// A single subscriber's outgoing half of a bounded broadcast channel.
///
/// Sends never block the publisher: a full queue or a disconnected
/// subscriber is reported via [`BoundedTx::send`]'s return value rather than
/// propagated as an error the publisher must handle per-subscriber. Once a
/// subscriber disconnects it is marked dead and further sends are no-ops,
/// mirroring the teacher's disable-on-error channel wrapper but trading its
/// unbounded queue for a bounded one with oldest-subscriber drop semantics,
/// per the fan-out backpressure requirement.
#[derive(Debug)]
pub struct BoundedTx<T> {
    tx: Option<mpsc::Sender<T>>,
}

impl<T: Debug> BoundedTx<T> {
    pub fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Attempt to deliver `item` to the subscriber. Returns `Ok(())` if
    /// delivered or the subscriber was already dead; returns the
    /// [`DropReason`] the first time a send fails so the caller can log it.
    pub fn try_send(&mut self, item: T) -> Result<(), DropReason> {
        let Some(tx) = &self.tx else {
            return Ok(());
        };

        match tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("broadcast subscriber queue full, dropping update");
                Err(DropReason::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.tx = None;
                Err(DropReason::Disconnected)
            }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.tx.is_some()
    }
}

/// Construct a bounded channel pair with the given subscriber queue depth.
pub fn bounded<T: Debug>(capacity: usize) -> (BoundedTx<T>, mpsc::Receiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (BoundedTx::new(tx), rx)
}
