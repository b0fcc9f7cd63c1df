use indexbot_integration::channel::bounded;
use indexbot_integration::BoundedTx;
use std::fmt::Debug;
use tokio::sync::mpsc;

const SUBSCRIBER_QUEUE_DEPTH: usize = 16;

/// Fans a [`Snapshot`](crate::Snapshot) out to every live subscriber. A slow
/// or disconnected subscriber never slows the engine loop down - see
/// [`BoundedTx`]'s drop-on-overflow semantics.
#[derive(Debug, Default)]
pub struct Broadcaster<T> {
    subscribers: Vec<BoundedTx<T>>,
}

impl<T: Clone + Debug> Broadcaster<T> {
    pub fn new() -> Self {
        Self { subscribers: Vec::new() }
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<T> {
        let (tx, rx) = bounded(SUBSCRIBER_QUEUE_DEPTH);
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, item: T) {
        self.subscribers.retain_mut(|tx| {
            let _ = tx.try_send(item.clone());
            tx.is_alive()
        });
    }
}
