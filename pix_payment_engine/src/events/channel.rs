//! Fire-and-forget event delivery.
//!
//! Each kind of event gets its own bounded queue and one [`EventHandler`] draining it. Any number of
//! [`EventProducer`]s can feed the queue. Handlers only ever see the event itself, never the engine's state, so a slow
//! or failing hook (an operator webhook timing out, say) cannot hold up a deposit.
//!
//! Publishing never blocks. When the queue is full the event is dropped with a warning: operator notifications are
//! best-effort, and the ledger remains the source of truth.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    queue: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, queue) = mpsc::channel(buffer_size.max(1));
        Self { queue, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped and all in-flight handlers have finished.
    pub async fn start_handler(self) {
        let Self { mut queue, sender, handler } = self;
        // Only producers may keep the queue open
        drop(sender);
        debug!("📬️ Event handler started");
        let mut jobs = JoinSet::new();
        while let Some(event) = queue.recv().await {
            let handler = Arc::clone(&handler);
            jobs.spawn(async move { (handler)(event).await });
            // Reap whatever has already finished so the set does not grow without bound
            while let Some(done) = jobs.try_join_next() {
                log_job_result(done);
            }
        }
        trace!("📬️ All producers are gone. Waiting for {} running handlers", jobs.len());
        while let Some(done) = jobs.join_next().await {
            log_job_result(done);
        }
        debug!("📬️ Event handler has shut down");
    }
}

fn log_job_result(result: Result<(), tokio::task::JoinError>) {
    match result {
        Ok(()) => trace!("📬️ Event handled"),
        Err(e) => warn!("📬️ An event hook did not complete. {e}"),
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Queues the event without waiting. Never fails the caller.
    pub fn publish_event(&self, event: E) {
        match self.sender.try_send(event) {
            Ok(()) => {},
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("📬️ Event queue is full. The event has been dropped");
            },
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("📬️ Event handler has shut down. The event has been dropped");
            },
        }
    }
}
