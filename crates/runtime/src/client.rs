use anyhow::{Context, Result, anyhow};
use tokio::sync::{mpsc, oneshot};

use crate::commands::SessionCommand;
use crate::controller::TopicOutcome;
use crate::InboundMessage;

/// Cloneable entry point into the session actor.  Each call is a synchronous
/// request/response handoff over the actor's queue.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { tx }
    }

    /// Queue an inbound message and wait for its reply.
    pub async fn submit(&self, message: InboundMessage) -> Result<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Inbound { message, reply_tx })
            .await
            .map_err(|_| anyhow!("session actor is not running"))?;
        reply_rx.await.context("session actor dropped the request")
    }

    /// Ask the actor to run the scheduled topic regeneration and wait for
    /// the outcome.
    pub async fn scheduled_topic(&self) -> Result<TopicOutcome> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::ScheduledTopic { done_tx })
            .await
            .map_err(|_| anyhow!("session actor is not running"))?;
        done_rx.await.context("session actor dropped the request")
    }
}
