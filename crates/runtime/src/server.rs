//! Session actor: the one task that owns the [`SessionController`].
//!
//! Every read-mutate-persist cycle happens inside this task, one command at a
//! time, so interactive turns and scheduled regenerations can never
//! interleave.  Other contexts talk to it only through [`SessionHandle`].

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::commands::SessionCommand;
use crate::controller::SessionController;
use crate::{OutboundMessage, SessionHandle};

/// Pending commands beyond this make senders wait.
const COMMAND_QUEUE_CAP: usize = 64;

/// Start the actor.  It runs until every [`SessionHandle`] clone is dropped.
pub fn spawn_session(
    controller: SessionController,
    outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAP);
    let join = tokio::spawn(run_session(controller, rx, outbound_tx));
    (SessionHandle::new(tx), join)
}

async fn run_session(
    mut controller: SessionController,
    mut rx: mpsc::Receiver<SessionCommand>,
    outbound_tx: mpsc::UnboundedSender<OutboundMessage>,
) {
    info!("session actor started");
    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::Inbound { message, reply_tx } => {
                debug!(sender = %message.sender, len = message.text.len(), "inbound message");
                let reply = controller.handle(&message).await;
                if reply_tx.send(reply).is_err() {
                    warn!(sender = %message.sender, "requester went away before the reply was ready");
                }
            }
            SessionCommand::ScheduledTopic { done_tx } => {
                let (outcome, delivery) = controller.run_scheduled_topic().await;
                if let Some(message) = delivery {
                    if outbound_tx.send(message).is_err() {
                        warn!("no outbound consumer; scheduled topic was not delivered");
                    }
                }
                let _ = done_tx.send(outcome);
            }
        }
    }
    info!("session actor stopped");
}
