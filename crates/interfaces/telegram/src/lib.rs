mod api;
#[cfg(test)]
mod test_support;

use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use tutor_config::TelegramConfig;
use tutor_runtime::{InboundMessage, OutboundMessage, SessionHandle};
use tutor_session::RecipientId;

pub use api::TelegramApi;

/// Long-poll Telegram and hand each text message to the session, one at a
/// time and in arrival order, until `shutdown_rx` flips.
///
/// Scheduled messages arriving on `outbound_rx` are delivered by a separate
/// task so they never wait behind a pending poll.
pub async fn start_bot(
    handle: SessionHandle,
    api: TelegramApi,
    config: &TelegramConfig,
    outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let delivery = spawn_delivery(api.clone(), outbound_rx, config.max_message_chars);
    let mut offset: i64 = 0;

    info!(poll_timeout_secs = config.poll_timeout_secs, "telegram polling started");

    loop {
        let polled = tokio::select! {
            polled = api.fetch_updates(offset, config.poll_timeout_secs) => polled,
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        };

        let updates = match polled {
            Ok(updates) => updates,
            Err(err) => {
                let backoff = if err.to_string().contains("409") {
                    // Another instance is polling with the same token.
                    warn!("telegram 409 conflict: another bot instance is polling; backing off");
                    Duration::from_secs(15)
                } else {
                    warn!(?err, "telegram getUpdates failed; retrying");
                    Duration::from_secs(5)
                };
                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = shutdown_rx.changed() => {}
                }
                if *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        };

        for update in updates {
            offset = update.update_id + 1;

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                debug!(chat_id = message.chat.id, "skipping non-text message");
                continue;
            };
            let chat_id = message.chat.id;

            let typing = spawn_typing(api.clone(), chat_id);
            let reply = handle
                .submit(InboundMessage::new(RecipientId(chat_id), text))
                .await;
            let _ = typing.send(());

            let reply = match reply {
                Ok(reply) => reply,
                Err(err) => {
                    error!(?err, "session is gone; stopping telegram polling");
                    delivery.abort();
                    return Err(err);
                }
            };

            for chunk in chunk_message(&reply, config.max_message_chars) {
                if let Err(err) = api.send_message(chat_id, &chunk).await {
                    warn!(?err, chat_id, "telegram sendMessage failed");
                }
            }
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    info!("telegram polling stopped");
    delivery.abort();
    Ok(())
}

/// Drain scheduler output to the chat.
fn spawn_delivery(
    api: TelegramApi,
    mut outbound_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    max_chars: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let chat_id = message.recipient.0;
            for chunk in chunk_message(&message.text, max_chars) {
                if let Err(err) = api.send_message(chat_id, &chunk).await {
                    warn!(?err, chat_id, "failed to deliver scheduled message");
                }
            }
        }
        debug!("outbound channel closed");
    })
}

/// Keep the "typing…" indicator alive until the returned sender fires or is
/// dropped.  Telegram clears the indicator after about five seconds.
fn spawn_typing(api: TelegramApi, chat_id: i64) -> oneshot::Sender<()> {
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        api.send_chat_action(chat_id, "typing").await;
        let mut interval = tokio::time::interval(Duration::from_secs(4));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel_rx => break,
                _ = interval.tick() => api.send_chat_action(chat_id, "typing").await,
            }
        }
    });
    cancel_tx
}

/// Split `text` into pieces of at most `max_chars` characters, preferring
/// line boundaries.  A single line longer than the limit is hard-split.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let mut line = line;
        while line.chars().count() > max_chars {
            if current_len > 0 {
                chunks.push(current.trim_end().to_string());
                current.clear();
                current_len = 0;
            }
            let split = line
                .char_indices()
                .nth(max_chars)
                .map(|(idx, _)| idx)
                .unwrap_or(line.len());
            chunks.push(line[..split].to_string());
            line = &line[split..];
        }

        let line_len = line.chars().count() + 1;
        if current_len > 0 && current_len + line_len > max_chars {
            chunks.push(current.trim_end().to_string());
            current.clear();
            current_len = 0;
        }
        current.push_str(line);
        current.push('\n');
        current_len += line_len;
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim_end().to_string());
    }

    if chunks.is_empty() {
        chunks.push(text.to_string());
    }
    chunks
}
