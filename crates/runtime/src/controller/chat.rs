//! Free-text turns.

use tracing::debug;

use tutor_llm::CallSite;
use tutor_session::RecipientId;

use crate::messages;
use crate::prompt_builder::reply_instruction;

use super::SessionController;

impl SessionController {
    /// Queue the message if it looks unsure, then answer it in the context of
    /// the current topic.  The reply never changes the topic.
    pub(super) async fn chat_turn(&mut self, sender: RecipientId, text: &str) -> String {
        if !self.is_bound_to(sender) {
            return messages::NEEDS_REGISTRATION.to_string();
        }
        if text.trim().is_empty() {
            return messages::START.to_string();
        }

        // Queue the raw text before the backend call so the item survives a
        // failed reply.
        if self.detector.is_unsure(text) {
            self.record.push_unsure(text);
            self.persist();
            debug!(queue_len = self.record.unsure_queue().len(), "message queued for review");
        }

        let topic = self
            .record
            .topic()
            .map(|t| t.text.as_str())
            .unwrap_or(self.tutor.fallback_topic.as_str());
        let instruction = reply_instruction(&self.tutor.name, topic);

        match self.gateway.complete(CallSite::Reply, &instruction, text).await {
            Ok(reply) => reply,
            Err(_) => messages::APOLOGY.to_string(),
        }
    }
}
