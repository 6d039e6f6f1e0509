//! Unsure-queue review: all items or nothing.

use tracing::{info, warn};

use tutor_llm::CallSite;
use tutor_session::RecipientId;

use crate::messages;
use crate::prompt_builder::{review_instruction, review_user_content};

use super::SessionController;

impl SessionController {
    /// Turn the whole queue into one review.  The queue is cleared only after
    /// the review text exists; a failed call keeps every item.
    pub(super) async fn flush_review(&mut self, sender: RecipientId) -> String {
        if !self.is_bound_to(sender) {
            return messages::NEEDS_REGISTRATION.to_string();
        }
        if self.record.unsure_queue().is_empty() {
            return messages::ENCOURAGEMENT.to_string();
        }

        let instruction = review_instruction(&self.tutor.name);
        let content = review_user_content(self.record.unsure_queue());
        match self.gateway.complete(CallSite::Review, &instruction, &content).await {
            Ok(review) => {
                let flushed = self.record.take_unsure();
                self.persist();
                info!(items = flushed.len(), "unsure queue flushed into review");
                messages::with_review_banner(&review)
            }
            Err(err) => {
                warn!(
                    reason = err.reason(),
                    items = self.record.unsure_queue().len(),
                    "review generation failed; queue kept"
                );
                messages::REVIEW_APOLOGY.to_string()
            }
        }
    }
}
