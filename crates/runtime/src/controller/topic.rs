//! Topic of the day, shared by the scheduler and the `/topic` command.

use tracing::{info, warn};

use tutor_llm::{CallSite, GenerationError};
use tutor_session::RecipientId;

use crate::messages;
use crate::prompt_builder::{topic_instruction, topic_user_content};
use crate::OutboundMessage;

use super::SessionController;

#[derive(Debug, Clone, PartialEq)]
pub enum TopicOutcome {
    /// A new topic was generated and stored.
    Generated(String),
    /// Today's topic already exists; no backend call was made.
    AlreadyToday(String),
    /// No recipient is bound yet.
    Unbound,
    /// The backend failed; the record is untouched.
    Failed(GenerationError),
}

impl SessionController {
    /// Generate and store today's topic unless one already exists for today.
    ///
    /// The day check is the only guard against duplicate generation, whichever
    /// path triggered the call.
    pub async fn regenerate_topic_if_due(&mut self) -> TopicOutcome {
        let Some(recipient) = self.record.recipient() else {
            info!("topic regeneration skipped: no recipient bound");
            return TopicOutcome::Unbound;
        };

        let today = self.clock.today();
        if let Some(topic) = self.record.topic_for(today) {
            info!(%today, "topic already generated today; skipping");
            return TopicOutcome::AlreadyToday(topic.text.clone());
        }

        let instruction = topic_instruction(&self.tutor.name);
        let content = topic_user_content(today);
        match self.gateway.complete(CallSite::Topic, &instruction, &content).await {
            Ok(text) => {
                self.record.set_topic(text.clone(), today);
                self.persist();
                info!(%recipient, %today, "topic of the day generated");
                TopicOutcome::Generated(text)
            }
            Err(err) => {
                warn!(reason = err.reason(), "topic generation failed; will retry on next trigger");
                TopicOutcome::Failed(err)
            }
        }
    }

    /// Scheduler entry point.  Only a freshly generated topic is pushed to the
    /// learner; every other outcome stays silent.
    pub async fn run_scheduled_topic(&mut self) -> (TopicOutcome, Option<OutboundMessage>) {
        let outcome = self.regenerate_topic_if_due().await;
        let delivery = match (&outcome, self.record.recipient()) {
            (TopicOutcome::Generated(text), Some(recipient)) => Some(OutboundMessage {
                recipient,
                text: messages::with_topic_banner(text),
            }),
            _ => None,
        };
        (outcome, delivery)
    }

    pub(super) async fn topic_on_request(&mut self, sender: RecipientId) -> String {
        if !self.is_bound_to(sender) {
            return messages::NEEDS_REGISTRATION.to_string();
        }
        match self.regenerate_topic_if_due().await {
            TopicOutcome::Generated(text) | TopicOutcome::AlreadyToday(text) => {
                messages::with_topic_banner(&text)
            }
            TopicOutcome::Unbound => messages::NEEDS_REGISTRATION.to_string(),
            TopicOutcome::Failed(_) => messages::TOPIC_APOLOGY.to_string(),
        }
    }
}
