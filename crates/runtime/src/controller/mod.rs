//! Session controller: turns one inbound message into one reply, owning the
//! session record while it does.

mod chat;
mod review;
mod topic;

use std::sync::Arc;

use tracing::{debug, error, info};

use tutor_config::TutorConfig;
use tutor_llm::CompletionGateway;
use tutor_session::{RecipientId, SessionRecord, SessionStore};

use crate::clock::Clock;
use crate::commands::TutorCommand;
use crate::messages;
use crate::unsure::UnsureDetector;
use crate::InboundMessage;

pub use topic::TopicOutcome;

pub struct SessionController {
    store: SessionStore,
    record: SessionRecord,
    gateway: CompletionGateway,
    clock: Arc<dyn Clock>,
    detector: UnsureDetector,
    tutor: TutorConfig,
}

impl SessionController {
    /// Loads the record from `store` once; afterwards the controller's copy is
    /// authoritative and every mutation is written back in full.
    pub fn new(
        store: SessionStore,
        gateway: CompletionGateway,
        clock: Arc<dyn Clock>,
        tutor: TutorConfig,
    ) -> Self {
        let record = store.load();
        info!(
            path = %store.path().display(),
            bound = record.recipient().is_some(),
            unsure = record.unsure_queue().len(),
            "session loaded"
        );
        Self {
            store,
            record,
            gateway,
            clock,
            detector: UnsureDetector::new(tutor.unsure_markers.clone()),
            tutor,
        }
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub async fn handle(&mut self, message: &InboundMessage) -> String {
        match TutorCommand::parse(&message.text) {
            TutorCommand::Start => messages::START.to_string(),
            TutorCommand::Register => self.register(message.sender),
            TutorCommand::Topic => self.topic_on_request(message.sender).await,
            TutorCommand::Review => self.flush_review(message.sender).await,
            TutorCommand::Debug => self.debug_dump(),
            TutorCommand::Unknown(command) => {
                debug!(command, "unknown command");
                messages::UNKNOWN_COMMAND.to_string()
            }
            TutorCommand::Chat(text) => self.chat_turn(message.sender, text).await,
        }
    }

    /// Re-registration always overwrites the previous binding.
    fn register(&mut self, sender: RecipientId) -> String {
        match self.record.bind_recipient(sender) {
            None => info!(recipient = %sender, "recipient bound"),
            Some(previous) if previous == sender => {
                info!(recipient = %sender, "recipient re-registered")
            }
            Some(previous) => {
                info!(%previous, recipient = %sender, "recipient binding replaced")
            }
        }
        self.persist();
        messages::REGISTERED.to_string()
    }

    fn is_bound_to(&self, sender: RecipientId) -> bool {
        self.record.recipient() == Some(sender)
    }

    fn debug_dump(&self) -> String {
        let recipient = self
            .record
            .recipient()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "(unbound)".to_string());
        let topic = self
            .record
            .topic()
            .map(|t| format!("{} ({})", t.text, t.date))
            .unwrap_or_else(|| "(none)".to_string());
        let queue = self.record.unsure_queue();

        let mut lines = vec![
            format!("recipient: {recipient}"),
            format!("today: {}", self.clock.today()),
            format!("topic: {topic}"),
            format!("unsure queue: {}", queue.len()),
        ];
        lines.extend(queue.iter().enumerate().map(|(i, item)| format!("{}. {item}", i + 1)));
        lines.join("\n")
    }

    /// Write the full record.  Failures are logged and the in-memory record
    /// stays authoritative for the rest of the process.
    fn persist(&self) {
        if let Err(err) = self.store.save(&self.record) {
            error!(?err, path = %self.store.path().display(), "failed to persist session record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, fixture};
    use tempfile::TempDir;
    use tutor_llm::GenerationError;

    fn msg(sender: i64, text: &str) -> InboundMessage {
        InboundMessage::new(RecipientId(sender), text)
    }

    // ── Registration ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn register_binds_and_persists_without_topic() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());

        let reply = f.controller.handle(&msg(77, "/me")).await;

        assert_eq!(reply, messages::REGISTERED);
        let saved = f.store.try_load().unwrap().unwrap();
        assert_eq!(saved.recipient(), Some(RecipientId(77)));
        assert!(saved.topic().is_none());
        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn re_registration_overwrites_binding() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        f.controller.handle(&msg(1, "/me")).await;
        f.controller.handle(&msg(2, "/me@tutor_bot")).await;
        assert_eq!(f.store.load().recipient(), Some(RecipientId(2)));
    }

    // ── Unbound state ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn unbound_chat_gets_hint_and_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());

        let reply = f.controller.handle(&msg(5, "이게 뭐예요?")).await;

        assert_eq!(reply, messages::NEEDS_REGISTRATION);
        assert!(f.controller.record().unsure_queue().is_empty());
        assert!(f.store.try_load().unwrap().is_none());
        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn other_chat_is_not_treated_as_the_learner() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        f.controller.handle(&msg(1, "/me")).await;

        assert_eq!(f.controller.handle(&msg(9, "뜻?")).await, messages::NEEDS_REGISTRATION);
        assert_eq!(f.controller.handle(&msg(9, "/review")).await, messages::NEEDS_REGISTRATION);
        assert!(f.controller.record().unsure_queue().is_empty());
    }

    #[tokio::test]
    async fn start_and_unknown_commands_are_canned() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        assert_eq!(f.controller.handle(&msg(1, "/start")).await, messages::START);
        assert_eq!(f.controller.handle(&msg(1, "/nope")).await, messages::UNKNOWN_COMMAND);
        assert_eq!(f.backend.call_count(), 0);
    }

    // ── Queueing ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn question_is_queued_and_answered() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        f.controller.handle(&msg(1, "/me")).await;
        f.backend.push_ok("\"뜻\"은 meaning이에요.");

        let reply = f.controller.handle(&msg(1, "이게 무슨 뜻이에요?")).await;

        assert_eq!(reply, "\"뜻\"은 meaning이에요.");
        assert_eq!(f.controller.record().unsure_queue(), ["이게 무슨 뜻이에요?"]);
        assert_eq!(f.store.load().unsure_queue(), ["이게 무슨 뜻이에요?"]);
        assert_eq!(f.backend.calls()[0].user_content, "이게 무슨 뜻이에요?");
    }

    #[tokio::test]
    async fn question_is_queued_even_when_reply_fails() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        f.controller.handle(&msg(1, "/me")).await;
        f.backend.push_err(GenerationError::Status { code: 500 });

        let reply = f.controller.handle(&msg(1, "여권?")).await;

        assert_eq!(reply, messages::APOLOGY);
        assert_eq!(f.store.load().unsure_queue(), ["여권?"]);
    }

    #[tokio::test]
    async fn queued_message_keeps_surrounding_whitespace() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        f.controller.handle(&msg(1, "/me")).await;
        f.backend.push_ok("설명");

        f.controller.handle(&msg(1, "  이게 무슨 뜻이에요?\n")).await;

        assert_eq!(f.store.load().unsure_queue(), ["  이게 무슨 뜻이에요?\n"]);
    }

    #[tokio::test]
    async fn whitespace_only_text_gets_greeting() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        f.controller.handle(&msg(1, "/me")).await;

        assert_eq!(f.controller.handle(&msg(1, "  \n")).await, messages::START);
        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn plain_statement_is_not_queued() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        f.controller.handle(&msg(1, "/me")).await;
        f.backend.push_ok("좋아요!");

        f.controller.handle(&msg(1, "커피를 마셨어요.")).await;

        assert!(f.controller.record().unsure_queue().is_empty());
    }

    #[tokio::test]
    async fn reply_uses_current_topic_or_fallback() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        f.controller.handle(&msg(1, "/me")).await;

        f.backend.push_ok("네!");
        f.controller.handle(&msg(1, "안녕하세요")).await;
        let fallback = TutorConfig::default().fallback_topic;
        assert!(f.backend.calls()[0].system_instruction.contains(&fallback));

        f.backend.push_ok("오늘은 날씨 얘기 해요");
        f.controller.handle(&msg(1, "/topic")).await;
        f.backend.push_ok("맑아요!");
        f.controller.handle(&msg(1, "날씨가 좋아요")).await;
        let last = f.backend.calls().pop().unwrap();
        assert!(last.system_instruction.contains("오늘은 날씨 얘기 해요"));
        assert_eq!(last.max_output_tokens, tutor_config::GenerationConfig::default().reply.max_output_tokens);
    }

    // ── Backend failure ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn generation_error_yields_apology_and_keeps_topic() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        f.controller.handle(&msg(1, "/me")).await;
        f.backend.push_ok("카페 얘기 해요");
        f.controller.handle(&msg(1, "/topic")).await;
        let before = f.controller.record().topic().cloned();

        f.backend.push_err(GenerationError::Transport("connection reset".into()));
        let reply = f.controller.handle(&msg(1, "빵이 맛있어요")).await;

        assert_eq!(reply, messages::APOLOGY);
        assert!(!reply.contains("connection reset"));
        assert_eq!(f.controller.record().topic().cloned(), before);
        assert_eq!(f.store.load().topic().cloned(), before);
    }

    // ── Persistence across restarts ──────────────────────────────────────────

    #[tokio::test]
    async fn new_controller_resumes_persisted_state() {
        let dir = TempDir::new().unwrap();
        {
            let mut f = fixture(dir.path());
            f.controller.handle(&msg(3, "/me")).await;
            f.backend.push_ok("답");
            f.controller.handle(&msg(3, "몰라요")).await;
        }
        let f = fixture(dir.path());
        assert_eq!(f.controller.record().recipient(), Some(RecipientId(3)));
        assert_eq!(f.controller.record().unsure_queue(), ["몰라요"]);
    }

    #[tokio::test]
    async fn debug_dump_lists_state() {
        let dir = TempDir::new().unwrap();
        let mut f = fixture(dir.path());
        assert!(f.controller.handle(&msg(1, "/debug")).await.contains("recipient: (unbound)"));

        f.controller.handle(&msg(1, "/me")).await;
        f.backend.push_ok("답");
        f.controller.handle(&msg(1, "뜻?")).await;
        f.clock.set(day(10, 20));

        let dump = f.controller.handle(&msg(1, "/debug")).await;
        assert!(dump.contains("recipient: 1"));
        assert!(dump.contains("today: 2026-10-20"));
        assert!(dump.contains("topic: (none)"));
        assert!(dump.contains("unsure queue: 1\n1. 뜻?"));
    }
}
