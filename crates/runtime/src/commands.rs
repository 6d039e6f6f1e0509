use tokio::sync::oneshot;

use crate::InboundMessage;
use crate::controller::TopicOutcome;

/// What an inbound text asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorCommand<'a> {
    Start,
    Register,
    Topic,
    Review,
    Debug,
    Unknown(&'a str),
    Chat(&'a str),
}

impl<'a> TutorCommand<'a> {
    /// Classify a message.  Telegram-style `/cmd@botname args` is accepted;
    /// the bot mention and any arguments are ignored.  Free text is passed
    /// through untouched.
    pub fn parse(text: &'a str) -> Self {
        let Some(rest) = text.trim().strip_prefix('/') else {
            return Self::Chat(text);
        };

        let command = rest.split(char::is_whitespace).next().unwrap_or_default();
        let command = command
            .split_once('@')
            .map(|(base, _)| base)
            .unwrap_or(command);

        match command {
            "start" | "help" => Self::Start,
            "me" => Self::Register,
            "topic" => Self::Topic,
            "review" => Self::Review,
            "debug" => Self::Debug,
            _ => Self::Unknown(command),
        }
    }
}

/// Work items drained in order by the session actor.
#[derive(Debug)]
pub enum SessionCommand {
    Inbound {
        message: InboundMessage,
        reply_tx: oneshot::Sender<String>,
    },
    ScheduledTopic {
        done_tx: oneshot::Sender<TopicOutcome>,
    },
}
