use tutor_session::RecipientId;

/// One inbound chat message as seen by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: RecipientId,
    pub text: String,
}

impl InboundMessage {
    pub fn new(sender: RecipientId, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}

/// A message the session wants delivered without a pending request, e.g. the
/// scheduled topic of the day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: RecipientId,
    pub text: String,
}
