use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque identifier of the chat the tutor is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub i64);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A generated topic and the calendar day it belongs to.  Keeping both in
/// one value means a topic can never exist without its date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTopic {
    pub text: String,
    pub date: NaiveDate,
}

/// The only mutable shared state in the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    recipient: Option<RecipientId>,
    topic: Option<DailyTopic>,
    unsure_queue: Vec<String>,
}

impl SessionRecord {
    pub fn recipient(&self) -> Option<RecipientId> {
        self.recipient
    }

    /// Binds `recipient`, replacing any previous binding.  Returns the
    /// recipient that was bound before, if any.
    pub fn bind_recipient(&mut self, recipient: RecipientId) -> Option<RecipientId> {
        self.recipient.replace(recipient)
    }

    pub fn topic(&self) -> Option<&DailyTopic> {
        self.topic.as_ref()
    }

    /// The stored topic, but only if it was generated on `date`.
    pub fn topic_for(&self, date: NaiveDate) -> Option<&DailyTopic> {
        self.topic.as_ref().filter(|topic| topic.date == date)
    }

    pub fn set_topic(&mut self, text: impl Into<String>, date: NaiveDate) {
        self.topic = Some(DailyTopic {
            text: text.into(),
            date,
        });
    }

    pub fn unsure_queue(&self) -> &[String] {
        &self.unsure_queue
    }

    pub fn push_unsure(&mut self, message: impl Into<String>) {
        self.unsure_queue.push(message.into());
    }

    /// Empties the whole queue at once and hands back its contents.
    pub fn take_unsure(&mut self) -> Vec<String> {
        std::mem::take(&mut self.unsure_queue)
    }
}

// ── On-disk shape ────────────────────────────────────────────────────────────

/// Flat file layout.  `topic_text` and `topic_date` are separate keys on disk
/// and are folded into [`DailyTopic`] when read back.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SessionFile {
    #[serde(default)]
    pub recipient_id: Option<RecipientId>,
    #[serde(default)]
    pub topic_text: Option<String>,
    #[serde(default)]
    pub topic_date: Option<NaiveDate>,
    #[serde(default)]
    pub unsure_queue: Vec<String>,
}

impl From<&SessionRecord> for SessionFile {
    fn from(record: &SessionRecord) -> Self {
        Self {
            recipient_id: record.recipient,
            topic_text: record.topic.as_ref().map(|t| t.text.clone()),
            topic_date: record.topic.as_ref().map(|t| t.date),
            unsure_queue: record.unsure_queue.clone(),
        }
    }
}

impl TryFrom<SessionFile> for SessionRecord {
    type Error = &'static str;

    fn try_from(file: SessionFile) -> Result<Self, Self::Error> {
        let topic = match (file.topic_text, file.topic_date) {
            (Some(text), Some(date)) => Some(DailyTopic { text, date }),
            (None, None) => None,
            (Some(_), None) => return Err("topic_text is set without topic_date"),
            (None, Some(_)) => return Err("topic_date is set without topic_text"),
        };
        Ok(Self {
            recipient: file.recipient_id,
            topic,
            unsure_queue: file.unsure_queue,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn default_record_is_unbound_and_empty() {
        let record = SessionRecord::default();
        assert!(record.recipient().is_none());
        assert!(record.topic().is_none());
        assert!(record.unsure_queue().is_empty());
    }

    #[test]
    fn rebinding_overwrites_and_reports_previous() {
        let mut record = SessionRecord::default();
        assert_eq!(record.bind_recipient(RecipientId(1)), None);
        assert_eq!(record.bind_recipient(RecipientId(2)), Some(RecipientId(1)));
        assert_eq!(record.recipient(), Some(RecipientId(2)));
    }

    #[test]
    fn topic_for_matches_only_its_own_day() {
        let mut record = SessionRecord::default();
        record.set_topic("카페에서 주문하기", day(18));
        assert!(record.topic_for(day(18)).is_some());
        assert!(record.topic_for(day(19)).is_none());
        assert_eq!(record.topic().unwrap().text, "카페에서 주문하기");
    }

    #[test]
    fn take_unsure_empties_queue_in_order() {
        let mut record = SessionRecord::default();
        record.push_unsure("뜻?");
        record.push_unsure("몰라요");
        assert_eq!(record.take_unsure(), vec!["뜻?", "몰라요"]);
        assert!(record.unsure_queue().is_empty());
    }

    #[test]
    fn half_set_topic_is_rejected() {
        let file = SessionFile {
            topic_text: Some("orphan".into()),
            ..SessionFile::default()
        };
        assert!(SessionRecord::try_from(file).is_err());

        let file = SessionFile {
            topic_date: Some(day(1)),
            ..SessionFile::default()
        };
        assert!(SessionRecord::try_from(file).is_err());
    }

    #[test]
    fn file_shape_uses_flat_keys() {
        let mut record = SessionRecord::default();
        record.bind_recipient(RecipientId(42));
        record.set_topic("날씨", day(19));
        let json = serde_json::to_value(SessionFile::from(&record)).unwrap();
        assert_eq!(json["recipient_id"], 42);
        assert_eq!(json["topic_text"], "날씨");
        assert_eq!(json["topic_date"], "2026-10-19");
        assert!(json["unsure_queue"].as_array().unwrap().is_empty());
    }
}
