//! Persisted single-recipient session state.

mod record;
mod store;

pub use record::{DailyTopic, RecipientId, SessionRecord};
pub use store::{SessionStore, StoreError};
