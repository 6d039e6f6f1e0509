//! Session runtime for the daily tutor: the controller, the single actor that
//! owns it, the topic scheduler, and the liveness probe.

mod client;
pub mod clock;
mod commands;
mod controller;
mod events;
mod liveness;
pub mod messages;
pub mod prompt_builder;
mod scheduler;
mod server;
mod unsure;

#[cfg(test)]
mod test_support;

pub use client::SessionHandle;
pub use clock::{Clock, SystemClock};
pub use controller::{SessionController, TopicOutcome};
pub use events::{InboundMessage, OutboundMessage};
pub use liveness::{LIVENESS_BODY, LivenessServer, spawn_liveness};
pub use scheduler::spawn_topic_scheduler;
pub use server::spawn_session;
pub use unsure::UnsureDetector;
