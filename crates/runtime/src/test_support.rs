//! Fakes shared by the runtime's unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use tutor_config::{GenerationConfig, TutorConfig};
use tutor_llm::{CompletionBackend, CompletionGateway, CompletionRequest, GenerationError};
use tutor_session::SessionStore;

use crate::clock::Clock;
use crate::controller::SessionController;

/// Manually advanced clock.
pub struct FixedClock(Mutex<NaiveDate>);

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self(Mutex::new(date))
    }

    pub fn set(&self, date: NaiveDate) {
        *self.0.lock().unwrap() = date;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.0.lock().unwrap()
    }
}

/// Backend that replays queued results and records every request.  Once the
/// script runs out it fails with a transport error.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn push_ok(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn push_err(&self, err: GenerationError) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".into())))
    }
}

/// Backend whose calls never complete.
pub struct StalledBackend;

#[async_trait]
impl CompletionBackend for StalledBackend {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, GenerationError> {
        std::future::pending().await
    }
}

pub fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

pub struct Fixture {
    pub controller: SessionController,
    pub backend: Arc<ScriptedBackend>,
    pub clock: Arc<FixedClock>,
    pub store: SessionStore,
}

/// Controller whose every backend call hangs.
pub fn stalled_controller(dir: &Path) -> SessionController {
    let gateway = CompletionGateway::new(Arc::new(StalledBackend), "test-model", GenerationConfig::default());
    SessionController::new(
        SessionStore::new(dir.join("session.json")),
        gateway,
        Arc::new(FixedClock::new(day(10, 19))),
        TutorConfig::default(),
    )
}

/// Controller over a session file in `dir`, with the clock set to 2026-10-19.
pub fn fixture(dir: &Path) -> Fixture {
    let backend = Arc::new(ScriptedBackend::default());
    let clock = Arc::new(FixedClock::new(day(10, 19)));
    let store = SessionStore::new(dir.join("session.json"));
    let gateway = CompletionGateway::new(backend.clone(), "test-model", GenerationConfig::default());
    let controller = SessionController::new(
        store.clone(),
        gateway,
        clock.clone(),
        TutorConfig::default(),
    );
    Fixture {
        controller,
        backend,
        clock,
        store,
    }
}
