//! In-process stand-in for the Bot API, shared by the crate's tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::TelegramApi;

#[derive(Clone, Default)]
pub struct MockState {
    updates: Arc<Vec<Value>>,
    pub sent: Arc<Mutex<Vec<Value>>>,
    pub offsets: Arc<Mutex<Vec<i64>>>,
}

impl MockState {
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|body| body["text"].as_str().map(str::to_string))
            .collect()
    }
}

pub struct MockBotApi {
    pub api: TelegramApi,
    pub base_url: String,
    pub state: MockState,
}

/// Serve `updates` from `getUpdates`, honouring `offset` the way Telegram
/// does, and record every `sendMessage` body.  `/botBROKEN/sendMessage`
/// always answers `ok: false`.
pub async fn mock_bot_api(updates: Vec<Value>) -> MockBotApi {
    let state = MockState {
        updates: Arc::new(updates),
        ..MockState::default()
    };
    let app = Router::new()
        .route("/botTEST/getUpdates", get(get_updates))
        .route("/botTEST/sendMessage", post(send_message))
        .route("/botTEST/sendChatAction", post(|| async { Json(json!({ "ok": true, "result": true })) }))
        .route(
            "/botBROKEN/sendMessage",
            post(|| async { Json(json!({ "ok": false, "description": "chat not found" })) }),
        )
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = format!("http://{addr}/botTEST");
    MockBotApi {
        api: TelegramApi::with_base_url(base_url.clone(), 1).unwrap(),
        base_url,
        state,
    }
}

async fn get_updates(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let offset: i64 = query.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);
    state.offsets.lock().unwrap().push(offset);
    let pending: Vec<Value> = state
        .updates
        .iter()
        .filter(|update| update["update_id"].as_i64().unwrap_or(0) >= offset)
        .cloned()
        .collect();
    Json(json!({ "ok": true, "result": pending }))
}

async fn send_message(State(state): State<MockState>, Json(body): Json<Value>) -> Json<Value> {
    state.sent.lock().unwrap().push(body);
    Json(json!({ "ok": true, "result": {} }))
}

pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> Value {
    json!({ "update_id": update_id, "message": { "chat": { "id": chat_id }, "text": text } })
}

pub fn sticker_update(update_id: i64, chat_id: i64) -> Value {
    json!({ "update_id": update_id, "message": { "chat": { "id": chat_id }, "sticker": {} } })
}
