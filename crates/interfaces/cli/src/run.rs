use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use tutor_config::{AppConfig, Credentials};
use tutor_llm::{ChatCompletionsClient, CompletionGateway};
use tutor_runtime::{
    SessionController, SystemClock, spawn_liveness, spawn_session, spawn_topic_scheduler,
};
use tutor_session::SessionStore;
use tutor_telegram::{TelegramApi, start_bot};

/// Wire every context together and run until Ctrl-C or until the transport
/// gives up.
pub async fn run(config: AppConfig) -> Result<()> {
    // Missing credentials are fatal before anything is started.
    let credentials = Credentials::from_env()?;

    let backend = ChatCompletionsClient::new(
        &config.llm.base_url,
        credentials.llm_api_key.clone(),
        Duration::from_secs(config.llm.request_timeout_secs),
    )?;
    info!(endpoint = backend.endpoint(), model = %config.llm.model, "completion backend ready");
    let gateway = CompletionGateway::new(
        Arc::new(backend),
        config.llm.model.clone(),
        config.generation.clone(),
    );

    let clock = SystemClock::from_name(&config.schedule.timezone);
    info!(tz = %clock.timezone(), "calendar day resolved in timezone");
    let store = SessionStore::new(&config.session.path);
    let controller = SessionController::new(store, gateway, Arc::new(clock), config.tutor.clone());

    let _liveness = spawn_liveness(&config.liveness)?;

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (handle, session_join) = spawn_session(controller, outbound_tx);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = spawn_topic_scheduler(handle.clone(), &config.schedule, shutdown_rx.clone());

    let api = TelegramApi::new(&credentials.telegram_token, config.telegram.poll_timeout_secs)?;
    let telegram_config = config.telegram.clone();
    let mut bot = tokio::spawn(async move {
        start_bot(handle, api, &telegram_config, outbound_rx, shutdown_rx).await
    });

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutdown requested");
            Ok(())
        }
        finished = &mut bot => match finished {
            Ok(Ok(())) => Err(anyhow!("telegram polling stopped unexpectedly")),
            Ok(Err(err)) => Err(err),
            Err(err) => Err(anyhow!("telegram task panicked: {err}")),
        },
    };

    let _ = shutdown_tx.send(true);
    if let Err(err) = scheduler.await {
        error!(?err, "topic scheduler task failed");
    }
    if !bot.is_finished() {
        if let Err(err) = bot.await {
            error!(?err, "telegram task failed");
        }
    }
    // The actor exits once the scheduler and transport have dropped their handles.
    if let Err(err) = session_join.await {
        error!(?err, "session actor task failed");
    }
    info!("shutdown complete");
    outcome
}
