// Main entry point for the event scanner

use std::sync::Arc;

use anyhow::{Context, Result};
use openai_client::OpenAIClient;
use scout_core::domains::bot::BotService;
use scout_core::domains::channels::TelegramWebReader;
use scout_core::domains::detection::LlmEventClassifier;
use scout_core::domains::notifications::BroadcastDispatcher;
use scout_core::domains::subscribers::{Subscriber, SubscriberStore};
use scout_core::kernel::{
    BaseAI, BaseChatBot, NoopChatBot, OpenAIAdapter, PipelineDeps, ServiceHost, TelegramAdapter,
    UnconfiguredAI,
};
use scout_core::pipeline::PollingWorker;
use scout_core::stores::SqliteStore;
use scout_core::Config;
use telegram::{TelegramOptions, TelegramService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,event_scout=debug,scout_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Event Scout");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Open database and run migrations
    let store = Arc::new(
        SqliteStore::new(&config.database_url)
            .await
            .context("Failed to open database")?,
    );
    tracing::info!("Database ready");

    if let Some(chat_id) = config.telegram_bot_chat_id {
        store
            .add_subscriber(&Subscriber::new(chat_id))
            .await
            .context("Failed to register TELEGRAM_BOT_CHAT_ID")?;
        tracing::info!(chat_id, "Configured chat registered as subscriber");
    }

    let ai: Arc<dyn BaseAI> = match &config.classifier_api_key {
        Some(api_key) => {
            let client = OpenAIClient::new(api_key.clone())
                .with_base_url(config.classifier_base_url.clone())
                .with_timeout(config.classifier_timeout)?;
            Arc::new(OpenAIAdapter::new(client, config.classifier_model.clone()))
        }
        None => {
            tracing::warn!("CLASSIFIER_API_KEY not set, every post will be classified as non-event");
            Arc::new(UnconfiguredAI)
        }
    };

    let mut classifier = LlmEventClassifier::new(ai);
    if let Some(path) = &config.classifier_prompt_path {
        match std::fs::read_to_string(path) {
            Ok(template) => {
                tracing::info!(path = %path.display(), "Using custom classifier prompt");
                classifier = classifier.with_prompt_template(template);
            }
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Classifier prompt not readable, using built-in prompt"
            ),
        }
    }

    let bot: Arc<dyn BaseChatBot> = match &config.telegram_bot_token {
        Some(token) => {
            let options = TelegramOptions::new(token.clone())
                .with_api_base(config.telegram_api_base.clone());
            Arc::new(TelegramAdapter::new(Arc::new(TelegramService::new(options))))
        }
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set, delivery and bot commands are disabled");
            Arc::new(NoopChatBot)
        }
    };

    let deps = PipelineDeps {
        posts: store.clone(),
        subscribers: store.clone(),
        classifier: Arc::new(classifier),
        reader: Arc::new(TelegramWebReader::new(config.channel_preview_base.clone())?),
        dispatcher: Arc::new(BroadcastDispatcher::new(bot.clone(), store.clone())),
        bot,
    };

    let mut host = ServiceHost::new().with_service(PollingWorker::new(
        deps.clone(),
        config.pipeline_settings(),
        config.channels_path.clone(),
        config.poll_interval,
    ));
    if config.telegram_bot_token.is_some() {
        host = host.with_service(BotService::new(&deps));
    }

    host.run_until_shutdown().await;

    store.close().await;
    tracing::info!("Event Scout stopped");
    Ok(())
}
