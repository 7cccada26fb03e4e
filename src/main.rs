//! Learning assistant terminal client

use learning_assistant::config::ClientConfig;
use learning_assistant::controller::ConversationController;
use learning_assistant::gateway::{Gateway, HttpGateway, LoggingGateway};
use learning_assistant::storage::LocalStorage;
use learning_assistant::store::SessionStore;
use learning_assistant::terminal::Terminal;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; stdout belongs to the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learning_assistant=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env()?;

    tracing::info!(path = %config.db_path.display(), "Opening local storage");
    let storage = LocalStorage::open(&config.db_path)?;
    let store = Arc::new(SessionStore::with_persistence(Arc::new(storage)));
    if let Some(subject) = config.subject {
        store.set_subject(subject);
    }

    tracing::info!(api_url = %config.api_url, timeout = ?config.timeout, "Connecting to service");
    let http: Arc<dyn Gateway> = Arc::new(HttpGateway::new(&config.api_url, config.timeout)?);
    let controller = Arc::new(ConversationController::new(
        Arc::clone(&store),
        LoggingGateway::new(http),
    ));

    Terminal::new(controller).run().await?;
    Ok(())
}
