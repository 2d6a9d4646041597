use anyhow::Context;
use parley_engine::{load_catalog, ChatEngine, Mailer, PolicyIndex};
use parley_llm::{ClientFactory, OpenAIConfig};
use parley_persist::{ConversationStore, InMemoryStore, MongoStore, UserStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_api::{
    config::Config,
    create_router,
    mail::{LogMailer, SmtpMailer},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Parley API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Provider client, shared by the assistant gateway and the classifiers
    let mut llm_config =
        OpenAIConfig::new(config.openai_api_key.clone()).with_assistant(config.assistant_id.clone());
    if let Some(base_url) = &config.llm.base_url {
        llm_config = llm_config.with_base_url(base_url.clone());
    }
    let client = ClientFactory::create_openai_client(llm_config)?;

    let (conversations, users) = connect_store(&config).await?;
    let mailer = build_mailer(&config)?;

    let records = load_catalog(&config.policy.catalog_path)
        .with_context(|| format!("Failed to load policy catalog {}", config.policy.catalog_path))?;
    tracing::info!("Loaded {} policies", records.len());
    let policies = PolicyIndex::new(records, config.policy.public_base_url.clone())
        .with_index_url(config.policy.index_url.clone());

    let engine = ChatEngine::builder()
        .assistant_client(client.clone())
        .chat_client(client, config.llm.classifier_model.clone())
        .conversation_store(conversations)
        .user_store(users)
        .mailer(mailer)
        .policy_index(policies)
        .waiter_config(config.waiter_config())
        .consultation(config.consultancy_email.clone(), config.mail.team_name.clone())
        .build()?;

    let state = AppState::new(config.clone(), engine);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Realtime channel: ws://{}/ws", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn ConversationStore>, Arc<dyn UserStore>)> {
    match &config.mongodb_uri {
        Some(uri) => {
            tracing::info!("Connecting to MongoDB");
            let store = Arc::new(MongoStore::connect(uri, &config.mongodb.database).await?);
            tracing::info!("MongoDB connected");
            let conversations: Arc<dyn ConversationStore> = store.clone();
            let users: Arc<dyn UserStore> = store;
            Ok((conversations, users))
        }
        None => {
            tracing::warn!("MONGODB_URI not set, conversations and accounts are kept in memory");
            let store = Arc::new(InMemoryStore::new());
            let conversations: Arc<dyn ConversationStore> = store.clone();
            let users: Arc<dyn UserStore> = store;
            Ok((conversations, users))
        }
    }
}

fn build_mailer(config: &Config) -> anyhow::Result<Arc<dyn Mailer>> {
    match (&config.mail.smtp_host, &config.email_user, &config.email_pass) {
        (Some(host), Some(user), Some(pass)) => {
            tracing::info!("Sending mail through {}", host);
            Ok(Arc::new(SmtpMailer::new(host, user, pass)?))
        }
        _ => {
            tracing::warn!("SMTP not configured, consultation emails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
