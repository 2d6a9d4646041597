use parley_engine::ChatEngine;
use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::config::Config;

/// Shared application state passed to all handlers
///
/// Everything is behind an Arc; cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<ChatEngine>,
    pub keys: JwtKeys,
}

impl AppState {
    pub fn new(config: Config, engine: ChatEngine) -> Self {
        let keys = JwtKeys::new(&config.jwt_key, config.auth.token_ttl_secs);
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            keys,
        }
    }
}
