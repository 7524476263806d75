use sqlx::PgPool;

use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum
/// extractors. No process-wide mutable singletons: everything a request
/// needs travels through here.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    /// Startup configuration, kept available to handlers that need it.
    #[allow(dead_code)]
    pub config: Config,
}
