use reqwest::Client;

use crate::optimizer::service::OptimizerService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub optimizer: OptimizerService,
    /// Client for job-posting fetches (short timeout, browser user agent).
    pub http: Client,
}
