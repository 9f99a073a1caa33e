pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

pub use config::Config;

use pipeline::{GenerationSettings, Rubric};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm_client: Arc<llm::LlmClient>,
    pub rubric: Arc<Rubric>,
    pub settings: GenerationSettings,
}

impl AppState {
    pub fn new(config: Config, llm_client: Arc<llm::LlmClient>) -> Self {
        Self {
            rubric: Arc::new(Rubric::standard(config.locale)),
            settings: GenerationSettings::from_config(&config),
            config,
            llm_client,
        }
    }
}
