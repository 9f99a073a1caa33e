use std::env;
use std::str::FromStr;

use anyhow::{Context, bail};

use crate::pipeline::Locale;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub llm_provider: String,
    pub llm_model: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub locale: Locale,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
    pub static_dir: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let llm_provider = var("LLM_PROVIDER", "openai").to_lowercase();
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.is_empty());
        let anthropic_api_key = lookup("ANTHROPIC_API_KEY").filter(|k| !k.is_empty());

        let default_model = match llm_provider.as_str() {
            "openai" => {
                if openai_api_key.is_none() {
                    bail!("OPENAI_API_KEY must be set when LLM_PROVIDER is openai");
                }
                "gpt-4o"
            }
            "anthropic" => {
                if anthropic_api_key.is_none() {
                    bail!("ANTHROPIC_API_KEY must be set when LLM_PROVIDER is anthropic");
                }
                "claude-haiku-4-5-20251001"
            }
            other => bail!("unsupported LLM_PROVIDER {other:?}, expected openai or anthropic"),
        };

        Ok(Self {
            port: parse_var(&var("APP_PORT", "8080"), "APP_PORT")?,
            environment: var("APP_ENVIRONMENT", "development"),
            llm_model: var("LLM_MODEL", default_model),
            llm_provider,
            openai_api_key,
            openai_base_url: lookup("OPENAI_BASE_URL").filter(|u| !u.is_empty()),
            anthropic_api_key,
            locale: parse_var(&var("AUDIT_LOCALE", "en"), "AUDIT_LOCALE")?,
            default_temperature: parse_var(&var("DEFAULT_TEMPERATURE", "0.2"), "DEFAULT_TEMPERATURE")?,
            default_max_tokens: parse_var(&var("DEFAULT_MAX_TOKENS", "1024"), "DEFAULT_MAX_TOKENS")?,
            static_dir: var("STATIC_DIR", "static"),
            max_upload_bytes: parse_var(&var("MAX_UPLOAD_BYTES", "20971520"), "MAX_UPLOAD_BYTES")?,
            request_timeout_secs: parse_var(
                &var("REQUEST_TIMEOUT_SECS", "300"),
                "REQUEST_TIMEOUT_SECS",
            )?,
            otel_service_name: var("OTEL_SERVICE_NAME", "hmi-audit"),
            otel_exporter_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T>(raw: &str, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}
