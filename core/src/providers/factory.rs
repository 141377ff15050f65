use crate::config::Config;
use crate::providers::{OllamaProvider, OpenAIProvider};
use crate::tools::resolve_api_key;
use crate::traits::Provider;
use anyhow::{Result, anyhow};
use std::sync::Arc;

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let provider_name = config.provider.as_deref().unwrap_or("openai");

    match provider_name.to_lowercase().as_str() {
        "ollama" => {
            let mut provider = OllamaProvider::new()
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "openai" => {
            let api_key = resolve_api_key(&["OPENAI_API_KEY", "TRIPWISE_OPENAI_API_KEY"], &config.api_key)
                .ok_or_else(|| anyhow!("No API key found. Set OPENAI_API_KEY or run 'tripwise onboard'."))?;
            let mut provider = OpenAIProvider::new(api_key)
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "openrouter" => {
            let api_key = resolve_api_key(
                &["OPENROUTER_API_KEY", "TRIPWISE_OPENROUTER_API_KEY"],
                &config.api_key,
            )
            .ok_or_else(|| anyhow!("No API key found. Set OPENROUTER_API_KEY or run 'tripwise onboard'."))?;
            let base_url = config.base_url.as_deref().unwrap_or(OPENROUTER_BASE_URL);
            let provider = OpenAIProvider::new(api_key)
                .with_model(config.model.clone())
                .with_temperature(config.temperature)
                .with_base_url(base_url);
            Ok(Arc::new(provider))
        }
        _ => Err(anyhow!(
            "Unknown provider: {}. Available: openai, openrouter, ollama",
            provider_name
        )),
    }
}
