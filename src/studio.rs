use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::AppConfig,
    provider::{GeminiClient, ModelClient, ProviderError, UnavailableClient},
};

/// Everything a flow needs at call time: the read-only configuration and
/// the model client. Built once at startup and passed by reference.
#[derive(Clone)]
pub struct Studio {
    config: Arc<AppConfig>,
    client: Arc<dyn ModelClient>,
    http: reqwest::Client,
}

impl Studio {
    pub fn new(config: AppConfig, client: Arc<dyn ModelClient>) -> Self {
        Self {
            config: Arc::new(config),
            client,
            http: reqwest::Client::new(),
        }
    }

    /// Picks the hosted provider when credentials are present, otherwise a
    /// client whose calls all fail as unavailable.
    pub fn from_config(config: AppConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let client: Arc<dyn ModelClient> = match config.api_key.as_deref() {
            Some(key) => {
                info!(
                    text_model = config.text_model.as_str(),
                    image_model = config.image_model.as_str(),
                    "model provider configured"
                );
                Arc::new(GeminiClient::new(http.clone(), key, config.api_base.clone()))
            }
            None => {
                warn!("GOOGLE_API_KEY / GEMINI_API_KEY not set; generation flows are unavailable");
                Arc::new(UnavailableClient)
            }
        };

        Ok(Self {
            config: Arc::new(config),
            client,
            http,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &dyn ModelClient {
        self.client.as_ref()
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn provider_available(&self) -> bool {
        self.client.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_degrades_to_unavailable_client() {
        let studio = Studio::from_config(AppConfig::default()).unwrap();
        assert!(!studio.provider_available());
    }

    #[test]
    fn api_key_selects_hosted_client() {
        let config = AppConfig {
            api_key: Some("test-key".into()),
            ..AppConfig::default()
        };
        let studio = Studio::from_config(config).unwrap();
        assert!(studio.provider_available());
    }
}
