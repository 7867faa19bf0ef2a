//! Provider selection: which endpoint answers, and with which model.

use crate::openai_compat::OpenAiCompatProvider;
use calclaw_config::AppConfig;
use calclaw_core::error::ProviderError;
use calclaw_core::provider::Provider;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A provider together with the model it should be asked for.
#[derive(Clone)]
pub struct ProviderRoute {
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

pub struct ProviderRouter {
    routes: BTreeMap<String, ProviderRoute>,
    default_name: String,
}

impl ProviderRouter {
    pub fn new(default_name: impl Into<String>) -> Self {
        Self {
            routes: BTreeMap::new(),
            default_name: default_name.into(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, route: ProviderRoute) {
        self.routes.insert(name.into(), route);
    }

    pub fn get(&self, name: &str) -> Option<&ProviderRoute> {
        self.routes.get(name)
    }

    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.default_route().map(|route| route.provider.clone())
    }

    pub fn default_route(&self) -> Option<&ProviderRoute> {
        self.routes.get(&self.default_name)
    }

    /// The default route, or `NotConfigured` naming what is missing.
    pub fn require_default(&self) -> Result<ProviderRoute, ProviderError> {
        self.default_route().cloned().ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "provider '{}' has no API key or endpoint",
                self.default_name
            ))
        })
    }

    /// Registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.routes.keys().map(String::as_str).collect()
    }
}

/// Build the routes the configuration can actually serve.
///
/// Each provider takes its own `api_key`, falling back to the global one.
/// Hosted providers without a key, and unknown providers without an
/// `api_url`, are left out.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    let mut names: Vec<&str> = config.providers.keys().map(String::as_str).collect();
    if !config.providers.contains_key(&config.default_provider) {
        names.push(&config.default_provider);
    }

    for name in names {
        let overrides = config.providers.get(name);

        let Some(base_url) = overrides
            .and_then(|p| p.api_url.clone())
            .or_else(|| known_base_url(name).map(String::from))
        else {
            warn!(provider = name, "No api_url for unknown provider, skipping");
            continue;
        };

        let api_key = overrides
            .and_then(|p| p.api_key.clone())
            .or_else(|| config.api_key.clone());
        let api_key = match api_key {
            Some(key) => key,
            None if is_local(name) => String::new(),
            None => {
                debug!(provider = name, "No API key, skipping");
                continue;
            }
        };

        let model = overrides
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        router.insert(
            name,
            ProviderRoute {
                provider: Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)),
                model,
            },
        );
    }

    router
}

fn known_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "groq" => Some("https://api.groq.com/openai/v1"),
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        "llamacpp" | "llama.cpp" => Some("http://localhost:8080/v1"),
        _ => None,
    }
}

/// Self-hosted servers accept requests without a key.
fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use calclaw_config::ProviderConfig;

    fn keyed_config() -> AppConfig {
        AppConfig {
            api_key: Some("gsk-test".into()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn default_provider_uses_global_key_and_model() {
        let config = keyed_config();
        let router = build_from_config(&config);

        let route = router.require_default().unwrap();
        assert_eq!(route.provider.name(), "groq");
        assert_eq!(route.model, config.default_model);
    }

    #[test]
    fn missing_key_leaves_default_unconfigured() {
        let router = build_from_config(&AppConfig::default());
        assert!(router.default().is_none());

        let err = router.require_default().err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(msg) if msg.contains("groq")));
    }

    #[test]
    fn local_provider_needs_no_key() {
        let config = AppConfig {
            default_provider: "ollama".into(),
            ..AppConfig::default()
        };
        let router = build_from_config(&config);
        assert_eq!(router.list(), vec!["ollama"]);
    }

    #[test]
    fn per_provider_overrides() {
        let mut config = keyed_config();
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-own".into()),
                default_model: Some("gpt-4o-mini".into()),
                ..Default::default()
            },
        );
        config.providers.insert(
            "mystery".into(),
            ProviderConfig {
                api_key: Some("k".into()),
                ..Default::default()
            },
        );

        let router = build_from_config(&config);
        assert_eq!(router.list(), vec!["groq", "openai"]);
        assert_eq!(router.get("openai").unwrap().model, "gpt-4o-mini");
    }

    #[test]
    fn unknown_provider_with_endpoint_is_routed() {
        let mut config = keyed_config();
        config.default_provider = "gpu-box".into();
        config.providers.insert(
            "gpu-box".into(),
            ProviderConfig {
                api_url: Some("http://gpu-box:9000/v1".into()),
                ..Default::default()
            },
        );
        let router = build_from_config(&config);
        assert_eq!(router.require_default().unwrap().provider.name(), "gpu-box");
    }
}
