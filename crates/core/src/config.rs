use crate::error::ConfigError;
use crate::models::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K};
use std::time::Duration;

pub const DEFAULT_PINECONE_CONTROL_ENDPOINT: &str = "https://api.pinecone.io";
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct PineconeSettings {
    pub api_key: String,
    pub index_name: String,
    pub index_host: String,
    pub control_endpoint: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub endpoint: String,
}

// Process-wide settings, read from the environment once at startup and
// passed down explicitly. Backend credentials are only demanded by the
// accessor for the backend actually in use.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pinecone_api_key: Option<String>,
    pinecone_index_name: Option<String>,
    pinecone_index_host: Option<String>,
    pinecone_control_endpoint: Option<String>,
    openai_api_key: Option<String>,
    openai_endpoint: Option<String>,
    pub top_k: usize,
    pub min_score: f32,
    pub search_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            pinecone_api_key: read_env("PINECONE_API_KEY"),
            pinecone_index_name: read_env("PINECONE_INDEX_NAME"),
            pinecone_index_host: read_env("PINECONE_INDEX_HOST"),
            pinecone_control_endpoint: read_env("PINECONE_CONTROL_ENDPOINT"),
            openai_api_key: read_env("OPENAI_API_KEY"),
            openai_endpoint: read_env("OPENAI_ENDPOINT"),
            top_k: parse_env("RETRIEVAL_TOP_K", DEFAULT_TOP_K)?,
            min_score: parse_env("RETRIEVAL_MIN_SCORE", DEFAULT_MIN_SCORE)?,
            search_timeout: Duration::from_secs(parse_env("RETRIEVAL_TIMEOUT_SECS", 10u64)?),
        })
    }

    pub fn pinecone(&self) -> Result<PineconeSettings, ConfigError> {
        let mut missing = Vec::new();
        if self.pinecone_api_key.is_none() {
            missing.push("PINECONE_API_KEY".to_string());
        }
        if self.pinecone_index_name.is_none() {
            missing.push("PINECONE_INDEX_NAME".to_string());
        }
        if self.pinecone_index_host.is_none() {
            missing.push("PINECONE_INDEX_HOST".to_string());
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv(missing));
        }

        Ok(PineconeSettings {
            api_key: self.pinecone_api_key.clone().unwrap_or_default(),
            index_name: self.pinecone_index_name.clone().unwrap_or_default(),
            index_host: self.pinecone_index_host.clone().unwrap_or_default(),
            control_endpoint: self
                .pinecone_control_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_PINECONE_CONTROL_ENDPOINT.to_string()),
        })
    }

    pub fn openai(&self) -> Result<OpenAiSettings, ConfigError> {
        let api_key = self
            .openai_api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingEnv(vec!["OPENAI_API_KEY".to_string()]))?;

        Ok(OpenAiSettings {
            api_key,
            endpoint: self
                .openai_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_ENDPOINT.to_string()),
        })
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match read_env(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidSetting {
            name,
            details: format!("could not parse {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_pinecone_settings_are_reported_together() {
        let settings = Settings {
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            search_timeout: Duration::from_secs(10),
            ..Default::default()
        };

        match settings.pinecone() {
            Err(ConfigError::MissingEnv(names)) => {
                assert_eq!(names.len(), 3);
                assert!(names.contains(&"PINECONE_API_KEY".to_string()));
                assert!(names.contains(&"PINECONE_INDEX_HOST".to_string()));
            }
            other => panic!("expected MissingEnv, got {other:?}"),
        }
    }

    #[test]
    fn present_pinecone_settings_use_the_default_control_endpoint() {
        let settings = Settings {
            pinecone_api_key: Some("key".to_string()),
            pinecone_index_name: Some("legal-index".to_string()),
            pinecone_index_host: Some("https://legal.svc.pinecone.io".to_string()),
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            search_timeout: Duration::from_secs(10),
            ..Default::default()
        };

        let pinecone = settings.pinecone().unwrap();
        assert_eq!(pinecone.control_endpoint, DEFAULT_PINECONE_CONTROL_ENDPOINT);
        assert_eq!(pinecone.index_name, "legal-index");
    }

    #[test]
    fn openai_settings_require_the_api_key() {
        let settings = Settings::default();
        assert!(matches!(
            settings.openai(),
            Err(ConfigError::MissingEnv(_))
        ));
    }
}
