use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub engine: EngineConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub fallback_enabled: bool,
}

impl LlmConfig {
    /// The configured credential, treating an empty value as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub strict_validation: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "qwen/qwen3-32b";

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // .env values must be visible before the overrides below are read
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("llm.api_url", DEFAULT_LLM_API_URL)?
            .set_default("llm.model", DEFAULT_LLM_MODEL)?
            .set_default("llm.temperature", 0.2)?
            .set_default("llm.max_tokens", 4096)?
            .set_default("llm.timeout_secs", 60)?
            .set_default("llm.fallback_enabled", true)?
            .set_default("engine.url", "http://localhost:8047")?
            .set_default("engine.timeout_secs", 30)?
            .set_default("engine.strict_validation", false)?
            .set_default("audit.database_url", "./audit.db")?
            .set_default("logging.level", "info")?;

        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(5000))?;
        }

        if let Ok(api_url) = env::var("LLM_API_URL") {
            builder = builder.set_override("llm.api_url", api_url)?;
        }

        if let Ok(api_key) = env::var("LLM_API_KEY") {
            if !api_key.trim().is_empty() {
                builder = builder.set_override("llm.api_key", api_key)?;
            }
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            builder = builder.set_override("llm.model", model)?;
        }

        if let Ok(temperature) = env::var("LLM_TEMPERATURE") {
            if let Ok(value) = temperature.parse::<f64>() {
                builder = builder.set_override("llm.temperature", value)?;
            }
        }

        if let Ok(max_tokens) = env::var("LLM_MAX_TOKENS") {
            if let Ok(value) = max_tokens.parse::<u32>() {
                builder = builder.set_override("llm.max_tokens", value)?;
            }
        }

        if let Ok(timeout) = env::var("LLM_TIMEOUT_SECS") {
            if let Ok(value) = timeout.parse::<u64>() {
                builder = builder.set_override("llm.timeout_secs", value)?;
            }
        }

        if let Ok(enabled) = env::var("LLM_FALLBACK_ENABLED") {
            builder = builder.set_override("llm.fallback_enabled", parse_flag(&enabled))?;
        }

        if let Ok(engine_url) = env::var("QUERY_ENGINE_URL") {
            builder = builder.set_override("engine.url", engine_url)?;
        }

        if let Ok(timeout) = env::var("QUERY_ENGINE_TIMEOUT_SECS") {
            if let Ok(value) = timeout.parse::<u64>() {
                builder = builder.set_override("engine.timeout_secs", value)?;
            }
        }

        if let Ok(strict) = env::var("STRICT_SQL_VALIDATION") {
            builder = builder.set_override("engine.strict_validation", parse_flag(&strict))?;
        }

        if let Ok(audit_url) = env::var("AUDIT_DATABASE_URL") {
            builder = builder.set_override("audit.database_url", audit_url)?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the generation client cannot honour.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !(self.llm.temperature > 0.0 && self.llm.temperature <= 1.0) {
            return Err(config::ConfigError::Message(format!(
                "llm.temperature must be in (0, 1], got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(config::ConfigError::Message(
                "llm.max_tokens must be positive".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 || self.engine.timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        llm: LlmConfig {
            api_url: DEFAULT_LLM_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 4096,
            timeout_secs: 60,
            fallback_enabled: true,
        },
        engine: EngineConfig {
            url: "http://localhost:8047".to_string(),
            timeout_secs: 30,
            strict_validation: false,
        },
        audit: AuditConfig {
            database_url: ":memory:".to_string(),
        },
        logging: LoggingConfig {
            level: "info".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::from_env();
        assert!(config.is_ok());

        let config = config.unwrap();
        assert!(config.llm.temperature > 0.0 && config.llm.temperature <= 1.0);
        assert!(config.llm.max_tokens > 0);
        assert!(!config.engine.url.is_empty());
    }

    #[test]
    fn test_empty_credential_is_absent() {
        let mut config = test_config();
        assert!(config.llm.credential().is_none());

        config.llm.api_key = Some("   ".to_string());
        assert!(config.llm.credential().is_none());

        config.llm.api_key = Some("gsk-test".to_string());
        assert_eq!(config.llm.credential(), Some("gsk-test"));
    }

    #[test]
    fn test_validate_rejects_greedy_temperature() {
        let mut config = test_config();
        assert!(config.validate().is_ok());

        config.llm.temperature = 0.0;
        assert!(config.validate().is_err());

        config.llm.temperature = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" ON "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_server_address() {
        let mut config = test_config();
        config.server.port = 5000;
        assert_eq!(config.server_address(), "127.0.0.1:5000");
    }
}
