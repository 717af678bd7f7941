//! Environment-driven server configuration.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use docqa_rag::{PipelineConfig, RagError};
use docqa_telemetry::{LogFormat, TelemetryConfig};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Everything the binary needs to start serving.
#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub pipeline: PipelineConfig,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    /// Upper bound on each provider call.
    pub request_timeout: Duration,
    /// `None` logs to stdout only.
    pub log_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("pipeline", &self.pipeline)
            .field("openai_api_key", &"<redacted>")
            .field("openai_base_url", &self.openai_base_url)
            .field("embedding_model", &self.embedding_model)
            .field("request_timeout", &self.request_timeout)
            .field("log_file", &self.log_file)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment, loading `.env`
    /// first when one exists.
    pub fn from_env() -> Result<Self, RagError> {
        // a missing .env is fine; real variables win over it
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `OPENAI_API_KEY` is missing or
    /// blank, a numeric value does not parse, or the resulting pipeline
    /// settings are invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let openai_api_key = var("OPENAI_API_KEY")
            .ok_or_else(|| RagError::ConfigError("OPENAI_API_KEY is not set".into()))?;

        let defaults = PipelineConfig::default();
        let mut pipeline = PipelineConfig::builder()
            .chunk_size(parse(&lookup, "DOCQA_CHUNK_SIZE", defaults.chunk_size)?)
            .top_k(parse(&lookup, "DOCQA_TOP_K", defaults.top_k)?);
        if let Some(path) = var("DOCQA_KNOWLEDGE_PATH") {
            pipeline = pipeline.knowledge_path(path);
        }
        if let Some(model) = var("DOCQA_CHAT_MODEL") {
            pipeline = pipeline.chat_model(model);
        }
        if let Some(prompt) = var("DOCQA_SYSTEM_PROMPT") {
            pipeline = pipeline.system_instruction(prompt);
        }

        // unset means the default file; set-but-empty turns the file sink off
        let log_file = match lookup("DOCQA_LOG_FILE") {
            None => Some(PathBuf::from("app.log")),
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(PathBuf::from(v)),
        };

        let log_format = match var("DOCQA_LOG_FORMAT") {
            Some(v) => v
                .parse()
                .map_err(|e| RagError::ConfigError(format!("DOCQA_LOG_FORMAT: {e}")))?,
            None => LogFormat::Text,
        };

        Ok(Self {
            host: var("DOCQA_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse(&lookup, "DOCQA_PORT", 8000)?,
            pipeline: pipeline.build()?,
            openai_api_key,
            openai_base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            embedding_model: var("DOCQA_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            request_timeout: Duration::from_secs(parse(&lookup, "DOCQA_REQUEST_TIMEOUT_SECS", 60)?),
            log_file,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, RagError> {
        format!("{}:{}", self.host, self.port).parse().map_err(|e| {
            RagError::ConfigError(format!("invalid host/port {}:{}: {e}", self.host, self.port))
        })
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        let config = TelemetryConfig::new("docqa-server").with_format(self.log_format);
        match &self.log_file {
            Some(path) => config.with_log_file(path),
            None => config,
        }
    }
}

fn parse<F, T>(lookup: &F, name: &str, default: T) -> Result<T, RagError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| RagError::ConfigError(format!("{name}={raw:?} is invalid: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_with_only_a_key() {
        let config = ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.log_file, Some(PathBuf::from("app.log")));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.bind_addr().unwrap().port(), 8000);
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        assert!(matches!(ServerConfig::from_lookup(lookup(&[])), Err(RagError::ConfigError(_))));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])),
            Err(RagError::ConfigError(_))
        ));
    }

    #[test]
    fn overrides_are_applied() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("DOCQA_HOST", "0.0.0.0"),
            ("DOCQA_PORT", "9001"),
            ("DOCQA_KNOWLEDGE_PATH", "data/faq.txt"),
            ("DOCQA_CHAT_MODEL", "gpt-4o"),
            ("DOCQA_TOP_K", "2"),
            ("DOCQA_CHUNK_SIZE", "500"),
            ("DOCQA_LOG_FILE", ""),
            ("DOCQA_LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9001);
        assert_eq!(config.pipeline.knowledge_path, PathBuf::from("data/faq.txt"));
        assert_eq!(config.pipeline.chat_model, "gpt-4o");
        assert_eq!(config.pipeline.top_k, 2);
        assert_eq!(config.pipeline.chunk_size, 500);
        assert_eq!(config.log_file, None);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.telemetry().log_file.is_none());
    }

    #[test]
    fn unparsable_numbers_are_rejected() {
        let cases = [("DOCQA_PORT", "eighty"), ("DOCQA_TOP_K", "-1"), ("DOCQA_TOP_K", "0")];
        for (name, value) in cases {
            let result =
                ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test"), (name, value)]));
            assert!(matches!(result, Err(RagError::ConfigError(_))), "{name}={value}");
        }
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
