//! Configuration for the answer pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::prompt::DEFAULT_SYSTEM_INSTRUCTION;

/// Configuration parameters for the answer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// UTF-8 knowledge document loaded by `initialize()`.
    pub knowledge_path: PathBuf,
    /// Maximum chunk size in characters. Chunks never overlap.
    pub chunk_size: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Chat model identifier sent with every completion request.
    pub chat_model: String,
    /// Sampling temperature for completions.
    pub temperature: f32,
    /// System message sent ahead of every question.
    pub system_instruction: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            knowledge_path: PathBuf::from("knowledge.txt"),
            chunk_size: 1000,
            top_k: 4,
            chat_model: "gpt-4".to_string(),
            temperature: 0.0,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Check that the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `top_k == 0`
    /// - `temperature` is outside `0.0..=2.0`
    /// - `chat_model` is blank
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::ConfigError(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        if self.chat_model.trim().is_empty() {
            return Err(RagError::ConfigError("chat_model must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn knowledge_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.knowledge_path = path.into();
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.config.chat_model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.config.system_instruction = instruction.into();
        self
    }

    /// Build the [`PipelineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`PipelineConfig::validate`].
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.top_k, 4);
        assert_eq!(config.chat_model, "gpt-4");
        assert_eq!(config.temperature, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert!(matches!(
            PipelineConfig::builder().top_k(0).build(),
            Err(RagError::ConfigError(_))
        ));
        assert!(matches!(
            PipelineConfig::builder().chunk_size(0).build(),
            Err(RagError::ConfigError(_))
        ));
        assert!(matches!(
            PipelineConfig::builder().temperature(3.0).build(),
            Err(RagError::ConfigError(_))
        ));
        assert!(matches!(
            PipelineConfig::builder().chat_model(" ").build(),
            Err(RagError::ConfigError(_))
        ));
    }

    #[test]
    fn round_trips_through_json() {
        let config =
            PipelineConfig::builder().knowledge_path("kb/faq.txt").top_k(2).build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
