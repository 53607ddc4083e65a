//! Configuration builders controlling chain construction and text generation.

use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};

/// Default external utility used to fetch remote sources.
pub const DEFAULT_FETCH_PROGRAM: &str = "curl";

/// Default number of words printed per output line.
pub const DEFAULT_WORDS_PER_LINE: usize = 10;

/// Configuration for building a chain from text sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Number of preceding words used as context.
    pub order: usize,
    /// Size of the buffer used when streaming a source into the word splitter.
    pub chunk_size: usize,
    /// External program invoked to fetch URL sources.
    pub fetch_program: String,
    /// Enables recursive directory traversal for local sources.
    pub recursive: bool,
    /// Follows symlinks encountered during traversal.
    pub follow_symlinks: bool,
}

impl BuildConfig {
    /// Returns a builder initialised with [`BuildConfig::default`].
    #[must_use]
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder::default()
    }

    /// Validates the invariants required for building.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(ChainError::InvalidConfig(
                "order must be greater than zero".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(ChainError::InvalidConfig(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if self.fetch_program.trim().is_empty() {
            return Err(ChainError::InvalidConfig(
                "fetch_program must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            order: 2,
            chunk_size: 4096,
            fetch_program: DEFAULT_FETCH_PROGRAM.into(),
            recursive: true,
            follow_symlinks: false,
        }
    }
}

/// Builder for [`BuildConfig`].
#[derive(Debug, Default, Clone)]
pub struct BuildConfigBuilder {
    cfg: BuildConfig,
}

impl BuildConfigBuilder {
    /// Creates a builder with [`BuildConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chain order.
    #[must_use]
    pub fn order(mut self, value: usize) -> Self {
        self.cfg.order = value;
        self
    }

    /// Sets the streaming chunk size in bytes.
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.cfg.chunk_size = size;
        self
    }

    /// Overrides the program used to fetch URL sources.
    #[must_use]
    pub fn fetch_program<S: Into<String>>(mut self, program: S) -> Self {
        self.cfg.fetch_program = program.into();
        self
    }

    /// Enables or disables recursive directory traversal.
    #[must_use]
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.cfg.recursive = enabled;
        self
    }

    /// Enables or disables following of symlinks when traversing directories.
    #[must_use]
    pub fn follow_symlinks(mut self, enabled: bool) -> Self {
        self.cfg.follow_symlinks = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`BuildConfig`].
    pub fn build(self) -> Result<BuildConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Configuration for generating text from a loaded chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateConfig {
    /// Number of new words to generate.
    pub word_count: usize,
    /// Number of words written per output line.
    pub words_per_line: usize,
    /// Fixed RNG seed; `None` keeps the chain's entropy-seeded generator.
    pub seed: Option<u64>,
}

impl GenerateConfig {
    /// Returns a builder initialised with [`GenerateConfig::default`].
    #[must_use]
    pub fn builder() -> GenerateConfigBuilder {
        GenerateConfigBuilder::default()
    }

    /// Validates the invariants required for generation.
    pub fn validate(&self) -> Result<()> {
        if self.word_count == 0 {
            return Err(ChainError::InvalidConfig(
                "word_count must be greater than zero".into(),
            ));
        }
        if self.words_per_line == 0 {
            return Err(ChainError::InvalidConfig(
                "words_per_line must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            word_count: 100,
            words_per_line: DEFAULT_WORDS_PER_LINE,
            seed: None,
        }
    }
}

/// Builder for [`GenerateConfig`].
#[derive(Debug, Default, Clone)]
pub struct GenerateConfigBuilder {
    cfg: GenerateConfig,
}

impl GenerateConfigBuilder {
    /// Creates a builder with [`GenerateConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of words to generate.
    #[must_use]
    pub fn word_count(mut self, value: usize) -> Self {
        self.cfg.word_count = value;
        self
    }

    /// Sets the output line width in words.
    #[must_use]
    pub fn words_per_line(mut self, value: usize) -> Self {
        self.cfg.words_per_line = value;
        self
    }

    /// Fixes the RNG seed for reproducible output.
    #[must_use]
    pub fn seed(mut self, value: Option<u64>) -> Self {
        self.cfg.seed = value;
        self
    }

    /// Finalises the builder, returning a validated [`GenerateConfig`].
    pub fn build(self) -> Result<GenerateConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}
