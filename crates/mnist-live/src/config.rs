// TrainerConfig — run parameters with documented defaults
//
// Every field has a default, so a TOML file only needs the keys it
// overrides. Command-line flags are applied on top by the binary, then
// `validate()` rejects values the session cannot run with.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mnist_live_data::LoadOptions;
use serde::Deserialize;

pub const DEFAULT_BATCH_SIZE: usize = 512;
pub const DEFAULT_VALIDATION_BATCH_SIZE: usize = 4096;
pub const DEFAULT_EPOCHS: usize = 25;

pub const DEFAULT_TRAIN_IMAGES: &str = "resources/train-images-idx3-ubyte.gz";
pub const DEFAULT_TRAIN_LABELS: &str = "resources/train-labels-idx1-ubyte.gz";
pub const DEFAULT_TEST_IMAGES: &str = "resources/t10k-images-idx3-ubyte.gz";
pub const DEFAULT_TEST_LABELS: &str = "resources/t10k-labels-idx1-ubyte.gz";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Parameters of one training run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    pub batch_size: usize,
    pub validation_batch_size: usize,
    pub epochs: usize,
    /// Locations are file paths or `http(s)://` URLs.
    pub train_images: String,
    pub train_labels: String,
    pub test_images: String,
    pub test_labels: String,
    /// Give up on loading a split after this many milliseconds.
    pub fetch_timeout_ms: Option<u64>,
    /// Shuffle seed; OS entropy when unset.
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            validation_batch_size: DEFAULT_VALIDATION_BATCH_SIZE,
            epochs: DEFAULT_EPOCHS,
            train_images: DEFAULT_TRAIN_IMAGES.to_string(),
            train_labels: DEFAULT_TRAIN_LABELS.to_string(),
            test_images: DEFAULT_TEST_IMAGES.to_string(),
            test_labels: DEFAULT_TEST_LABELS.to_string(),
            fetch_timeout_ms: None,
            seed: None,
        }
    }
}

impl TrainerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validation_batch_size(mut self, size: usize) -> Self {
        self.validation_batch_size = size;
        self
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn train_images(mut self, location: impl Into<String>) -> Self {
        self.train_images = location.into();
        self
    }

    pub fn train_labels(mut self, location: impl Into<String>) -> Self {
        self.train_labels = location.into();
        self
    }

    pub fn test_images(mut self, location: impl Into<String>) -> Self {
        self.test_images = location.into();
        self
    }

    pub fn test_labels(mut self, location: impl Into<String>) -> Self {
        self.test_labels = location.into();
        self
    }

    pub fn fetch_timeout_ms(mut self, millis: u64) -> Self {
        self.fetch_timeout_ms = Some(millis);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject sizes the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be positive".into()));
        }
        if self.validation_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "validation_batch_size must be positive".into(),
            ));
        }
        if self.epochs == 0 {
            return Err(ConfigError::Invalid("epochs must be positive".into()));
        }
        if self.fetch_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("fetch_timeout_ms must be positive".into()));
        }
        for (key, location) in [
            ("train_images", &self.train_images),
            ("train_labels", &self.train_labels),
            ("test_images", &self.test_images),
            ("test_labels", &self.test_labels),
        ] {
            if location.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    pub fn load_options(&self) -> LoadOptions {
        match self.fetch_timeout() {
            Some(timeout) => LoadOptions::default().fetch_timeout(timeout),
            None => LoadOptions::default(),
        }
    }
}
