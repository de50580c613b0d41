use super::{ConfigSchemaError, Validate};
use crate::log::Level;
use serde::{Deserialize, Serialize};

///
/// Defaults
///

mod defaults {
    use crate::log::Level;

    pub const fn min_level() -> Level {
        Level::Info
    }

    pub const fn max_entries() -> usize {
        1_000
    }
}

pub const MAX_LOG_ENTRIES: usize = 100_000;

///
/// LogConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "defaults::min_level")]
    pub min_level: Level,

    #[serde(default = "defaults::max_entries")]
    pub max_entries: usize,

    #[serde(default)]
    pub echo: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            min_level: defaults::min_level(),
            max_entries: defaults::max_entries(),
            echo: false,
        }
    }
}

impl Validate for LogConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.max_entries > MAX_LOG_ENTRIES {
            return Err(ConfigSchemaError::ValidationError(format!(
                "log.max_entries {} exceeds max {}",
                self.max_entries, MAX_LOG_ENTRIES
            )));
        }

        Ok(())
    }
}

///
/// TESTS
///
