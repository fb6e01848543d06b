use std::str::FromStr;

use thiserror::Error;
use tracing::Level;

pub const POOL_SIZE_VAR: &str = "MICRO_API_POOL_SIZE";
pub const LOG_LEVEL_VAR: &str = "MICRO_API_LOG_LEVEL";

const DEFAULT_POOL_SIZE: usize = 5;

/// Process level settings of the tutorial console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorialConfig {
    pool_size: usize,
    log_level: Level,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TutorialConfigError {
    #[error("invalid value `{value}` for {var}: {reason}")]
    InvalidValue { var: &'static str, value: String, reason: String },
}

impl TutorialConfigError {
    fn invalid<R: ToString>(var: &'static str, value: &str, reason: R) -> Self {
        Self::InvalidValue { var, value: value.to_owned(), reason: reason.to_string() }
    }
}

impl Default for TutorialConfig {
    fn default() -> Self {
        Self { pool_size: DEFAULT_POOL_SIZE, log_level: Level::INFO }
    }
}

impl TutorialConfig {
    pub fn from_env() -> Result<Self, TutorialConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads every setting through `lookup`; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TutorialConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(POOL_SIZE_VAR) {
            let pool_size = usize::from_str(value.trim()).map_err(|e| TutorialConfigError::invalid(POOL_SIZE_VAR, &value, e))?;
            if pool_size == 0 {
                return Err(TutorialConfigError::invalid(POOL_SIZE_VAR, &value, "the pool needs at least one session"));
            }
            config.pool_size = pool_size;
        }

        if let Some(value) = lookup(LOG_LEVEL_VAR) {
            config.log_level = Level::from_str(value.trim()).map_err(|e| TutorialConfigError::invalid(LOG_LEVEL_VAR, &value, e))?;
        }

        Ok(config)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn log_level(&self) -> Level {
        self.log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(TutorialConfig::from_lookup(lookup(&[])).unwrap(), TutorialConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = TutorialConfig::from_lookup(lookup(&[(POOL_SIZE_VAR, "2"), (LOG_LEVEL_VAR, "debug")])).unwrap();
        assert_eq!(config.pool_size(), 2);
        assert_eq!(config.log_level(), Level::DEBUG);
    }

    #[test]
    fn rejects_unparsable_values() {
        let error = TutorialConfig::from_lookup(lookup(&[(POOL_SIZE_VAR, "many")])).unwrap_err();
        assert!(matches!(error, TutorialConfigError::InvalidValue { var: POOL_SIZE_VAR, .. }));

        let error = TutorialConfig::from_lookup(lookup(&[(POOL_SIZE_VAR, "0")])).unwrap_err();
        assert!(matches!(error, TutorialConfigError::InvalidValue { var: POOL_SIZE_VAR, .. }));

        let error = TutorialConfig::from_lookup(lookup(&[(LOG_LEVEL_VAR, "loud")])).unwrap_err();
        assert!(matches!(error, TutorialConfigError::InvalidValue { var: LOG_LEVEL_VAR, .. }));
    }
}
