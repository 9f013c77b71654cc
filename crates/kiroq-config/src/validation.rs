// SPDX-FileCopyrightText: 2026 KiroQ Bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for values figment cannot check.

use kiroq_core::BridgeError;

use crate::model::KiroqConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Figment already rejects unknown keys and type mismatches; this checks
/// value ranges a schema cannot express.
pub fn validate_config(config: &KiroqConfig) -> Result<(), BridgeError> {
    if config.store.max_messages == 0 {
        return Err(BridgeError::Config(
            "store.max_messages must be at least 1".to_string(),
        ));
    }
    if !LOG_LEVELS.contains(&config.log_level.as_str()) {
        return Err(BridgeError::Config(format!(
            "log_level must be one of {LOG_LEVELS:?}, got \"{}\"",
            config.log_level
        )));
    }
    if config.ask.poll_interval_secs == 0 {
        return Err(BridgeError::Config(
            "ask.poll_interval_secs must be at least 1".to_string(),
        ));
    }
    if config.store.message_file.as_os_str().is_empty() {
        return Err(BridgeError::Config(
            "store.message_file must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        validate_config(&KiroqConfig::default()).expect("defaults must validate");
    }

    #[test]
    fn zero_cap_is_rejected() {
        let mut config = KiroqConfig::default();
        config.store.max_messages = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut config = KiroqConfig::default();
        config.log_level = "loud".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut config = KiroqConfig::default();
        config.ask.poll_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
