//! Configuration validation utilities.

use std::net::SocketAddr;

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    BridgeConfig, HeraldConfig, LogOutput, LoggingConfig, ModerationConfig, RelayConfig,
};
use herald_adapter_telegram::TelegramConfig;

/// Validates the entire configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_telegram_config(&config.telegram)?;
    validate_moderation_config(&config.moderation)?;
    validate_relay_config(&config.relay)?;
    validate_bridge_config(&config.bridge)?;
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

/// Validates the Telegram connection.
fn validate_telegram_config(telegram: &TelegramConfig) -> ConfigResult<()> {
    if telegram.token.trim().is_empty() {
        return Err(ConfigError::missing_field("telegram.token"));
    }

    if telegram.group.trim().is_empty() {
        return Err(ConfigError::missing_field("telegram.group"));
    }

    if telegram.poll_timeout_secs == 0 {
        return Err(ConfigError::not_positive("telegram.poll_timeout_secs"));
    }

    if let Some(url) = &telegram.api_url {
        validate_url(url)?;
    }

    Ok(())
}

/// Validates the moderation policy.
fn validate_moderation_config(moderation: &ModerationConfig) -> ConfigResult<()> {
    if moderation.allowed_period_secs == 0 {
        return Err(ConfigError::not_positive("moderation.allowed_period_secs"));
    }

    if moderation.ban_penalty == 0 {
        return Err(ConfigError::not_positive("moderation.ban_penalty"));
    }

    if moderation.ban_duration_secs == 0 {
        return Err(ConfigError::not_positive("moderation.ban_duration_secs"));
    }

    if moderation
        .exclude
        .iter()
        .any(|name| name.trim().trim_start_matches('@').is_empty())
    {
        return Err(ConfigError::invalid("moderation.exclude", "empty username"));
    }

    Ok(())
}

/// Validates relay timeouts.
fn validate_relay_config(relay: &RelayConfig) -> ConfigResult<()> {
    if relay.outbound_timeout_secs == 0 {
        return Err(ConfigError::not_positive("relay.outbound_timeout_secs"));
    }

    if relay.responder_timeout_secs == 0 {
        return Err(ConfigError::not_positive("relay.responder_timeout_secs"));
    }

    if relay.transcript_path.is_some() && relay.transcript_buffer == 0 {
        return Err(ConfigError::not_positive("relay.transcript_buffer"));
    }

    Ok(())
}

/// Validates the bridge and its listener.
fn validate_bridge_config(bridge: &BridgeConfig) -> ConfigResult<()> {
    if bridge.capacity == 0 {
        return Err(ConfigError::not_positive("bridge.capacity"));
    }

    if bridge.enabled {
        bridge
            .listen
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid_address(&bridge.listen, e.to_string()))?;
    }

    Ok(())
}

/// Validates an HTTP(S) URL.
fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("telegram.api_url"));
    }

    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {:?}", valid_schemes),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> HeraldConfig {
        let mut config = HeraldConfig::default();
        config.telegram.token = "123:abc".to_string();
        config.telegram.group = "radio_t_chat".to_string();
        config
    }

    #[test]
    fn test_validate_minimal_config() {
        assert!(validate_config(&minimal()).is_ok());
    }

    #[test]
    fn test_validate_missing_token() {
        let result = validate_config(&HeraldConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingField { field }) if field == "telegram.token"));
    }

    #[test]
    fn test_validate_zero_penalty() {
        let mut config = minimal();
        config.moderation.ban_penalty = 0;
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.field(), Some("moderation.ban_penalty"));
    }

    #[test]
    fn test_validate_zero_period_and_duration() {
        let mut config = minimal();
        config.moderation.allowed_period_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = minimal();
        config.moderation.ban_duration_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_exclude_entry() {
        let mut config = minimal();
        config.moderation.exclude = vec!["admin".into(), "@".into()];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let mut config = minimal();
        config.bridge.capacity = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_bad_listen_address() {
        let mut config = minimal();
        config.bridge.listen = "localhost".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidAddress { .. })
        ));

        config.bridge.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_api_url() {
        let mut config = minimal();
        config.telegram.api_url = Some("ftp://example.com".into());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = minimal();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());
    }
}
