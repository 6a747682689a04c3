use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Ledger columns are at least 1 and distinct
/// - Completed marker is not blank
/// - Smart delay values are non-negative and min <= max
/// - Timeouts, poll interval and attempt budget are not 0
/// - Backoff multiplier is finite and at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let ledger = &config.ledger;
    if ledger.prompt_column == 0 || ledger.status_column == 0 {
        return Err(invalid("ledger columns are 1-based and cannot be 0"));
    }
    if ledger.prompt_column == ledger.status_column {
        return Err(invalid(
            "ledger.prompt_column and ledger.status_column must differ",
        ));
    }
    if ledger.completed_marker.trim().is_empty() {
        return Err(invalid("ledger.completed_marker cannot be empty"));
    }

    let delay = &config.smart_delay;
    let values = [
        delay.min_delay,
        delay.max_delay,
        delay.upload_after,
        delay.input_after,
        delay.click_after,
    ];
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(invalid("smart_delay values must be non-negative"));
    }
    if delay.min_delay > delay.max_delay {
        return Err(invalid(
            "smart_delay.min_delay cannot exceed smart_delay.max_delay",
        ));
    }

    if config.session.operation_timeout_ms == 0 {
        return Err(invalid("session.operation_timeout_ms cannot be 0"));
    }
    if config.poller.poll_interval_ms == 0 {
        return Err(invalid("poller.poll_interval_ms cannot be 0"));
    }
    if config.poller.generation_timeout_ms == 0 {
        return Err(invalid("poller.generation_timeout_ms cannot be 0"));
    }
    if config.download.timeout_secs == 0 {
        return Err(invalid("download.timeout_secs cannot be 0"));
    }
    if config.download.max_attempts == 0 {
        return Err(invalid("download.max_attempts cannot be 0"));
    }
    let multiplier = config.download.backoff_multiplier;
    if !multiplier.is_finite() || multiplier < 1.0 {
        return Err(invalid(
            "download.backoff_multiplier must be a finite number >= 1.0",
        ));
    }
    if config.download.extension.trim().is_empty() {
        return Err(invalid("download.extension cannot be empty"));
    }

    Ok(())
}

/// Validate what a live run needs on top of [`validate_config`]:
/// a bridge URL and the browser profile to attach to.
pub fn validate_run_config(config: &Config) -> Result<(), ConfigError> {
    validate_config(config)?;

    if config.session.bridge_url.trim().is_empty() {
        return Err(invalid("session.bridge_url is required"));
    }
    if config.session.browser_id.trim().is_empty() {
        return Err(invalid("session.browser_id is required"));
    }
    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
