//! CLI error handling with user-friendly messages.

use std::fmt;

use tilestack::harvest::HarvestError;
use tilestack::pipeline::RenderError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line options.
    Config(String),
    /// Failed to create the Tokio runtime.
    RuntimeCreation(std::io::Error),
    /// Failed to spawn the external tile producer.
    Spawn { command: String, error: std::io::Error },
    /// Harvesting the producer's output failed.
    Harvest(HarvestError),
    /// The pyramid build failed.
    Render(RenderError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::RuntimeCreation(e) => {
                write!(f, "Failed to create Tokio runtime: {}", e)
            }
            CliError::Spawn { command, error } => {
                write!(f, "Failed to start producer '{}': {}", command, error)
            }
            CliError::Harvest(e) => write!(f, "Harvest failed: {}", e),
            CliError::Render(e) => write!(f, "Render failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::RuntimeCreation(e) => Some(e),
            CliError::Spawn { error, .. } => Some(error),
            CliError::Harvest(e) => Some(e),
            CliError::Render(e) => Some(e),
        }
    }
}

impl From<RenderError> for CliError {
    fn from(e: RenderError) -> Self {
        CliError::Render(e)
    }
}

impl From<HarvestError> for CliError {
    fn from(e: HarvestError) -> Self {
        CliError::Harvest(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = CliError::Config("quality out of range".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("quality out of range"));
    }

    #[test]
    fn test_harvest_error_converts() {
        let err: CliError = HarvestError::NoSignal.into();
        assert!(matches!(err, CliError::Harvest(_)));
    }
}
