//! Settings error types.

use thiserror::Error;

/// Errors from profile-store and persistence operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read or write the settings file.
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse settings JSON.
    #[error("failed to parse settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A profile with this name does not exist.
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
    /// The operation would leave the store without any profile.
    #[error("cannot delete the last remaining profile")]
    LastProfile,
    /// A profile name was empty or already taken.
    #[error("invalid profile name: {0}")]
    InvalidName(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_display() {
        let err = SettingsError::UnknownProfile("Roleplay".into());
        assert_eq!(err.to_string(), "unknown profile: Roleplay");
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: SettingsError = json_err.into();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SettingsError = io_err.into();
        assert!(err.to_string().contains("missing"));
    }
}
