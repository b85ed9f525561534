use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Qovery(#[from] crate::qovery::QoveryError),

    #[error(transparent)]
    State(#[from] crate::terraform::StateError),

    #[error("invalid desired state: {0}")]
    Desired(#[from] crate::plan::DesiredStateError),

    #[error(transparent)]
    AdvancedSettings(#[from] crate::advanced_settings::AdvancedSettingsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot resolve '{key}' in {collection}: no variable with that key to attach to")]
    MissingParent { collection: String, key: String },

    #[error("'{key}' in {collection} has no id in state")]
    MissingId { collection: String, key: String },

    #[error("'{key}' in {collection} has no value to send")]
    MissingValue { collection: String, key: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_parent_display() {
        let err = ReconcileError::MissingParent {
            collection: "environment_variable_aliases".to_string(),
            key: "DATABASE_URL".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot resolve 'DATABASE_URL' in environment_variable_aliases: \
             no variable with that key to attach to"
        );
    }

    #[test]
    fn test_missing_id_display() {
        let err = ReconcileError::MissingId {
            collection: "secrets".to_string(),
            key: "TOKEN".to_string(),
        };
        assert_eq!(err.to_string(), "'TOKEN' in secrets has no id in state");
    }

    #[test]
    fn test_missing_value_display() {
        let err = ReconcileError::MissingValue {
            collection: "secrets".to_string(),
            key: "TOKEN".to_string(),
        };
        assert_eq!(err.to_string(), "'TOKEN' in secrets has no value to send");
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ReconcileError = io_err.into();
        assert!(matches!(err, ReconcileError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_qovery_error_from_conversion() {
        let qovery_err = crate::qovery::QoveryError::Auth {
            message: "Invalid token".to_string(),
        };
        let err: ReconcileError = qovery_err.into();
        assert!(matches!(err, ReconcileError::Qovery(_)));
        assert_eq!(err.to_string(), "authentication failed: Invalid token");
    }

    #[test]
    fn test_state_error_from_conversion() {
        let state_err = crate::terraform::StateError::UnsupportedVersion(3);
        let err: ReconcileError = state_err.into();
        assert!(err.to_string().contains("unsupported state version 3"));
    }
}
