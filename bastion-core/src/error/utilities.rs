use crate::{
    Error,
    error::{ConfigError, StorageError},
};

/// Extension trait for mapping storage driver errors into [`Error::Storage`].
///
/// # Example
///
/// ```rust,ignore
/// use bastion_core::error::utilities::DatabaseResultExt;
///
/// query.execute(&pool).await.map_db_err_with_context("Failed to clear failures")?;
/// ```
pub trait DatabaseResultExt<T> {
    fn map_db_err_with_context(self, context: &str) -> Result<T, Error>;
}

impl<T, E: std::fmt::Display> DatabaseResultExt<T> for Result<T, E> {
    fn map_db_err_with_context(self, context: &str) -> Result<T, Error> {
        self.map_err(|e| Error::Storage(StorageError::Database(format!("{context}: {e}"))))
    }
}

/// Extension trait for settings that must be present.
pub trait RequiredSettingExt<T> {
    fn require_setting(self, name: &str) -> Result<T, ConfigError>;
}

impl<T> RequiredSettingExt<T> for Option<T> {
    fn require_setting(self, name: &str) -> Result<T, ConfigError> {
        self.ok_or_else(|| ConfigError::MissingSetting(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_result_ext_with_context() {
        let error_result: Result<u64, &str> = Err("timeout");

        match error_result
            .map_db_err_with_context("Failed to record failure")
            .unwrap_err()
        {
            Error::Storage(StorageError::Database(msg)) => {
                assert_eq!(msg, "Failed to record failure: timeout");
            }
            other => panic!("Expected storage database error, got {other:?}"),
        }
    }

    #[test]
    fn test_require_setting() {
        assert_eq!(Some("Admin").require_setting("site_admin").unwrap(), "Admin");

        let missing: Option<&str> = None;
        match missing.require_setting("site_admin").unwrap_err() {
            ConfigError::MissingSetting(name) => assert_eq!(name, "site_admin"),
            other => panic!("Expected missing setting error, got {other:?}"),
        }
    }
}
