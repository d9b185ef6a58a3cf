use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,
}

impl Error {
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let storage_error = Error::Storage(StorageError::NotFound);
        assert_eq!(storage_error.to_string(), "Storage error: Record not found");

        let db_error = Error::Storage(StorageError::Database("connection refused".to_string()));
        assert_eq!(
            db_error.to_string(),
            "Storage error: Database error: connection refused"
        );
    }

    #[test]
    fn test_error_from_conversion() {
        let storage_error = StorageError::Migration("bad version".to_string());
        let error: Error = storage_error.into();
        assert!(error.is_storage_error());
    }
}
