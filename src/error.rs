use async_graphql::ErrorExtensions;
use sea_orm::DbErr;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("failed to {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: DbErr,
    },
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Storage { .. } => "STORAGE_FAILURE",
        }
    }
}

/// Tags a store failure with the operation that produced it.
pub trait DbResultExt<T> {
    fn context(self, op: &'static str) -> AppResult<T>;
}

impl<T> DbResultExt<T> for Result<T, DbErr> {
    fn context(self, op: &'static str) -> AppResult<T> {
        self.map_err(|source| AppError::Storage { op, source })
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| ext.set("code", self.code()))
    }
}

pub type AppResult<T> = Result<T, AppError>;
