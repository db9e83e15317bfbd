use thiserror::Error;

/// Application-level errors (bootstrap and HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error(transparent)]
    LayoutFileError(#[from] ::config::ConfigError),

    #[error(transparent)]
    LayoutError(#[from] signage_display::LayoutError),

    #[error(transparent)]
    DisplayError(#[from] signage_display::DisplayError),

    #[error(transparent)]
    ProviderError(#[from] signage_provider::ProviderError),

    #[error(transparent)]
    CoreError(#[from] signage_core::error::CoreError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
