use thiserror::Error;

/// Structural problems in a layout tree, found before interpretation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Duplicate layout id: {0}")]
    DuplicateId(String),

    #[error("Root layout node {0} does not name a parent")]
    MissingParent(String),

    #[error("Layout node {0} has several children but no orientation")]
    MissingOrientation(String),

    #[error("Layout node {id} has size {size} outside 0-100")]
    SizeOutOfRange { id: String, size: f64 },

    #[error("Layout node has an empty id")]
    EmptyId,
}

/// Display-level errors
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error(transparent)]
    LayoutError(#[from] LayoutError),

    #[error(transparent)]
    CoreError(#[from] signage_core::error::CoreError),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

pub type DisplayResult<T> = std::result::Result<T, DisplayError>;
