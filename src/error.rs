use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User already exists: {email}")]
    DuplicateIdentity { email: String },

    #[error("User not found: {email}")]
    UnknownUser { email: String },

    #[error("Invalid credentials for {email}")]
    InvalidCredentials { email: String },

    #[error("Administrator rights required")]
    NotAuthorized,

    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),

    #[error("Database error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
}

impl StoreError {
    pub(crate) fn storage<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        StoreError::Storage(Box::new(err))
    }

    /// True for the not-found conditions callers usually turn into a message.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::UnknownUser { .. })
    }
}
