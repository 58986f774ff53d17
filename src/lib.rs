use thiserror::Error;

pub type Result<T> = std::result::Result<T, LicaError>;

#[derive(Error, Debug)]
pub enum LicaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod admin;
pub mod assistant;
pub mod cart;
pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod providers;
pub mod session;
