use thiserror::Error;

use crate::validate::Violation;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid field style: {0} (expected camel or snake)")]
    InvalidFieldStyle(String),

    #[error("Invalid presence status: {0}")]
    InvalidPresenceStatus(String),

    #[error("Invalid file status: {0}")]
    InvalidFileStatus(String),

    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[error("Seed data failed {} integrity check(s)", .0.len())]
    Integrity(Vec<Violation>),

    #[error("Document is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("ScyllaDB connection error: {0}")]
    ScyllaConnect(#[from] scylla::transport::errors::NewSessionError),

    #[error("ScyllaDB error: {0}")]
    Scylla(#[from] scylla::transport::errors::QueryError),

    #[error("ScyllaDB result error: {0}")]
    ScyllaRows(#[from] scylla::transport::query_result::SingleRowTypedError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
