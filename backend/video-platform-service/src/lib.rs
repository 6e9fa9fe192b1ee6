/// Video Platform Service Library
///
/// Serves videos, comments, likes, tweets and channel subscriptions. Listings are
/// described as aggregation pipelines (see the `query-pipeline` crate) and returned
/// as labelled pages inside the standard response envelope.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `models`: Entities, caller identity and identifier parsing
/// - `services`: Resource operations (validation, ownership, toggles)
/// - `db`: Repository traits, PostgreSQL implementations and collection schemas
/// - `pipelines`: Per-resource aggregation pipelines
/// - `media`: Object storage uploads for video files and images
/// - `middleware`: Bearer authentication, permission checks and request metrics
/// - `response`: The `{statusCode, data, message, success}` envelope
/// - `error`: Error types and the error envelope
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pipelines;
pub mod response;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
