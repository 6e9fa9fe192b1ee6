//! Aggregation pipelines over relational collections
//!
//! Resource listings in the video platform are described as ordered stages
//! (match, lookup, shape, sort) against a declared collection schema and compiled
//! into a single PostgreSQL statement that returns `jsonb` documents.
//!
//! # Modules
//!
//! - `schema`: collection and field declarations, including which fields are public
//! - `stage`: the pipeline builder and its stage types
//! - `compile`: translation of a pipeline into SQL with bound parameters
//! - `pagination`: page/limit normalization, page metadata and labelled output
//! - `execute`: running pipelines against a `PgPool`
//!
//! # Example
//!
//! ```rust,ignore
//! let pipeline = Pipeline::new(&COMMENTS)
//!     .match_eq("video", video_id)
//!     .lookup(Lookup::new(&USERS, "owner", "_id", "owner").project(&["_id", "username"]))
//!     .shape("owner", Reduce::First)
//!     .sort(Sort::descending("createdAt"));
//!
//! let page = aggregate_paginate(&pool, &pipeline, PageRequest::default()).await?;
//! ```
pub mod compile;
pub mod error;
pub mod execute;
pub mod pagination;
pub mod schema;
pub mod stage;

pub use compile::Window;
pub use error::PipelineError;
pub use execute::{aggregate, aggregate_paginate};
pub use pagination::{PageLabels, PageMeta, PageQuery, PageRequest, Paginated};
pub use schema::{CollectionSchema, Exposure, FieldDef};
pub use stage::{Direction, Lookup, Pipeline, Predicate, Reduce, Sort, Stage, Value};
