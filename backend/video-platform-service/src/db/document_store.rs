use super::DocumentStore;
use async_trait::async_trait;
use query_pipeline::{PageRequest, Paginated, Pipeline, PipelineError};
use sqlx::PgPool;

/// Runs pipelines against the service database
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn aggregate(
        &self,
        pipeline: &Pipeline,
    ) -> Result<Vec<serde_json::Value>, PipelineError> {
        query_pipeline::aggregate(&self.pool, pipeline).await
    }

    async fn aggregate_paginate(
        &self,
        pipeline: &Pipeline,
        request: PageRequest,
    ) -> Result<Paginated<serde_json::Value>, PipelineError> {
        query_pipeline::aggregate_paginate(&self.pool, pipeline, request).await
    }
}
