//! Running pipelines against PostgreSQL
use crate::compile::{compile, compile_paginated};
use crate::error::PipelineError;
use crate::pagination::{PageLabels, PageMeta, PageRequest, Paginated};
use crate::stage::Pipeline;
use sqlx::{PgPool, Row};
use tracing::debug;

/// Run a pipeline and return every document in pipeline order.
pub async fn aggregate(
    pool: &PgPool,
    pipeline: &Pipeline,
) -> Result<Vec<serde_json::Value>, PipelineError> {
    let mut qb = compile(pipeline)?;
    debug!(collection = pipeline.collection().name, sql = qb.sql(), "aggregate");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter()
        .map(|row| row.try_get::<serde_json::Value, _>("document"))
        .collect::<Result<Vec<_>, _>>()
        .map_err(PipelineError::from)
}

/// Run a pipeline and return the requested page together with the total count.
///
/// Count and window come from the same statement, so both always reflect the same
/// match and join stages.
pub async fn aggregate_paginate(
    pool: &PgPool,
    pipeline: &Pipeline,
    request: PageRequest,
) -> Result<Paginated<serde_json::Value>, PipelineError> {
    let mut qb = compile_paginated(pipeline, request.window())?;
    debug!(
        collection = pipeline.collection().name,
        page = request.page(),
        limit = request.limit(),
        "aggregate_paginate"
    );

    let (total_docs, docs): (i64, serde_json::Value) =
        qb.build_query_as().fetch_one(pool).await?;

    let docs = match docs {
        serde_json::Value::Array(docs) => docs,
        other => {
            return Err(PipelineError::InvalidStage(format!(
                "paginated statement returned {other} instead of an array"
            )))
        }
    };

    Ok(Paginated {
        docs,
        meta: PageMeta::new(request, total_docs),
        labels: PageLabels::default(),
    })
}
