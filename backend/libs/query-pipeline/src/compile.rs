//! Pipeline → SQL
//!
//! Compilation happens in two passes. `plan` resolves every field reference against
//! the collection schemas and folds `Shape`/`Unwind` stages into the lookup they
//! collapse. The emitter then walks the plan and writes a single statement into a
//! `QueryBuilder`, in textual order, so bound parameters line up with their
//! placeholders.
//!
//! The core statement yields one row per document:
//!
//! ```sql
//! SELECT jsonb_build_object(...) AS document,
//!        ROW_NUMBER() OVER (ORDER BY <sort>, <key>) AS ordinal
//! FROM <table> t0
//! LEFT JOIN LATERAL (<lookup>) l1 ON TRUE
//! WHERE <match predicates>
//! ```
//!
//! Lookups are compiled per reduction: `Size` to `COUNT(*)`, `Exists` to `EXISTS`,
//! `First` to a `LIMIT 1` object and an unshaped lookup to `jsonb_agg`.
use crate::error::PipelineError;
use crate::schema::{CollectionSchema, FieldDef};
use crate::stage::{Direction, Lookup, Pipeline, Predicate, Reduce, Sort, Stage, Value};
use sqlx::{Postgres, QueryBuilder};

/// `jsonb_build_object` accepts at most 100 arguments.
const MAX_DOCUMENT_FIELDS: usize = 50;

/// Row window applied to a paginated statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug)]
pub(crate) struct Plan {
    collection: &'static CollectionSchema,
    filters: Vec<PlannedPredicate>,
    lookups: Vec<PlannedLookup>,
    output: Vec<OutputField>,
    order: Option<(&'static FieldDef, Direction)>,
}

#[derive(Debug)]
enum PlannedPredicate {
    Eq { column: &'static str, value: Value },
    Any(Vec<PlannedPredicate>),
}

#[derive(Debug)]
struct PlannedLookup {
    as_field: String,
    local_column: &'static str,
    foreign_column: &'static str,
    reduce: Option<Reduce>,
    /// Documents without a joined row are dropped.
    required: bool,
    inner: Plan,
}

#[derive(Debug)]
enum OutputField {
    Column(&'static FieldDef),
    /// Index into `Plan::lookups`.
    Lookup(usize),
}

pub(crate) fn plan(pipeline: &Pipeline) -> Result<Plan, PipelineError> {
    plan_stages(pipeline.collection(), pipeline.stages())
}

fn plan_stages(
    collection: &'static CollectionSchema,
    stages: &[Stage],
) -> Result<Plan, PipelineError> {
    let mut filters = Vec::new();
    let mut lookups: Vec<PlannedLookup> = Vec::new();
    let mut projection: Option<&[String]> = None;
    let mut order = None;

    for stage in stages {
        match stage {
            Stage::Match(predicates) => {
                for predicate in predicates {
                    filters.push(resolve_predicate(collection, predicate)?);
                }
            }
            Stage::Lookup(lookup) => {
                if lookups.iter().any(|l| l.as_field == lookup.as_field) {
                    return Err(PipelineError::InvalidStage(format!(
                        "lookup '{}' is declared twice",
                        lookup.as_field
                    )));
                }
                lookups.push(plan_lookup(collection, lookup)?);
            }
            Stage::Shape { field, reduce } => {
                let lookup = unshaped_lookup(&mut lookups, field)?;
                lookup.reduce = Some(*reduce);
            }
            Stage::Unwind(field) => {
                let lookup = unshaped_lookup(&mut lookups, field)?;
                lookup.reduce = Some(Reduce::First);
                lookup.required = true;
            }
            Stage::Project(fields) => {
                if projection.is_some() {
                    return Err(PipelineError::InvalidStage(
                        "more than one project stage".to_string(),
                    ));
                }
                projection = Some(fields.as_slice());
            }
            Stage::Sort(Sort { field, direction }) => {
                if order.is_some() {
                    return Err(PipelineError::InvalidStage(
                        "more than one sort stage".to_string(),
                    ));
                }
                order = Some((collection.require(field)?, *direction));
            }
        }
    }

    let output = match projection {
        Some(fields) => fields
            .iter()
            .map(|name| {
                if let Some(index) = lookups.iter().position(|l| &l.as_field == name) {
                    Ok(OutputField::Lookup(index))
                } else {
                    collection.require_public(name).map(OutputField::Column)
                }
            })
            .collect::<Result<Vec<_>, _>>()?,
        // A lookup named after a base field replaces it in place.
        None => {
            let lookup_index = |name: &str| lookups.iter().position(|l| l.as_field == name);
            let mut output: Vec<OutputField> = collection
                .public_fields()
                .map(|def| match lookup_index(def.name) {
                    Some(index) => OutputField::Lookup(index),
                    None => OutputField::Column(def),
                })
                .collect();
            output.extend(
                lookups
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| {
                        !collection
                            .field(&l.as_field)
                            .is_some_and(|f| f.is_public())
                    })
                    .map(|(index, _)| OutputField::Lookup(index)),
            );
            output
        }
    };

    if output.is_empty() {
        return Err(PipelineError::InvalidStage(format!(
            "pipeline over '{}' renders no fields",
            collection.name
        )));
    }
    if output.len() > MAX_DOCUMENT_FIELDS {
        return Err(PipelineError::InvalidStage(format!(
            "pipeline over '{}' renders {} fields (max {MAX_DOCUMENT_FIELDS})",
            collection.name,
            output.len()
        )));
    }

    // The key column backs every ordering, so resolve it up front.
    collection.key_field()?;

    Ok(Plan {
        collection,
        filters,
        lookups,
        output,
        order,
    })
}

fn plan_lookup(
    parent: &'static CollectionSchema,
    lookup: &Lookup,
) -> Result<PlannedLookup, PipelineError> {
    let local = parent.require(&lookup.local_field)?;
    let foreign = lookup.from.require(&lookup.foreign_field)?;
    let inner = plan_stages(lookup.from, &lookup.pipeline)?;

    Ok(PlannedLookup {
        as_field: lookup.as_field.clone(),
        local_column: local.column,
        foreign_column: foreign.column,
        reduce: None,
        required: false,
        inner,
    })
}

fn unshaped_lookup<'a>(
    lookups: &'a mut [PlannedLookup],
    field: &str,
) -> Result<&'a mut PlannedLookup, PipelineError> {
    let lookup = lookups
        .iter_mut()
        .find(|l| l.as_field == field)
        .ok_or_else(|| PipelineError::UnboundLookupField {
            field: field.to_string(),
        })?;

    if lookup.reduce.is_some() {
        return Err(PipelineError::InvalidStage(format!(
            "lookup '{field}' is already shaped"
        )));
    }
    Ok(lookup)
}

fn resolve_predicate(
    collection: &CollectionSchema,
    predicate: &Predicate,
) -> Result<PlannedPredicate, PipelineError> {
    match predicate {
        Predicate::Eq { field, value } => Ok(PlannedPredicate::Eq {
            column: collection.require(field)?.column,
            value: value.clone(),
        }),
        Predicate::Any(inner) => inner
            .iter()
            .map(|p| resolve_predicate(collection, p))
            .collect::<Result<Vec<_>, _>>()
            .map(PlannedPredicate::Any),
    }
}

/// Compile a pipeline into a statement returning `document` rows in pipeline order.
pub fn compile(pipeline: &Pipeline) -> Result<QueryBuilder<'static, Postgres>, PipelineError> {
    let plan = plan(pipeline)?;
    let mut qb = QueryBuilder::new("WITH pipeline AS (");
    Emitter::default().core(&mut qb, &plan);
    qb.push(") SELECT document FROM pipeline ORDER BY ordinal");
    Ok(qb)
}

/// Compile a pipeline into a statement returning one row: the total number of
/// documents (`total_docs`) and the requested window as a `jsonb` array (`docs`).
pub fn compile_paginated(
    pipeline: &Pipeline,
    window: Window,
) -> Result<QueryBuilder<'static, Postgres>, PipelineError> {
    let plan = plan(pipeline)?;
    let mut qb = QueryBuilder::new("WITH pipeline AS (");
    Emitter::default().core(&mut qb, &plan);
    qb.push(
        ") SELECT (SELECT COUNT(*) FROM pipeline) AS total_docs, \
         COALESCE((SELECT jsonb_agg(w.document ORDER BY w.ordinal) FROM \
         (SELECT document, ordinal FROM pipeline ORDER BY ordinal LIMIT ",
    );
    qb.push_bind(window.limit);
    qb.push(" OFFSET ");
    qb.push_bind(window.offset);
    qb.push(") w), '[]'::jsonb) AS docs");
    Ok(qb)
}

#[derive(Default)]
struct Emitter {
    next_alias: usize,
}

impl Emitter {
    fn alias(&mut self, prefix: &str) -> String {
        let alias = format!("{prefix}{}", self.next_alias);
        self.next_alias += 1;
        alias
    }

    fn core(&mut self, qb: &mut QueryBuilder<'static, Postgres>, plan: &Plan) {
        let table = self.alias("t");
        let joins = self.join_aliases(plan);

        qb.push("SELECT ");
        self.document(qb, plan, &table, &joins);
        qb.push(" AS document, ROW_NUMBER() OVER (ORDER BY ");
        push_order(qb, plan, &table);
        qb.push(") AS ordinal ");
        self.source(qb, plan, &table, &joins, None);
    }

    fn join_aliases(&mut self, plan: &Plan) -> Vec<String> {
        plan.lookups.iter().map(|_| self.alias("l")).collect()
    }

    /// `FROM <table> <alias> <lateral joins> WHERE <join condition> AND <filters>`
    fn source(
        &mut self,
        qb: &mut QueryBuilder<'static, Postgres>,
        plan: &Plan,
        table: &str,
        joins: &[String],
        join_on: Option<(&str, &str, &str)>,
    ) {
        qb.push(format!(
            "FROM \"{}\" {table}",
            plan.collection.table
        ));

        for (lookup, alias) in plan.lookups.iter().zip(joins) {
            qb.push(" LEFT JOIN LATERAL (");
            self.lookup(qb, lookup, table);
            qb.push(format!(") {alias} ON TRUE"));
        }

        let mut conditions = Conditions::default();
        if let Some((foreign_column, parent, local_column)) = join_on {
            conditions.next(qb);
            qb.push(format!(
                "{table}.\"{foreign_column}\" = {parent}.\"{local_column}\""
            ));
        }
        for filter in &plan.filters {
            conditions.next(qb);
            push_predicate(qb, filter, table);
        }
        for (lookup, alias) in plan.lookups.iter().zip(joins) {
            if lookup.required {
                conditions.next(qb);
                qb.push(format!("{alias}.value IS NOT NULL"));
            }
        }
    }

    fn lookup(
        &mut self,
        qb: &mut QueryBuilder<'static, Postgres>,
        lookup: &PlannedLookup,
        parent: &str,
    ) {
        let inner = &lookup.inner;
        let table = self.alias("t");
        let joins = self.join_aliases(inner);
        let join_on = Some((lookup.foreign_column, parent, lookup.local_column));

        match lookup.reduce {
            Some(Reduce::Size) => {
                qb.push("SELECT COUNT(*) AS value ");
                self.source(qb, inner, &table, &joins, join_on);
            }
            Some(Reduce::Exists) => {
                qb.push("SELECT EXISTS (SELECT 1 ");
                self.source(qb, inner, &table, &joins, join_on);
                qb.push(") AS value");
            }
            Some(Reduce::First) => {
                qb.push("SELECT ");
                self.document(qb, inner, &table, &joins);
                qb.push(" AS value ");
                self.source(qb, inner, &table, &joins, join_on);
                qb.push(" ORDER BY ");
                push_order(qb, inner, &table);
                qb.push(" LIMIT 1");
            }
            None => {
                qb.push("SELECT COALESCE(jsonb_agg(");
                self.document(qb, inner, &table, &joins);
                qb.push(" ORDER BY ");
                push_order(qb, inner, &table);
                qb.push("), '[]'::jsonb) AS value ");
                self.source(qb, inner, &table, &joins, join_on);
            }
        }
    }

    fn document(
        &mut self,
        qb: &mut QueryBuilder<'static, Postgres>,
        plan: &Plan,
        table: &str,
        joins: &[String],
    ) {
        qb.push("jsonb_build_object(");
        for (i, field) in plan.output.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            match field {
                OutputField::Column(def) => {
                    qb.push(format!("'{}', {table}.\"{}\"", def.name, def.column));
                }
                OutputField::Lookup(index) => {
                    let lookup = &plan.lookups[*index];
                    qb.push(format!("'{}', {}.value", lookup.as_field, joins[*index]));
                }
            }
        }
        qb.push(")");
    }
}

/// Joins successive conditions with `WHERE` then `AND`.
#[derive(Default)]
struct Conditions {
    started: bool,
}

impl Conditions {
    fn next(&mut self, qb: &mut QueryBuilder<'static, Postgres>) {
        qb.push(if self.started { " AND " } else { " WHERE " });
        self.started = true;
    }
}

/// Sort key first, primary key as a tiebreaker.
fn push_order(qb: &mut QueryBuilder<'static, Postgres>, plan: &Plan, table: &str) {
    let key = plan
        .collection
        .field(plan.collection.key)
        .map(|f| f.column)
        .unwrap_or("id");

    match plan.order {
        Some((field, direction)) if field.column != key => {
            qb.push(format!(
                "{table}.\"{}\" {}, {table}.\"{key}\" ASC",
                field.column,
                direction.sql()
            ));
        }
        Some((_, direction)) => {
            qb.push(format!("{table}.\"{key}\" {}", direction.sql()));
        }
        None => {
            qb.push(format!("{table}.\"{key}\" ASC"));
        }
    }
}

fn push_predicate(
    qb: &mut QueryBuilder<'static, Postgres>,
    predicate: &PlannedPredicate,
    table: &str,
) {
    match predicate {
        PlannedPredicate::Eq { column, value } => {
            qb.push(format!("{table}.\"{column}\" = "));
            match value {
                Value::Uuid(v) => qb.push_bind(*v),
                Value::Bool(v) => qb.push_bind(*v),
                Value::Text(v) => qb.push_bind(v.clone()),
            };
        }
        PlannedPredicate::Any(inner) if inner.is_empty() => {
            qb.push("FALSE");
        }
        PlannedPredicate::Any(inner) => {
            qb.push("(");
            for (i, p) in inner.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                push_predicate(qb, p, table);
            }
            qb.push(")");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::{POSTS, REACTIONS, USERS};
    use uuid::Uuid;

    fn sql(pipeline: &Pipeline) -> String {
        compile(pipeline).unwrap().sql().to_string()
    }

    #[test]
    fn match_and_sort_compile_to_bound_where_and_ordinal() {
        let owner = Uuid::new_v4();
        let pipeline = Pipeline::new(&POSTS)
            .match_eq("owner", owner)
            .match_eq("isPublished", true)
            .sort(Sort::descending("createdAt"));

        let sql = sql(&pipeline);
        assert!(sql.contains("FROM \"posts\" t0 WHERE t0.\"owner_id\" = $1 AND t0.\"is_published\" = $2"));
        assert!(sql.contains("ROW_NUMBER() OVER (ORDER BY t0.\"created_at\" DESC, t0.\"id\" ASC)"));
        assert!(sql.ends_with("SELECT document FROM pipeline ORDER BY ordinal"));
        assert!(!sql.contains(&owner.to_string()));
    }

    #[test]
    fn document_renders_public_fields_only() {
        let sql = sql(&Pipeline::new(&USERS));
        assert!(sql.contains("'fullName', t0.\"full_name\""));
        assert!(!sql.contains("password_hash"));
        assert!(!sql.contains("email"));
    }

    #[test]
    fn first_lookup_becomes_limited_lateral_object() {
        let pipeline = Pipeline::new(&POSTS)
            .lookup(Lookup::new(&USERS, "owner", "_id", "owner_doc").project(&["_id", "username"]))
            .shape("owner_doc", Reduce::First);

        let sql = sql(&pipeline);
        assert!(sql.contains(
            "LEFT JOIN LATERAL (SELECT jsonb_build_object('_id', t2.\"id\", 'username', t2.\"username\") AS value \
             FROM \"users\" t2 WHERE t2.\"id\" = t0.\"owner_id\" ORDER BY t2.\"id\" ASC LIMIT 1) l1 ON TRUE"
        ));
        assert!(sql.contains("'owner_doc', l1.value"));
    }

    #[test]
    fn size_and_exists_do_not_load_rows() {
        let caller = Uuid::new_v4();
        let pipeline = Pipeline::new(&POSTS)
            .lookup(
                Lookup::new(&REACTIONS, "_id", "targetId", "likesCount")
                    .match_eq("targetKind", "post"),
            )
            .shape("likesCount", Reduce::Size)
            .lookup(
                Lookup::new(&REACTIONS, "_id", "targetId", "isLiked")
                    .match_eq("targetKind", "post")
                    .match_eq("owner", caller),
            )
            .shape("isLiked", Reduce::Exists);

        let sql = sql(&pipeline);
        assert!(sql.contains(
            "SELECT COUNT(*) AS value FROM \"reactions\" t3 WHERE t3.\"target_id\" = t0.\"id\" AND t3.\"target_kind\" = $1"
        ));
        assert!(sql.contains(
            "SELECT EXISTS (SELECT 1 FROM \"reactions\" t4 WHERE t4.\"target_id\" = t0.\"id\" \
             AND t4.\"target_kind\" = $2 AND t4.\"owner_id\" = $3) AS value"
        ));
        assert!(!sql.contains("jsonb_agg"));
    }

    #[test]
    fn unwind_drops_documents_without_a_match() {
        let pipeline = Pipeline::new(&REACTIONS)
            .lookup(Lookup::new(&POSTS, "targetId", "_id", "post").match_eq("isPublished", true))
            .unwind("post");

        let sql = sql(&pipeline);
        assert!(sql.contains("LIMIT 1) l1 ON TRUE WHERE l1.value IS NOT NULL"));
    }

    #[test]
    fn unshaped_lookup_aggregates_into_array() {
        let pipeline = Pipeline::new(&USERS).lookup(Lookup::new(&POSTS, "_id", "owner", "posts"));
        let sql = sql(&pipeline);
        assert!(sql.contains("COALESCE(jsonb_agg(jsonb_build_object("));
        assert!(sql.contains("'[]'::jsonb) AS value"));
    }

    #[test]
    fn any_predicate_is_parenthesized() {
        let caller = Uuid::new_v4();
        let pipeline = Pipeline::new(&POSTS).matching(vec![Predicate::any(vec![
            Predicate::eq("isPublished", true),
            Predicate::eq("owner", caller),
        ])]);
        assert!(sql(&pipeline).contains("WHERE (t0.\"is_published\" = $1 OR t0.\"owner_id\" = $2)"));
    }

    #[test]
    fn paginated_statement_binds_window_last() {
        let pipeline = Pipeline::new(&POSTS).match_eq("isPublished", true);
        let qb = compile_paginated(&pipeline, Window { limit: 10, offset: 20 }).unwrap();
        let sql = qb.sql();
        assert!(sql.contains("(SELECT COUNT(*) FROM pipeline) AS total_docs"));
        assert!(sql.contains("ORDER BY ordinal LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn projecting_internal_join_field_fails() {
        let pipeline = Pipeline::new(&POSTS)
            .lookup(Lookup::new(&USERS, "owner", "_id", "author").project(&["_id", "password"]))
            .shape("author", Reduce::First);
        assert!(matches!(
            pipeline.validate(),
            Err(PipelineError::NonPublicField { collection: "users", .. })
        ));
    }

    #[test]
    fn shape_requires_preceding_lookup() {
        let pipeline = Pipeline::new(&POSTS).shape("author", Reduce::First);
        assert!(matches!(
            pipeline.validate(),
            Err(PipelineError::UnboundLookupField { .. })
        ));
    }

    #[test]
    fn lookup_replaces_base_field_of_same_name() {
        let pipeline = Pipeline::new(&POSTS)
            .lookup(Lookup::new(&USERS, "owner", "_id", "owner").project(&["_id"]))
            .shape("owner", Reduce::First);

        let sql = sql(&pipeline);
        assert!(sql.contains("jsonb_build_object('_id', t0.\"id\", 'owner', l1.value, 'title'"));
        assert!(!sql.contains("'owner', t0.\"owner_id\""));
    }

    #[test]
    fn duplicate_lookup_names_are_rejected() {
        let pipeline = Pipeline::new(&POSTS)
            .lookup(Lookup::new(&USERS, "owner", "_id", "author"))
            .lookup(Lookup::new(&USERS, "owner", "_id", "author"));
        assert!(matches!(pipeline.validate(), Err(PipelineError::InvalidStage(_))));
    }

    #[test]
    fn unknown_match_field_fails() {
        let pipeline = Pipeline::new(&POSTS).match_eq("nope", true);
        assert!(matches!(
            pipeline.validate(),
            Err(PipelineError::UnknownField { collection: "posts", .. })
        ));
    }
}
