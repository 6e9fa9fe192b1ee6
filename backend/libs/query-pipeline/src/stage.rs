//! Pipeline builder
//!
//! Stages are kept in declaration order. A `Lookup` attaches a joined collection
//! under a new field as an array; a following `Shape` (or `Unwind`) on that field
//! decides how the array is collapsed.
use crate::error::PipelineError;
use crate::schema::CollectionSchema;
use uuid::Uuid;

/// A value bound into a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uuid(Uuid),
    Bool(bool),
    Text(String),
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { field: String, value: Value },
    /// Matches when any of the inner predicates match.
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn any(predicates: Vec<Predicate>) -> Self {
        Predicate::Any(predicates)
    }
}

/// How a looked-up array is collapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    /// First joined document, or `null` when nothing matched.
    First,
    /// Number of joined rows.
    Size,
    /// Whether at least one row joined.
    Exists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// `asc` (any case) sorts ascending; anything else, including nothing, descends.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("asc") => Direction::Ascending,
            _ => Direction::Descending,
        }
    }

    pub(crate) fn sql(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: Direction,
}

impl Sort {
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    /// Build a sort from request parameters, falling back to `default_field`
    /// descending when no key is given.
    ///
    /// A key without a direction (or with anything other than `asc`) sorts
    /// descending; the key alone is enough to override the default.
    pub fn from_params(
        collection: &CollectionSchema,
        sort_by: Option<&str>,
        sort_type: Option<&str>,
        default_field: &str,
    ) -> Result<Self, PipelineError> {
        let requested = sort_by.map(str::trim).filter(|s| !s.is_empty());
        let Some(field) = requested else {
            return Ok(Sort::descending(default_field));
        };

        match collection.field(field) {
            Some(def) if def.sortable => Ok(Sort {
                field: field.to_string(),
                direction: Direction::parse(sort_type),
            }),
            _ => Err(PipelineError::UnsortableField {
                field: field.to_string(),
                allowed: collection.sortable_fields().join(", "),
            }),
        }
    }
}

/// Join another collection into the current document
#[derive(Debug, Clone)]
pub struct Lookup {
    pub from: &'static CollectionSchema,
    pub local_field: String,
    pub foreign_field: String,
    pub as_field: String,
    /// Stages applied to the joined collection before it is attached.
    pub pipeline: Vec<Stage>,
}

impl Lookup {
    pub fn new(
        from: &'static CollectionSchema,
        local_field: impl Into<String>,
        foreign_field: impl Into<String>,
        as_field: impl Into<String>,
    ) -> Self {
        Self {
            from,
            local_field: local_field.into(),
            foreign_field: foreign_field.into(),
            as_field: as_field.into(),
            pipeline: Vec::new(),
        }
    }

    pub fn match_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.pipeline
            .push(Stage::Match(vec![Predicate::eq(field, value)]));
        self
    }

    pub fn matching(mut self, predicates: Vec<Predicate>) -> Self {
        self.pipeline.push(Stage::Match(predicates));
        self
    }

    pub fn project(mut self, fields: &[&str]) -> Self {
        self.pipeline
            .push(Stage::Project(fields.iter().map(|f| f.to_string()).collect()));
        self
    }

    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.pipeline.push(Stage::Lookup(lookup));
        self
    }

    pub fn shape(mut self, field: impl Into<String>, reduce: Reduce) -> Self {
        self.pipeline.push(Stage::Shape {
            field: field.into(),
            reduce,
        });
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.pipeline.push(Stage::Sort(sort));
        self
    }
}

#[derive(Debug, Clone)]
pub enum Stage {
    Match(Vec<Predicate>),
    Lookup(Lookup),
    Shape { field: String, reduce: Reduce },
    /// Collapse a lookup to its first document and drop documents where it is empty.
    Unwind(String),
    /// Restrict rendered top-level fields; every named field must be public.
    Project(Vec<String>),
    Sort(Sort),
}

/// An ordered list of stages rooted at one collection
#[derive(Debug, Clone)]
pub struct Pipeline {
    collection: &'static CollectionSchema,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(collection: &'static CollectionSchema) -> Self {
        Self {
            collection,
            stages: Vec::new(),
        }
    }

    pub fn collection(&self) -> &'static CollectionSchema {
        self.collection
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn match_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.matching(vec![Predicate::eq(field, value)])
    }

    pub fn matching(mut self, predicates: Vec<Predicate>) -> Self {
        if !predicates.is_empty() {
            self.stages.push(Stage::Match(predicates));
        }
        self
    }

    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.stages.push(Stage::Lookup(lookup));
        self
    }

    pub fn shape(mut self, field: impl Into<String>, reduce: Reduce) -> Self {
        self.stages.push(Stage::Shape {
            field: field.into(),
            reduce,
        });
        self
    }

    pub fn unwind(mut self, field: impl Into<String>) -> Self {
        self.stages.push(Stage::Unwind(field.into()));
        self
    }

    pub fn project(mut self, fields: &[&str]) -> Self {
        self.stages
            .push(Stage::Project(fields.iter().map(|f| f.to_string()).collect()));
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.stages.push(Stage::Sort(sort));
        self
    }

    /// Check every field reference without touching the database.
    pub fn validate(&self) -> Result<(), PipelineError> {
        crate::compile::plan(self).map(|_| ())
    }
}
