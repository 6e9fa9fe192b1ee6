//! Collection declarations
//!
//! A collection maps document field names (the keys clients see, e.g. `fullName`)
//! onto table columns. Every field is either public or internal; internal fields
//! are never rendered into a document, neither at the top level nor through a join.
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    Public,
    Internal,
}

/// A single document field backed by a column
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub column: &'static str,
    pub exposure: Exposure,
    pub sortable: bool,
}

impl FieldDef {
    pub const fn public(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            exposure: Exposure::Public,
            sortable: false,
        }
    }

    pub const fn internal(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            exposure: Exposure::Internal,
            sortable: false,
        }
    }

    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn is_public(&self) -> bool {
        self.exposure == Exposure::Public
    }
}

/// A table seen as a collection of documents
#[derive(Debug)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub table: &'static str,
    /// Document field holding the primary key, used as a stable sort tiebreaker.
    pub key: &'static str,
    pub fields: &'static [FieldDef],
}

impl CollectionSchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&'static FieldDef, PipelineError> {
        self.field(name).ok_or_else(|| PipelineError::UnknownField {
            collection: self.name,
            field: name.to_string(),
        })
    }

    /// Resolve a field that will be rendered into a document.
    pub fn require_public(&self, name: &str) -> Result<&'static FieldDef, PipelineError> {
        let field = self.require(name)?;
        if !field.is_public() {
            return Err(PipelineError::NonPublicField {
                collection: self.name,
                field: name.to_string(),
            });
        }
        Ok(field)
    }

    pub fn key_field(&self) -> Result<&'static FieldDef, PipelineError> {
        self.require(self.key)
    }

    pub fn public_fields(&self) -> impl Iterator<Item = &'static FieldDef> + '_ {
        self.fields.iter().filter(|f| f.is_public())
    }

    pub fn sortable_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.sortable)
            .map(|f| f.name)
            .collect()
    }
}
