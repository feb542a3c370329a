use crate::{
    data::{
        enrollment::EnrollmentView,
        resource::{BoundField, ResourceMeta},
    },
    error::TpsiResult,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fmt::Debug};

pub mod enrollment;
#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod resource;

/// A row exactly as the store hands it back, column name to JSON value.
pub type Row = Map<String, Value>;

/// Flat field-to-value mapping decoded from a request body.
pub type FieldMap = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
}

impl FieldValue {
    pub const fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Text(text) => Some(text),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(text) => Self::Text(text),
            other => Self::Text(other.to_string()),
        }
    }
}

/// Hands out one session per request.
#[async_trait]
pub trait Store: Debug + Send + Sync {
    async fn session(&self) -> TpsiResult<Box<dyn StoreSession>>;

    async fn close(&self) {}
}

/// A single request-scoped connection. Table and column names only ever come
/// from the static registry; every value is bound as a parameter.
#[async_trait]
pub trait StoreSession: Send {
    async fn select_all(&mut self, resource: &ResourceMeta) -> Result<Vec<Row>, sqlx::Error>;

    async fn select_by_id(
        &mut self,
        resource: &ResourceMeta,
        id: i64,
    ) -> Result<Option<Row>, sqlx::Error>;

    async fn exists(&mut self, resource: &ResourceMeta, id: i64) -> Result<bool, sqlx::Error>;

    /// Returns the id the store generated for the new row.
    async fn insert(
        &mut self,
        resource: &ResourceMeta,
        fields: &[BoundField],
    ) -> Result<i64, sqlx::Error>;

    async fn update(
        &mut self,
        resource: &ResourceMeta,
        id: i64,
        fields: &[BoundField],
    ) -> Result<(), sqlx::Error>;

    /// Returns the number of rows affected.
    async fn delete(&mut self, resource: &ResourceMeta, id: i64) -> Result<u64, sqlx::Error>;

    async fn enrollments(
        &mut self,
        view: EnrollmentView,
        id: i64,
    ) -> Result<Vec<Row>, sqlx::Error>;
}
