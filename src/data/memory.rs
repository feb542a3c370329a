//! In-process stand-in for the relational store, used by the HTTP tests.
//! Emulates generated ids, column coercion and the enrollment joins.

use crate::{
    data::{
        FieldValue, Row, Store, StoreSession,
        enrollment::EnrollmentView,
        resource::{BoundField, FieldKind, Resource, ResourceMeta},
    },
    error::{GetDatabaseConnectionSnafu, TpsiResult},
};
use async_trait::async_trait;
use serde_json::{Number, Value, json};
use snafu::ResultExt;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Row>,
}

#[derive(Debug, Default)]
struct Tables {
    by_name: BTreeMap<&'static str, Table>,
    enrollments: Vec<Row>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    offline: bool,
}

impl MemoryStore {
    /// A store whose every connection attempt fails.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn seed_enrollment(&self, studente_id: i64, corso_id: i64, data_iscrizione: &str) -> i64 {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let id = i64::try_from(tables.enrollments.len()).unwrap_or(i64::MAX) + 1;
        let row = json!({
            "id": id,
            "studente_id": studente_id,
            "corso_id": corso_id,
            "data_iscrizione": data_iscrizione,
        });
        if let Value::Object(row) = row {
            tables.enrollments.push(row);
        }
        id
    }

    pub fn row_count(&self, resource: Resource) -> usize {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .by_name
            .get(resource.meta().table)
            .map_or(0, |table| table.rows.len())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn session(&self) -> TpsiResult<Box<dyn StoreSession>> {
        if self.offline {
            return Err(sqlx::Error::PoolTimedOut).context(GetDatabaseConnectionSnafu);
        }
        Ok(Box::new(self.clone()))
    }
}

/// What the store would do when casting a bound value to the column type.
fn coerce(field: &BoundField) -> Result<Value, sqlx::Error> {
    let FieldValue::Text(text) = &field.value else {
        return Ok(Value::Null);
    };

    match field.meta.kind {
        FieldKind::Text | FieldKind::Date => Ok(Value::String(text.clone())),
        FieldKind::Decimal => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| {
                sqlx::Error::Protocol(format!(
                    "invalid input syntax for type numeric: \"{text}\""
                ))
            }),
    }
}

impl MemoryStore {
    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut tables)
    }
}

#[async_trait]
impl StoreSession for MemoryStore {
    async fn select_all(&mut self, resource: &ResourceMeta) -> Result<Vec<Row>, sqlx::Error> {
        Ok(self.with_tables(|tables| {
            tables
                .by_name
                .get(resource.table)
                .map(|table| table.rows.values().cloned().collect())
                .unwrap_or_default()
        }))
    }

    async fn select_by_id(
        &mut self,
        resource: &ResourceMeta,
        id: i64,
    ) -> Result<Option<Row>, sqlx::Error> {
        Ok(self.with_tables(|tables| {
            tables
                .by_name
                .get(resource.table)
                .and_then(|table| table.rows.get(&id).cloned())
        }))
    }

    async fn exists(&mut self, resource: &ResourceMeta, id: i64) -> Result<bool, sqlx::Error> {
        Ok(self.select_by_id(resource, id).await?.is_some())
    }

    async fn insert(
        &mut self,
        resource: &ResourceMeta,
        fields: &[BoundField],
    ) -> Result<i64, sqlx::Error> {
        let mut values = Row::new();
        for field in fields {
            values.insert(field.meta.name.to_string(), coerce(field)?);
        }

        Ok(self.with_tables(|tables| {
            let table = tables.by_name.entry(resource.table).or_default();
            table.next_id += 1;
            let id = table.next_id;

            let mut row = Row::new();
            row.insert("id".to_string(), json!(id));
            for meta in resource.fields {
                let value = values.remove(meta.name).unwrap_or(Value::Null);
                row.insert(meta.name.to_string(), value);
            }
            table.rows.insert(id, row);
            id
        }))
    }

    async fn update(
        &mut self,
        resource: &ResourceMeta,
        id: i64,
        fields: &[BoundField],
    ) -> Result<(), sqlx::Error> {
        let values = fields
            .iter()
            .map(|field| Ok((field.meta.name.to_string(), coerce(field)?)))
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        self.with_tables(|tables| {
            if let Some(row) = tables
                .by_name
                .get_mut(resource.table)
                .and_then(|table| table.rows.get_mut(&id))
            {
                row.extend(values);
            }
        });
        Ok(())
    }

    async fn delete(&mut self, resource: &ResourceMeta, id: i64) -> Result<u64, sqlx::Error> {
        self.with_tables(|tables| {
            if tables.enrollments.iter().any(|enrollment| {
                let column = match resource.table {
                    "studenti" => "studente_id",
                    _ => "corso_id",
                };
                enrollment.get(column) == Some(&json!(id))
            }) {
                return Err(sqlx::Error::Protocol(
                    "violates foreign key constraint on table \"iscrizioni\"".to_string(),
                ));
            }

            Ok(tables
                .by_name
                .get_mut(resource.table)
                .and_then(|table| table.rows.remove(&id))
                .map_or(0, |_| 1))
        })
    }

    async fn enrollments(
        &mut self,
        view: EnrollmentView,
        id: i64,
    ) -> Result<Vec<Row>, sqlx::Error> {
        let (own_column, other_column, other, joined) = match view {
            EnrollmentView::ByStudent => (
                "studente_id",
                "corso_id",
                Resource::Courses,
                &["titolo", "docente"][..],
            ),
            EnrollmentView::ByCourse => (
                "corso_id",
                "studente_id",
                Resource::Students,
                &["nome", "cognome", "email"][..],
            ),
        };

        Ok(self.with_tables(|tables| {
            let others = tables.by_name.get(other.meta().table);

            tables
                .enrollments
                .iter()
                .filter(|enrollment| enrollment.get(own_column) == Some(&json!(id)))
                .filter_map(|enrollment| {
                    let other_id = enrollment.get(other_column)?.as_i64()?;
                    let other_row = others?.rows.get(&other_id)?;

                    let mut row = enrollment.clone();
                    for column in joined {
                        row.insert(
                            (*column).to_string(),
                            other_row.get(*column).cloned().unwrap_or(Value::Null),
                        );
                    }
                    Some(row)
                })
                .collect()
        }))
    }
}
