//! Static description of the CRUD resources: which table backs them, how a
//! single row is named in messages, and which columns a request may touch.

use crate::{
    data::{FieldMap, FieldValue},
    error::{MissingFieldSnafu, TpsiResult},
};
use snafu::ensure;

/// Scalar kind of a column, used as the SQL cast target for bound values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Decimal,
}

impl FieldKind {
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Date => "date",
            Self::Decimal => "numeric",
        }
    }
}

#[derive(Debug)]
pub struct FieldMeta {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FieldMeta {
    FieldMeta {
        name,
        kind,
        required,
    }
}

#[derive(Debug)]
pub struct ResourceMeta {
    pub table: &'static str,
    pub singular: &'static str,
    pub fields: &'static [FieldMeta],
}

static STUDENTS: ResourceMeta = ResourceMeta {
    table: "studenti",
    singular: "Studente",
    fields: &[
        field("nome", FieldKind::Text, true),
        field("cognome", FieldKind::Text, true),
        field("email", FieldKind::Text, true),
        field("data_nascita", FieldKind::Date, true),
    ],
};

static COURSES: ResourceMeta = ResourceMeta {
    table: "corsi",
    singular: "Corso",
    fields: &[
        field("titolo", FieldKind::Text, true),
        field("descrizione", FieldKind::Text, false),
        field("docente", FieldKind::Text, true),
        field("prezzo", FieldKind::Decimal, true),
    ],
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resource {
    Students,
    Courses,
}

impl Resource {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "studenti" => Some(Self::Students),
            "corsi" => Some(Self::Courses),
            _ => None,
        }
    }

    pub fn meta(self) -> &'static ResourceMeta {
        match self {
            Self::Students => &STUDENTS,
            Self::Courses => &COURSES,
        }
    }
}

/// A body value that survived the allow-list, paired with its column.
#[derive(Debug, Clone)]
pub struct BoundField {
    pub meta: &'static FieldMeta,
    pub value: FieldValue,
}

impl ResourceMeta {
    /// First required column that is absent, `null` or an empty string wins.
    pub fn check_required(&self, fields: &FieldMap) -> TpsiResult<()> {
        for meta in self.fields.iter().filter(|meta| meta.required) {
            let present = fields.get(meta.name).is_some_and(|value| !value.is_blank());
            ensure!(present, MissingFieldSnafu { field: meta.name });
        }
        Ok(())
    }

    /// Keeps only known columns, in registry order; unknown keys are dropped.
    pub fn allow_list(&self, fields: &FieldMap) -> Vec<BoundField> {
        self.fields
            .iter()
            .filter_map(|meta| {
                fields.get(meta.name).map(|value| BoundField {
                    meta,
                    value: value.clone(),
                })
            })
            .collect()
    }
}
