use crate::routes::reply::JsonReply;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use snafu::Snafu;
use std::num::ParseIntError;

pub type TpsiResult<T> = Result<T, TpsiError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TpsiError {
    #[snafu(display("Errore connessione DB"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Errore connessione DB"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Errore database"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Errore inserimento: {}", store_message(source)))]
    Insert { source: sqlx::Error },
    #[snafu(display("Errore aggiornamento: {}", store_message(source)))]
    Update { source: sqlx::Error },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a number", name))]
    ParseNumber {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("Campo obbligatorio mancante: {}", field))]
    MissingField { field: &'static str },
    #[snafu(display("ID mancante"))]
    MissingId,
    #[snafu(display("Nessun dato da aggiornare"))]
    NothingToUpdate,
    #[snafu(display("Corpo della richiesta non valido"))]
    MalformedBody,
    #[snafu(display("Corpo della richiesta troppo grande"))]
    BodyTooLarge,
    #[snafu(display("{} non trovato", label))]
    NotFound { label: &'static str },
    #[snafu(display("Risorsa non trovata"))]
    UnknownResource,
    #[snafu(display("Operazione non supportata per iscrizioni"))]
    UnsupportedEnrollmentOperation,
    #[snafu(display("Solo GET è supportato per iscrizioni"))]
    EnrollmentsAreReadOnly,
    #[snafu(display("Metodo non supportato"))]
    MethodNotSupported,
}

/// The store's own wording for a failure, without sqlx's framing.
pub fn store_message(error: &sqlx::Error) -> String {
    error
        .as_database_error()
        .map_or_else(|| error.to_string(), |db| db.message().to_string())
}

impl TpsiError {
    pub const fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const NA: StatusCode = StatusCode::METHOD_NOT_ALLOWED; //not allowed
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input
        const TL: StatusCode = StatusCode::PAYLOAD_TOO_LARGE; //too large

        match self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MakeQuery { .. } | Self::Insert { .. } | Self::Update { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParseNumber { .. } => ISE,
            Self::MissingField { .. } | Self::MissingId | Self::NothingToUpdate => BI,
            Self::MalformedBody => BI,
            Self::BodyTooLarge => TL,
            Self::NotFound { .. } | Self::UnknownResource => NF,
            Self::UnsupportedEnrollmentOperation
            | Self::EnrollmentsAreReadOnly
            | Self::MethodNotSupported => NA,
        }
    }
}

impl IntoResponse for TpsiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(?self, "Error!");
        } else {
            debug!(%self, %status_code, "Rejected request");
        }

        JsonReply::new(status_code, json!({ "errore": self.to_string() })).into_response()
    }
}
