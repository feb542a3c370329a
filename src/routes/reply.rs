use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// The one way a request ends: a status plus a JSON-serialised value.
#[derive(Debug)]
pub struct JsonReply<T> {
    status: StatusCode,
    value: T,
}

impl<T: Serialize> JsonReply<T> {
    pub const fn new(status: StatusCode, value: T) -> Self {
        Self { status, value }
    }

    pub const fn ok(value: T) -> Self {
        Self::new(StatusCode::OK, value)
    }

    pub const fn created(value: T) -> Self {
        Self::new(StatusCode::CREATED, value)
    }
}

impl<T: Serialize> IntoResponse for JsonReply<T> {
    fn into_response(self) -> Response {
        let (status, body) = match serde_json::to_vec(&self.value) {
            Ok(body) => (self.status, body),
            Err(e) => {
                error!(?e, "Error serialising response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    br#"{"errore":"Errore serializzazione"}"#.to_vec(),
                )
            }
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        response
    }
}

/// Status only, no body and no content type.
pub fn no_content(status: StatusCode) -> Response {
    status.into_response()
}
