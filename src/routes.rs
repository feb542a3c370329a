use crate::{
    data::{enrollment::EnrollmentView, resource::Resource},
    error::{TpsiError, TpsiResult, UnknownResourceSnafu, UnsupportedEnrollmentOperationSnafu},
    routes::{
        enrollments::handle_enrollments,
        reply::no_content,
        resources::handle_resource,
    },
    state::TpsiState,
};
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{HeaderValue, Method, StatusCode, Uri, header},
    response::Response,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

pub mod body;
pub mod enrollments;
pub mod reply;
pub mod resources;

/// Up to three segments after the prefix: `/{resource}/{id_or_verb}/{sub_param}`.
#[derive(Debug, PartialEq, Eq)]
pub struct ApiPath<'a> {
    pub resource: &'a str,
    pub id_or_verb: Option<&'a str>,
    pub sub_param: Option<&'a str>,
}

impl<'a> ApiPath<'a> {
    /// Paths outside the prefix resolve to the empty resource.
    pub fn parse(prefix: &str, path: &'a str) -> Self {
        let rest = match path.strip_prefix(prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => "",
        };

        let mut segments = rest
            .trim_matches('/')
            .split('/')
            .map(|segment| Some(segment).filter(|segment| !segment.is_empty()));

        Self {
            resource: segments.next().flatten().unwrap_or_default(),
            id_or_verb: segments.next().flatten(),
            sub_param: segments.next().flatten(),
        }
    }
}

pub fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

const ALLOWED_HEADERS: &str = "Content-Type";
const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE";

pub fn router(state: TpsiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    Router::new()
        .fallback(dispatch)
        .layer(DefaultBodyLimit::max(state.server_config().max_body_bytes))
        .layer(CompressionLayer::new())
        .layer(cors)
        // cors only lists headers and methods on preflights
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn dispatch(
    State(state): State<TpsiState>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> TpsiResult<Response> {
    if method == Method::OPTIONS {
        return Ok(no_content(StatusCode::OK));
    }

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            TpsiError::BodyTooLarge
        } else {
            warn!(%rejection, "Unable to read request body");
            TpsiError::MalformedBody
        }
    })?;

    let mut session = state.get_session().await?;
    let path = ApiPath::parse(state.api_prefix(), uri.path());

    match path.resource {
        "iscrizioni" => match path.id_or_verb.and_then(EnrollmentView::from_segment) {
            Some(view) => handle_enrollments(&mut *session, &method, view, path.sub_param).await,
            None => UnsupportedEnrollmentOperationSnafu.fail(),
        },
        other => match Resource::from_segment(other) {
            Some(resource) => {
                handle_resource(&mut *session, &method, path.id_or_verb, resource, &body).await
            }
            None => UnknownResourceSnafu.fail(),
        },
    }
}
