use crate::{
    data::{StoreSession, enrollment::EnrollmentView},
    error::{EnrollmentsAreReadOnlySnafu, MakeQuerySnafu, TpsiResult},
    routes::{parse_id, reply::JsonReply},
};
use axum::{
    http::Method,
    response::{IntoResponse, Response},
};
use snafu::{ResultExt, ensure};

/// Read-only enrollment lookups. An unknown student or course id yields an
/// empty list, not a 404.
pub async fn handle_enrollments(
    session: &mut dyn StoreSession,
    method: &Method,
    view: EnrollmentView,
    id: Option<&str>,
) -> TpsiResult<Response> {
    ensure!(*method == Method::GET, EnrollmentsAreReadOnlySnafu);

    let rows = match id.and_then(parse_id) {
        Some(id) => session
            .enrollments(view, id)
            .await
            .context(MakeQuerySnafu)?,
        None => Vec::new(),
    };

    Ok(JsonReply::ok(rows).into_response())
}
