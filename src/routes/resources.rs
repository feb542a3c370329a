use crate::{
    data::{
        Row, StoreSession,
        resource::{Resource, ResourceMeta},
    },
    error::{
        InsertSnafu, MakeQuerySnafu, MethodNotSupportedSnafu, MissingIdSnafu, NotFoundSnafu,
        NothingToUpdateSnafu, TpsiResult, UpdateSnafu,
    },
    routes::{
        body::parse_body,
        parse_id,
        reply::{JsonReply, no_content},
    },
};
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use snafu::{OptionExt, ResultExt, ensure};

/// Generic CRUD over one of the registry's tables.
pub async fn handle_resource(
    session: &mut dyn StoreSession,
    method: &Method,
    id: Option<&str>,
    resource: Resource,
    body: &[u8],
) -> TpsiResult<Response> {
    let meta = resource.meta();

    match *method {
        Method::GET => match id {
            Some(raw_id) => get_one(session, meta, raw_id).await,
            None => get_all(session, meta).await,
        },
        Method::POST => create(session, meta, body).await,
        Method::PUT => update(session, meta, id.context(MissingIdSnafu)?, body).await,
        Method::DELETE => delete(session, meta, id.context(MissingIdSnafu)?).await,
        _ => MethodNotSupportedSnafu.fail(),
    }
}

async fn find(session: &mut dyn StoreSession, meta: &ResourceMeta, id: i64) -> TpsiResult<Row> {
    let row = session
        .select_by_id(meta, id)
        .await
        .context(MakeQuerySnafu)?;

    row.context(NotFoundSnafu {
        label: meta.singular,
    })
}

/// Ids that don't parse can't match a row, so they read as "not found".
async fn find_raw(
    session: &mut dyn StoreSession,
    meta: &ResourceMeta,
    raw_id: &str,
) -> TpsiResult<Row> {
    let id = parse_id(raw_id).context(NotFoundSnafu {
        label: meta.singular,
    })?;
    find(session, meta, id).await
}

async fn get_one(
    session: &mut dyn StoreSession,
    meta: &ResourceMeta,
    raw_id: &str,
) -> TpsiResult<Response> {
    let row = find_raw(session, meta, raw_id).await?;
    Ok(JsonReply::ok(row).into_response())
}

async fn get_all(session: &mut dyn StoreSession, meta: &ResourceMeta) -> TpsiResult<Response> {
    let rows = session.select_all(meta).await.context(MakeQuerySnafu)?;
    Ok(JsonReply::ok(rows).into_response())
}

async fn create(
    session: &mut dyn StoreSession,
    meta: &ResourceMeta,
    body: &[u8],
) -> TpsiResult<Response> {
    let fields = parse_body(body)?;
    meta.check_required(&fields)?;

    let bound = meta.allow_list(&fields);
    let id = session.insert(meta, &bound).await.context(InsertSnafu)?;
    info!(table = meta.table, id, "Inserted row");

    let row = find(session, meta, id).await?;
    Ok(JsonReply::created(row).into_response())
}

async fn update(
    session: &mut dyn StoreSession,
    meta: &ResourceMeta,
    raw_id: &str,
    body: &[u8],
) -> TpsiResult<Response> {
    let fields = parse_body(body)?;
    ensure!(!fields.is_empty(), NothingToUpdateSnafu);

    let id = parse_id(raw_id).context(NotFoundSnafu {
        label: meta.singular,
    })?;
    let exists = session.exists(meta, id).await.context(MakeQuerySnafu)?;
    ensure!(
        exists,
        NotFoundSnafu {
            label: meta.singular
        }
    );

    let bound = meta.allow_list(&fields);
    ensure!(!bound.is_empty(), NothingToUpdateSnafu);

    session
        .update(meta, id, &bound)
        .await
        .context(UpdateSnafu)?;
    info!(table = meta.table, id, "Updated row");

    let row = find(session, meta, id).await?;
    Ok(JsonReply::ok(row).into_response())
}

/// Affected rows are the only success signal, so a failed delete reads as 404.
async fn delete(
    session: &mut dyn StoreSession,
    meta: &ResourceMeta,
    raw_id: &str,
) -> TpsiResult<Response> {
    let affected = match parse_id(raw_id) {
        Some(id) => match session.delete(meta, id).await {
            Ok(affected) => affected,
            Err(e) => {
                warn!(?e, table = meta.table, id, "Store refused delete");
                0
            }
        },
        None => 0,
    };

    ensure!(
        affected > 0,
        NotFoundSnafu {
            label: meta.singular
        }
    );
    info!(table = meta.table, raw_id, "Deleted row");

    Ok(no_content(StatusCode::NO_CONTENT))
}
