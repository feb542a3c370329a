use crate::{
    data::{
        Row, Store, StoreSession,
        enrollment::EnrollmentView,
        resource::{BoundField, ResourceMeta},
    },
    error::{GetDatabaseConnectionSnafu, OpenDatabaseSnafu, TpsiResult},
};
use async_trait::async_trait;
use snafu::ResultExt;
use sqlx::{
    Pool, Postgres, QueryBuilder,
    pool::PoolConnection,
    postgres::PgPoolOptions,
    types::Json,
};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub async fn connect(options: PgPoolOptions, url: &str) -> TpsiResult<Self> {
        let pool = options.connect(url).await.context(OpenDatabaseSnafu)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn session(&self) -> TpsiResult<Box<dyn StoreSession>> {
        let conn = self
            .pool
            .acquire()
            .await
            .context(GetDatabaseConnectionSnafu)?;
        Ok(Box::new(PgSession { conn }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Goes back to the pool when dropped at the end of the request.
pub struct PgSession {
    conn: PoolConnection<Postgres>,
}

/// Pushes `CAST($n AS <kind>)` so the store does the type coercion.
fn push_cast_bind<'args>(builder: &mut QueryBuilder<'args, Postgres>, field: &BoundField) {
    builder.push("CAST(");
    builder.push_bind(field.value.as_text().map(ToString::to_string));
    builder.push(" AS ");
    builder.push(field.meta.kind.sql_type());
    builder.push(")");
}

fn insert_query(resource: &ResourceMeta, fields: &[BoundField]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("INSERT INTO {}", resource.table));

    if fields.is_empty() {
        builder.push(" DEFAULT VALUES");
    } else {
        builder.push(" (");
        let mut columns = builder.separated(", ");
        for field in fields {
            columns.push(field.meta.name);
        }
        builder.push(") VALUES (");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_cast_bind(&mut builder, field);
        }
        builder.push(")");
    }

    builder.push(" RETURNING CAST(id AS bigint)");
    builder
}

fn update_query(
    resource: &ResourceMeta,
    id: i64,
    fields: &[BoundField],
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", resource.table));

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(field.meta.name);
        builder.push(" = ");
        push_cast_bind(&mut builder, field);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder
}

#[async_trait]
impl StoreSession for PgSession {
    async fn select_all(&mut self, resource: &ResourceMeta) -> Result<Vec<Row>, sqlx::Error> {
        let sql = format!(
            "SELECT row_to_json(t) FROM {} t ORDER BY t.id",
            resource.table
        );
        let rows: Vec<Json<Row>> = sqlx::query_scalar(&sql).fetch_all(&mut *self.conn).await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    async fn select_by_id(
        &mut self,
        resource: &ResourceMeta,
        id: i64,
    ) -> Result<Option<Row>, sqlx::Error> {
        let sql = format!(
            "SELECT row_to_json(t) FROM {} t WHERE t.id = $1",
            resource.table
        );
        let row: Option<Json<Row>> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.map(|Json(row)| row))
    }

    async fn exists(&mut self, resource: &ResourceMeta, id: i64) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            resource.table
        );
        sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&mut *self.conn)
            .await
    }

    async fn insert(
        &mut self,
        resource: &ResourceMeta,
        fields: &[BoundField],
    ) -> Result<i64, sqlx::Error> {
        insert_query(resource, fields)
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.conn)
            .await
    }

    async fn update(
        &mut self,
        resource: &ResourceMeta,
        id: i64,
        fields: &[BoundField],
    ) -> Result<(), sqlx::Error> {
        update_query(resource, id, fields)
            .build()
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    async fn delete(&mut self, resource: &ResourceMeta, id: i64) -> Result<u64, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE id = $1", resource.table);
        Ok(sqlx::query(&sql)
            .bind(id)
            .execute(&mut *self.conn)
            .await?
            .rows_affected())
    }

    async fn enrollments(
        &mut self,
        view: EnrollmentView,
        id: i64,
    ) -> Result<Vec<Row>, sqlx::Error> {
        let rows: Vec<Json<Row>> = sqlx::query_scalar(view.query())
            .bind(id)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }
}
