//! Persistence for the `biofeedback` table.
//!
//! Entries are create-only and cleared in bulk. Writes run inside a
//! transaction; an uncommitted transaction rolls back when dropped, so every
//! early return through `?` leaves the table untouched.

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::entry::{BiofeedbackEntry, ColumnInfo, EntryFilter, EntryRow, NewEntry};

const SELECT_ENTRIES: &str =
    "SELECT id, date, time, metrics, additional_notes, summary FROM biofeedback";

pub async fn create(db: &PgPool, entry: &NewEntry) -> Result<i64, sqlx::Error> {
    let mut tx = db.begin().await?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO biofeedback (date, time, metrics, additional_notes, summary)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(entry.date)
    .bind(&entry.time)
    .bind(Json(&entry.metrics))
    .bind(&entry.additional_notes)
    .bind(&entry.summary)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(id, date = %entry.date, metrics = entry.metrics.len(), "Entry created");
    Ok(id)
}

pub async fn list(db: &PgPool, filter: EntryFilter) -> Result<Vec<BiofeedbackEntry>, sqlx::Error> {
    let mut query = list_query(filter);
    let rows = query.build_query_as::<EntryRow>().fetch_all(db).await?;

    tracing::debug!(
        start_date = ?filter.start_date,
        end_date = ?filter.end_date,
        count = rows.len(),
        "Entries listed"
    );
    Ok(rows.into_iter().map(BiofeedbackEntry::from).collect())
}

/// Builds the listing query. Bounds are inclusive; ties on `date` resolve
/// newest id first.
pub(crate) fn list_query(filter: EntryFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(SELECT_ENTRIES);

    match (filter.start_date, filter.end_date) {
        (Some(start), Some(end)) => {
            query.push(" WHERE date BETWEEN ");
            query.push_bind(start);
            query.push(" AND ");
            query.push_bind(end);
        }
        (Some(start), None) => {
            query.push(" WHERE date >= ");
            query.push_bind(start);
        }
        (None, Some(end)) => {
            query.push(" WHERE date <= ");
            query.push_bind(end);
        }
        (None, None) => {}
    }

    query.push(" ORDER BY date DESC, id DESC");
    query
}

/// Deletes every entry. Returns the number of rows removed.
pub async fn clear_all(db: &PgPool) -> Result<u64, sqlx::Error> {
    let mut tx = db.begin().await?;
    let result = sqlx::query("DELETE FROM biofeedback")
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    let deleted = result.rows_affected();
    tracing::info!(deleted, "All entries cleared");
    Ok(deleted)
}

pub async fn describe_schema(db: &PgPool) -> Result<Vec<ColumnInfo>, sqlx::Error> {
    sqlx::query_as::<_, ColumnInfo>(
        r#"
        SELECT column_name::text AS column_name,
               data_type::text AS data_type,
               is_nullable::text AS is_nullable
        FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = 'biofeedback'
        ORDER BY ordinal_position
        "#,
    )
    .fetch_all(db)
    .await
}
