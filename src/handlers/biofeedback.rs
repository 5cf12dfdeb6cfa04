use axum::{extract::State, Json};

use crate::db::entries;
use crate::dto::{
    ClearEntriesResponse, CreateEntryRequest, CreateEntryResponse, DebugEntriesResponse,
    SchemaResponse,
};
use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::models::entry::{BiofeedbackEntry, EntryFilter};
use crate::AppState;

pub async fn create_entry(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateEntryRequest>,
) -> AppResult<Json<CreateEntryResponse>> {
    // Reject before touching the pool
    let entry = body.into_new_entry()?;

    let id = entries::create(&state.db, &entry).await?;

    Ok(Json(CreateEntryResponse {
        id,
        message: "New entry created successfully".into(),
    }))
}

pub async fn list_entries(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<EntryFilter>,
) -> AppResult<Json<Vec<BiofeedbackEntry>>> {
    let entries = entries::list(&state.db, filter).await?;
    Ok(Json(entries))
}

pub async fn clear_entries(State(state): State<AppState>) -> AppResult<Json<ClearEntriesResponse>> {
    let deleted = entries::clear_all(&state.db).await?;

    Ok(Json(ClearEntriesResponse {
        message: "All biofeedback entries have been cleared".into(),
        deleted,
    }))
}

pub async fn debug_entries(State(state): State<AppState>) -> AppResult<Json<DebugEntriesResponse>> {
    let entries = entries::list(&state.db, EntryFilter::default()).await?;

    Ok(Json(DebugEntriesResponse {
        total_entries: entries.len(),
        entries,
    }))
}

pub async fn describe_schema(State(state): State<AppState>) -> AppResult<Json<SchemaResponse>> {
    let schema = entries::describe_schema(&state.db).await?;
    Ok(Json(SchemaResponse { schema }))
}
