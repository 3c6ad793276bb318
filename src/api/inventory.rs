//! Inventory endpoints

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{BookRecord, Isbn},
    AppState,
};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct InventoryResponse {
    pub records: Vec<BookRecord>,
    /// Distinct isbns
    pub titles: usize,
    /// Sum of all counts
    pub copies: u64,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RemoveResponse {
    pub record: BookRecord,
    /// Whether the records API confirmed the removal
    pub synced: bool,
}

/// List inventoried books
#[utoipa::path(
    get,
    path = "/inventory",
    tag = "inventory",
    responses(
        (status = 200, description = "Current inventory", body = InventoryResponse)
    )
)]
pub async fn list_records(State(state): State<AppState>) -> Json<InventoryResponse> {
    let inventory = state.session.inventory();
    let inventory = inventory.read().await;
    Json(InventoryResponse {
        records: inventory.records().cloned().collect(),
        titles: inventory.len(),
        copies: inventory.total_count(),
    })
}

/// Get one record
#[utoipa::path(
    get,
    path = "/inventory/{isbn}",
    tag = "inventory",
    params(("isbn" = String, Path, description = "Scanned isbn")),
    responses(
        (status = 200, description = "Record", body = BookRecord),
        (status = 404, description = "Not in inventory")
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> AppResult<Json<BookRecord>> {
    let isbn = Isbn::new(isbn);
    let inventory = state.session.inventory();
    let inventory = inventory.read().await;
    inventory
        .get(&isbn)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No record for isbn {}", isbn)))
}

/// Remove a record locally and from the records API
#[utoipa::path(
    delete,
    path = "/inventory/{isbn}",
    tag = "inventory",
    params(("isbn" = String, Path, description = "Scanned isbn")),
    responses(
        (status = 200, description = "Record removed", body = RemoveResponse),
        (status = 404, description = "Not in inventory")
    )
)]
pub async fn remove_record(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> AppResult<Json<RemoveResponse>> {
    let (record, outcome) = state.session.remove_book(&Isbn::new(isbn)).await?;
    Ok(Json(RemoveResponse {
        record,
        synced: outcome.is_stored(),
    }))
}

/// Download the inventory as a JSON file
#[utoipa::path(
    get,
    path = "/inventory/export",
    tag = "inventory",
    responses(
        (status = 200, description = "JSON array of records", body = Vec<BookRecord>)
    )
)]
pub async fn export_records(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let body = state.session.inventory().read().await.export_json()?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"inventory.json\""),
        ],
        body,
    ))
}
