use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::{
    errors::ServiceError,
    services::purchase_orders::dto::{UpsertReceiptInput, UpsertReceiptResult},
    services::Identity,
};

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/receipts", post(upsert_receipt))
}

async fn upsert_receipt(
    State(state): State<AppState>,
    identity: Identity,
    Json(input): Json<UpsertReceiptInput>,
) -> Result<(StatusCode, Json<UpsertReceiptResult>), ServiceError> {
    let created = input.name.is_none();
    let result = state.receipts.upsert_receipt(&identity, input).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}
