pub mod purchase_orders;
pub mod receipts;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::services::{
    purchase_orders::PurchaseOrderService, receipts::ReceiptService, Identity,
};

/// Shared handler state: the service layer behind every route.
#[derive(Clone)]
pub struct AppState {
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub receipts: Arc<ReceiptService>,
}

/// Extracts the acting identity from request headers. `X-Staff-Id` is
/// required; `X-Allowed-Locations` is an optional comma-separated list,
/// absent meaning unrestricted.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let staff_member_id = parts
            .headers
            .get("x-staff-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| bad_request("missing or invalid X-Staff-Id header"))?;

        let allowed_location_ids = match parts.headers.get("x-allowed-locations") {
            None => Vec::new(),
            Some(value) => value
                .to_str()
                .ok()
                .map(|v| {
                    v.split(',')
                        .filter(|s| !s.trim().is_empty())
                        .map(|s| s.trim().parse::<i64>())
                        .collect::<Result<Vec<i64>, _>>()
                })
                .and_then(Result::ok)
                .ok_or_else(|| bad_request("invalid X-Allowed-Locations header"))?,
        };

        Ok(Identity {
            staff_member_id,
            allowed_location_ids,
        })
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Bad Request",
            "message": message,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<Identity, Response> {
        let (mut parts, _) = req.into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn parses_identity_headers() {
        let req = Request::builder()
            .header("X-Staff-Id", "7")
            .header("X-Allowed-Locations", "1, 2,3")
            .body(())
            .unwrap();
        let identity = extract(req).await.unwrap();
        assert_eq!(identity.staff_member_id, 7);
        assert_eq!(identity.allowed_location_ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn missing_staff_id_is_rejected() {
        let req = Request::builder().body(()).unwrap();
        assert!(extract(req).await.is_err());
    }

    #[tokio::test]
    async fn absent_locations_header_means_unrestricted() {
        let req = Request::builder()
            .header("X-Staff-Id", "7")
            .body(())
            .unwrap();
        let identity = extract(req).await.unwrap();
        assert!(identity.allowed_location_ids.is_empty());
        assert!(identity.may_access_location(42));
    }
}
