use super::http_server::AppState;
use crate::error::OrderFlowError;
use crate::orders::OrderDraft;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

/// `POST /api/orders` - submit a new order from the kiosk.
pub async fn create_order(
    draft: web::Json<OrderDraft>,
    state: web::Data<AppState>,
) -> impl Responder {
    match state.node.submit_order(draft.into_inner()).await {
        Ok(receipt) => HttpResponse::Created().json(json!({
            "id": receipt.order_id,
            "order_number": receipt.order_number,
            "message": "Order placed successfully"
        })),
        Err(OrderFlowError::Validation(msg)) => {
            HttpResponse::BadRequest().json(json!({"error": msg}))
        }
        Err(e) => {
            log::error!("Order submission failed: {}", e);
            HttpResponse::InternalServerError()
                .json(json!({"error": format!("Failed to create order: {}", e)}))
        }
    }
}

/// `GET /api/orders/{id}` - fetch an order with its items.
pub async fn get_order(path: web::Path<u64>, state: web::Data<AppState>) -> impl Responder {
    let order_id = path.into_inner();
    match state.node.get_order_with_items(order_id) {
        Ok(Some((order, items))) => match serde_json::to_value(&order) {
            Ok(mut body) => {
                if let Some(obj) = body.as_object_mut() {
                    obj.insert("items".to_string(), json!(items));
                }
                HttpResponse::Ok().json(body)
            }
            Err(e) => HttpResponse::InternalServerError()
                .json(json!({"error": format!("Failed to serialize order: {}", e)})),
        },
        Ok(None) => {
            HttpResponse::NotFound().json(json!({"error": format!("Order {} not found", order_id)}))
        }
        Err(e) => {
            log::error!("Order lookup failed: {}", e);
            HttpResponse::InternalServerError()
                .json(json!({"error": format!("Failed to fetch order: {}", e)}))
        }
    }
}
