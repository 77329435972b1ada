use super::node::OrderNode;
use super::order_routes;
use crate::error::OrderFlowResult;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer as ActixHttpServer};
use log::info;
use std::sync::Arc;

/// HTTP server exposing the inbound API boundary of the order pipeline.
///
/// Serves the order submission endpoint the kiosk frontends call, plus the
/// read-back endpoint the confirmation screen uses. Everything else the
/// full product exposes (menu, auth, admin) lives outside this core.
pub struct OrderHttpServer {
    node: Arc<OrderNode>,
    bind_address: String,
}

/// Shared application state for the HTTP server.
pub struct AppState {
    pub node: Arc<OrderNode>,
}

impl OrderHttpServer {
    /// Create a new HTTP server over the given node.
    pub fn new(node: Arc<OrderNode>, bind_address: &str) -> Self {
        Self {
            node,
            bind_address: bind_address.to_string(),
        }
    }

    /// Run the HTTP server until the process shuts down.
    pub async fn run(&self) -> OrderFlowResult<()> {
        info!("HTTP server running on {}", self.bind_address);

        let app_state = web::Data::new(AppState {
            node: Arc::clone(&self.node),
        });

        let server = ActixHttpServer::new(move || {
            // Kiosk frontends are served from their own origin
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new().wrap(cors).app_data(app_state.clone()).service(
                web::scope("/api")
                    .route("/orders", web::post().to(order_routes::create_order))
                    .route("/orders/{id}", web::get().to(order_routes::get_order)),
            )
        })
        .bind(&self.bind_address)?;

        server.run().await?;
        Ok(())
    }
}
