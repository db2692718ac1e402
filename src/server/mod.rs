//! HTTP front for the pantry agent.
//!
//! `routes` holds the handlers and `state` the shared services. [`serve`] binds
//! a port and runs the layered app until a shutdown future resolves.

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Router with CORS and request tracing applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    create_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind `port` on all interfaces and serve until `shutdown` resolves.
///
/// In-flight requests are drained before returning.
///
/// # Errors
/// Returns an error if the port cannot be bound or serving fails.
pub async fn serve<F>(state: Arc<AppState>, port: u16, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await?;
    info!("Pantry agent listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown)
        .await
}
