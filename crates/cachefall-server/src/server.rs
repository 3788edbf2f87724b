use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use cachefall_cache::CacheRegistry;

use crate::CacheTiers;
use crate::handlers;
use crate::service::UserService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub registry: Arc<CacheRegistry>,
    pub tiers: Arc<CacheTiers>,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // User CRUD
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/users/bulk", axum::routing::post(handlers::create_users_bulk))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/users/by-name/{name}", get(handlers::get_user_by_name))
        // Cache administration
        .route("/cache", get(handlers::cache_names))
        .route("/cache/health", get(handlers::cache_health))
        .route(
            "/cache/{name}",
            axum::routing::delete(handlers::clear_cache),
        )
        .route("/cache/{name}/{key}", get(handlers::peek_cache))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http.request",
                    http.method = %req.method(),
                    http.target = %req.uri(),
                )
            }),
        )
}

/// Runs the app on `addr` until a shutdown signal arrives.
pub async fn serve(addr: SocketAddr, app: Router) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
