//! HTTP query adapter
//!
//! Serves the query service as JSON:
//!
//! | Method | Path       | 200                    | 404               |
//! |--------|------------|------------------------|-------------------|
//! | GET    | `/current` | newest reading         | no reading yet    |
//! | GET    | `/history` | readings, newest-first | -                 |
//! | other  | other      | -                      | `{"status":404}`  |

use std::future::Future;
use std::io;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use tokio::net::TcpListener;

use crate::protocol::{NotFound, ReadingJson};
use crate::services::QueryService;

/// Build the query router
pub fn router(service: QueryService) -> Router {
    Router::new()
        .route("/current", get(current).fallback(not_found))
        .route("/history", get(history).fallback(not_found))
        .fallback(not_found)
        .with_state(service)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, service: QueryService, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Query service listening on http://{}", addr);
    }
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn current(State(service): State<QueryService>) -> Response {
    match service.current() {
        Some(reading) => Json(ReadingJson::from(&reading)).into_response(),
        None => not_found().await.into_response(),
    }
}

async fn history(State(service): State<QueryService>) -> Json<Vec<ReadingJson>> {
    Json(service.history().iter().map(ReadingJson::from).collect())
}

async fn not_found() -> (StatusCode, Json<NotFound>) {
    (StatusCode::NOT_FOUND, Json(NotFound::BODY))
}
