use axum::{error_handling::HandleErrorLayer, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::error::{middleware_failure, panic_response, report_unhandled, route_not_found};
use crate::state::AppState;
use crate::{courses, users};

pub fn build_app(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;

    Router::new()
        .route("/", get(welcome))
        .merge(users::routes())
        .merge(courses::routes())
        .fallback(route_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), report_unhandled))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(middleware_failure))
                .timeout(request_timeout),
        )
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the REST API project!" }))
}

pub async fn serve(app: Router, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
