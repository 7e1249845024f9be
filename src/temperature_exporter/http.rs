// temperature_exporter - Prometheus metrics exporter for api.open-meteo.com
//
// Copyright 2024 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const TEXT_FORMAT: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Global state shared between all HTTP requests via `Arc`.
#[derive(Debug)]
pub struct RequestState {
    pub registry: Registry,
}

impl RequestState {
    pub fn new(registry: Registry) -> Self {
        RequestState { registry }
    }
}

/// Routes for the exporter: `GET /metrics` renders every registered metric in the text format.
pub fn router(state: Arc<RequestState>) -> Router {
    Router::new()
        .route("/metrics", get(text_metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn text_metrics_handler(State(state): State<Arc<RequestState>>) -> impl IntoResponse {
    let mut buf = String::new();
    let mut headers = HeaderMap::new();

    match encode(&mut buf, &state.registry) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", bytes = buf.len());
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
            (StatusCode::OK, headers, buf)
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            (StatusCode::INTERNAL_SERVER_ERROR, headers, String::new())
        }
    }
}
