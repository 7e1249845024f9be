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

#![allow(dead_code)]

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use reqwest::{Client, Url};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use temperature_exporter::client::{Coordinates, OpenMeteoClient};
use tracing::subscriber::DefaultGuard;
use tracing::Level;

pub fn tallinn() -> Coordinates {
    Coordinates::new("Tallinn", 59.43696, 24.75353)
}

pub fn forecast_body(time: &str, temperature: f64) -> String {
    format!(
        r#"{{"latitude":59.4375,"longitude":24.75,"current_units":{{"time":"iso8601","temperature_2m":"°C"}},"current":{{"time":"{}","interval":900,"temperature_2m":{}}}}}"#,
        time, temperature
    )
}

#[derive(Debug, Clone)]
pub struct StubResponse {
    status: StatusCode,
    body: String,
    delay: Duration,
}

impl StubResponse {
    pub fn ok(time: &str, temperature: f64) -> Self {
        Self::raw(StatusCode::OK, forecast_body(time, temperature))
    }

    pub fn raw<S: Into<String>>(status: StatusCode, body: S) -> Self {
        StubResponse {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug)]
struct StubState {
    responses: Vec<StubResponse>,
    hits: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

/// Fake forecast API that answers each request with the next configured response,
/// repeating the last one once they have all been used.
#[derive(Debug)]
pub struct StubUpstream {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubUpstream {
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        assert!(!responses.is_empty(), "stub needs at least one response");

        let state = Arc::new(StubState {
            responses,
            hits: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/forecast", get(forecast))
            .with_state(state.clone());
        let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0))).serve(app.into_make_service());
        let addr = server.local_addr();
        tokio::spawn(server);

        StubUpstream { addr, state }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/v1/forecast", self.addr)).unwrap()
    }

    pub fn client(&self, timeout: Duration) -> OpenMeteoClient {
        let http = Client::builder().timeout(timeout).build().unwrap();
        OpenMeteoClient::new(http, self.url())
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.queries.lock().unwrap().clone()
    }
}

async fn forecast(State(state): State<Arc<StubState>>, RawQuery(query): RawQuery) -> (StatusCode, String) {
    let n = state.hits.fetch_add(1, Ordering::SeqCst);
    state.queries.lock().unwrap().push(query.unwrap_or_default());

    let res = state.responses[n.min(state.responses.len() - 1)].clone();
    if !res.delay.is_zero() {
        tokio::time::sleep(res.delay).await;
    }

    (res.status, res.body)
}

/// In-memory destination for formatted log lines.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Send logs emitted on the current thread to a buffer until the guard is dropped.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buf = LogBuffer::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(Level::DEBUG)
        .finish();

    (buf, tracing::subscriber::set_default(subscriber))
}

/// Wait for `check` to be true, failing the test after a few seconds.
pub async fn eventually<F: Fn() -> bool>(check: F) {
    let res = tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(res.is_ok(), "condition not met before timeout");
}
