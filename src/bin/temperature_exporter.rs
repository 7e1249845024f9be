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

use clap::Parser;
use prometheus_client::registry::Registry;
use reqwest::{Client, Url};
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use temperature_exporter::client::{Coordinates, OpenMeteoClient};
use temperature_exporter::http::RequestState;
use temperature_exporter::metrics::TemperatureMetrics;
use temperature_exporter::updater::TemperatureUpdater;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_LOCATION: &str = "Tallinn";
const DEFAULT_LATITUDE: f64 = 59.43696;
const DEFAULT_LONGITUDE: f64 = 24.75353;

// Open-Meteo refreshes current conditions every 15 minutes.
const REFRESH_INTERVAL: Duration = Duration::from_secs(900);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const API_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Parser)]
#[clap(name = "temperature_exporter", version = clap::crate_version!())]
struct TemperatureExporterApplication {
    /// Name of the location, used as the value of the "location" label
    #[clap(long, default_value_t = DEFAULT_LOCATION.into())]
    location: String,

    /// Latitude of the location in decimal degrees, from -90 to 90
    #[clap(long, default_value_t = DEFAULT_LATITUDE, value_parser = parse_latitude, allow_negative_numbers = true)]
    latitude: f64,

    /// Longitude of the location in decimal degrees, from -180 to 180
    #[clap(long, default_value_t = DEFAULT_LONGITUDE, value_parser = parse_longitude, allow_negative_numbers = true)]
    longitude: f64,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,
}

fn parse_latitude(s: &str) -> Result<f64, String> {
    parse_degrees(s, 90.0)
}

fn parse_longitude(s: &str) -> Result<f64, String> {
    parse_degrees(s, 180.0)
}

fn parse_degrees(s: &str, max: f64) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if v.is_finite() && v.abs() <= max {
        Ok(v)
    } else {
        Err(format!("must be between -{} and {}", max, max))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = TemperatureExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let client = OpenMeteoClient::new(http_client, Url::parse(API_URL)?);
    let coordinates = Coordinates::new(opts.location, opts.latitude, opts.longitude);
    let mut registry = Registry::default();
    let metrics = TemperatureMetrics::new(&mut registry);
    let updater = TemperatureUpdater::new(client, metrics, coordinates);

    let context = Arc::new(RequestState::new(registry));
    let app = temperature_exporter::http::router(context);
    let bind = SocketAddr::from(BIND_ADDR);
    let server = axum::Server::try_bind(&bind)
        .unwrap_or_else(|e| {
            tracing::error!(message = "error binding to address", address = %bind, error = %e);
            process::exit(1)
        })
        .serve(app.into_make_service());

    tracing::info!(message = "server started", address = %server.local_addr());
    tokio::spawn(updater.run(REFRESH_INTERVAL));

    server
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
