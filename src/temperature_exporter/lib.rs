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

//! Prometheus metrics exporter for the current temperature from api.open-meteo.com
//!
//! ## Features
//!
//! `temperature_exporter` fetches the current temperature for a single location using the
//! [Open-Meteo] forecast API and emits it as a Prometheus metric. The temperature is fetched in
//! the background every 15 minutes, matching how often the API refreshes current conditions, and
//! *not* in response to Prometheus scrapes. The following metrics are emitted.
//!
//! * `current_temperature_celsius{location=$LOCATION}` - Current temperature, in degrees celsius.
//!   This is `NaN` until the first successful fetch and keeps the last fetched value if later
//!   fetches fail.
//! * `temperature_exporter_fetches_total{location=$LOCATION}` - Attempts to fetch the temperature.
//! * `temperature_exporter_fetch_errors_total{location=$LOCATION, kind=$KIND}` - Failed attempts
//!   to fetch the temperature. `kind` is one of `timeout`, `network`, `bad_status`, or `decode`.
//!
//! [Open-Meteo]: https://open-meteo.com/en/docs
//!
//! ## Build
//!
//! `temperature_exporter` is a Rust program and must be built from source using a
//! [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! git clone git@github.com:56quarters/temperature_exporter.git && cd temperature_exporter
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! By default, the temperature for Tallinn is exported. Pick a different location by giving it a
//! name along with its latitude and longitude in decimal degrees.
//!
//! ```text
//! ./temperature_exporter --location Boston --latitude 42.3601 --longitude -71.0589
//! ```
//!
//! ### Prometheus
//!
//! Prometheus metrics are exposed on port `8080` at `/metrics`. Once `temperature_exporter`
//! is running, configure scrapes of it by your Prometheus server. Add the host running
//! `temperature_exporter` as a target under the Prometheus `scrape_configs` section as described
//! by the example below.
//!
//! ```yaml
//! # Sample config for Prometheus.
//!
//! global:
//!   scrape_interval:     1m
//!   evaluation_interval: 1m
//!   external_labels:
//!     monitor: 'my_prom'
//!
//! scrape_configs:
//! - job_name: temperature_exporter
//!   static_configs:
//!   - targets: ['example:8080']
//! ```
//!

pub mod client;
pub mod http;
pub mod metrics;
pub mod updater;
