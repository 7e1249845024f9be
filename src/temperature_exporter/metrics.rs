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

use crate::client::ClientError;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::collections::HashSet;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, PoisonError, RwLock};

type TemperatureGauge = Gauge<f64, AtomicU64>;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct LocationLabels {
    location: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ErrorLabels {
    location: String,
    kind: String,
}

/// Every new temperature series starts as NaN so that scrapes can tell a location that
/// has never been updated apart from one that is simply cold.
fn unknown_temperature() -> TemperatureGauge {
    let gauge = TemperatureGauge::default();
    gauge.set(f64::NAN);
    gauge
}

/// Holder for the last known temperature of each location and counts of attempts to
/// fetch it.
///
/// All metrics are created and registered upon call to `TemperatureMetrics::new()`. Clones
/// share the same underlying values so one copy can be updated in the background while the
/// `Registry` it was registered with is encoded for scrapes. Values are stored atomically so a
/// concurrent read sees either the previous or the new temperature, never a mix of both.
#[derive(Clone, Debug)]
pub struct TemperatureMetrics {
    temperature: Family<LocationLabels, TemperatureGauge, fn() -> TemperatureGauge>,
    fetches: Family<LocationLabels, Counter>,
    errors: Family<ErrorLabels, Counter>,
    locations: Arc<RwLock<HashSet<String>>>,
}

impl TemperatureMetrics {
    /// Create a new `TemperatureMetrics` and register each metric with the provided `Registry`.
    pub fn new(reg: &mut Registry) -> Self {
        let temperature = Family::new_with_constructor(unknown_temperature as fn() -> TemperatureGauge);
        let fetches = Family::<LocationLabels, Counter>::default();
        let errors = Family::<ErrorLabels, Counter>::default();

        reg.register(
            "current_temperature_celsius",
            "Current temperature in degrees Celsius",
            temperature.clone(),
        );
        reg.register(
            "temperature_exporter_fetches",
            "Attempts to fetch the current temperature",
            fetches.clone(),
        );
        reg.register(
            "temperature_exporter_fetch_errors",
            "Failed attempts to fetch the current temperature by type of error",
            errors.clone(),
        );

        Self {
            temperature,
            fetches,
            errors,
            locations: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Create the temperature series for a location, set to NaN, if it doesn't exist yet.
    pub fn location(&self, location: &str) {
        let _ = self.temperature.get_or_create(&Self::labels(location));
        self.add_location(location);
    }

    pub fn set_temperature(&self, location: &str, temperature: f64) {
        self.temperature.get_or_create(&Self::labels(location)).set(temperature);
        self.add_location(location);
    }

    /// Last temperature set for a location, NaN if it has never been set, or `None` if
    /// there is no series for the location. Never creates a series.
    pub fn temperature(&self, location: &str) -> Option<f64> {
        let exists = self
            .locations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(location);

        if exists {
            Some(self.temperature.get_or_create(&Self::labels(location)).get())
        } else {
            None
        }
    }

    pub fn fetch(&self, location: &str) {
        self.fetches.get_or_create(&Self::labels(location)).inc();
    }

    pub fn fetch_error(&self, location: &str, err: &ClientError) {
        self.errors
            .get_or_create(&ErrorLabels {
                location: location.to_owned(),
                kind: err.kind().to_owned(),
            })
            .inc();
    }

    // Only called after the series exists so that readers never create it.
    fn add_location(&self, location: &str) {
        let mut locations = self.locations.write().unwrap_or_else(PoisonError::into_inner);
        if !locations.contains(location) {
            locations.insert(location.to_owned());
        }
    }

    fn labels(location: &str) -> LocationLabels {
        LocationLabels {
            location: location.to_owned(),
        }
    }
}
