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

use crate::client::{ClientError, Coordinates, OpenMeteoClient, Reading};
use crate::metrics::TemperatureMetrics;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, Level};

/// Periodically fetch the current temperature for a single location and record it.
///
/// Only successful fetches change the temperature gauge. Failures are logged and counted,
/// leaving the last known temperature (or NaN if there has never been a successful fetch)
/// in place until the next attempt.
#[derive(Debug)]
pub struct TemperatureUpdater {
    client: OpenMeteoClient,
    metrics: TemperatureMetrics,
    coordinates: Coordinates,
}

impl TemperatureUpdater {
    /// Create a new updater, creating the temperature series for the location as NaN
    /// so that it is present in scrapes before the first fetch completes.
    pub fn new(client: OpenMeteoClient, metrics: TemperatureMetrics, coordinates: Coordinates) -> Self {
        metrics.location(coordinates.location());

        TemperatureUpdater {
            client,
            metrics,
            coordinates,
        }
    }

    /// Fetch the current temperature once, updating metrics if the fetch was successful.
    pub async fn update(&self) -> Result<Reading, ClientError> {
        let location = self.coordinates.location();
        self.metrics.fetch(location);

        match self
            .client
            .current(&self.coordinates)
            .instrument(tracing::span!(Level::DEBUG, "open_meteo_current"))
            .await
        {
            Ok(reading) => {
                self.metrics.set_temperature(location, reading.temperature);
                tracing::info!(
                    message = "updated temperature",
                    location = %location,
                    temperature = reading.temperature,
                    time = %reading.time,
                );

                Ok(reading)
            }
            Err(e) => {
                self.metrics.fetch_error(location, &e);
                tracing::error!(
                    message = "failed to update temperature",
                    location = %location,
                    kind = e.kind(),
                    network = e.is_network(),
                    error = %e,
                );

                Err(e)
            }
        }
    }

    /// Update immediately and then once per `period`, forever. Updates run one at a time:
    /// a tick that would fire while an update is still in progress is delayed instead of
    /// being queued.
    pub async fn run(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            message = "temperature polling started",
            location = %self.coordinates.location(),
            latitude = self.coordinates.latitude(),
            longitude = self.coordinates.longitude(),
            period_secs = period.as_secs(),
        );

        loop {
            let _ = interval.tick().await;
            let _ = self.update().await;
        }
    }
}
