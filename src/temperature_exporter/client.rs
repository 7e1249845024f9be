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

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::error;
use std::fmt;

#[derive(Debug)]
pub enum ClientError {
    Timeout(reqwest::Error),
    Network(reqwest::Error),
    BadStatus(StatusCode, Url),
    Decode(reqwest::Error),
}

impl ClientError {
    /// Short, stable name for the type of failure, suitable for use as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network",
            Self::BadStatus(_, _) => "bad_status",
            Self::Decode(_) => "decode",
        }
    }

    /// True if the request never produced a response from the API: DNS, connection,
    /// or timeout failures.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_))
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else if e.is_decode() {
            Self::Decode(e)
        } else {
            Self::Network(e)
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(e) => write!(f, "timed out: {}", e),
            Self::Network(e) => write!(f, "{}", e),
            Self::BadStatus(status, url) => write!(f, "unexpected status {} for {}", status, url),
            Self::Decode(e) => write!(f, "unable to decode response: {}", e),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Timeout(e) => Some(e),
            Self::Network(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::BadStatus(_, _) => None,
        }
    }
}

/// Name and position of the place to fetch temperatures for, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    location: String,
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new<S: Into<String>>(location: S, latitude: f64, longitude: f64) -> Self {
        Coordinates {
            location: location.into(),
            latitude,
            longitude,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Current temperature in celsius and the time it was observed, exactly as reported by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub time: String,
}

impl From<Forecast> for Reading {
    fn from(f: Forecast) -> Self {
        Reading {
            temperature: f.current.temperature,
            time: f.current.time,
        }
    }
}

#[derive(Debug)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: Url,
}

impl OpenMeteoClient {
    const USER_AGENT: &'static str = "Temperature Prometheus Exporter (https://github.com/56quarters/temperature_exporter)";
    const JSON_RESPONSE: &'static str = "application/json";

    /// Create a new client for the forecast endpoint at `base_url`. Any request timeout
    /// must be configured on the provided `Client`.
    pub fn new(client: Client, base_url: Url) -> Self {
        OpenMeteoClient { client, base_url }
    }

    pub async fn current(&self, coordinates: &Coordinates) -> Result<Reading, ClientError> {
        let request_url = self.forecast_url(coordinates);
        tracing::debug!(message = "making current temperature request", url = %request_url);

        let res = self
            .client
            .get(request_url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(ClientError::BadStatus(status, request_url));
        }

        let forecast = res.json::<Forecast>().await.map_err(ClientError::from_reqwest)?;
        Ok(Reading::from(forecast))
    }

    fn forecast_url(&self, coordinates: &Coordinates) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &format!("{:.6}", coordinates.latitude()))
            .append_pair("longitude", &format!("{:.6}", coordinates.longitude()))
            .append_pair("current", "temperature_2m");

        url
    }
}

#[derive(Deserialize, Debug)]
pub struct Forecast {
    #[serde(alias = "current")]
    pub current: CurrentWeather,
}

#[derive(Deserialize, Debug)]
pub struct CurrentWeather {
    #[serde(alias = "time")]
    pub time: String,
    #[serde(alias = "temperature_2m")]
    pub temperature: f64,
}
