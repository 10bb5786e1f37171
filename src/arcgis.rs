//! ArcGIS World Geocoding Service adapter.
//!
//! Resolves addresses through the `findAddressCandidates` endpoint and uses
//! the great-circle distance between the returned points.

use serde::Deserialize;
use tracing::debug;

use crate::error::OracleError;
use crate::traits::{Coordinate, DistanceOracle};

#[derive(Debug, Clone)]
pub struct ArcGisConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Candidates requested per lookup; the best-scored one is used.
    pub max_locations: u32,
}

impl Default for ArcGisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://geocode.arcgis.com/arcgis/rest/services/World/GeocodeServer"
                .to_string(),
            timeout_secs: 10,
            max_locations: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArcGisGeocoder {
    config: ArcGisConfig,
    client: reqwest::blocking::Client,
}

impl ArcGisGeocoder {
    pub fn new(config: ArcGisConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/findAddressCandidates",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl DistanceOracle for ArcGisGeocoder {
    fn geocode(&self, address: &str) -> Result<Coordinate, OracleError> {
        let max_locations = self.config.max_locations.to_string();
        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("SingleLine", address),
                ("f", "json"),
                ("outFields", "none"),
                ("maxLocations", max_locations.as_str()),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<CandidatesResponse>())
            .map_err(|source| OracleError::Http {
                address: address.to_string(),
                source,
            })?;

        let coordinate = best_candidate(address, response)?;
        debug!(%address, lat = coordinate.lat, lon = coordinate.lon, "geocoded");
        Ok(coordinate)
    }
}

/// Pick the highest-scoring candidate, first one on ties.
fn best_candidate(address: &str, response: CandidatesResponse) -> Result<Coordinate, OracleError> {
    if let Some(error) = response.error {
        return Err(OracleError::Malformed {
            address: address.to_string(),
            reason: error.message,
        });
    }

    let mut best: Option<Candidate> = None;
    for candidate in response.candidates {
        if best.as_ref().is_none_or(|b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    let Some(candidate) = best else {
        return Err(OracleError::NotFound {
            address: address.to_string(),
        });
    };

    let CandidateLocation { x, y } = candidate.location;
    if !x.is_finite() || !y.is_finite() {
        return Err(OracleError::Malformed {
            address: address.to_string(),
            reason: format!("non-finite location ({x}, {y})"),
        });
    }
    Ok(Coordinate::new(y, x))
}

#[derive(Debug, Deserialize)]
struct CandidatesResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    location: CandidateLocation,
    #[serde(default)]
    score: f64,
}

/// `x` is longitude, `y` latitude.
#[derive(Debug, Deserialize)]
struct CandidateLocation {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    message: String,
}
