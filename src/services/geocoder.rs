//! Geocoding and the geospatial radius computation. The external lookup is a
//! collaborator behind the `Geocoder` trait; the angular-radius arithmetic is
//! local and unit-explicit.

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use serde::Deserialize;

use crate::config::{DistanceUnit, GeocoderConfig};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-form location (postal code or street address) to a
    /// best-match coordinate.
    async fn geocode(&self, location: &str) -> Result<GeoPoint, AppError>;
}

/// Distance as a fraction of Earth's radius, for spherical containment
/// queries. The unit of `distance` must match `unit`.
pub fn angular_radius(distance: f64, unit: DistanceUnit) -> f64 {
    distance / unit.earth_radius()
}

/// Reject a non-positive (or NaN) search distance before it reaches the
/// store, which errors on negative `$centerSphere` radii.
pub fn validate_distance(distance: f64) -> Result<f64, AppError> {
    if distance > 0.0 {
        Ok(distance)
    } else {
        Err(AppError::BadRequest(anyhow::anyhow!(
            "Distance must be a positive number"
        )))
    }
}

/// `$geoWithin $centerSphere` filter with GeoJSON `[lng, lat]` center
/// ordering.
pub fn radius_filter(center: GeoPoint, radius: f64) -> Document {
    doc! {
        "location": {
            "$geoWithin": {
                "$centerSphere": [[center.longitude, center.latitude], radius]
            }
        }
    }
}

/// Nominatim-style HTTP geocoder: `GET {base}/search?q=…&format=json`
/// returning an array of candidate matches, best first.
#[derive(Clone)]
pub struct HttpGeocoder {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeCandidate {
    lat: String,
    lon: String,
}

impl HttpGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, location: &str) -> Result<GeoPoint, AppError> {
        let url = format!("{}/search", self.base_url);

        let candidates: Vec<GeocodeCandidate> = self
            .http
            .get(&url)
            .query(&[("q", location), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::BadGateway(format!("geocoder request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::BadGateway(format!("geocoder returned an error: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::BadGateway(format!("geocoder response unreadable: {}", e)))?;

        let best = candidates.first().ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Could not resolve location '{}'", location))
        })?;

        let latitude = best.lat.parse().map_err(|_| {
            AppError::BadGateway(format!("geocoder returned malformed latitude '{}'", best.lat))
        })?;
        let longitude = best.lon.parse().map_err(|_| {
            AppError::BadGateway(format!("geocoder returned malformed longitude '{}'", best.lon))
        })?;

        tracing::debug!(location = %location, latitude, longitude, "Geocoded location");

        Ok(GeoPoint {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    #[test]
    fn angular_radius_divides_by_earth_radius() {
        assert_eq!(angular_radius(100.0, DistanceUnit::Kilometers), 100.0 / 6378.0);
        assert_eq!(angular_radius(100.0, DistanceUnit::Miles), 100.0 / 3963.0);
    }

    #[test]
    fn non_positive_distances_are_rejected() {
        assert!(validate_distance(100.0).is_ok());
        assert!(validate_distance(0.0).is_err());
        assert!(validate_distance(-5.0).is_err());
        assert!(validate_distance(f64::NAN).is_err());
    }

    #[test]
    fn radius_filter_centers_on_lng_lat() {
        let center = GeoPoint {
            latitude: 40.0,
            longitude: -75.0,
        };
        let radius = angular_radius(100.0, DistanceUnit::Kilometers);
        let filter = radius_filter(center, radius);

        let sphere = filter
            .get_document("location")
            .unwrap()
            .get_document("$geoWithin")
            .unwrap()
            .get_array("$centerSphere")
            .unwrap();

        assert_eq!(
            sphere[0],
            Bson::Array(vec![Bson::Double(-75.0), Bson::Double(40.0)])
        );
        assert_eq!(sphere[1], Bson::Double(100.0 / 6378.0));
    }
}
