use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// GeoJSON Point with the geocoder's best-match address details, indexed
/// 2dsphere for radius containment queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type")]
    pub type_: String,
    /// `[longitude, latitude]` per GeoJSON ordering.
    pub coordinates: [f64; 2],
    pub formatted_address: Option<String>,
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
}

impl Location {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self {
            type_: "Point".to_string(),
            coordinates: [longitude, latitude],
            formatted_address: None,
            city: None,
            zipcode: None,
            country: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bootcamp {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: String,
    pub location: Option<Location>,
    pub careers: Vec<String>,
    /// Mean review rating, maintained by the review handlers.
    pub average_rating: Option<f64>,
    /// Mean course tuition rounded up to the nearest 10, maintained by the
    /// course handlers.
    pub average_cost: Option<f64>,
    pub photo: Option<String>,
    pub housing: bool,
    pub job_assistance: bool,
    pub job_guarantee: bool,
    pub accept_gi: bool,
    /// Owner identity; mutation rights hinge on this.
    pub user: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Bootcamp {
    pub fn new(
        name: String,
        description: String,
        address: String,
        careers: Vec<String>,
        owner_id: String,
    ) -> Self {
        let slug = slugify(&name);
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            description,
            website: None,
            phone: None,
            email: None,
            address,
            location: None,
            careers,
            average_rating: None,
            average_cost: None,
            photo: None,
            housing: false,
            job_assistance: false,
            job_guarantee: false,
            accept_gi: false,
            user: owner_id,
            created_at: Utc::now(),
        }
    }
}

pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_non_alphanumerics() {
        assert_eq!(slugify("Devworks Bootcamp"), "devworks-bootcamp");
        assert_eq!(slugify("  ModernTech -- 2024!  "), "moderntech-2024");
    }

    #[test]
    fn location_point_is_lng_lat() {
        let loc = Location::point(-75.0, 40.0);
        assert_eq!(loc.coordinates, [-75.0, 40.0]);
        assert_eq!(loc.type_, "Point");
    }
}
