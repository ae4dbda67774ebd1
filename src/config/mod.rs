use crate::error::AppError;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub port: u16,
    pub mongodb: MongoConfig,
    pub jwt: JwtConfig,
    pub geocoder: GeocoderConfig,
    pub smtp: SmtpConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_days: i64,
}

/// Distance unit used for radius searches. The angular radius handed to the
/// store is `distance / earth_radius(unit)`, so the unit of the incoming
/// distance and this setting must agree.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn earth_radius(&self) -> f64 {
        match self {
            DistanceUnit::Miles => 3963.0,
            DistanceUnit::Kilometers => 6378.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub units: DistanceUnit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub reset_url_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub path: String,
    pub max_file_size: u64,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        Ok(ServiceConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("bootcamp-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("5000"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("bootcamp_db"), is_prod)?,
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET", Some("dev-only-secret"), is_prod)?,
                expiry_days: get_env("JWT_EXPIRY_DAYS", Some("30"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
            geocoder: GeocoderConfig {
                base_url: get_env(
                    "GEOCODER_BASE_URL",
                    Some("https://nominatim.openstreetmap.org"),
                    is_prod,
                )?,
                user_agent: get_env("GEOCODER_USER_AGENT", Some("bootcamp-service"), is_prod)?,
                units: get_env("GEOCODER_UNITS", Some("kilometers"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                user: get_env("SMTP_USER", Some("noreply@bootcamp.dev"), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@bootcamp.dev"), is_prod)?,
                reset_url_base: get_env(
                    "RESET_URL_BASE",
                    Some("http://localhost:5000/api/v1/auth/resetpassword"),
                    is_prod,
                )?,
            },
            uploads: UploadConfig {
                path: get_env("FILE_UPLOAD_PATH", Some("public/uploads"), is_prod)?,
                max_file_size: get_env("MAX_FILE_UPLOAD", Some("1000000"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
        })
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mi" | "miles" => Ok(DistanceUnit::Miles),
            "km" | "kilometers" => Ok(DistanceUnit::Kilometers),
            _ => Err(format!("Invalid distance unit: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earth_radius_matches_unit() {
        assert_eq!(DistanceUnit::Kilometers.earth_radius(), 6378.0);
        assert_eq!(DistanceUnit::Miles.earth_radius(), 3963.0);
    }

    #[test]
    fn distance_unit_parses_short_and_long_forms() {
        assert_eq!("km".parse::<DistanceUnit>(), Ok(DistanceUnit::Kilometers));
        assert_eq!("Miles".parse::<DistanceUnit>(), Ok(DistanceUnit::Miles));
        assert!("furlongs".parse::<DistanceUnit>().is_err());
    }
}
