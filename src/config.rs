use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::models::geo::GeoPoint;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub api_base_url: String,
    pub api_auth_token: Option<String>,
    pub route_timeout_ms: u64,
    pub location_timeout_ms: u64,
    pub default_origin_lat: f64,
    pub default_origin_lon: f64,
    pub completion_rating: f64,
    pub command_queue_size: usize,
    pub event_buffer_size: usize,
    pub location_feed_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let config = Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            api_base_url: env::var("API_BASE_URL").unwrap_or(defaults.api_base_url),
            api_auth_token: env::var("API_AUTH_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            route_timeout_ms: parse_or_default("ROUTE_TIMEOUT_MS", defaults.route_timeout_ms)?,
            location_timeout_ms: parse_or_default(
                "LOCATION_TIMEOUT_MS",
                defaults.location_timeout_ms,
            )?,
            default_origin_lat: parse_or_default("DEFAULT_ORIGIN_LAT", defaults.default_origin_lat)?,
            default_origin_lon: parse_or_default("DEFAULT_ORIGIN_LON", defaults.default_origin_lon)?,
            completion_rating: parse_or_default("COMPLETION_RATING", defaults.completion_rating)?,
            command_queue_size: parse_or_default("COMMAND_QUEUE_SIZE", defaults.command_queue_size)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            location_feed_size: parse_or_default("LOCATION_FEED_SIZE", defaults.location_feed_size)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.route_timeout_ms == 0 {
            return Err(AppError::Internal("ROUTE_TIMEOUT_MS must be > 0".to_string()));
        }
        if self.location_timeout_ms == 0 {
            return Err(AppError::Internal("LOCATION_TIMEOUT_MS must be > 0".to_string()));
        }
        self.default_origin()?;
        Ok(())
    }

    /// Origin reported while no real location fix has arrived yet.
    pub fn default_origin(&self) -> Result<GeoPoint, AppError> {
        GeoPoint::try_new(self.default_origin_lat, self.default_origin_lon)
            .map_err(|err| AppError::Internal(format!("invalid default origin: {err}")))
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_millis(self.route_timeout_ms)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            api_base_url: "http://localhost:5000/api".to_string(),
            api_auth_token: None,
            route_timeout_ms: 4000,
            location_timeout_ms: 5000,
            default_origin_lat: 55.7536,
            default_origin_lon: 37.6201,
            completion_rating: 5.0,
            command_queue_size: 64,
            event_buffer_size: 1024,
            location_feed_size: 256,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::error::AppError;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let route = Config {
            route_timeout_ms: 0,
            ..Config::default()
        };
        assert!(matches!(route.validate(), Err(AppError::Internal(_))));

        let location = Config {
            location_timeout_ms: 0,
            ..Config::default()
        };
        assert!(matches!(location.validate(), Err(AppError::Internal(_))));
    }

    #[test]
    fn out_of_range_default_origin_is_rejected() {
        let config = Config {
            default_origin_lat: 91.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Internal(_))));
    }
}
