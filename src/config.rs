use reqwest::Url;
use thiserror::Error;

use crate::weather;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:weatherbot.db?mode=rwc";
pub const DEFAULT_CITY: &str = "London";

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid WEATHER_ENDPOINT {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Settings read from the environment. The bot token is picked up by
/// `Bot::from_env` and is not part of this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub default_city: String,
    pub weather_endpoint: Url,
    pub weather_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let endpoint = get("WEATHER_ENDPOINT").unwrap_or_else(|| weather::DEFAULT_ENDPOINT.to_string());
        let weather_endpoint = Url::parse(&endpoint).map_err(|e| Error::InvalidEndpoint {
            url: endpoint.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            default_city: get("DEFAULT_CITY")
                .map(|city| city.trim().to_string())
                .unwrap_or_else(|| DEFAULT_CITY.to_string()),
            weather_endpoint,
            weather_api_key: get("WEATHER_API_KEY"),
        })
    }
}
