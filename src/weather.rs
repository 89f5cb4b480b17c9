use std::time::Duration;

use futures_core::future::BoxFuture;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to reach weather provider: {0}")]
    Request(#[from] reqwest::Error),
    #[error("weather provider answered with status {0}")]
    Status(StatusCode),
    #[error("invalid weather data: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weather {
    pub description: Option<String>,
    pub temperature_celsius: f64,
}

impl Weather {
    fn from_response(response: WeatherResponse) -> Self {
        Self {
            description: response.weather.into_iter().next().map(|c| c.description),
            temperature_celsius: kelvin_to_celsius(response.main.temp),
        }
    }
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    ((kelvin - KELVIN_OFFSET) * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: Main,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: f64,
}

pub trait WeatherSource: Send + Sync {
    fn fetch_weather<'a>(
        &'a self,
        city: &'a str,
        api_key: &'a str,
    ) -> BoxFuture<'a, Result<Weather, Error>>;
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl WeatherClient {
    pub fn new(endpoint: Url) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub async fn fetch_weather(&self, city: &str, api_key: &str) -> Result<Weather, Error> {
        log::debug!("Fetch weather for {city}");
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", city), ("appid", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }

        let body = response.text().await?;
        parse_weather(&body)
    }
}

impl WeatherSource for WeatherClient {
    fn fetch_weather<'a>(
        &'a self,
        city: &'a str,
        api_key: &'a str,
    ) -> BoxFuture<'a, Result<Weather, Error>> {
        Box::pin(WeatherClient::fetch_weather(self, city, api_key))
    }
}

fn parse_weather(body: &str) -> Result<Weather, Error> {
    let response: WeatherResponse = serde_json::from_str(body)?;
    Ok(Weather::from_response(response))
}
