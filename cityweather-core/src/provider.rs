use crate::{Config, Coordinates, Forecast, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn forecast(&self, at: Coordinates) -> anyhow::Result<Forecast>;
}

/// Construct the OpenWeather provider from config.
///
/// The API key is not checked here; it is resolved on every request.
pub fn provider_from_config(config: &Config) -> Box<dyn WeatherProvider> {
    Box::new(OpenWeatherProvider::from_config(&config.openweather))
}
