//! Request-level logic behind each page, independent of the HTTP framework.
//!
//! Every function here is a plain mapping from request parameters to the
//! data a page needs; rendering and status codes live in the web crate.

use thiserror::Error;

use crate::{
    city::{CityDirectory, CityRecord},
    model::{Coordinates, Forecast},
    provider::WeatherProvider,
};

#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid city id {0:?}")]
    InvalidInput(String),

    #[error("no city with id {0}")]
    NotFound(u64),

    #[error("forecast provider failed")]
    Upstream(#[source] anyhow::Error),
}

#[derive(Debug, PartialEq)]
pub enum HomeOutcome<'a> {
    /// No search typed: send the user to this city's forecast.
    Redirect(u64),
    Results { query: String, cities: Vec<&'a CityRecord> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityForecast {
    pub city: CityRecord,
    pub forecast: Forecast,
}

pub fn home<'a>(
    directory: &'a CityDirectory,
    default_city_id: u64,
    query: Option<&str>,
) -> HomeOutcome<'a> {
    match query.and_then(|q| directory.search(q).map(|cities| (q, cities))) {
        Some((q, cities)) => HomeOutcome::Results { query: q.trim().to_string(), cities },
        None => HomeOutcome::Redirect(default_city_id),
    }
}

/// Ids are unsigned, so a signed value such as `-1` is invalid input, not an unknown city.
pub fn parse_city_id(raw: &str) -> Result<u64, PageError> {
    raw.parse().map_err(|_| PageError::InvalidInput(raw.to_string()))
}

pub async fn city_forecast(
    directory: &CityDirectory,
    provider: &dyn WeatherProvider,
    raw_id: &str,
) -> Result<CityForecast, PageError> {
    let city_id = parse_city_id(raw_id)?;
    let city = directory.lookup(city_id).ok_or(PageError::NotFound(city_id))?;

    let forecast = provider
        .forecast(Coordinates::from(city))
        .await
        .map_err(PageError::Upstream)?;

    Ok(CityForecast { city: city.clone(), forecast })
}
