//! Core library for the `cityweather` web app.
//!
//! This crate defines:
//! - The read-only city directory with lookup and name search
//! - Configuration & credentials handling
//! - Abstraction over the forecast provider (OpenWeather One Call)
//! - Page-level request logic shared by the HTTP frontend

pub mod city;
pub mod collate;
pub mod config;
pub mod model;
pub mod pages;
pub mod provider;

pub use city::{CityDirectory, CityRecord, DirectoryError};
pub use config::{Config, OpenWeatherConfig, ServerConfig};
pub use model::{Coordinates, DailySample, Forecast, HourlySample, TemperatureRange, WeatherIcon};
pub use pages::{CityForecast, HomeOutcome, PageError};
pub use provider::WeatherProvider;
