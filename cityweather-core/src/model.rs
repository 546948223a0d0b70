use serde::{Deserialize, Serialize};

use crate::city::CityRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl From<&CityRecord> for Coordinates {
    fn from(city: &CityRecord) -> Self {
        Self { lat: city.lat, lon: city.lon }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherIcon {
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    /// Epoch seconds, UTC.
    pub timestamp: i64,
    pub temperature: f64,
    pub humidity: u8,
    pub icon: Option<WeatherIcon>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySample {
    /// Epoch seconds, UTC.
    pub timestamp: i64,
    pub summary: String,
    pub temperature: TemperatureRange,
    pub icon: Option<WeatherIcon>,
}

/// Display-oriented forecast built fresh for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Seconds east of UTC at the forecast location.
    pub timezone_offset: i32,
    pub hourly: Vec<HourlySample>,
    pub daily: Vec<DailySample>,
}
