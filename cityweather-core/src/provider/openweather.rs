use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

use crate::{
    config::OpenWeatherConfig,
    model::{Coordinates, DailySample, Forecast, HourlySample, TemperatureRange, WeatherIcon},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_API_KEY_ENV: &str = "OPENWEATHER_API_ID";

/// Blocks of the One Call response the app never shows.
const EXCLUDE: &str = "minutely,current,alerts";
const UNITS: &str = "imperial";

pub const HOURLY_LIMIT: usize = 12;
pub const DAILY_LIMIT: usize = 7;

/// Client for the OpenWeather One Call 3.0 API.
#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key_env: String,
    fallback_key: Option<String>,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(
        api_key_env: impl Into<String>,
        fallback_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key_env: api_key_env.into(),
            fallback_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(cfg: &OpenWeatherConfig) -> Self {
        Self::new(cfg.api_key_env.clone(), cfg.api_key.clone(), cfg.base_url.clone())
    }

    fn api_key(&self) -> Result<String> {
        resolve_api_key(&self.api_key_env, self.fallback_key.as_deref(), |name| {
            std::env::var(name).ok()
        })
    }

    async fn fetch_onecall(&self, at: Coordinates) -> Result<OwOneCallResponse> {
        let api_key = self.api_key()?;
        let url = format!("{}/data/3.0/onecall", self.base_url);

        tracing::debug!(lat = at.lat, lon = at.lon, "requesting OpenWeather forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lon", at.lon.to_string()),
                ("exclude", EXCLUDE.to_string()),
                ("units", UNITS.to_string()),
                ("appid", api_key),
            ])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to OpenWeather (One Call)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read OpenWeather One Call response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather One Call request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).context("Failed to parse OpenWeather One Call JSON")
    }
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("api_key_env", &self.api_key_env)
            .field("fallback_key", &self.fallback_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    icon: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    humidity: u8,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    #[serde(default)]
    summary: String,
    temp: OwDailyTemp,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    #[serde(default)]
    timezone_offset: i32,
    hourly: Vec<OwHourly>,
    daily: Vec<OwDaily>,
}

impl From<OwWeather> for WeatherIcon {
    fn from(w: OwWeather) -> Self {
        Self { icon: w.icon, description: w.description }
    }
}

/// Only the first icon of a slot is ever displayed.
fn first_icon(weather: Vec<OwWeather>) -> Option<WeatherIcon> {
    weather.into_iter().next().map(WeatherIcon::from)
}

fn reshape(raw: OwOneCallResponse) -> Forecast {
    let hourly = raw
        .hourly
        .into_iter()
        .take(HOURLY_LIMIT)
        .map(|h| HourlySample {
            timestamp: h.dt,
            temperature: h.temp,
            humidity: h.humidity,
            icon: first_icon(h.weather),
        })
        .collect();

    let daily = raw
        .daily
        .into_iter()
        .take(DAILY_LIMIT)
        .map(|d| DailySample {
            timestamp: d.dt,
            summary: d.summary,
            temperature: TemperatureRange { min: d.temp.min, max: d.temp.max },
            icon: first_icon(d.weather),
        })
        .collect();

    Forecast { timezone_offset: raw.timezone_offset, hourly, daily }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn forecast(&self, at: Coordinates) -> Result<Forecast> {
        let raw = self.fetch_onecall(at).await?;
        Ok(reshape(raw))
    }
}

/// Pick the API key: the environment variable when set and non-empty,
/// otherwise the key stored in the config file.
fn resolve_api_key(
    env_name: &str,
    fallback: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    if let Some(key) = lookup(env_name).filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }

    fallback
        .filter(|k| !k.trim().is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            anyhow!(
                "No OpenWeather API key configured.\n\
                 Hint: set {env_name} or run `cityweather configure <api-key>`."
            )
        })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    const UNSET_ENV: &str = "CITYWEATHER_TEST_UNSET_OPENWEATHER_KEY";

    fn icon(code: &str, description: &str) -> Value {
        json!({ "id": 800, "main": "Clear", "icon": code, "description": description })
    }

    fn onecall_body(hours: usize, days: usize) -> Value {
        let hourly: Vec<Value> = (0..hours)
            .map(|i| {
                let dt = 1725807600 + 3600 * i as i64;
                json!({
                    "dt": dt,
                    "temp": 85.62,
                    "feels_like": 89.08,
                    "humidity": 56,
                    "weather": [icon("01d", "clear sky"), icon("10d", "light rain")],
                    "pop": 0
                })
            })
            .collect();

        let daily: Vec<Value> = (0..days)
            .map(|i| {
                let dt = 1725807600 + 86400 * i as i64;
                json!({
                    "dt": dt,
                    "summary": "Expect a day of partly cloudy with clear spells",
                    "temp": { "day": 84.0, "min": 70.3, "max": 88.1, "night": 72.0 },
                    "weather": [icon("02d", "few clouds"), icon("01d", "clear sky")]
                })
            })
            .collect();

        json!({
            "lat": -22.9028,
            "lon": -43.2075,
            "timezone": "America/Sao_Paulo",
            "timezone_offset": -10800,
            "hourly": hourly,
            "daily": daily
        })
    }

    fn provider_for(server: &MockServer) -> OpenWeatherProvider {
        OpenWeatherProvider::new(UNSET_ENV, Some("KEY".to_string()), server.uri())
    }

    const RIO: Coordinates = Coordinates { lat: -22.9028, lon: -43.2075 };

    #[test]
    fn reshape_truncates_to_display_windows() {
        for (hours, days) in [(48, 8), (12, 7), (3, 2), (0, 0)] {
            let raw: OwOneCallResponse = serde_json::from_value(onecall_body(hours, days)).unwrap();
            let forecast = reshape(raw);

            assert_eq!(forecast.hourly.len(), hours.min(HOURLY_LIMIT));
            assert_eq!(forecast.daily.len(), days.min(DAILY_LIMIT));
        }
    }

    #[test]
    fn reshape_keeps_only_the_first_icon() {
        let raw: OwOneCallResponse = serde_json::from_value(onecall_body(2, 2)).unwrap();
        let forecast = reshape(raw);

        let hour = &forecast.hourly[0];
        assert_eq!(hour.timestamp, 1725807600);
        assert_eq!(hour.temperature, 85.62);
        assert_eq!(hour.humidity, 56);
        assert_eq!(
            hour.icon,
            Some(WeatherIcon { icon: "01d".into(), description: "clear sky".into() })
        );

        let day = &forecast.daily[1];
        assert_eq!(day.timestamp, 1725807600 + 86400);
        assert_eq!(day.temperature, TemperatureRange { min: 70.3, max: 88.1 });
        assert_eq!(day.icon.as_ref().map(|i| i.icon.as_str()), Some("02d"));
        assert_eq!(forecast.timezone_offset, -10800);
    }

    #[test]
    fn reshape_tolerates_slots_without_icons() {
        let raw: OwOneCallResponse = serde_json::from_value(json!({
            "hourly": [{ "dt": 1, "temp": 50.0, "humidity": 10, "weather": [] }],
            "daily": [{ "dt": 1, "temp": { "min": 1.0, "max": 2.0 } }]
        }))
        .unwrap();
        let forecast = reshape(raw);

        assert_eq!(forecast.hourly[0].icon, None);
        assert_eq!(forecast.daily[0].icon, None);
        assert_eq!(forecast.daily[0].summary, "");
        assert_eq!(forecast.timezone_offset, 0);
    }

    #[tokio::test]
    async fn forecast_sends_expected_query_and_reshapes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall"))
            .and(query_param("lat", "-22.9028"))
            .and(query_param("lon", "-43.2075"))
            .and(query_param("exclude", "minutely,current,alerts"))
            .and(query_param("units", "imperial"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(onecall_body(48, 8)))
            .expect(1)
            .mount(&server)
            .await;

        let forecast = provider_for(&server).forecast(RIO).await.unwrap();

        assert_eq!(forecast.hourly.len(), 12);
        assert_eq!(forecast.daily.len(), 7);
    }

    #[tokio::test]
    async fn upstream_error_status_is_propagated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider_for(&server).forecast(RIO).await.unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("failed with status 500"), "{msg}");
        assert!(msg.contains("internal error"), "{msg}");
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"hourly\": 12}"))
            .mount(&server)
            .await;

        let err = provider_for(&server).forecast(RIO).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse OpenWeather One Call JSON"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(onecall_body(1, 1)))
            .expect(0)
            .mount(&server)
            .await;

        let provider = OpenWeatherProvider::new(UNSET_ENV, None, server.uri());
        let err = provider.forecast(RIO).await.unwrap_err();

        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[tokio::test]
    async fn transport_errors_do_not_expose_the_api_key() {
        let provider =
            OpenWeatherProvider::new(UNSET_ENV, Some("SECRETKEY123".into()), "http://127.0.0.1:1");
        let err = provider.forecast(Coordinates { lat: 1.0, lon: 2.0 }).await.unwrap_err();
        let msg = format!("{err:#}");

        assert!(msg.contains("Failed to send request to OpenWeather"), "{msg}");
        assert!(!msg.contains("SECRETKEY123"), "{msg}");
    }

    #[test]
    fn env_key_wins_over_config_key() {
        let key = resolve_api_key("OW", Some("from-config"), |_| Some("from-env".into())).unwrap();
        assert_eq!(key, "from-env");
    }

    #[test]
    fn blank_env_key_falls_back_to_config() {
        let key = resolve_api_key("OW", Some("from-config"), |_| Some("  ".into())).unwrap();
        assert_eq!(key, "from-config");

        let key = resolve_api_key("OW", Some("from-config"), |_| None).unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn missing_key_error_names_the_variable() {
        let err = resolve_api_key("MY_KEY_VAR", None, |_| None).unwrap_err();
        assert!(err.to_string().contains("MY_KEY_VAR"));
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let provider = OpenWeatherProvider::new("OW", Some("secret".into()), "http://localhost/");
        let debug = format!("{provider:?}");

        assert!(!debug.contains("secret"));
        assert!(debug.contains("http://localhost\""));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);

        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
