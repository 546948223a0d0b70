//! HTML rendering for every page.
//!
//! Markup is assembled with `write!` into a `String`. Every piece of text
//! that comes from the directory, the provider or the request goes through
//! [`escape`].

use std::fmt::Write;

use axum::http::StatusCode;
use chrono::{DateTime, FixedOffset};
use cityweather_core::{CityForecast, CityRecord, DailySample, HourlySample, WeatherIcon};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Debounced search-as-you-type. The first search adds a history entry,
/// later keystrokes replace it.
const SEARCH_SCRIPT: &str = r#"<script>
(function () {
  var form = document.getElementById("search-form");
  var input = document.getElementById("q");
  var timer = null;
  var searching = new URLSearchParams(location.search).has("q");
  input.addEventListener("input", function () {
    clearTimeout(timer);
    timer = setTimeout(function () {
      var url = "/?q=" + encodeURIComponent(input.value);
      if (searching) { location.replace(url); } else { location.assign(url); }
    }, 300);
  });
  form.addEventListener("submit", function () { clearTimeout(timer); });
})();
</script>"#;

const STYLE: &str = r#"<style>
body { margin: 0; font-family: system-ui, sans-serif; background: #f1f5f9; }
header { display: flex; justify-content: space-between; align-items: center; height: 4rem; padding: 0 1.5rem; background: #cbd5e1; }
header h1 { font-size: 1.5rem; font-weight: normal; }
main { max-width: 720px; margin: 0.5rem auto; }
nav { display: grid; grid-template-columns: repeat(3, 1fr); gap: 0.5rem; text-align: center; }
.panel { background: #e2e8f0; padding: 0.5rem; margin-top: 0.75rem; }
.hours { display: flex; overflow-x: auto; }
.hour { display: flex; flex-direction: column; align-items: center; padding: 0.5rem; }
.day { display: flex; justify-content: space-between; align-items: center; }
.muted { color: rgba(0, 0, 0, 0.5); }
.humidity { color: #60a5fa; }
</style>"#;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rounds half up, like the browser's `Math.round`.
fn round_degrees(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn local_time(timestamp: i64, offset_secs: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_secs)?;
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&offset))
}

fn hour_label(timestamp: i64, offset_secs: i32) -> String {
    local_time(timestamp, offset_secs)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_default()
}

fn day_label(timestamp: i64, offset_secs: i32) -> String {
    local_time(timestamp, offset_secs)
        .map(|t| t.format("%a, %b %-d").to_string())
        .unwrap_or_default()
}

fn icon_img(icon: Option<&WeatherIcon>) -> String {
    match icon {
        Some(icon) => format!(
            r#"<img alt="{}" src="{}/{}@2x.png" width="64" height="64">"#,
            escape(&icon.description),
            ICON_BASE_URL,
            escape(&icon.icon),
        ),
        None => String::new(),
    }
}

fn layout(title: &str, featured: &[CityRecord], query: &str, content: &str) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
{STYLE}
</head>
<body>
<header>
<h1>Weather App</h1>
<form id="search-form" role="search" action="/" method="get">
<input type="search" id="q" name="q" placeholder="Search cities..." aria-label="Search cities" value="{}"{}>
</form>
</header>
<main>
<nav>
"#,
        escape(title),
        escape(query),
        if query.is_empty() { "" } else { " autofocus" },
    );

    for city in featured {
        let _ = writeln!(
            html,
            r#"<a href="/city/{}">{}</a>"#,
            city.city_id,
            escape(&city.city_name)
        );
    }

    let _ = write!(html, "</nav>\n{content}\n</main>\n{SEARCH_SCRIPT}\n</body>\n</html>\n");

    html
}

pub fn search_page(featured: &[CityRecord], query: &str, cities: &[&CityRecord]) -> String {
    let mut content = String::from("<section class=\"panel\">\n");

    let _ = writeln!(content, "<h2>Cities matching \u{201c}{}\u{201d}</h2>", escape(query));

    if cities.is_empty() {
        content.push_str("<p class=\"muted\">No cities match.</p>\n");
    } else {
        content.push_str("<ul class=\"results\">\n");
        for city in cities {
            let _ = writeln!(
                content,
                r#"<li><a href="/city/{}">{}</a></li>"#,
                city.city_id,
                escape(&city.display_name())
            );
        }
        content.push_str("</ul>\n");
    }
    content.push_str("</section>");

    layout("Search cities", featured, query, &content)
}

fn hourly_panel(out: &mut String, hours: &[HourlySample], offset: i32) {
    out.push_str("<section class=\"panel\">\n<h3>Next hours</h3>\n<div class=\"hours\">\n");
    for hour in hours {
        let _ = writeln!(
            out,
            r#"<div class="hour"><div>{}&deg;</div><div class="humidity">{}%</div><div>{}</div><div class="muted">{}</div></div>"#,
            round_degrees(hour.temperature),
            hour.humidity,
            icon_img(hour.icon.as_ref()),
            hour_label(hour.timestamp, offset),
        );
    }
    out.push_str("</div>\n</section>\n");
}

fn daily_panel(out: &mut String, days: &[DailySample], offset: i32) {
    out.push_str("<section class=\"panel\">\n<h3>Next days</h3>\n");
    for day in days {
        let _ = writeln!(
            out,
            r#"<div class="day"><div>{}</div><div><strong>{}</strong><div class="muted">{}</div></div><div>{}&deg;&nbsp;{}&deg;</div></div>"#,
            icon_img(day.icon.as_ref()),
            day_label(day.timestamp, offset),
            escape(&day.summary),
            round_degrees(day.temperature.min),
            round_degrees(day.temperature.max),
        );
    }
    out.push_str("</section>\n");
}

pub fn city_page(featured: &[CityRecord], page: &CityForecast) -> String {
    let title = page.city.display_name();
    let offset = page.forecast.timezone_offset;

    let mut content = String::new();
    let _ = writeln!(content, "<h2>{}</h2>", escape(&title));
    hourly_panel(&mut content, &page.forecast.hourly, offset);
    daily_panel(&mut content, &page.forecast.daily, offset);

    layout(&title, featured, "", &content)
}

pub fn error_page(featured: &[CityRecord], status: StatusCode, message: &str) -> String {
    let heading = status.canonical_reason().unwrap_or("Error");
    let content = format!(
        "<section class=\"panel\">\n<h2>{} {}</h2>\n<p>{}</p>\n</section>",
        status.as_u16(),
        escape(heading),
        escape(message),
    );

    layout(heading, featured, "", &content)
}
