//! Tomorrow's forecast from the OpenWeather One Call 3.0 endpoint.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherSmsError},
    http::{join_url, send_json},
    model::{DailyForecast, HourlyPrecipitationSample, Location},
};

const PROVIDER: &str = "OpenWeather One Call";

/// Position of "tomorrow" in the `daily` array; index 0 is today.
const TOMORROW_INDEX: usize = 1;

#[derive(Debug, Clone)]
pub struct ForecastFetcher {
    base_url: String,
    http: Client,
    include_hourly: bool,
}

#[derive(Debug, Deserialize)]
struct OwTemp {
    day: f64,
    min: f64,
    max: f64,
    night: f64,
    eve: f64,
    morn: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    temp: OwTemp,
    humidity: u8,
    wind_speed: f64,
    weather: Vec<OwWeather>,
    pop: f64,
    uvi: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwRain {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    #[serde(default)]
    pop: f64,
    #[serde(default)]
    rain: Option<OwRain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    daily: Vec<OwDaily>,
    #[serde(default)]
    hourly: Vec<OwHourly>,
}

impl ForecastFetcher {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http, include_hourly: true }
    }

    /// Request the hourly section as well (needed for the rain narrative).
    pub fn with_hourly(mut self, include_hourly: bool) -> Self {
        self.include_hourly = include_hourly;
        self
    }

    fn exclude(&self) -> &'static str {
        if self.include_hourly { "minutely,alerts" } else { "minutely,hourly,alerts" }
    }

    pub async fn fetch_tomorrow<Tz: TimeZone>(
        &self,
        location: &Location,
        api_key: &str,
        reference_now: &DateTime<Tz>,
    ) -> Result<DailyForecast> {
        if api_key.trim().is_empty() {
            return Err(WeatherSmsError::config(
                "OPENWEATHER_API_KEY environment variable not set",
            ));
        }

        let req = self.http.get(join_url(&self.base_url, "data/3.0/onecall")).query(&[
            ("lat", location.latitude.to_string().as_str()),
            ("lon", location.longitude.to_string().as_str()),
            ("exclude", self.exclude()),
            ("appid", api_key),
            ("units", "imperial"),
        ]);

        let parsed: OwOneCallResponse = send_json(req, PROVIDER).await?;

        tomorrow_from_response(parsed, location, reference_now)
    }
}

fn tomorrow_from_response<Tz: TimeZone>(
    parsed: OwOneCallResponse,
    location: &Location,
    reference_now: &DateTime<Tz>,
) -> Result<DailyForecast> {
    let target_date = tomorrow_of(reference_now)?;

    let hourly_samples = parsed
        .hourly
        .into_iter()
        .filter_map(|h| {
            let timestamp = DateTime::<Utc>::from_timestamp(h.dt, 0)?;
            Some(HourlyPrecipitationSample {
                timestamp,
                probability_percent: percent(h.pop),
                amount_mm: h.rain.map(|r| r.one_hour.max(0.0)).unwrap_or(0.0),
                condition_label: h
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| w.description)
                    .unwrap_or_default(),
            })
        })
        .collect();
    let hourly_samples = samples_on_date(hourly_samples, target_date, &reference_now.timezone());

    let day_count = parsed.daily.len();
    let tomorrow = parsed.daily.into_iter().nth(TOMORROW_INDEX).ok_or_else(|| {
        WeatherSmsError::format(
            PROVIDER,
            format!("daily forecast has {day_count} entries; tomorrow is missing"),
        )
    })?;

    let description = tomorrow
        .weather
        .first()
        .map(|w| title_case(&w.description))
        .ok_or_else(|| WeatherSmsError::format(PROVIDER, "daily entry has no weather description"))?;

    Ok(DailyForecast {
        location_name: location.display_name.clone(),
        date_label: target_date.format("%A, %B %d").to_string(),
        high_f: tomorrow.temp.max.round() as i32,
        low_f: tomorrow.temp.min.round() as i32,
        morning_f: tomorrow.temp.morn.round() as i32,
        day_f: tomorrow.temp.day.round() as i32,
        evening_f: tomorrow.temp.eve.round() as i32,
        night_f: tomorrow.temp.night.round() as i32,
        humidity_percent: tomorrow.humidity,
        description,
        wind_speed_mph: tomorrow.wind_speed,
        precipitation_probability_percent: percent(tomorrow.pop),
        uv_index: tomorrow.uvi.round() as i32,
        hourly_samples,
        rain_narrative: None,
    })
}

/// The calendar day after `now`, in `now`'s own time zone.
pub fn tomorrow_of<Tz: TimeZone>(now: &DateTime<Tz>) -> Result<NaiveDate> {
    now.date_naive()
        .checked_add_days(Days::new(1))
        .ok_or_else(|| WeatherSmsError::config("reference date is out of range"))
}

/// Keep the samples whose local date in `tz` is `date`, preserving order.
pub fn samples_on_date<Tz: TimeZone>(
    samples: Vec<HourlyPrecipitationSample>,
    date: NaiveDate,
    tz: &Tz,
) -> Vec<HourlyPrecipitationSample> {
    samples
        .into_iter()
        .filter(|s| s.timestamp.with_timezone(tz).date_naive() == date)
        .collect()
}

/// Provider fraction (0..1) to a rounded 0..100 percentage.
fn percent(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use serde_json::json;

    fn location() -> Location {
        Location { latitude: 41.11, longitude: -74.04, display_name: "Spring Valley".into() }
    }

    fn eastern() -> FixedOffset {
        FixedOffset::west_opt(4 * 3600).unwrap()
    }

    fn daily(max: f64, min: f64, pop: f64, uvi: f64) -> serde_json::Value {
        json!({
            "temp": { "day": 72.4, "min": min, "max": max, "night": 60.5, "eve": 68.6, "morn": 59.2 },
            "humidity": 64,
            "wind_speed": 8.3,
            "weather": [{ "description": "light rain" }],
            "pop": pop,
            "uvi": uvi
        })
    }

    fn parse(v: serde_json::Value) -> OwOneCallResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn picks_index_one_and_rounds() {
        let now = eastern().with_ymd_and_hms(2025, 6, 9, 18, 0, 0).unwrap();
        let resp = parse(json!({ "daily": [daily(90.0, 70.0, 0.0, 9.0), daily(75.2, 57.6, 0.4, 6.6)] }));

        let f = tomorrow_from_response(resp, &location(), &now).unwrap();

        assert_eq!(f.location_name, "Spring Valley");
        assert_eq!(f.date_label, "Tuesday, June 10");
        assert_eq!((f.high_f, f.low_f), (75, 58));
        assert_eq!((f.morning_f, f.day_f, f.evening_f, f.night_f), (59, 72, 69, 61));
        assert_eq!(f.precipitation_probability_percent, 40);
        assert_eq!(f.uv_index, 7);
        assert_eq!(f.description, "Light Rain");
        assert_eq!(f.rain_narrative, None);
    }

    #[test]
    fn short_daily_array_is_a_format_error() {
        let now = eastern().with_ymd_and_hms(2025, 6, 9, 18, 0, 0).unwrap();
        for days in [json!([]), json!([daily(70.0, 50.0, 0.0, 1.0)])] {
            let err = tomorrow_from_response(parse(json!({ "daily": days })), &location(), &now)
                .unwrap_err();
            assert!(matches!(err, WeatherSmsError::UpstreamFormat { .. }), "{err}");
        }
    }

    #[test]
    fn hourly_window_keeps_only_tomorrow_in_order() {
        let tz = eastern();
        let now = tz.with_ymd_and_hms(2025, 6, 9, 18, 0, 0).unwrap();
        let ts = |d, h, m, s| tz.with_ymd_and_hms(2025, 6, d, h, m, s).unwrap().timestamp();

        let resp = parse(json!({
            "daily": [daily(1.0, 1.0, 0.0, 0.0), daily(1.0, 1.0, 0.0, 0.0)],
            "hourly": [
                { "dt": ts(9, 23, 59, 59), "pop": 0.9, "rain": { "1h": 2.0 } },
                { "dt": ts(10, 0, 0, 0), "pop": 0.5, "rain": { "1h": 0.3 }, "weather": [{ "description": "light rain" }] },
                { "dt": ts(10, 13, 0, 0) },
                { "dt": ts(10, 23, 59, 59), "pop": 0.25 },
                { "dt": ts(11, 0, 0, 0), "pop": 1.0, "rain": { "1h": 5.0 } }
            ]
        }));

        let f = tomorrow_from_response(resp, &location(), &now).unwrap();

        let kept: Vec<i64> = f.hourly_samples.iter().map(|s| s.timestamp.timestamp()).collect();
        assert_eq!(kept, vec![ts(10, 0, 0, 0), ts(10, 13, 0, 0), ts(10, 23, 59, 59)]);

        assert_eq!(f.hourly_samples[0].probability_percent, 50);
        assert_eq!(f.hourly_samples[0].amount_mm, 0.3);
        assert_eq!(f.hourly_samples[0].condition_label, "light rain");
        // Missing precipitation fields default to zero.
        assert_eq!(f.hourly_samples[1].probability_percent, 0);
        assert_eq!(f.hourly_samples[1].amount_mm, 0.0);
        assert_eq!(f.hourly_samples[2].probability_percent, 25);
    }

    #[test]
    fn window_follows_reference_time_zone() {
        // 02:00 UTC on the 11th is still the 10th in UTC-4.
        let sample = HourlyPrecipitationSample {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 11, 2, 0, 0).unwrap(),
            probability_percent: 10,
            amount_mm: 0.1,
            condition_label: String::new(),
        };
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

        assert_eq!(samples_on_date(vec![sample.clone()], date, &eastern()).len(), 1);
        assert!(samples_on_date(vec![sample], date, &Utc).is_empty());
    }

    #[test]
    fn missing_daily_field_is_a_format_error_at_decode() {
        let err = serde_json::from_value::<OwOneCallResponse>(json!({ "daily": [{ "humidity": 1 }] }));
        assert!(err.is_err());
    }

    #[test]
    fn exclusion_list_depends_on_hourly() {
        let fetcher = ForecastFetcher::new(Client::new(), "http://localhost");
        assert_eq!(fetcher.exclude(), "minutely,alerts");
        assert_eq!(fetcher.with_hourly(false).exclude(), "minutely,hourly,alerts");
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("scattered clouds"), "Scattered Clouds");
        assert_eq!(title_case("THUNDERSTORM with rain"), "Thunderstorm With Rain");
    }

    #[test]
    fn percent_clamps_and_rounds() {
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(0.424), 42);
        assert_eq!(percent(1.2), 100);
    }
}
