use chrono::{DateTime, TimeZone};
use std::fmt::{Display, Write};

use crate::model::DailyForecast;

/// Render the SMS body. The layout is fixed; recipients rely on its shape.
pub fn render<Tz>(forecast: &DailyForecast, rendered_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let f = forecast;
    let sent_at = rendered_at.format("%B %d, %Y at %I:%M %p");

    let mut extras = String::new();
    if f.precipitation_probability_percent > 0 {
        let _ = writeln!(extras, "🌧️ Rain chance: {}%", f.precipitation_probability_percent);
    }
    if let Some(narrative) = f.rain_narrative.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(extras, "☔ Rain timing: {}", narrative.trim());
    }
    if f.uv_index >= 6 {
        let _ = writeln!(extras, "☀️ UV Index: {} (High - use sunscreen)", f.uv_index);
    } else if f.uv_index >= 3 {
        let _ = writeln!(extras, "☀️ UV Index: {} (Moderate)", f.uv_index);
    }

    format!(
        "🌤️ Tomorrow's Weather for {location}\n\
         📅 {date}\n\
         🕙 Forecast sent: {sent_at}\n\
         \n\
         🌡️ High: {high}°F | Low: {low}°F\n\
         📝 Conditions: {description}\n\
         💧 Humidity: {humidity}%\n\
         💨 Wind: {wind} mph\n\
         {extras}\n\
         🌅 Morning: {morning}°F\n\
         ☀️ Afternoon: {day}°F\n\
         🌆 Evening: {evening}°F\n\
         🌙 Night: {night}°F\n\
         \n\
         Have a great day tomorrow! 🌟",
        location = f.location_name,
        date = f.date_label,
        high = f.high_f,
        low = f.low_f,
        description = f.description,
        humidity = f.humidity_percent,
        wind = f.wind_speed_mph,
        morning = f.morning_f,
        day = f.day_f,
        evening = f.evening_f,
        night = f.night_f,
    )
}
