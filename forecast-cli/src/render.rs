use std::fmt::{self, Write};

use forecast_core::{ForecastPayload, ForecastResult};

/// Text rendering of the current result slot.
pub fn render(result: Option<&ForecastResult>) -> String {
    match result {
        None => "Search for any location".to_string(),
        Some(ForecastResult::Loading) => "Loading forecast...".to_string(),
        Some(ForecastResult::Error(message)) => message.clone(),
        Some(ForecastResult::Success(payload)) => {
            let mut out = String::new();
            // Writing into a String cannot fail.
            let _ = write_payload(&mut out, payload);
            out.trim_end().to_string()
        }
    }
}

fn write_payload(out: &mut impl Write, data: &ForecastPayload) -> fmt::Result {
    let current = &data.current;

    writeln!(out, "{}, {}", data.location.name, data.location.country)?;
    writeln!(out)?;
    writeln!(out, "{}°C  {}", current.temperature_c, current.condition.text)?;
    writeln!(out, "Feels like {}°C", current.feels_like_c)?;
    writeln!(out, "{}", current.condition.icon_url())?;
    writeln!(out)?;

    let rows = [
        ("Humidity", format!("{}%", current.humidity_pct)),
        ("Wind Speed", format!("{} Km/h", current.wind_kph)),
        ("UV", current.uv.to_string()),
        ("Precipitation", format!("{} mm", current.precip_mm)),
        ("Local time", data.location.local_time().unwrap_or("-").to_string()),
        ("Local date", data.location.local_date().unwrap_or("-").to_string()),
    ];
    for pair in rows.chunks(2) {
        let line: Vec<String> = pair.iter().map(|(k, v)| format!("{k:<14}{v:<12}")).collect();
        writeln!(out, "{}", line.join("  ").trim_end())?;
    }

    if let Some(today) = data.today() {
        writeln!(out)?;
        writeln!(out, "Today")?;
        for hour in &today.hours {
            writeln!(
                out,
                "  {}  {:>6}°C  {}",
                hour.hour_label(),
                hour.temperature_c,
                hour.condition.text
            )?;
        }
    }

    if !data.forecast.is_empty() {
        writeln!(out)?;
        writeln!(out, "{} day forecast", data.forecast.len())?;
        for day in &data.forecast {
            writeln!(
                out,
                "  {:<7} {:>6}°C  {}",
                day.short_label(),
                day.avg_temp_c,
                day.condition.text
            )?;
        }
    }

    Ok(())
}
