use crate::engine::models::{ActivitySummary, OAUTH_CLIENT_SOURCE};

/// `1h 02m 03s`, or `2m 05s` under an hour.
pub fn format_duration(seconds: i64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else {
        format!("{m}m {s:02}s")
    }
}

pub fn format_distance(meters: f64) -> String {
    format!("{:.1}km", meters / 1000.0)
}

/// Device name, plus the uploader when it adds information.
pub fn system_label(summary: &ActivitySummary) -> String {
    let uploader = summary.uploader();
    if !uploader.is_empty()
        && uploader != OAUTH_CLIENT_SOURCE
        && !summary
            .device_name
            .to_lowercase()
            .contains(&uploader.to_lowercase())
    {
        format!("{} / {}", summary.device_name, uploader)
    } else {
        summary.device_name.clone()
    }
}

/// One-line description used for winners and losers alike.
pub fn describe(summary: &ActivitySummary, score: f64) -> String {
    format!(
        "[{}] (ID: {}, Score: {:.2}) - {} ({}, {})",
        system_label(summary),
        summary.id,
        score,
        summary.name,
        format_distance(summary.distance),
        format_duration(summary.moving_time)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(3723), "1h 02m 03s");
        assert_eq!(format_duration(125), "2m 05s");
        assert_eq!(format_duration(0), "0m 00s");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(12_345.0), "12.3km");
        assert_eq!(format_distance(0.0), "0.0km");
    }

    #[test]
    fn test_system_label() {
        let mut summary = ActivitySummary {
            device_name: "Garmin Edge 540".to_string(),
            source: "GARMIN_CONNECT".to_string(),
            ..Default::default()
        };
        assert_eq!(system_label(&summary), "Garmin Edge 540 / GARMIN_CONNECT");

        summary.source = "garmin".to_string();
        assert_eq!(system_label(&summary), "Garmin Edge 540");

        summary.source = OAUTH_CLIENT_SOURCE.to_string();
        assert_eq!(system_label(&summary), "Garmin Edge 540");

        summary.oauth_client_name = "RunGap".to_string();
        assert_eq!(system_label(&summary), "Garmin Edge 540 / RunGap");
    }

    #[test]
    fn test_describe() {
        let summary = ActivitySummary {
            id: "i5".to_string(),
            name: "Fox Creek Trails".to_string(),
            device_name: "Wahoo".to_string(),
            distance: 25_000.0,
            moving_time: 3900,
            ..Default::default()
        };
        assert_eq!(
            describe(&summary, 12.5),
            "[Wahoo] (ID: i5, Score: 12.50) - Fox Creek Trails (25.0km, 1h 05m 00s)"
        );
    }
}
