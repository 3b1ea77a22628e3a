use crate::config::ScoringConfig;
use crate::engine::models::{ActivityDetail, OAUTH_CLIENT_SOURCE, StreamKind};
use crate::engine::names::is_generic_name;
use serde::Serialize;
use std::collections::BTreeMap;

/// How an activity was evaluated: the total, what each factor contributed,
/// and the reasoning in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total: f64,
    pub breakdown: BTreeMap<String, f64>,
    pub reasonings: Vec<String>,
}

impl ScoreBreakdown {
    pub fn factor(&self, name: &str) -> Option<f64> {
        self.breakdown.get(name).copied()
    }
}

// Output of a single evaluation pass
#[derive(Debug, Default)]
struct Partial {
    entries: Vec<(String, f64)>,
    reasonings: Vec<String>,
}

impl Partial {
    fn award(&mut self, factor: impl Into<String>, value: f64, reason: impl Into<String>) {
        self.entries.push((factor.into(), value));
        self.reasonings.push(reason.into());
    }
}

type Pass = fn(&ActivityDetail, &ScoringConfig) -> Partial;

const PASSES: [Pass; 6] = [
    evaluate_streams,
    evaluate_sampling,
    evaluate_device,
    evaluate_interactions,
    evaluate_name,
    evaluate_uploader,
];

/// Heuristic quality scoring for duplicate candidates.
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one activity. Pure: depends only on `detail` and the configuration.
    pub fn score(&self, detail: &ActivityDetail) -> ScoreBreakdown {
        let mut card = ScoreBreakdown::default();

        for pass in PASSES {
            let partial = pass(detail, &self.config);
            card.breakdown.extend(partial.entries);
            card.reasonings.extend(partial.reasonings);
        }

        card.total = card.breakdown.values().sum();
        card
    }
}

fn evaluate_streams(detail: &ActivityDetail, config: &ScoringConfig) -> Partial {
    let weights = &config.weights;
    let streams = [
        (StreamKind::Power, "Power Stream", weights.power, "Contains power/watts data."),
        (StreamKind::HeartRate, "HeartRate Stream", weights.heart_rate, "Contains heart rate data."),
        (StreamKind::Gps, "GPS/Map Stream", weights.gps, "Contains GPS/latlng map data."),
        (StreamKind::Cadence, "Cadence Stream", weights.cadence, "Contains cadence data."),
    ];

    let mut partial = Partial::default();
    for (kind, factor, weight, reason) in streams {
        if detail.has_stream(kind) {
            partial.award(factor, weight, reason);
        }
    }
    partial
}

fn evaluate_sampling(detail: &ActivityDetail, config: &ScoringConfig) -> Partial {
    let mut partial = Partial::default();
    let summary = &detail.summary;
    if summary.icu_recording_seconds <= 0 || summary.moving_time <= 0 {
        return partial;
    }

    // Recorded samples per second of moving time, capped at one per second
    let rate = summary.icu_recording_seconds as f64 / summary.moving_time as f64;
    let normalized = rate.min(1.0);

    partial.award(
        "Sampling Density",
        normalized * config.weights.sampling_rate,
        format!(
            "Sampling density: {:.0}% of moving time recorded.",
            normalized * 100.0
        ),
    );
    partial
}

fn evaluate_device(detail: &ActivityDetail, config: &ScoringConfig) -> Partial {
    let mut partial = Partial::default();
    let summary = &detail.summary;
    let haystack = format!(
        "{} {} {} {}",
        summary.device_name, summary.source, summary.power_meter, summary.oauth_client_name
    )
    .to_lowercase();

    let ranked = config.device_priority.len();
    if let Some((index, preferred)) = config
        .device_priority
        .iter()
        .enumerate()
        .find(|(_, preferred)| haystack.contains(&preferred.to_lowercase()))
    {
        partial.award(
            format!("Device/Sensor Priority: {preferred}"),
            (ranked - index) as f64 * 2.0,
            format!("Matches preferred device/sensor: {preferred}"),
        );
    }
    partial
}

fn evaluate_interactions(detail: &ActivityDetail, config: &ScoringConfig) -> Partial {
    let mut partial = Partial::default();
    let summary = &detail.summary;

    if summary.rpe > 0 {
        partial.award(
            "RPE/Feel",
            config.weights.rpe,
            format!("User provided RPE: {}", summary.rpe),
        );
    } else if summary.feel > 0 {
        partial.award(
            "RPE/Feel",
            config.weights.rpe,
            format!("User provided Feel: {}", summary.feel),
        );
    }

    if !summary.description.trim().is_empty() {
        partial.award(
            "Manual Description",
            config.weights.manual,
            "Activity has custom notes/description.",
        );
    }
    partial
}

fn evaluate_name(detail: &ActivityDetail, config: &ScoringConfig) -> Partial {
    let mut partial = Partial::default();
    let summary = &detail.summary;
    if is_generic_name(&summary.name, &summary.activity_type) {
        return partial;
    }

    // Sync tools set automated titles, so their names earn nothing
    let uploader = if summary.source == OAUTH_CLIENT_SOURCE {
        summary.oauth_client_name.to_lowercase()
    } else {
        summary.source.to_lowercase()
    };
    let penalized = config
        .uploader_penalties
        .keys()
        .any(|key| uploader.contains(&key.to_lowercase()));

    if !penalized {
        partial.award(
            "Custom Name",
            config.weights.custom_name,
            format!("Appears to have a custom name: {}", summary.name),
        );
    }
    partial
}

fn evaluate_uploader(detail: &ActivityDetail, config: &ScoringConfig) -> Partial {
    let mut partial = Partial::default();
    let uploader = detail.summary.uploader();
    let lowered = uploader.to_lowercase();

    for (key, penalty) in &config.uploader_penalties {
        if lowered.contains(&key.to_lowercase()) {
            partial.award(
                format!("Uploader Penalty: {key}"),
                -penalty,
                format!("Penalized for using indirect sync tool: {uploader}"),
            );
        }
    }
    partial
}
