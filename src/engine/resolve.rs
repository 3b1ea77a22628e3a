use crate::engine::models::{ActivityDetail, ActivitySummary};
use crate::engine::names::{is_generic_name, rank_candidate_names};
use crate::engine::scoring::{ScoreBreakdown, ScoringEngine};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

const DISTANCE_TOLERANCE: f64 = 0.5;
const DURATION_TOLERANCE: f64 = 0.25;

/// An activity together with its score.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluated {
    pub detail: ActivityDetail,
    pub score: ScoreBreakdown,
}

/// Which size checks a loser failed against the winner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeMismatch {
    pub distance: bool,
    pub duration: bool,
}

impl SizeMismatch {
    pub fn between(winner: &ActivitySummary, loser: &ActivitySummary) -> Self {
        let dist_diff = (winner.distance - loser.distance).abs() / winner.distance.max(1.0);
        let time_diff = (winner.moving_time - loser.moving_time).abs() as f64
            / (winner.moving_time as f64).max(1.0);

        Self {
            distance: dist_diff > DISTANCE_TOLERANCE,
            duration: time_diff > DURATION_TOLERANCE,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        self.distance || self.duration
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedLoser {
    pub detail: ActivityDetail,
    pub score: ScoreBreakdown,
    pub mismatch: SizeMismatch,
}

impl RankedLoser {
    /// A size mismatch suggests it is not really a duplicate.
    pub fn safe_to_delete(&self) -> bool {
        !self.mismatch.is_mismatch()
    }
}

/// Fields proposed for copying from losers onto the winner.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataMerge {
    pub feel: Option<u32>,
    pub rpe: Option<u32>,
    pub description: Option<String>,
}

impl MetadataMerge {
    pub fn is_empty(&self) -> bool {
        self.feel.is_none() && self.rpe.is_none() && self.description.is_none()
    }

    /// The update body for the activity API.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(feel) = self.feel {
            fields.insert("feel".to_string(), Value::from(feel));
        }
        if let Some(rpe) = self.rpe {
            fields.insert("icu_rpe".to_string(), Value::from(rpe));
        }
        if let Some(description) = &self.description {
            fields.insert("description".to_string(), Value::from(description.as_str()));
        }
        fields
    }

    /// Short description, e.g. "Feel: 3, RPE: 7, Description".
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(feel) = self.feel {
            parts.push(format!("Feel: {feel}"));
        }
        if let Some(rpe) = self.rpe {
            parts.push(format!("RPE: {rpe}"));
        }
        if self.description.is_some() {
            parts.push("Description".to_string());
        }
        parts.join(", ")
    }
}

/// What to do with one cluster: keep `winner`, discard `losers` (best first),
/// and optionally backfill the winner.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionDecision {
    pub winner: Evaluated,
    pub losers: Vec<RankedLoser>,
    pub name_adoption: Option<String>,
    pub metadata: MetadataMerge,
}

impl ResolutionDecision {
    /// Update body for the proposed rename, if any.
    pub fn rename_fields(&self) -> Option<Map<String, Value>> {
        self.name_adoption.as_ref().map(|name| {
            let mut fields = Map::new();
            fields.insert("name".to_string(), Value::from(name.as_str()));
            fields
        })
    }

    pub fn deletable(&self) -> impl Iterator<Item = &RankedLoser> {
        self.losers.iter().filter(|l| l.safe_to_delete())
    }
}

// Winner fields that can be backfilled, copied for the duration of one resolve call
struct WinnerFields {
    feel: u32,
    rpe: u32,
    description: String,
}

impl WinnerFields {
    fn of(summary: &ActivitySummary) -> Self {
        Self {
            feel: summary.feel,
            rpe: summary.rpe,
            description: summary.description.clone(),
        }
    }
}

/// Picks the record to keep in a duplicate cluster.
pub struct Resolver<'a> {
    engine: &'a ScoringEngine,
}

impl<'a> Resolver<'a> {
    pub fn new(engine: &'a ScoringEngine) -> Self {
        Self { engine }
    }

    /// Resolve one cluster.
    ///
    /// # Panics
    ///
    /// If `details` holds fewer than two activities. The cluster builder
    /// never produces such a cluster.
    pub fn resolve(&self, details: Vec<ActivityDetail>) -> ResolutionDecision {
        assert!(
            details.len() >= 2,
            "resolve needs at least two activities, got {}",
            details.len()
        );

        let mut evaluated: Vec<Evaluated> = details
            .into_iter()
            .map(|detail| Evaluated {
                score: self.engine.score(&detail),
                detail,
            })
            .collect();
        evaluated.sort_by(rank);

        let mut ranked = evaluated.into_iter();
        let Some(winner) = ranked.next() else {
            unreachable!("cluster has at least two members");
        };
        let ranked: Vec<Evaluated> = ranked.collect();

        let name_adoption = propose_name(&winner.detail.summary, &ranked);
        let metadata = propose_metadata(&winner.detail.summary, &ranked);

        let losers = ranked
            .into_iter()
            .map(|loser| RankedLoser {
                mismatch: SizeMismatch::between(&winner.detail.summary, &loser.detail.summary),
                detail: loser.detail,
                score: loser.score,
            })
            .collect();

        ResolutionDecision {
            winner,
            losers,
            name_adoption,
            metadata,
        }
    }
}

// Score desc, then last updated desc, then created desc
fn rank(a: &Evaluated, b: &Evaluated) -> Ordering {
    b.score
        .total
        .total_cmp(&a.score.total)
        .then_with(|| b.detail.summary.updated.cmp(&a.detail.summary.updated))
        .then_with(|| b.detail.summary.created_at.cmp(&a.detail.summary.created_at))
}

fn propose_name(winner: &ActivitySummary, losers: &[Evaluated]) -> Option<String> {
    if !is_generic_name(&winner.name, &winner.activity_type) {
        return None;
    }

    let candidates: Vec<&str> = losers.iter().map(|l| l.detail.summary.name.as_str()).collect();
    let best = rank_candidate_names(&candidates, &winner.activity_type);
    (!best.is_empty()).then_some(best)
}

fn propose_metadata(winner: &ActivitySummary, losers: &[Evaluated]) -> MetadataMerge {
    let mut working = WinnerFields::of(winner);
    let mut merge = MetadataMerge::default();

    for loser in losers.iter().map(|l| &l.detail.summary) {
        if working.feel == 0 && loser.feel > 0 {
            merge.feel = Some(loser.feel);
            working.feel = loser.feel;
        }
        if working.rpe == 0 && loser.rpe > 0 {
            merge.rpe = Some(loser.rpe);
            working.rpe = loser.rpe;
        }
        let description = loser.description.trim();
        if working.description.trim().is_empty() && !description.is_empty() {
            merge.description = Some(description.to_string());
            working.description = description.to_string();
        }
    }

    merge
}
