// Deduplication engine: clustering, scoring and conflict resolution.
// Everything in here is synchronous and free of I/O.

pub mod cluster;
pub mod models;
pub mod names;
pub mod resolve;
pub mod scoring;

pub use cluster::{Cluster, build_clusters, build_clusters_within, sort_by_start};
pub use models::{ActivityDetail, ActivitySummary, StreamKind};
pub use names::{is_generic_name, rank_candidate_names};
pub use resolve::{MetadataMerge, RankedLoser, ResolutionDecision, Resolver, SizeMismatch};
pub use scoring::{ScoreBreakdown, ScoringEngine};
