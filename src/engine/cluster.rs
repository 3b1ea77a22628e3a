// Temporal grouping of activity summaries into suspected-duplicate clusters

use crate::engine::models::ActivitySummary;
use chrono::Duration;

/// Activities starting within this many seconds of a group's first member
/// are treated as the same workout.
pub const DEFAULT_WINDOW_SECS: i64 = 30;

/// Two or more summaries suspected to be the same workout.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    members: Vec<ActivitySummary>,
}

impl Cluster {
    /// The member every other member was measured against.
    pub fn anchor(&self) -> &ActivitySummary {
        &self.members[0]
    }

    pub fn members(&self) -> &[ActivitySummary] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.id.as_str())
    }

    pub fn into_members(self) -> Vec<ActivitySummary> {
        self.members
    }
}

/// Stable sort by local start time, activities without one first.
pub fn sort_by_start(summaries: &mut [ActivitySummary]) {
    summaries.sort_by_key(|a| a.start_date_local);
}

/// Group summaries already sorted by start time, using the default window.
pub fn build_clusters(summaries: &[ActivitySummary]) -> Vec<Cluster> {
    build_clusters_within(summaries, Duration::seconds(DEFAULT_WINDOW_SECS))
}

/// Single pass over `summaries` (sorted ascending by start). Each group is
/// anchored at its first member; the window is never measured from the
/// previous element. Groups of one are dropped.
pub fn build_clusters_within(summaries: &[ActivitySummary], window: Duration) -> Vec<Cluster> {
    let mut clusters = Vec::new();
    let mut iter = summaries.iter();
    let Some(first) = iter.next() else {
        return clusters;
    };

    let mut current = vec![first.clone()];
    for activity in iter {
        if within_window(&current[0], activity, window) {
            if !current.iter().any(|m| m.id == activity.id) {
                current.push(activity.clone());
            }
        } else {
            let finished = std::mem::replace(&mut current, vec![activity.clone()]);
            push_if_duplicate(&mut clusters, finished);
        }
    }
    push_if_duplicate(&mut clusters, current);

    clusters
}

fn within_window(anchor: &ActivitySummary, candidate: &ActivitySummary, window: Duration) -> bool {
    match (anchor.start_date_local, candidate.start_date_local) {
        (Some(a), Some(b)) => (b - a).abs() <= window,
        _ => false,
    }
}

fn push_if_duplicate(clusters: &mut Vec<Cluster>, members: Vec<ActivitySummary>) {
    if members.len() > 1 {
        clusters.push(Cluster { members });
    }
}
