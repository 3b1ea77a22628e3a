// In-memory collaborators for orchestration tests

use crate::client::{ActivitySource, ClientError};
use crate::engine::models::{ActivityDetail, ActivitySummary};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeSource {
    pub details: HashMap<String, ActivityDetail>,
    pub missing: HashSet<String>,
    pub failing_deletes: HashSet<String>,
    pub updates: Mutex<Vec<(String, Map<String, Value>)>>,
    pub deletes: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with(details: Vec<ActivityDetail>) -> Self {
        Self {
            details: details
                .into_iter()
                .map(|d| (d.summary.id.clone(), d))
                .collect(),
            ..Default::default()
        }
    }

    pub fn summaries(&self) -> Vec<ActivitySummary> {
        let mut summaries: Vec<ActivitySummary> =
            self.details.values().map(|d| d.summary.clone()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn updates(&self) -> Vec<(String, Map<String, Value>)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

impl ActivitySource for FakeSource {
    fn list_activities(
        &self,
        _oldest: NaiveDate,
        _newest: NaiveDate,
    ) -> Result<Vec<ActivitySummary>, ClientError> {
        Ok(self.summaries())
    }

    fn get_activity_detail(&self, id: &str) -> Result<ActivityDetail, ClientError> {
        if self.missing.contains(id) {
            return Err(ClientError::NotFound {
                resource: format!("activity {id}"),
            });
        }
        self.details
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                resource: format!("activity {id}"),
            })
    }

    fn update_activity(&self, id: &str, fields: &Map<String, Value>) -> Result<(), ClientError> {
        self.updates
            .lock()
            .unwrap()
            .push((id.to_string(), fields.clone()));
        Ok(())
    }

    fn delete_activity(&self, id: &str) -> Result<(), ClientError> {
        if self.failing_deletes.contains(id) {
            return Err(ClientError::Status {
                code: 500,
                resource: format!("activity {id}"),
            });
        }
        self.deletes.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

/// A ride starting `offset_secs` after 2024-06-01 08:00.
pub fn ride(id: &str, name: &str, offset_secs: i64, streams: &[&str]) -> ActivityDetail {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    ActivityDetail {
        summary: ActivitySummary {
            id: id.to_string(),
            name: name.to_string(),
            activity_type: "Ride".to_string(),
            start_date_local: Some(t0 + Duration::seconds(offset_secs)),
            distance: 20_000.0,
            moving_time: 3600,
            ..Default::default()
        },
        stream_types: streams.iter().map(|s| s.to_string()).collect(),
    }
}
