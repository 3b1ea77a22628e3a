use crate::client::ActivitySource;
use crate::engine::cluster::Cluster;
use crate::engine::models::ActivityDetail;
use crate::engine::resolve::{RankedLoser, ResolutionDecision, Resolver};
use crate::history::{HistoryLog, HistoryRecord};
use crate::report::describe;
use anyhow::{Context, Result};
use dialoguer::Confirm;
use rayon::prelude::*;
use tracing::{info, warn};

/// Asks the user whether to go ahead with an action.
pub trait Prompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Says yes to everything; used when not running interactively.
pub struct AutoApprove;

impl Prompter for AutoApprove {
    fn confirm(&self, _prompt: &str, _default: bool) -> Result<bool> {
        Ok(true)
    }
}

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .context("Failed to read confirmation")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print decisions only
    Report,
    /// Carry decisions out; with `dry_run` only print what would happen
    Apply { dry_run: bool },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub clusters: usize,
    pub skipped: usize,
    pub renamed: usize,
    pub merged: usize,
    pub deleted: usize,
    pub kept_mismatched: usize,
    pub failures: usize,
}

/// Drives the engine over a batch of clusters and applies the outcome.
pub struct Runner<'a, S: ActivitySource, P: Prompter> {
    source: &'a S,
    resolver: Resolver<'a>,
    prompter: &'a P,
    history: Option<&'a HistoryLog>,
    mode: Mode,
}

impl<'a, S: ActivitySource, P: Prompter> Runner<'a, S, P> {
    pub fn new(source: &'a S, resolver: Resolver<'a>, prompter: &'a P, mode: Mode) -> Self {
        Self {
            source,
            resolver,
            prompter,
            history: None,
            mode,
        }
    }

    pub fn with_history(mut self, history: &'a HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn run(&self, clusters: Vec<Cluster>) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for cluster in clusters {
            summary.clusters += 1;
            self.process_cluster(&cluster, &mut summary)?;
        }
        Ok(summary)
    }

    fn process_cluster(&self, cluster: &Cluster, summary: &mut RunSummary) -> Result<()> {
        let started = cluster
            .anchor()
            .start_date_local
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown time".to_string());
        println!(
            "\n🚩 Found {} suspected duplicates starting around: {}",
            cluster.len(),
            started
        );

        let details = self.fetch_details(cluster);
        if details.len() < 2 {
            warn!(
                fetched = details.len(),
                "not enough activity details to compare; skipping cluster"
            );
            summary.skipped += 1;
            return Ok(());
        }

        let decision = self.resolver.resolve(details);
        let winner = &decision.winner;
        println!(
            "  🏆 Winner: {}",
            describe(&winner.detail.summary, winner.score.total)
        );
        for reason in &winner.score.reasonings {
            println!("    - {reason}");
        }

        match self.mode {
            Mode::Report => {
                print_proposals(&decision);
                for loser in &decision.losers {
                    print_loser(loser);
                    if !loser.safe_to_delete() {
                        summary.kept_mismatched += 1;
                    }
                }
                Ok(())
            }
            Mode::Apply { dry_run } => self.apply(&decision, dry_run, summary),
        }
    }

    // Detail fetches for one cluster run in parallel; failures drop the member
    fn fetch_details(&self, cluster: &Cluster) -> Vec<ActivityDetail> {
        let source = self.source;
        cluster
            .members()
            .par_iter()
            .filter_map(|member| match source.get_activity_detail(&member.id) {
                Ok(detail) => Some(detail),
                Err(e) => {
                    warn!(id = %member.id, error = %e, "failed to fetch activity details");
                    println!("  ⚠️ Failed to fetch details for {}: {}", member.id, e);
                    None
                }
            })
            .collect()
    }

    fn apply(&self, decision: &ResolutionDecision, dry_run: bool, summary: &mut RunSummary) -> Result<()> {
        let winner_id = decision.winner.detail.summary.id.as_str();
        let mut record = HistoryRecord::applied(winner_id, Vec::new(), None, None);
        let outcome = self.apply_steps(decision, dry_run, summary, &mut record);

        // Written even when a prompt fails part way through the cluster
        if !dry_run && !record.is_noop() {
            if let Some(history) = self.history {
                if let Err(e) = history.append(&record) {
                    warn!(error = %e, "failed to record history");
                }
            }
        }
        outcome
    }

    fn apply_steps(
        &self,
        decision: &ResolutionDecision,
        dry_run: bool,
        summary: &mut RunSummary,
        record: &mut HistoryRecord,
    ) -> Result<()> {
        record.renamed = self.adopt_name(decision, dry_run, summary)?;
        record.metadata = self.adopt_metadata(decision, dry_run, summary)?;

        for loser in &decision.losers {
            print_loser(loser);
            if !loser.safe_to_delete() {
                summary.kept_mismatched += 1;
                continue;
            }
            if self.delete_loser(loser, dry_run, summary)? {
                record.deleted.push(loser.detail.summary.id.clone());
            }
        }
        Ok(())
    }

    fn adopt_name(
        &self,
        decision: &ResolutionDecision,
        dry_run: bool,
        summary: &mut RunSummary,
    ) -> Result<Option<String>> {
        let (Some(name), Some(fields)) = (&decision.name_adoption, decision.rename_fields()) else {
            return Ok(None);
        };
        let id = &decision.winner.detail.summary.id;

        if !self
            .prompter
            .confirm(&format!("Adopt descriptive name \"{name}\" for {id}?"), true)?
        {
            return Ok(None);
        }
        if dry_run {
            println!("    [DRY RUN] Would adopt name \"{name}\" for {id}");
            return Ok(None);
        }

        println!("    Adopting name \"{name}\"...");
        match self.source.update_activity(id, &fields) {
            Ok(()) => {
                println!("    ✅ Name updated");
                info!(%id, %name, "adopted name");
                summary.renamed += 1;
                Ok(Some(name.clone()))
            }
            Err(e) => {
                println!("    ❌ Error updating name: {e}");
                summary.failures += 1;
                Ok(None)
            }
        }
    }

    fn adopt_metadata(
        &self,
        decision: &ResolutionDecision,
        dry_run: bool,
        summary: &mut RunSummary,
    ) -> Result<Option<String>> {
        let merge = &decision.metadata;
        if merge.is_empty() {
            return Ok(None);
        }
        let id = &decision.winner.detail.summary.id;
        let msg = merge.summary();

        if !self
            .prompter
            .confirm(&format!("Adopt metadata ({msg}) for {id}?"), true)?
        {
            return Ok(None);
        }
        if dry_run {
            println!("    [DRY RUN] Would adopt metadata ({msg}) for {id}");
            return Ok(None);
        }

        println!("    Adopting metadata ({msg})...");
        match self.source.update_activity(id, &merge.to_fields()) {
            Ok(()) => {
                println!("    ✅ Metadata updated");
                info!(%id, metadata = %msg, "adopted metadata");
                summary.merged += 1;
                Ok(Some(msg))
            }
            Err(e) => {
                println!("    ❌ Error updating metadata: {e}");
                summary.failures += 1;
                Ok(None)
            }
        }
    }

    fn delete_loser(&self, loser: &RankedLoser, dry_run: bool, summary: &mut RunSummary) -> Result<bool> {
        let id = &loser.detail.summary.id;
        if !self
            .prompter
            .confirm(&format!("Confirm deletion of {id}?"), false)?
        {
            println!("    ⏭️  Skipped deletion of {id}");
            return Ok(false);
        }
        if dry_run {
            println!("    [DRY RUN] Would delete {id}");
            return Ok(false);
        }

        println!("    Deleting {id}...");
        match self.source.delete_activity(id) {
            Ok(()) => {
                println!("    ✅ Deleted {id}");
                info!(%id, "deleted duplicate");
                summary.deleted += 1;
                Ok(true)
            }
            Err(e) => {
                println!("    ❌ Error deleting {id}: {e}");
                summary.failures += 1;
                Ok(false)
            }
        }
    }
}

fn print_proposals(decision: &ResolutionDecision) {
    if let Some(name) = &decision.name_adoption {
        println!("    💡 Would adopt name \"{name}\"");
    }
    if !decision.metadata.is_empty() {
        println!("    💡 Would adopt metadata ({})", decision.metadata.summary());
    }
}

fn print_loser(loser: &RankedLoser) {
    let line = describe(&loser.detail.summary, loser.score.total);
    if loser.safe_to_delete() {
        println!("  🗑️  To Delete: {line}");
        for reason in &loser.score.reasonings {
            println!("    - {reason}");
        }
        return;
    }

    let mut warnings = String::new();
    if loser.mismatch.distance {
        warnings.push_str(" ⚠️ [DIST MISMATCH]");
    }
    if loser.mismatch.duration {
        warnings.push_str(" ⚠️ [TIME MISMATCH]");
    }
    println!("  ⚠️  Mismatch: {line}{warnings}");
    println!(
        "    ⏭️  Skipping deletion recommendation for {} due to size difference.",
        loser.detail.summary.id
    );
}
