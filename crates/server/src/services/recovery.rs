//! Disaster-recovery drills.
//!
//! A static catalog of incident runbooks plus a simulated executor. Running
//! a drill walks the runbook's steps with a short pause per step and returns
//! a timed report; nothing touches real infrastructure.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

/// Pause simulated per runbook step.
const STEP_PAUSE: Duration = Duration::from_millis(200);

/// Errors that can occur when running a drill.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// No runbook with this slug.
    #[error("unknown incident: {0}")]
    UnknownIncident(String),
}

/// A recovery runbook for one class of incident.
#[derive(Debug, Clone, Serialize)]
pub struct Runbook {
    /// URL-safe identifier, e.g. `database-corruption`.
    pub slug: &'static str,
    /// Human-readable incident name.
    pub title: &'static str,
    /// What the incident looks like when it happens.
    pub description: &'static str,
    /// Target recovery time objective, in minutes.
    pub rto_minutes: u32,
    /// Ordered recovery steps.
    pub steps: &'static [&'static str],
}

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: String,
    pub elapsed_ms: u64,
}

/// Report produced by a completed drill.
#[derive(Debug, Clone, Serialize)]
pub struct DrillReport {
    pub incident: &'static str,
    pub title: &'static str,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepResult>,
    pub succeeded: bool,
}

/// The incident catalog. Order matters: it is the order shown to admins.
pub const RUNBOOKS: &[Runbook] = &[
    Runbook {
        slug: "database-corruption",
        title: "Database corruption",
        description: "Primary database reports corrupted pages or failed integrity checks.",
        rto_minutes: 30,
        steps: &[
            "Freeze writes by putting the API into read-only mode",
            "Snapshot the corrupted volume for forensics",
            "Restore the latest verified backup to a fresh instance",
            "Replay write-ahead logs up to the corruption point",
            "Run integrity checks against restored data",
            "Repoint the application and re-enable writes",
        ],
    },
    Runbook {
        slug: "credential-leak",
        title: "Credential leak",
        description: "Service credentials or API keys exposed in logs or a public repository.",
        rto_minutes: 15,
        steps: &[
            "Revoke the leaked credentials at the provider",
            "Rotate all secrets sharing the same scope",
            "Invalidate active sessions issued under the old secrets",
            "Audit access logs for use of the leaked credentials",
            "Redeploy with rotated secrets",
        ],
    },
    Runbook {
        slug: "ransomware",
        title: "Ransomware",
        description: "Hosts encrypted by ransomware; attacker demands payment.",
        rto_minutes: 120,
        steps: &[
            "Isolate affected hosts from the network",
            "Preserve images of infected machines for forensics",
            "Verify offline backups are intact and uninfected",
            "Rebuild hosts from clean images",
            "Restore data from the last clean backup",
            "Rotate every credential that touched infected hosts",
            "Validate service health before reopening traffic",
        ],
    },
    Runbook {
        slug: "scheduled-backup",
        title: "Scheduled backup verification",
        description: "Routine checklist confirming backups exist and restore cleanly.",
        rto_minutes: 45,
        steps: &[
            "Confirm last night's backup job completed without errors",
            "Verify backup artifact checksums against the manifest",
            "Restore the backup into an isolated staging database",
            "Run row-count and constraint spot checks on the restore",
            "Record the verification result in the operations log",
        ],
    },
    Runbook {
        slug: "region-outage",
        title: "Region outage",
        description: "Primary hosting region unavailable.",
        rto_minutes: 60,
        steps: &[
            "Confirm the outage scope with the provider status page",
            "Promote the standby database replica in the failover region",
            "Repoint DNS to the failover load balancer",
            "Scale the failover region to production capacity",
            "Verify end-to-end checkout and download flows",
        ],
    },
];

/// Look up a runbook by slug.
#[must_use]
pub fn find_runbook(slug: &str) -> Option<&'static Runbook> {
    RUNBOOKS.iter().find(|r| r.slug == slug)
}

/// Execute a drill for the named incident.
///
/// # Errors
///
/// Returns `RecoveryError::UnknownIncident` if no runbook matches.
#[instrument]
pub async fn run_drill(slug: &str) -> Result<DrillReport, RecoveryError> {
    let runbook = find_runbook(slug).ok_or_else(|| RecoveryError::UnknownIncident(slug.to_string()))?;

    let started_at = Utc::now();
    let mut steps = Vec::with_capacity(runbook.steps.len());

    for step in runbook.steps {
        let step_started = std::time::Instant::now();
        tokio::time::sleep(STEP_PAUSE).await;
        let elapsed_ms = u64::try_from(step_started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(incident = runbook.slug, step, elapsed_ms, "drill step complete");
        steps.push(StepResult {
            step: (*step).to_string(),
            elapsed_ms,
        });
    }

    let finished_at = Utc::now();
    tracing::info!(
        incident = runbook.slug,
        steps = steps.len(),
        "drill complete"
    );

    Ok(DrillReport {
        incident: runbook.slug,
        title: runbook.title,
        started_at,
        finished_at,
        steps,
        succeeded: true,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_slugs_are_unique() {
        let mut slugs: Vec<_> = RUNBOOKS.iter().map(|r| r.slug).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), RUNBOOKS.len());
    }

    #[test]
    fn test_every_runbook_has_steps() {
        for runbook in RUNBOOKS {
            assert!(!runbook.steps.is_empty(), "{} has no steps", runbook.slug);
            assert!(runbook.rto_minutes > 0);
        }
    }

    #[test]
    fn test_find_runbook() {
        assert!(find_runbook("ransomware").is_some());
        assert!(find_runbook("alien-invasion").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drill_reports_every_step() {
        let report = run_drill("credential-leak").await.unwrap();
        assert_eq!(report.incident, "credential-leak");
        assert_eq!(report.steps.len(), 5);
        assert!(report.succeeded);
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_drill_unknown_incident() {
        assert!(matches!(
            run_drill("nope").await,
            Err(RecoveryError::UnknownIncident(_))
        ));
    }
}
