//! Disaster-recovery drills from the command line.

use moostyle_server::services::recovery;

use super::CliError;

/// Run a drill, or list the runbook catalog when no incident is given.
///
/// # Errors
///
/// Returns `CliError::Recovery` for an unknown incident slug.
pub async fn run(incident: Option<&str>) -> Result<(), CliError> {
    let Some(incident) = incident else {
        #[allow(clippy::print_stdout)]
        for runbook in recovery::RUNBOOKS {
            println!(
                "{:<22} {} (RTO {} min, {} steps)",
                runbook.slug,
                runbook.title,
                runbook.rto_minutes,
                runbook.steps.len()
            );
        }
        return Ok(());
    };

    let report = recovery::run_drill(incident).await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{}",
            serde_json::to_string_pretty(&report)
                .unwrap_or_else(|_| "drill report unavailable".to_string())
        );
    }

    Ok(())
}
