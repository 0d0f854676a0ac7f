//! `replicator-check` command implementation.

use acquisition::SyntheticGenerator;
use anyhow::{Context, Result};
use contracts::MonitorBlueprint;
use dispatcher::{PushMode, RemoteReplicator, ReplicatorStats};
use tracing::info;

use super::load_blueprint;
use crate::cli::ReplicatorCheckArgs;

#[derive(Debug)]
struct CheckOutcome {
    healthy: bool,
    /// None when no test push was requested
    pushed: Option<bool>,
    stats: ReplicatorStats,
}

/// Execute the `replicator-check` command
pub async fn run_replicator_check(args: &ReplicatorCheckArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config, true)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let Some(outcome) = check(&blueprint, args.push).await? else {
        println!("Replicator is disabled (enable it and set endpoint/api_key)");
        return Ok(());
    };

    print_outcome(&outcome);

    if !outcome.healthy || outcome.pushed == Some(false) {
        anyhow::bail!("Remote endpoint check failed");
    }
    Ok(())
}

async fn check(blueprint: &MonitorBlueprint, push: bool) -> Result<Option<CheckOutcome>> {
    let replicator =
        RemoteReplicator::new(&blueprint.replicator).context("Failed to create replicator")?;
    if !replicator.is_enabled() {
        return Ok(None);
    }

    info!(endpoint = %replicator.endpoint(), "Checking remote endpoint");
    let healthy = replicator.check_connection().await;

    let pushed = if push {
        let reading = SyntheticGenerator::new(blueprint.synthetic.clone()).next_reading();
        Some(
            replicator
                .push(&reading, blueprint.replicator.notify_remote, PushMode::Wait)
                .await,
        )
    } else {
        None
    };

    Ok(Some(CheckOutcome {
        healthy,
        pushed,
        stats: replicator.stats(),
    }))
}

fn print_outcome(outcome: &CheckOutcome) {
    let mark = |ok: bool| if ok { "✓" } else { "✗" };

    println!("\n=== Replicator Check ===\n");
    if let Some(endpoint) = &outcome.stats.endpoint {
        println!("Endpoint: {endpoint}");
    }
    println!("{} Health check", mark(outcome.healthy));
    if let Some(pushed) = outcome.pushed {
        println!("{} Test push", mark(pushed));
    }
    if let Some(error) = &outcome.stats.last_error {
        println!("\nLast error: {error}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn unreachable_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    #[tokio::test]
    async fn test_disabled_replicator_skips_check() {
        let blueprint = MonitorBlueprint::default();
        assert!(check(&blueprint, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reported() {
        let mut blueprint = MonitorBlueprint::default();
        blueprint.replicator.enabled = true;
        blueprint.replicator.endpoint = unreachable_endpoint();
        blueprint.replicator.api_key = "test-key".to_string();
        blueprint.replicator.push_timeout_secs = 1;
        blueprint.replicator.health_timeout_secs = 1;

        let outcome = check(&blueprint, true).await.unwrap().unwrap();
        assert!(!outcome.healthy);
        assert_eq!(outcome.pushed, Some(false));
        assert_eq!(outcome.stats.failed_count, 1);
        assert!(outcome.stats.last_error.is_some());
    }
}
