//! Concurrent collaborator execution.

use super::{Collaborator, CollaboratorContext, ResultsStore, plan_roster};
use crate::EclipseraError;
use crate::core::config::{AnalyzeConfig, AnalyzeOptions};
use crate::core::format::ImageFormat;
use crate::types::ToolReport;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Duration, timeout};

/// Run every applicable collaborator for the workspace image.
///
/// At most `config.concurrency()` collaborators run at once, each under
/// `config.collaborator_timeout_secs`. No collaborator failure escapes: a
/// missing binary, tool error, timeout or panic becomes that collaborator's
/// status entry. The returned map is `results.json` as written by the
/// collaborators, overlaid with the entries for skipped and failed ones.
#[tracing::instrument(skip_all, fields(format = %format, deep = options.deep))]
pub async fn run_collaborators(
    image_path: &Path,
    output_dir: &Path,
    format: ImageFormat,
    options: &AnalyzeOptions,
    config: &AnalyzeConfig,
) -> BTreeMap<String, ToolReport> {
    let plan = plan_roster(format, options.deep);
    let mut supplemental: BTreeMap<String, ToolReport> = plan
        .skipped
        .iter()
        .map(|(collaborator, reason)| (collaborator.name().to_string(), ToolReport::skipped(*reason)))
        .collect();

    let store = ResultsStore::new(output_dir);
    let ctx = Arc::new(CollaboratorContext {
        image_path: image_path.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        password: options.password.clone(),
        tools: config.tools.clone(),
        timeout_secs: config.collaborator_timeout_secs,
        store: store.clone(),
    });

    let timeout_secs = config.collaborator_timeout_secs;
    let semaphore = Arc::new(Semaphore::new(config.concurrency()));
    let mut tasks = JoinSet::new();

    for collaborator in plan.active {
        let ctx = Arc::clone(&ctx);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return (collaborator, Err(format!("Concurrency limit unavailable: {}", e))),
            };

            // A nested task so a panic is attributed to its collaborator.
            let handle = tokio::spawn(async move {
                timeout(Duration::from_secs(timeout_secs), collaborator.run(&ctx)).await
            });
            let outcome = match handle.await {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(_elapsed)) => Ok(Err(EclipseraError::Timeout {
                    name: collaborator.name().to_string(),
                    seconds: timeout_secs,
                })),
                Err(join_error) => Err(format!("collaborator task panicked: {}", join_error)),
            };
            (collaborator, outcome)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (collaborator, outcome) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!("Collaborator supervisor task failed: {}", e);
                continue;
            }
        };

        let entry = match outcome {
            Ok(Ok(_)) => None,
            Ok(Err(err)) => Some(failure_entry(collaborator, err)),
            Err(message) => {
                tracing::error!("{} failed: {}", collaborator, message);
                Some(ToolReport::error(message))
            }
        };
        if let Some(entry) = entry {
            supplemental.insert(collaborator.name().to_string(), entry);
        }
    }

    let mut results = match ResultsStore::load(output_dir).await {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!("Could not reload {}: {}", store.path().display(), e);
            store.snapshot()
        }
    };
    results.extend(supplemental);
    results
}

/// Status entry for a collaborator that returned an error.
fn failure_entry(collaborator: Collaborator, err: EclipseraError) -> ToolReport {
    match err {
        EclipseraError::Timeout { seconds, .. } => {
            tracing::warn!("{} timed out after {}s", collaborator, seconds);
            ToolReport::skipped(format!("timed out after {} s", seconds))
        }
        EclipseraError::MissingDependency(message) => {
            tracing::debug!("{} unavailable: {}", collaborator, message);
            ToolReport::error(format!("Dependency missing: {}", message))
        }
        other => {
            tracing::warn!("{} failed: {}", collaborator, other);
            ToolReport::error(other.to_string())
        }
    }
}
