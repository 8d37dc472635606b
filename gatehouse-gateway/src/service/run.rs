//! Pipeline State Machine
//!
//! Turns a pipeline tunnel's step list into an ordered, server-persisted
//! sequence no caller can tamper with. Validation never mutates a run;
//! confirmation is the sole commit point and persists before the caller
//! sees success, so a crash between the two leaves the run unadvanced and
//! the same step replayable. The per-run gate from the run store
//! serializes the whole validate+confirm sequence, so two workers racing
//! on one run are linearized and at most one wins per step.

use chrono::{DateTime, Utc};
use gatehouse_core::domain::policy::DenialKind;
use gatehouse_core::domain::run::{PipelineRun, RunStatus, StepRecord};
use gatehouse_core::domain::tunnel::PipelineStep;
use gatehouse_core::dto::run::{RunStarted, StartRun};

use crate::repository::file::StoreError;
use crate::repository::{RunStore, TunnelRegistry};

/// Errors from the orchestrator-facing run operations
#[derive(Debug)]
pub enum RunError {
    TunnelNotFound(String),
    NotAPipeline(String),
    RunNotFound(u64),
    NotInProgress(u64),
    Storage(StoreError),
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        RunError::Storage(err)
    }
}

/// Denials and failures from a worker step submission
#[derive(Debug)]
pub enum SubmitError {
    RunNotFound(u64),
    AlreadyCompleted,
    Terminal(RunStatus),
    ConfigGone,
    StepsExhausted,
    WrongStep { expected: String, received: String },
    Storage(StoreError),
}

impl From<StoreError> for SubmitError {
    fn from(err: StoreError) -> Self {
        SubmitError::Storage(err)
    }
}

impl SubmitError {
    /// The policy denial this submission failure maps to; None for
    /// storage failures, which are internal errors rather than denials.
    pub fn into_denial(self) -> Option<DenialKind> {
        match self {
            SubmitError::RunNotFound(id) => Some(DenialKind::RunNotFound(id.to_string())),
            SubmitError::AlreadyCompleted => Some(DenialKind::RunAlreadyCompleted),
            SubmitError::Terminal(status) => Some(DenialKind::RunTerminal(status)),
            SubmitError::ConfigGone => Some(DenialKind::ConfigGone),
            SubmitError::StepsExhausted => Some(DenialKind::StepsExhausted),
            SubmitError::WrongStep { expected, received } => {
                Some(DenialKind::WrongStep { expected, received })
            }
            SubmitError::Storage(_) => None,
        }
    }
}

/// A confirmed step advance
#[derive(Debug, Clone)]
pub struct StepAdvance {
    pub run_id: u64,
    /// One-based number of the step just confirmed
    pub step_number: usize,
    pub command: String,
    pub run_status: RunStatus,
    pub next_command: Option<String>,
}

/// Begin a run on a pipeline tunnel (orchestrator-only)
pub async fn start_run(
    runs: &RunStore,
    tunnels: &TunnelRegistry,
    req: StartRun,
) -> Result<RunStarted, RunError> {
    let tunnel = tunnels
        .snapshot(&req.pipeline)
        .await
        .ok_or_else(|| RunError::TunnelNotFound(req.pipeline.clone()))?;

    let steps = tunnel
        .pipeline
        .as_ref()
        .map(|p| p.steps.as_slice())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RunError::NotAPipeline(req.pipeline.clone()))?;

    let next_command = steps[0].command.clone();
    let total_steps = steps.len();

    let run = runs.create(req.pipeline, req.agent).await?;

    tracing::info!(
        "Pipeline run {} started on '{}' for agent '{}'",
        run.run_id,
        run.pipeline,
        run.agent
    );

    Ok(RunStarted {
        run_id: run.run_id,
        pipeline: run.pipeline,
        agent: run.agent,
        started_at: run.started_at,
        next_command,
        total_steps,
    })
}

/// Fetch a run by id
pub async fn get_run(runs: &RunStore, run_id: u64) -> Result<PipelineRun, RunError> {
    runs.get(run_id).await.ok_or(RunError::RunNotFound(run_id))
}

/// All runs, ordered by id
pub async fn list_runs(runs: &RunStore) -> Vec<PipelineRun> {
    runs.list().await
}

/// Abort a run (orchestrator-only). Terminal runs cannot be re-aborted.
pub async fn abort_run(runs: &RunStore, run_id: u64) -> Result<PipelineRun, RunError> {
    // Terminal runs are immutable; reject before taking a gate so they
    // never get a fresh gate entry.
    let run = runs.get(run_id).await.ok_or(RunError::RunNotFound(run_id))?;
    if run.status.is_terminal() {
        return Err(RunError::NotInProgress(run_id));
    }

    let gate = runs.gate(run_id).await.ok_or(RunError::RunNotFound(run_id))?;
    let _guard = gate.lock().await;

    // Re-read under the gate; a racing confirm may have finished the run
    let mut run = runs.get(run_id).await.ok_or(RunError::RunNotFound(run_id))?;
    if run.status.is_terminal() {
        runs.prune_gate(run_id).await;
        return Err(RunError::NotInProgress(run_id));
    }

    run.status = RunStatus::Aborted;
    run.aborted_at = Some(Utc::now());
    runs.update(run.clone()).await?;

    tracing::info!("Pipeline run {} aborted", run_id);

    Ok(run)
}

/// Validate and, on allow, confirm one step submission for a run.
///
/// The caller-visible decision ladder; the first match wins. Confirmation
/// only happens after validation allowed the step, and the persisted state
/// is the commit.
pub async fn submit_step(
    runs: &RunStore,
    tunnels: &TunnelRegistry,
    run_id: u64,
    command: &str,
) -> Result<StepAdvance, SubmitError> {
    // Terminal runs reject everything and never need serialization, so
    // deny them before a gate entry can be (re)created.
    let run = runs
        .get(run_id)
        .await
        .ok_or(SubmitError::RunNotFound(run_id))?;
    reject_if_terminal(&run)?;

    let gate = runs
        .gate(run_id)
        .await
        .ok_or(SubmitError::RunNotFound(run_id))?;
    let _guard = gate.lock().await;

    // Re-read under the gate; a racing submission may have advanced or
    // finished the run while we waited.
    let mut run = runs
        .get(run_id)
        .await
        .ok_or(SubmitError::RunNotFound(run_id))?;

    if let Err(denied) = reject_if_terminal(&run) {
        runs.prune_gate(run_id).await;
        return Err(denied);
    }

    // Late-bound: the pipeline definition is read from the registry on
    // every submission, so a tunnel edit mid-run takes effect immediately.
    let steps = tunnels
        .snapshot(&run.pipeline)
        .await
        .and_then(|t| t.pipeline)
        .map(|p| p.steps)
        .filter(|s| !s.is_empty())
        .ok_or(SubmitError::ConfigGone)?;

    match validate_step(&run, &steps, command) {
        Ok(()) => {}
        Err(SubmitError::StepsExhausted) => {
            // A shrunken pipeline left current_step past the end; coerce
            // the run to its idempotent terminal state.
            run.status = RunStatus::Completed;
            run.completed_at = Some(Utc::now());
            runs.update(run).await?;
            return Err(SubmitError::StepsExhausted);
        }
        Err(e) => return Err(e),
    }

    let advance = confirm_step(&mut run, &steps, Utc::now());
    runs.update(run).await?;

    tracing::info!(
        "Run {}: step {} confirmed ('{}'), status {:?}",
        advance.run_id,
        advance.step_number,
        advance.command,
        advance.run_status
    );

    Ok(advance)
}

/// The status half of the decision ladder: terminal runs deny everything
fn reject_if_terminal(run: &PipelineRun) -> Result<(), SubmitError> {
    match run.status {
        RunStatus::Completed => Err(SubmitError::AlreadyCompleted),
        RunStatus::Aborted | RunStatus::Failed => Err(SubmitError::Terminal(run.status)),
        RunStatus::InProgress => Ok(()),
    }
}

/// Check a submission against the expected step without mutating the run
fn validate_step(
    run: &PipelineRun,
    steps: &[PipelineStep],
    command: &str,
) -> Result<(), SubmitError> {
    reject_if_terminal(run)?;

    if run.current_step >= steps.len() {
        return Err(SubmitError::StepsExhausted);
    }

    let expected = &steps[run.current_step];
    if command.trim() != expected.command.trim() {
        return Err(SubmitError::WrongStep {
            expected: expected.command.clone(),
            received: command.to_string(),
        });
    }

    Ok(())
}

/// Commit the validated step: append the record, advance the cursor, and
/// complete the run when the cursor reaches the end.
fn confirm_step(run: &mut PipelineRun, steps: &[PipelineStep], now: DateTime<Utc>) -> StepAdvance {
    let command = steps[run.current_step].command.clone();

    run.steps_completed.push(StepRecord {
        step_number: run.current_step + 1,
        command: command.clone(),
        confirmed_at: now,
    });
    run.current_step += 1;

    let next_command = if run.current_step == steps.len() {
        run.status = RunStatus::Completed;
        run.completed_at = Some(now);
        None
    } else {
        Some(steps[run.current_step].command.clone())
    };

    StepAdvance {
        run_id: run.run_id,
        step_number: run.current_step,
        command,
        run_status: run.status,
        next_command,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gatehouse_core::domain::tunnel::{PipelineSpec, Tunnel, WhitelistMode};
    use tempfile::TempDir;

    fn step(command: &str) -> PipelineStep {
        PipelineStep {
            command: command.to_string(),
            description: None,
        }
    }

    fn deploy_tunnel(steps: Vec<PipelineStep>) -> Tunnel {
        Tunnel {
            name: "Deploy".to_string(),
            description: None,
            allowed_methods: vec!["POST".to_string()],
            allowed_paths: vec![],
            allowed_commands: vec![],
            forbidden_keywords: vec![],
            command_whitelist_mode: WhitelistMode::Lax,
            pipeline: Some(PipelineSpec { steps }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn stores(steps: Vec<PipelineStep>) -> (Arc<RunStore>, Arc<TunnelRegistry>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let runs = RunStore::load(dir.path().join("runs.json")).unwrap();
        let tunnels = TunnelRegistry::load(dir.path().join("tunnels.json")).unwrap();
        tunnels.insert(deploy_tunnel(steps)).await.unwrap();
        (Arc::new(runs), Arc::new(tunnels), dir)
    }

    fn deploy_steps() -> Vec<PipelineStep> {
        vec![
            step("git pull origin main"),
            step("npm install"),
            step("npm run build"),
            step("pm2 restart shortshub"),
        ]
    }

    #[tokio::test]
    async fn test_start_run_returns_first_command() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;

        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(started.next_command, "git pull origin main");
        assert_eq!(started.total_steps, 4);
    }

    #[tokio::test]
    async fn test_start_run_rejects_policy_tunnel() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let mut plain = deploy_tunnel(vec![]);
        plain.name = "Plain".into();
        plain.pipeline = None;
        tunnels.insert(plain).await.unwrap();

        let result = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Plain".into(),
                agent: "ci-bot".into(),
            },
        )
        .await;
        assert!(matches!(result, Err(RunError::NotAPipeline(_))));
    }

    #[tokio::test]
    async fn test_happy_path_runs_to_completion() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        let commands = [
            "git pull origin main",
            "npm install",
            "npm run build",
            "pm2 restart shortshub",
        ];

        let mut last = None;
        for command in commands {
            last = Some(
                submit_step(&runs, &tunnels, started.run_id, command)
                    .await
                    .unwrap(),
            );
        }

        let advance = last.unwrap();
        assert_eq!(advance.run_status, RunStatus::Completed);
        assert!(advance.next_command.is_none());

        let run = runs.get(started.run_id).await.unwrap();
        assert_eq!(run.current_step, 4);
        assert_eq!(run.steps_completed.len(), 4);
        assert!(run.completed_at.is_some());
        // Confirmed commands are exactly the pipeline prefix, in order
        let confirmed: Vec<&str> = run
            .steps_completed
            .iter()
            .map(|s| s.command.as_str())
            .collect();
        assert_eq!(confirmed, commands);
    }

    #[tokio::test]
    async fn test_skip_is_denied_without_mutation() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        submit_step(&runs, &tunnels, started.run_id, "git pull origin main")
            .await
            .unwrap();

        let result = submit_step(&runs, &tunnels, started.run_id, "npm run build").await;
        match result {
            Err(SubmitError::WrongStep { expected, received }) => {
                assert_eq!(expected, "npm install");
                assert_eq!(received, "npm run build");
            }
            other => panic!("expected wrong-step denial, got {:?}", other),
        }

        let run = runs.get(started.run_id).await.unwrap();
        assert_eq!(run.current_step, 1);
        assert_eq!(run.steps_completed.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_of_confirmed_step_is_denied() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        submit_step(&runs, &tunnels, started.run_id, "git pull origin main")
            .await
            .unwrap();
        let result = submit_step(&runs, &tunnels, started.run_id, "git pull origin main").await;
        assert!(matches!(result, Err(SubmitError::WrongStep { .. })));
    }

    #[tokio::test]
    async fn test_unknown_run_denied() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let result = submit_step(&runs, &tunnels, 99, "git pull origin main").await;
        assert!(matches!(result, Err(SubmitError::RunNotFound(99))));
    }

    #[tokio::test]
    async fn test_completed_run_rejects_submissions() {
        let (runs, tunnels, _dir) = stores(vec![step("only")]).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        submit_step(&runs, &tunnels, started.run_id, "only")
            .await
            .unwrap();

        let result = submit_step(&runs, &tunnels, started.run_id, "only").await;
        assert!(matches!(result, Err(SubmitError::AlreadyCompleted)));

        let run = runs.get(started.run_id).await.unwrap();
        assert_eq!(run.steps_completed.len(), 1);
    }

    #[tokio::test]
    async fn test_aborted_run_rejects_submissions() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        abort_run(&runs, started.run_id).await.unwrap();

        let result = submit_step(&runs, &tunnels, started.run_id, "git pull origin main").await;
        assert!(matches!(
            result,
            Err(SubmitError::Terminal(RunStatus::Aborted))
        ));
    }

    #[tokio::test]
    async fn test_abort_is_not_idempotent() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        abort_run(&runs, started.run_id).await.unwrap();
        let result = abort_run(&runs, started.run_id).await;
        assert!(matches!(result, Err(RunError::NotInProgress(_))));
    }

    #[tokio::test]
    async fn test_dropped_pipeline_definition_denies() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        let mut edited = deploy_tunnel(vec![]);
        edited.pipeline = None;
        tunnels.insert(edited).await.unwrap();

        let result = submit_step(&runs, &tunnels, started.run_id, "git pull origin main").await;
        assert!(matches!(result, Err(SubmitError::ConfigGone)));
    }

    #[tokio::test]
    async fn test_shrunken_pipeline_coerces_completion() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        submit_step(&runs, &tunnels, started.run_id, "git pull origin main")
            .await
            .unwrap();

        // Pipeline shrinks to one step; the cursor is now past the end
        tunnels
            .insert(deploy_tunnel(vec![step("git pull origin main")]))
            .await
            .unwrap();

        let result = submit_step(&runs, &tunnels, started.run_id, "npm install").await;
        assert!(matches!(result, Err(SubmitError::StepsExhausted)));

        let run = runs.get(started.run_id).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_crash_between_allow_and_confirm_is_replayable() {
        // Simulated crash: validation allowed but nothing was committed.
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        let run = runs.get(started.run_id).await.unwrap();
        let steps = deploy_steps();
        assert!(validate_step(&run, &steps, "git pull origin main").is_ok());

        // The run on disk is unadvanced; the same submission still works.
        let reloaded = runs.get(started.run_id).await.unwrap();
        assert_eq!(reloaded.current_step, 0);
        let advance = submit_step(&runs, &tunnels, started.run_id, "git pull origin main")
            .await
            .unwrap();
        assert_eq!(advance.step_number, 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_linearize() {
        let (runs, tunnels, _dir) = stores(deploy_steps()).await;
        let started = start_run(
            &runs,
            &tunnels,
            StartRun {
                pipeline: "Deploy".into(),
                agent: "ci-bot".into(),
            },
        )
        .await
        .unwrap();

        let a = {
            let (runs, tunnels) = (runs.clone(), tunnels.clone());
            let run_id = started.run_id;
            tokio::spawn(
                async move { submit_step(&runs, &tunnels, run_id, "git pull origin main").await },
            )
        };
        let b = {
            let (runs, tunnels) = (runs.clone(), tunnels.clone());
            let run_id = started.run_id;
            tokio::spawn(
                async move { submit_step(&runs, &tunnels, run_id, "git pull origin main").await },
            )
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);

        let run = runs.get(started.run_id).await.unwrap();
        assert_eq!(run.current_step, 1);
        assert_eq!(run.steps_completed.len(), 1);
    }

    #[test]
    fn test_validate_step_trims_whitespace() {
        let run = PipelineRun {
            run_id: 1,
            pipeline: "Deploy".into(),
            agent: "ci-bot".into(),
            started_at: Utc::now(),
            current_step: 0,
            status: RunStatus::InProgress,
            steps_completed: vec![],
            completed_at: None,
            aborted_at: None,
        };
        let steps = vec![step("npm install")];
        assert!(validate_step(&run, &steps, "  npm install  ").is_ok());
        assert!(validate_step(&run, &steps, "npm  install").is_err());
    }
}
