//! # Dispatch Orchestrator
//!
//! Drives one request end to end: resolve peers, plan, execute each step in plan order,
//! then settle the task into its terminal state. Every state transition is followed by a
//! progress event, and every run ends with exactly one terminal status event.
//!
//! ## Run Sequence
//!
//! ```text
//! Pending ──resolve──▶ plan ──┬── no peers ─────────▶ Failed (NoPeersAvailable)
//!                             ├── empty plan ───────▶ NothingToDispatch
//!                             └── steps ──▶ Working ──▶ step 1 … step N ──▶ terminal
//! ```
//!
//! A failed step never aborts the plan; the next step still runs. Cancellation is
//! honored at step boundaries only: a step already in flight finishes and its outcome
//! is recorded but not reported. Once the task's execution budget is spent, the
//! remaining steps fail with `Timeout` without contacting their peers.

use reqwest::Client;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::error_classifier::StandardErrorClassifier;
use super::planner::{ensure_resolved_targets, DispatchPlanner, KeywordPlanner};
use super::step_executor::StepExecutor;
use super::transport::{A2aHttpTransport, PeerTransport};
use super::types::{PlanningError, StepFailureKind, StepOutcome};
use crate::config::DispatchConfig;
use crate::constants::{defaults, events};
use crate::discovery::{HttpCardResolver, PeerDirectory};
use crate::error::Result;
use crate::events::{EventEmitter, ProgressEvent};
use crate::logging::{log_error, log_task_operation};
use crate::models::{DispatchRequest, DispatchStep, Task, TaskSnapshot};
use crate::persistence::TaskStore;
use crate::registry::PeerSnapshot;
use crate::state_machine::{StepEvent, TaskEvent, TaskState, TaskStateMachine};

/// Shared, stateless driver; each [`run`](Self::run) owns its own task
#[derive(Clone)]
pub struct DispatchOrchestrator {
    config: Arc<DispatchConfig>,
    directory: PeerDirectory,
    planner: Arc<dyn DispatchPlanner>,
    executor: StepExecutor,
    store: Option<Arc<dyn TaskStore>>,
}

impl DispatchOrchestrator {
    pub fn new(
        config: Arc<DispatchConfig>,
        directory: PeerDirectory,
        planner: Arc<dyn DispatchPlanner>,
        executor: StepExecutor,
    ) -> Self {
        Self {
            config,
            directory,
            planner,
            executor,
            store: None,
        }
    }

    /// HTTP card resolution, A2A transport and the keyword planner from configuration
    pub fn from_config(config: Arc<DispatchConfig>, client: Client) -> Self {
        let directory = PeerDirectory::new(Arc::new(HttpCardResolver::new(client.clone())));
        let planner = Arc::new(KeywordPlanner::from_config(
            &config.planning,
            &config.execution,
        ));
        let transport: Arc<dyn PeerTransport> = Arc::new(A2aHttpTransport::new(client));
        let executor =
            StepExecutor::with_classifier(transport, Arc::new(StandardErrorClassifier::new()));
        Self::new(config, directory, planner, executor)
    }

    pub fn with_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    pub async fn run(
        &self,
        request: DispatchRequest,
        snapshot: &PeerSnapshot,
        emitter: EventEmitter,
        cancel: CancellationToken,
    ) -> TaskSnapshot {
        self.run_task(Task::new(request), snapshot, emitter, cancel)
            .await
    }

    /// Drive `task` to a terminal state and return its final snapshot.
    ///
    /// Never fails: internal errors abort the task into `Failed` and still produce the
    /// terminal event.
    #[instrument(skip_all, fields(task_id = %task.task_id(), context_id = %task.context_id()))]
    pub async fn run_task(
        &self,
        task: Task,
        snapshot: &PeerSnapshot,
        emitter: EventEmitter,
        cancel: CancellationToken,
    ) -> TaskSnapshot {
        let mut run = Run {
            orchestrator: self,
            machine: TaskStateMachine::new(task),
            emitter,
            cancel,
            started: Instant::now(),
        };

        if let Err(error) = run.drive(snapshot).await {
            log_error(
                "orchestrator",
                "run",
                &error.to_string(),
                Some(run.machine.task_id()),
            );
            run.abort(&error.to_string()).await;
        }

        run.machine.snapshot()
    }

    async fn persist(&self, snapshot: TaskSnapshot) {
        if !self.config.persistence.enabled {
            return;
        }
        if let Some(store) = &self.store {
            if let Err(error) = store.save(&snapshot).await {
                warn!(task_id = %snapshot.task_id, error = %error, "Failed to save task snapshot");
            }
        }
    }
}

/// State of one orchestrator run
struct Run<'a> {
    orchestrator: &'a DispatchOrchestrator,
    machine: TaskStateMachine,
    emitter: EventEmitter,
    cancel: CancellationToken,
    started: Instant,
}

impl Run<'_> {
    async fn drive(&mut self, snapshot: &PeerSnapshot) -> Result<()> {
        let config = Arc::clone(&self.orchestrator.config);
        let task_id = self.machine.task_id().to_string();

        log_task_operation(
            events::TASK_RECEIVED,
            Some(&task_id),
            Some(self.context_id()),
            "pending",
            Some(format!("{} candidates", snapshot.len()).as_str()),
        );
        self.emit_status(
            TaskState::Pending,
            format!("Discovering {} peers...", snapshot.len()),
        )
        .await?;

        if self.cancel.is_cancelled() {
            return self.finish_cancelled().await;
        }

        let report = self
            .orchestrator
            .directory
            .resolve_snapshot(snapshot, config.per_call_timeout(), config.overall_budget())
            .await;
        let peers = report.descriptors();
        self.emit(ProgressEvent::text(
            &task_id,
            format!("Discovered {} of {} peers", report.resolved_count(), report.len()),
        ))
        .await?;

        if self.cancel.is_cancelled() {
            return self.finish_cancelled().await;
        }

        let plan = self
            .orchestrator
            .planner
            .plan(&task_id, self.machine.task().request(), &peers);
        let steps = match plan {
            Err(PlanningError::NoPeersAvailable) => {
                self.machine
                    .transition(TaskEvent::fail_with_error(defaults::NO_PEERS_REASON))?;
                return self
                    .finish(format!(
                        "[WARNING] No peers available in the registry ({})",
                        defaults::NO_PEERS_REASON
                    ))
                    .await;
            }
            Ok(steps) if steps.is_empty() => {
                self.machine.transition(TaskEvent::NothingToDispatch)?;
                return self
                    .finish("[WARNING] No peers matched this request, nothing to dispatch")
                    .await;
            }
            Ok(steps) => steps,
            Err(error) => return Err(error.into()),
        };
        ensure_resolved_targets(&steps, &peers)?;

        let names: Vec<&str> = steps.iter().map(|step| step.target.name.as_str()).collect();
        let plan_text = format!("[PLAN] Dispatch plan created: {}", names.join(", "));
        let total = steps.len();
        self.machine.install_plan(steps)?;
        log_task_operation(
            events::TASK_PLANNED,
            Some(&task_id),
            Some(self.context_id()),
            "pending",
            Some(format!("{total} steps").as_str()),
        );
        self.emit(ProgressEvent::text(&task_id, plan_text)).await?;
        self.orchestrator.persist(self.machine.snapshot()).await;

        if self.cancel.is_cancelled() {
            return self.finish_cancelled().await;
        }

        self.machine.transition(TaskEvent::Start)?;
        log_task_operation(
            events::TASK_STARTED,
            Some(&task_id),
            Some(self.context_id()),
            "working",
            None,
        );

        let deadline = self.started + config.max_task_duration(total);
        for index in 0..total {
            if self.cancel.is_cancelled() {
                return self.finish_cancelled().await;
            }
            let step = self.machine.task().steps()[index].clone();
            let label = format!("[{}/{}]", index + 1, total);

            let now = Instant::now();
            if now >= deadline {
                self.machine.finish_step(
                    index,
                    StepEvent::fail_with_error(
                        StepFailureKind::Timeout,
                        defaults::BUDGET_EXHAUSTED_DETAIL,
                    ),
                )?;
                self.emit_step_failure(
                    &step,
                    &label,
                    StepFailureKind::Timeout,
                    defaults::BUDGET_EXHAUSTED_DETAIL,
                )
                .await?;
                continue;
            }

            self.machine.start_step(index)?;
            self.emit_status(
                TaskState::Working,
                format!("{label} Dispatching {}...", step.target.name),
            )
            .await?;

            let step_timeout = config.step_timeout().min(deadline - now);
            let outcome = self
                .orchestrator
                .executor
                .execute(&task_id, self.context_id(), &step, step_timeout)
                .await;
            self.machine.finish_step(index, outcome.to_step_event())?;

            if self.cancel.is_cancelled() {
                return self.finish_cancelled().await;
            }

            match outcome {
                StepOutcome::Success { reply } => {
                    self.emit(ProgressEvent::step_text(
                        &task_id,
                        &step.step_id,
                        format!(
                            "[OK] {label} {} dispatched successfully: {reply}",
                            step.target.name
                        ),
                    ))
                    .await?;
                }
                StepOutcome::Failure { kind, detail } => {
                    self.emit_step_failure(&step, &label, kind, &detail).await?;
                }
            }
        }

        let completed = self.machine.task().completed_count();
        let terminal = TaskEvent::from_tally(completed, total);
        let state = self.machine.transition(terminal)?;
        let summary = match state {
            TaskState::Completed => format!(
                "[SUCCESS] All peers dispatched successfully ({completed}/{total})"
            ),
            TaskState::PartiallyFailed => format!(
                "[WARNING] Dispatch completed with issues: {completed} successful, {} failed",
                total - completed
            ),
            _ => format!("[FAILED] No peer could be dispatched (0/{total})"),
        };
        self.finish(summary).await
    }

    fn context_id(&self) -> &str {
        self.machine.task().context_id()
    }

    async fn emit(&mut self, event: ProgressEvent) -> Result<()> {
        self.emitter.emit(event).await?;
        Ok(())
    }

    async fn emit_status(&mut self, state: TaskState, message: String) -> Result<()> {
        let event = ProgressEvent::status(
            self.machine.task_id(),
            self.machine.task().context_id(),
            state,
            message,
        );
        self.emit(event).await
    }

    async fn emit_step_failure(
        &mut self,
        step: &DispatchStep,
        label: &str,
        kind: StepFailureKind,
        detail: &str,
    ) -> Result<()> {
        let event = ProgressEvent::step_error(
            self.machine.task_id(),
            &step.step_id,
            kind,
            format!(
                "[FAILED] {label} Failed to dispatch {}: {detail}",
                step.target.name
            ),
        );
        self.emit(event).await
    }

    async fn finish_cancelled(&mut self) -> Result<()> {
        self.machine.transition(TaskEvent::Cancel)?;
        let (finished, total) = self.machine.progress();
        self.finish(format!(
            "Dispatch cancelled after {finished} of {total} steps"
        ))
        .await
    }

    /// Persist the terminal snapshot and emit the final status event
    async fn finish(&mut self, message: impl Into<String>) -> Result<()> {
        let state = self.machine.current_state();
        let message = message.into();
        self.orchestrator.persist(self.machine.snapshot()).await;

        log_task_operation(
            terminal_event_name(state),
            Some(self.machine.task_id()),
            Some(self.context_id()),
            &state.to_string(),
            Some(message.as_str()),
        );
        info!(
            state = %state,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Task finished"
        );

        let event = ProgressEvent::terminal(
            self.machine.task_id(),
            self.machine.task().context_id(),
            state,
            message,
        );
        self.emit(event).await
    }

    /// Last resort after an internal error: force `Failed` and make sure the caller
    /// still gets a terminal event
    async fn abort(&mut self, reason: &str) {
        if !self.machine.is_terminal() {
            let _ = self.machine.abort(format!("internal error: {reason}"));
        }
        self.orchestrator.persist(self.machine.snapshot()).await;

        if !self.emitter.is_terminated() {
            let event = ProgressEvent::terminal(
                self.machine.task_id(),
                self.machine.task().context_id(),
                self.machine.current_state(),
                format!("[FAILED] Dispatch aborted: {reason}"),
            );
            if let Err(error) = self.emitter.emit(event).await {
                warn!(error = %error, "Terminal event could not be emitted");
            }
        }
    }
}

fn terminal_event_name(state: TaskState) -> &'static str {
    match state {
        TaskState::Completed => events::TASK_COMPLETED,
        TaskState::PartiallyFailed => events::TASK_PARTIALLY_FAILED,
        TaskState::NothingToDispatch => events::TASK_NOTHING_TO_DISPATCH,
        TaskState::Cancelled => events::TASK_CANCELLED,
        _ => events::TASK_FAILED,
    }
}
