use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parley_persist::{ConversationStore, StoredMessage};
use parley_types::{Reply, ServerEvent, WaiterConfig};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::{EngineError, Result};
use crate::gateway::AssistantGateway;
use crate::notifier::RealtimeNotifier;

/// Terminal state of a run as seen by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(Reply),
    Failed,
    TimedOut,
}

impl RunOutcome {
    pub fn into_result(self) -> Result<Reply> {
        match self {
            Self::Completed(reply) => Ok(reply),
            Self::Failed => Err(EngineError::AssistantFailed),
            Self::TimedOut => Err(EngineError::TimedOut),
        }
    }
}

/// A started run to wait on
#[derive(Debug, Clone)]
pub struct RunJob {
    pub thread_id: String,
    pub run_id: String,
    pub owner_id: Option<String>,
    /// Timestamp of the triggering user turn; the reply is stored after it
    pub after: DateTime<Utc>,
}

/// Earliest timestamp at or after `at` that sorts behind every stored turn of the thread
///
/// Provider clocks have whole-second resolution while local turns carry
/// milliseconds, so every new turn is pushed past the thread's newest one.
pub(crate) async fn stamp_after_latest(
    store: &dyn ConversationStore,
    thread_id: &str,
    at: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let stamped = match store.latest_message_at(thread_id).await? {
        Some(last) => at.max(last + ChronoDuration::milliseconds(1)),
        None => at,
    };
    Ok(stamped)
}

/// Hands the outcome to the caller at most once
struct Resolver {
    tx: Option<oneshot::Sender<RunOutcome>>,
}

impl Resolver {
    fn new(tx: oneshot::Sender<RunOutcome>) -> Self {
        Self { tx: Some(tx) }
    }

    fn is_resolved(&self) -> bool {
        self.tx.is_none()
    }

    fn resolve(&mut self, outcome: RunOutcome) {
        if let Some(tx) = self.tx.take() {
            // Receiver gone means the caller disconnected; nothing to do
            let _ = tx.send(outcome);
        }
    }
}

/// Polls a run to a terminal state in a background task
///
/// The caller gets one outcome through a oneshot channel. Completion is
/// persisted and broadcast from the task itself, so it still happens when
/// the caller has gone away or already received `TimedOut`.
#[derive(Clone)]
pub struct RunCompletionWaiter {
    gateway: Arc<AssistantGateway>,
    store: Arc<dyn ConversationStore>,
    notifier: Arc<RealtimeNotifier>,
    config: WaiterConfig,
}

impl RunCompletionWaiter {
    pub fn new(
        gateway: Arc<AssistantGateway>,
        store: Arc<dyn ConversationStore>,
        notifier: Arc<RealtimeNotifier>,
        config: WaiterConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &WaiterConfig {
        &self.config
    }

    /// Start polling and return the channel the outcome arrives on
    pub fn spawn(&self, job: RunJob) -> oneshot::Receiver<RunOutcome> {
        let (tx, rx) = oneshot::channel();
        let waiter = self.clone();
        tokio::spawn(async move {
            waiter.run(job, Resolver::new(tx)).await;
        });
        rx
    }

    /// Spawn and wait for the outcome
    pub async fn wait(&self, job: RunJob) -> Result<Reply> {
        self.spawn(job)
            .await
            .map_err(|_| EngineError::Internal("run waiter stopped without an outcome".to_string()))?
            .into_result()
    }

    async fn run(self, job: RunJob, mut resolver: Resolver) {
        let total = self.config.max_attempts + self.config.late_completion_attempts;
        let error_limit = self.config.max_consecutive_errors.max(1);
        let mut consecutive_errors = 0;

        for attempt in 1..=total {
            tokio::time::sleep(self.config.poll_interval).await;

            match self.gateway.poll_run(&job.thread_id, &job.run_id).await {
                Ok(status) if status.is_completed() => match self.finish(&job).await {
                    Ok(reply) => {
                        tracing::info!(thread_id = %job.thread_id, run_id = %job.run_id, attempt, "run completed");
                        resolver.resolve(RunOutcome::Completed(reply));
                        return;
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        tracing::warn!(thread_id = %job.thread_id, run_id = %job.run_id, error = %e, "failed to collect reply");
                    }
                },
                Ok(status) if status.is_failed() => {
                    tracing::warn!(thread_id = %job.thread_id, run_id = %job.run_id, ?status, "run failed");
                    resolver.resolve(RunOutcome::Failed);
                    return;
                }
                Ok(status) => {
                    consecutive_errors = 0;
                    tracing::debug!(thread_id = %job.thread_id, run_id = %job.run_id, attempt, ?status, "run pending");
                }
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(thread_id = %job.thread_id, run_id = %job.run_id, attempt, error = %e, "run poll failed");
                }
            }

            if consecutive_errors >= error_limit {
                tracing::warn!(thread_id = %job.thread_id, run_id = %job.run_id, consecutive_errors, "giving up on run");
                resolver.resolve(RunOutcome::Failed);
                return;
            }

            if attempt == self.config.max_attempts && !resolver.is_resolved() {
                tracing::info!(thread_id = %job.thread_id, run_id = %job.run_id, "run timed out for caller, still polling");
                resolver.resolve(RunOutcome::TimedOut);
            }
        }

        tracing::warn!(thread_id = %job.thread_id, run_id = %job.run_id, "run abandoned without reaching a terminal state");
        resolver.resolve(RunOutcome::TimedOut);
    }

    /// Fetch, persist and broadcast the reply of a completed run
    async fn finish(&self, job: &RunJob) -> Result<Reply> {
        let latest = self.gateway.latest_reply(&job.thread_id).await?;

        if let Some(created_at) = latest.created_at {
            let created_at = created_at.max(job.after + ChronoDuration::milliseconds(1));
            if let Err(e) = self.persist_reply(job, &latest.reply, created_at).await {
                tracing::error!(thread_id = %job.thread_id, error = %e, "failed to persist assistant turn");
            }
        }

        self.notifier
            .publish(&job.thread_id, ServerEvent::new_message(latest.reply.clone()));
        Ok(latest.reply)
    }

    async fn persist_reply(&self, job: &RunJob, reply: &Reply, created_at: DateTime<Utc>) -> Result<()> {
        let created_at = stamp_after_latest(self.store.as_ref(), &job.thread_id, created_at).await?;
        let message = StoredMessage::assistant(
            &job.thread_id,
            job.owner_id.clone(),
            reply.content.clone(),
            created_at,
        );
        self.store.save_message(message).await?;
        Ok(())
    }
}
