//! Undo for capacity mutations when a later write step fails.
//!
//! The capacity counter is adjusted first and the appointment write second.
//! When the write fails, or the caller stops polling in between, the inverse
//! adjustment is issued on its own task with its own deadline so it does not
//! inherit the caller's cancellation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use super::ports::TrainRepository;

/// Deadline applied to a single compensating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompensationPolicy {
    pub timeout: Duration,
}

impl Default for CompensationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
        }
    }
}

/// Direction of a capacity adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityAdjustment {
    Deduct,
    Increase,
}

impl CapacityAdjustment {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Deduct => "deduct",
            Self::Increase => "increase",
        }
    }
}

/// Pending inverse of a capacity mutation that already succeeded.
///
/// Dropping an armed guard spawns the inverse call on the current runtime.
pub(crate) struct CapacityCompensation<R>
where
    R: TrainRepository + 'static,
{
    repo: Arc<R>,
    train_date_id: String,
    count: u32,
    inverse: CapacityAdjustment,
    policy: CompensationPolicy,
    use_case: &'static str,
    armed: bool,
}

impl<R> CapacityCompensation<R>
where
    R: TrainRepository + 'static,
{
    /// Arm a guard that will apply `inverse` unless disarmed.
    pub(crate) fn arm(
        repo: Arc<R>,
        train_date_id: impl Into<String>,
        count: u32,
        inverse: CapacityAdjustment,
        policy: CompensationPolicy,
        use_case: &'static str,
    ) -> Self {
        Self {
            repo,
            train_date_id: train_date_id.into(),
            count,
            inverse,
            policy,
            use_case,
            armed: true,
        }
    }

    /// The guarded step succeeded; nothing to undo.
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }

    /// Run the inverse adjustment and wait for it.
    ///
    /// Failures are logged and never returned; the caller reports the error
    /// of the step that triggered compensation.
    pub(crate) async fn compensate(mut self) {
        self.armed = false;
        let task = tokio::spawn(apply_inverse(
            Arc::clone(&self.repo),
            std::mem::take(&mut self.train_date_id),
            self.count,
            self.inverse,
            self.policy,
            self.use_case,
        ));
        if let Err(err) = task.await {
            error!(use_case = self.use_case, error = %err, "capacity compensation task aborted");
        }
    }
}

impl<R> Drop for CapacityCompensation<R>
where
    R: TrainRepository + 'static,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let train_date_id = std::mem::take(&mut self.train_date_id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(apply_inverse(
                    Arc::clone(&self.repo),
                    train_date_id,
                    self.count,
                    self.inverse,
                    self.policy,
                    self.use_case,
                ));
            }
            Err(_) => error!(
                use_case = self.use_case,
                train_date_id = %train_date_id,
                count = self.count,
                "no runtime available; capacity compensation skipped"
            ),
        }
    }
}

async fn apply_inverse<R>(
    repo: Arc<R>,
    train_date_id: String,
    count: u32,
    inverse: CapacityAdjustment,
    policy: CompensationPolicy,
    use_case: &'static str,
) where
    R: TrainRepository + 'static,
{
    let call = async {
        match inverse {
            CapacityAdjustment::Deduct => repo.deduct_capacity(&train_date_id, count).await,
            CapacityAdjustment::Increase => repo.increase_capacity(&train_date_id, count).await,
        }
    };
    match tokio::time::timeout(policy.timeout, call).await {
        Ok(Ok(())) => info!(
            use_case,
            train_date_id = %train_date_id,
            count,
            adjustment = inverse.as_str(),
            "capacity compensation applied"
        ),
        Ok(Err(err)) => error!(
            use_case,
            train_date_id = %train_date_id,
            count,
            adjustment = inverse.as_str(),
            error = %err,
            "capacity compensation failed"
        ),
        Err(_) => error!(
            use_case,
            train_date_id = %train_date_id,
            count,
            adjustment = inverse.as_str(),
            timeout_ms = u64::try_from(policy.timeout.as_millis()).unwrap_or(u64::MAX),
            "capacity compensation timed out"
        ),
    }
}
