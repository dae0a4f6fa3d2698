use std::{sync::Arc, time::Duration};

use anyhow::Result;
use backend::usecases::expiry_sweep::{ExpirySweepUseCase, SweepReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::RwLock,
    time::{MissedTickBehavior, interval},
};
use tracing::{error, info};

/// Outcome of the most recent sweep, served by the health endpoint.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SweepStatus {
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_report: Option<SweepReport>,
    pub consecutive_failures: u32,
}

pub type SharedSweepStatus = Arc<RwLock<SweepStatus>>;

/// Runs the sweep immediately and then once per `period`. A failed run is
/// logged and the loop waits for the next tick.
pub async fn run_expiry_sweep_loop(
    usecase: Arc<ExpirySweepUseCase>,
    status: SharedSweepStatus,
    period: Duration,
) -> Result<()> {
    info!(period_secs = period.as_secs(), "expiry sweep loop started");
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        sweep_once(&usecase, &status, Utc::now()).await;
    }
}

pub async fn sweep_once(
    usecase: &ExpirySweepUseCase,
    status: &SharedSweepStatus,
    now: DateTime<Utc>,
) -> Option<SweepReport> {
    let outcome = usecase.run(now).await;

    let mut status = status.write().await;
    status.last_run_at = Some(now);
    match outcome {
        Ok(report) => {
            info!(
                scanned = report.scanned,
                downgraded = report.downgraded,
                failed = report.failed,
                "expiry sweep finished"
            );
            status.last_report = Some(report);
            status.consecutive_failures = 0;
            Some(report)
        }
        Err(err) => {
            status.consecutive_failures += 1;
            error!(
                error = ?err,
                consecutive_failures = status.consecutive_failures,
                "expiry sweep failed, retrying on next tick"
            );
            None
        }
    }
}
