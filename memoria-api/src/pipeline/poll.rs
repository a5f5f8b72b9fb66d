//! Bounded poll loop for remote jobs

use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::service::MediaAnalysisService;
use super::PipelineError;
use crate::models::{AnalysisJob, JobState};

/// Poll cadence and upper bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1500),
            timeout: Duration::from_secs(180),
        }
    }
}

/// Query the job until it is READY, FAILED, or the policy timeout elapses
///
/// A job that is already terminal returns without any query. Status query
/// errors are fatal.
pub async fn wait_until_ready(
    service: &dyn MediaAnalysisService,
    mut job: AnalysisJob,
    policy: PollPolicy,
) -> Result<AnalysisJob, PipelineError> {
    let started = Instant::now();
    let mut polls: u32 = 0;

    loop {
        match job.state {
            JobState::Ready => {
                info!(
                    job_id = %job.job_id,
                    polls = polls,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "Remote job ready"
                );
                return Ok(job);
            }
            JobState::Failed => {
                return Err(PipelineError::ProcessingFailed(format!(
                    "remote job {} reached FAILED state",
                    job.job_id
                )));
            }
            JobState::Submitted | JobState::Processing => {}
        }

        let remaining = policy.timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(PipelineError::PollTimeout {
                job_id: job.job_id,
                waited: started.elapsed(),
            });
        }

        tokio::time::sleep(policy.interval.min(remaining)).await;

        let remaining = policy.timeout.saturating_sub(started.elapsed());
        let query = tokio::time::timeout(remaining, service.job_state(&job)).await;
        let observed = match query {
            Ok(result) => result.map_err(PipelineError::StatusQuery)?,
            Err(_) => {
                return Err(PipelineError::PollTimeout {
                    job_id: job.job_id,
                    waited: started.elapsed(),
                });
            }
        };
        polls += 1;

        let next = job.state.advance(observed);
        debug!(
            job_id = %job.job_id,
            poll = polls,
            observed = ?observed,
            state = ?next,
            "Polled remote job"
        );
        job.state = next;
    }
}
