use std::{sync::Arc, time::Duration as StdDuration};

use time::{Duration, OffsetDateTime};
use tokio::time as tokio_time;

use crate::Result;
use folio_service::{FolioService, IngestOutcome};
use folio_storage::{jobs, models::IngestJob};

const BASE_BACKOFF_MS: i64 = 500;
const MAX_BACKOFF_MS: i64 = 30_000;
const MAX_JOB_ERROR_CHARS: usize = 1_024;

/// What one polling step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobOutcome {
	/// No job was runnable.
	Idle,
	Done,
	/// The attempt failed and the job was put back with a backoff.
	Retried,
	/// The job failed for good and the document carries the error.
	Failed,
	/// Another worker claimed the job after this lease ran out; nothing more was written.
	LeaseLost,
}

pub async fn run_worker(service: Arc<FolioService>) -> Result<()> {
	let poll_interval = StdDuration::from_millis(service.cfg.worker.poll_interval_ms);

	tracing::info!(
		poll_interval_ms = service.cfg.worker.poll_interval_ms,
		lease_seconds = service.cfg.worker.lease_seconds,
		"Ingest worker started."
	);

	loop {
		match process_once(&service).await {
			Ok(JobOutcome::Idle) => tokio_time::sleep(poll_interval).await,
			Ok(_) => {},
			Err(err) => {
				tracing::error!(error = %err, "Ingest job processing failed.");

				tokio_time::sleep(poll_interval).await;
			},
		}
	}
}

/// Claims one runnable ingest job and drives its document through the pipeline.
pub async fn process_once(service: &FolioService) -> Result<JobOutcome> {
	let now = OffsetDateTime::now_utc();
	let Some(job) =
		jobs::claim_next_job(&service.db, now, service.cfg.worker.lease_seconds).await?
	else {
		return Ok(JobOutcome::Idle);
	};

	tracing::debug!(job_id = %job.job_id, document_id = %job.document_id, "Claimed ingest job.");

	match service.process_job(&job).await {
		Ok(outcome) => {
			if !jobs::mark_job_done(&service.db.pool, &job, OffsetDateTime::now_utc()).await? {
				return Ok(lease_lost(&job));
			}

			if let IngestOutcome::Ready { total_chunks, embedded } = outcome {
				tracing::info!(
					job_id = %job.job_id,
					document_id = %job.document_id,
					total_chunks,
					embedded,
					"Ingest job completed."
				);
			}

			Ok(JobOutcome::Done)
		},
		Err(folio_service::Error::LeaseLost { .. }) => Ok(lease_lost(&job)),
		Err(err) => handle_failure(service, &job, &err).await,
	}
}

fn lease_lost(job: &IngestJob) -> JobOutcome {
	tracing::warn!(
		job_id = %job.job_id,
		document_id = %job.document_id,
		"Ingest job lease was lost; leaving the job to its new owner."
	);

	JobOutcome::LeaseLost
}

async fn handle_failure(
	service: &FolioService,
	job: &IngestJob,
	err: &folio_service::Error,
) -> Result<JobOutcome> {
	let attempts = job.attempts.saturating_add(1);
	let message = sanitize_job_error(&err.to_string());
	let now = OffsetDateTime::now_utc();
	let max_attempts = i32::try_from(service.cfg.worker.max_attempts).unwrap_or(i32::MAX);

	if err.is_permanent() || attempts >= max_attempts {
		if !service.fail_job(job, attempts, &message).await? {
			return Ok(lease_lost(job));
		}

		tracing::error!(
			job_id = %job.job_id,
			document_id = %job.document_id,
			attempts,
			error = %message,
			"Ingest job failed."
		);

		return Ok(JobOutcome::Failed);
	}

	let available_at = now + backoff_for_attempt(attempts);

	if !jobs::reschedule_job(&service.db.pool, job, attempts, &message, available_at, now).await? {
		return Ok(lease_lost(job));
	}

	tracing::warn!(
		job_id = %job.job_id,
		document_id = %job.document_id,
		attempts,
		retry_in_ms = to_std_duration(available_at - now).as_millis() as u64,
		error = %message,
		"Ingest job attempt failed; retrying."
	);

	Ok(JobOutcome::Retried)
}

/// Redacts credentials and caps the length of an error before it is persisted.
pub fn sanitize_job_error(text: &str) -> String {
	let mut parts = Vec::new();
	let mut redact_next = false;

	for raw in text.split_whitespace() {
		let mut word = raw.to_string();

		if redact_next {
			word = "[REDACTED]".to_string();
			redact_next = false;
		}
		if raw.eq_ignore_ascii_case("bearer") {
			redact_next = true;
		}

		let lowered = raw.to_ascii_lowercase();

		for key in ["api_key", "apikey", "password", "secret", "token"] {
			if lowered.contains(key) && (lowered.contains('=') || lowered.contains(':')) {
				let sep = if raw.contains('=') { '=' } else { ':' };
				let prefix = raw.split(sep).next().unwrap_or(raw);

				word = format!("{prefix}{sep}[REDACTED]");

				break;
			}
		}

		parts.push(word);
	}

	let mut out = parts.join(" ");

	if out.chars().count() > MAX_JOB_ERROR_CHARS {
		out = out.chars().take(MAX_JOB_ERROR_CHARS).collect();
		out.push_str("...");
	}

	out
}

pub fn backoff_for_attempt(attempt: i32) -> Duration {
	let attempts = attempt.max(1) as u32;
	let exp = attempts.saturating_sub(1).min(6);
	let base = BASE_BACKOFF_MS.saturating_mul(1 << exp);

	Duration::milliseconds(base.min(MAX_BACKOFF_MS))
}

fn to_std_duration(duration: Duration) -> StdDuration {
	let millis = duration.whole_milliseconds();

	if millis <= 0 {
		return StdDuration::from_millis(0);
	}

	StdDuration::from_millis(millis as u64)
}
