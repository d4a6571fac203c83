use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, db::Db, models::IngestJob};

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_CLAIMED: &str = "CLAIMED";
pub const STATUS_DONE: &str = "DONE";
pub const STATUS_FAILED: &str = "FAILED";

pub async fn enqueue_job<'e, E>(executor: E, document_id: Uuid, now: OffsetDateTime) -> Result<Uuid>
where
	E: PgExecutor<'e>,
{
	let job_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO ingest_jobs (job_id, document_id, status, attempts, available_at, created_at, updated_at)
VALUES ($1,$2,'PENDING',0,$3,$3,$3)",
	)
	.bind(job_id)
	.bind(document_id)
	.bind(now)
	.execute(executor)
	.await?;

	Ok(job_id)
}

/// Claims the oldest runnable job and leases it for `lease_seconds`.
///
/// Claimed jobs whose lease expired are runnable again, so a crashed worker never strands a job.
/// Each claim issues a fresh `lease_id`; writes from an earlier holder no longer match it.
pub async fn claim_next_job(
	db: &Db,
	now: OffsetDateTime,
	lease_seconds: i64,
) -> Result<Option<IngestJob>> {
	let mut tx = db.pool.begin().await?;
	let row = sqlx::query_as::<_, IngestJob>(
		"\
SELECT
	job_id,
	document_id,
	status,
	attempts,
	last_error,
	lease_id,
	available_at,
	created_at,
	updated_at
FROM ingest_jobs
WHERE status IN ('PENDING','CLAIMED') AND available_at <= $1
ORDER BY available_at ASC
LIMIT 1
FOR UPDATE SKIP LOCKED",
	)
	.bind(now)
	.fetch_optional(&mut *tx)
	.await?;
	let job = if let Some(mut job) = row {
		let lease_id = Uuid::new_v4();
		let lease_until = now + time::Duration::seconds(lease_seconds);

		sqlx::query(
			"\
UPDATE ingest_jobs
SET status = 'CLAIMED', lease_id = $1, available_at = $2, updated_at = $3
WHERE job_id = $4",
		)
		.bind(lease_id)
		.bind(lease_until)
		.bind(now)
		.bind(job.job_id)
		.execute(&mut *tx)
		.await?;

		job.status = STATUS_CLAIMED.to_string();
		job.lease_id = Some(lease_id);
		job.available_at = lease_until;
		job.updated_at = now;

		Some(job)
	} else {
		None
	};

	tx.commit().await?;

	Ok(job)
}

/// Extends the lease of a claimed job. Returns `false` when `job` no longer holds the lease.
pub async fn renew_lease<'e, E>(
	executor: E,
	job: &IngestJob,
	lease_until: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE ingest_jobs
SET available_at = $1, updated_at = $2
WHERE job_id = $3 AND status = 'CLAIMED' AND lease_id = $4",
	)
	.bind(lease_until)
	.bind(now)
	.bind(job.job_id)
	.bind(job.lease_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

/// Returns `false` when `job` no longer holds the lease.
pub async fn mark_job_done<'e, E>(
	executor: E,
	job: &IngestJob,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE ingest_jobs
SET status = 'DONE', lease_id = NULL, last_error = NULL, updated_at = $1
WHERE job_id = $2 AND status = 'CLAIMED' AND lease_id = $3",
	)
	.bind(now)
	.bind(job.job_id)
	.bind(job.lease_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

/// Puts a job back in the queue after a failed attempt.
///
/// Returns `false` when `job` no longer holds the lease.
pub async fn reschedule_job<'e, E>(
	executor: E,
	job: &IngestJob,
	attempts: i32,
	error_text: &str,
	available_at: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE ingest_jobs
SET status = 'PENDING',
	lease_id = NULL,
	attempts = $1,
	last_error = $2,
	available_at = $3,
	updated_at = $4
WHERE job_id = $5 AND status = 'CLAIMED' AND lease_id = $6",
	)
	.bind(attempts)
	.bind(error_text)
	.bind(available_at)
	.bind(now)
	.bind(job.job_id)
	.bind(job.lease_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

/// Returns `false` when `job` no longer holds the lease.
pub async fn mark_job_failed<'e, E>(
	executor: E,
	job: &IngestJob,
	attempts: i32,
	error_text: &str,
	now: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE ingest_jobs
SET status = 'FAILED',
	lease_id = NULL,
	attempts = $1,
	last_error = $2,
	updated_at = $3
WHERE job_id = $4 AND status = 'CLAIMED' AND lease_id = $5",
	)
	.bind(attempts)
	.bind(error_text)
	.bind(now)
	.bind(job.job_id)
	.bind(job.lease_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn get_job<'e, E>(executor: E, job_id: Uuid) -> Result<Option<IngestJob>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, IngestJob>(
		"\
SELECT
	job_id,
	document_id,
	status,
	attempts,
	last_error,
	lease_id,
	available_at,
	created_at,
	updated_at
FROM ingest_jobs
WHERE job_id = $1",
	)
	.bind(job_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Counts jobs that are waiting or running.
pub async fn count_pending_jobs<'e, E>(executor: E) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM ingest_jobs WHERE status IN ('PENDING','CLAIMED')")
			.fetch_one(executor)
			.await?;

	Ok(count)
}
