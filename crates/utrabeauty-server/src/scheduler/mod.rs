//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers recurring
//! housekeeping jobs.

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Top of every hour.
const SESSION_PURGE_SCHEDULE: &str = "0 0 * * * *";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(pool: PgPool) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_session_purge_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register an hourly job deleting expired login sessions.
async fn register_session_purge_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(SESSION_PURGE_SCHEDULE, move |_uuid, _lock| {
        let pool = pool.clone();

        Box::pin(async move {
            match utrabeauty_db::delete_expired_sessions(&pool).await {
                Ok(0) => tracing::debug!("scheduler: no expired sessions"),
                Ok(removed) => tracing::info!(removed, "scheduler: purged expired sessions"),
                Err(e) => tracing::error!(error = %e, "scheduler: session purge failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
