//! Independent runs side by side.
//!
//! Each job builds and owns its own [`Sim`][crate::Sim]; nothing mutable is
//! shared, so the only parallelism is across jobs.  With the `parallel`
//! feature jobs go to a Rayon pool of `num_threads` workers (Rayon's default
//! when `None`); without it they run one after another.  Either way results
//! come back in job order.

use crate::{SimError, SimResult};

/// Run `f(index, job)` for every job and collect the results in job order.
pub fn run_batch<J, T, F>(jobs: Vec<J>, num_threads: Option<usize>, f: F) -> SimResult<Vec<T>>
where
    J: Send,
    T: Send,
    F: Fn(usize, J) -> T + Send + Sync,
{
    if num_threads == Some(0) {
        return Err(SimError::Configuration("num_threads must be at least 1".into()));
    }
    tracing::info!(jobs = jobs.len(), threads = ?num_threads, "batch started");

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| SimError::Configuration(format!("thread pool: {e}")))?;
        Ok(pool.install(|| {
            jobs.into_par_iter()
                .enumerate()
                .map(|(i, job)| f(i, job))
                .collect()
        }))
    }

    #[cfg(not(feature = "parallel"))]
    {
        Ok(jobs.into_iter().enumerate().map(|(i, job)| f(i, job)).collect())
    }
}
