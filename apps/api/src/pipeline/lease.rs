//! Per-job mutual exclusion for batch passes.
//!
//! A pass holds exclusive intent over its cohort's score fields for its
//! duration. The lease is an in-process advisory lock: acquisition is
//! immediate or rejected (no queueing — the operator re-triggers manually),
//! and release happens when the guard drops, including on cancellation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("a pipeline pass is already running for job {0}")]
pub struct LeaseBusy(pub Uuid);

#[derive(Clone, Default)]
pub struct PassLeases {
    held: Arc<Mutex<HashSet<Uuid>>>,
}

impl PassLeases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, job_id: Uuid) -> Result<PassLease, LeaseBusy> {
        let mut held = self.held.lock().expect("lease set poisoned");
        if !held.insert(job_id) {
            return Err(LeaseBusy(job_id));
        }
        Ok(PassLease {
            job_id,
            held: Arc::clone(&self.held),
        })
    }
}

/// RAII guard for one job's pass. Dropping it releases the lease.
pub struct PassLease {
    job_id: Uuid,
    held: Arc<Mutex<HashSet<Uuid>>>,
}

impl Drop for PassLease {
    fn drop(&mut self) {
        self.held
            .lock()
            .expect("lease set poisoned")
            .remove(&self.job_id);
    }
}
