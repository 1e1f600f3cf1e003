//! Progress reporting for long enumerations.
//!
//! # Example
//!
//! ```
//! use cellwalk::progress::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//! progress.report(1, 3, "building cells");
//! ```

/// A callback that receives `(current, total, message)` updates.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report progress of a sub-task occupying step `stage` of `stages`.
    ///
    /// Sub-progress is scaled by 1000 so the caller sees a single monotonic
    /// counter across stages.
    #[inline]
    pub fn report_stage(
        &self,
        sub_current: usize,
        sub_total: usize,
        stage: usize,
        stages: usize,
        message: &str,
    ) {
        if sub_total == 0 || stages == 0 {
            return;
        }
        let sub_fraction = (sub_current.min(sub_total) * 1000) / sub_total;
        (self.callback)(stage * 1000 + sub_fraction, stages * 1000, message);
    }

    /// Create a reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_report_stage_scaling() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |c, t, _| sink.lock().unwrap().push((c, t)));

        progress.report_stage(5, 10, 1, 4, "half of stage 1");
        progress.report_stage(1, 0, 0, 4, "ignored");
        progress.report(4, 4, "done");

        assert_eq!(*seen.lock().unwrap(), vec![(1500, 4000), (4, 4)]);
    }
}
