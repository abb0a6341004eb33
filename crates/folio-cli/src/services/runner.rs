// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background saver: runs one blocking save at a time off the async runtime.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use folio_core::error::{FolioError, Result};

/// Runs saves on tokio's blocking pool. A second request while one is in
/// flight is refused with [`FolioError::Busy`].
#[derive(Clone, Default)]
pub struct BackgroundSaver {
    busy: Arc<Mutex<bool>>,
}

/// Clears the busy flag when the save ends, including by panic.
struct BusyGuard(Arc<Mutex<bool>>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

impl BackgroundSaver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `job` on the blocking pool and wait for its result.
    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.acquire()?;
        let outcome = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            job()
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Save task did not finish");
                Err(FolioError::Io(std::io::Error::other(format!(
                    "save task failed: {err}"
                ))))
            }
        }
    }

    fn acquire(&self) -> Result<BusyGuard> {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        if *busy {
            debug!("Refusing save, another one is running");
            return Err(FolioError::Busy);
        }
        *busy = true;
        Ok(BusyGuard(Arc::clone(&self.busy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[tokio::test]
    async fn returns_the_job_result() {
        let saver = BackgroundSaver::new();
        let value = saver.run(|| Ok(41 + 1)).await.expect("run");
        assert_eq!(value, 42);
        assert!(!saver.is_busy());
    }

    #[tokio::test]
    async fn job_errors_pass_through() {
        let saver = BackgroundSaver::new();
        let err = saver
            .run(|| -> Result<()> { Err(FolioError::NothingToSave) })
            .await
            .err()
            .expect("error");
        assert!(matches!(err, FolioError::NothingToSave));
        assert!(!saver.is_busy());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overlapping_save_is_refused() {
        let saver = BackgroundSaver::new();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let first = {
            let saver = saver.clone();
            tokio::spawn(async move {
                saver
                    .run(move || {
                        started_tx.send(()).expect("signal start");
                        release_rx.recv().expect("wait for release");
                        Ok(())
                    })
                    .await
            })
        };

        tokio::task::spawn_blocking(move || started_rx.recv().expect("started"))
            .await
            .expect("join");
        assert!(saver.is_busy());
        let second = saver.run(|| Ok(())).await;
        assert!(matches!(second, Err(FolioError::Busy)));

        release_tx.send(()).expect("release");
        first.await.expect("join").expect("first save");
        assert!(!saver.is_busy());
    }

    #[tokio::test]
    async fn panicking_job_clears_busy_flag() {
        let saver = BackgroundSaver::new();
        let result = saver.run(|| -> Result<()> { panic!("boom") }).await;
        assert!(matches!(result, Err(FolioError::Io(_))));
        assert!(!saver.is_busy());
    }
}
