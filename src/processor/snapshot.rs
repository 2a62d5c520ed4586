use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::{
    config::Config,
    processor::{ParseSummary, ProcessorError, engine::FundingEngine},
};

/// Shared handle to the current engine snapshot.
///
/// Readers take an `Arc` and query it without further locking. A refresh
/// builds a whole new engine first and only then swaps the pointer, so a
/// reader sees either the old snapshot or the new one, never a mix.
#[derive(Debug)]
pub struct EngineHandle {
    current: RwLock<Arc<FundingEngine>>,
}

impl EngineHandle {
    pub fn new(engine: FundingEngine) -> Self {
        Self {
            current: RwLock::new(Arc::new(engine)),
        }
    }

    pub fn snapshot(&self) -> Arc<FundingEngine> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Installs `engine`, returning the snapshot it replaced
    pub fn replace(&self, engine: FundingEngine) -> Arc<FundingEngine> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(engine))
    }

    /// Loads `path` into a fresh engine and swaps it in.
    ///
    /// On error the current snapshot stays in place.
    pub fn reload(&self, path: &Path, config: &Config) -> Result<ParseSummary, ProcessorError> {
        let (engine, summary) = FundingEngine::load_csv(path, config)?;
        self.replace(engine);
        info!(path = %path.display(), rows = summary.rows_loaded, "funding snapshot replaced");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_old_snapshot_survives_replace() {
        let (first, _) =
            FundingEngine::from_csv_str("startup,amount\nA,1\n", &Config::default()).unwrap();
        let (second, _) =
            FundingEngine::from_csv_str("startup,amount\nA,1\nB,2\n", &Config::default())
                .unwrap();

        let handle = EngineHandle::new(first);
        let before = handle.snapshot();
        handle.replace(second);

        assert_eq!(before.overall_summary().total_amount, 1.0);
        assert_eq!(handle.snapshot().overall_summary().total_amount, 3.0);
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let (engine, _) =
            FundingEngine::from_csv_str("startup,amount\nA,1\n", &Config::default()).unwrap();
        let handle = EngineHandle::new(engine);

        let mut bad = NamedTempFile::new().unwrap();
        write!(bad, "startup,city\nA,Pune\n").unwrap();
        assert!(handle.reload(bad.path(), &Config::default()).is_err());
        assert_eq!(handle.snapshot().dataset().row_count(), 1);

        let mut good = NamedTempFile::new().unwrap();
        write!(good, "startup,amount\nA,1\nB,4\n").unwrap();
        let summary = handle.reload(good.path(), &Config::default()).unwrap();
        assert_eq!(summary.rows_loaded, 2);
        assert_eq!(handle.snapshot().overall_summary().startup_count, 2);
    }
}
