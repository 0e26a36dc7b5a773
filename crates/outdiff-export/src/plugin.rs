use std::thread::JoinHandle;

use outdiff_types::{ExportOptions, OutputFile, Record};

use crate::error::{ExportError, ExportResult};

/// The result of invoking an export plugin.
///
/// Plugins may finish synchronously or hand back work that completes later.
/// Callers treat both forms the same way through [`PendingExport::wait`].
#[derive(Debug)]
pub enum PendingExport {
    /// The files are already available.
    Ready(Vec<OutputFile>),
    /// The files are being produced on another thread.
    Deferred(JoinHandle<ExportResult<Vec<OutputFile>>>),
}

impl PendingExport {
    /// Block until the file list is available.
    pub fn wait(self, key: &str) -> ExportResult<Vec<OutputFile>> {
        match self {
            Self::Ready(files) => Ok(files),
            Self::Deferred(handle) => handle
                .join()
                .map_err(|_| ExportError::invocation(key, "export worker panicked"))?,
        }
    }
}

/// A pluggable export routine.
///
/// The trait is object-safe and `Send + Sync` so loaded plugins can be held
/// as `Box<dyn ExportPlugin>`.
pub trait ExportPlugin: Send + Sync {
    /// The plugin key this instance was loaded for.
    fn key(&self) -> &str;

    /// Convert `records` into output files.
    fn export(&self, records: &[Record], options: &ExportOptions) -> ExportResult<PendingExport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_and_deferred_are_equivalent() {
        let files = vec![OutputFile::new("a.ext", "A")];

        let ready = PendingExport::Ready(files.clone()).wait("demo").unwrap();
        let moved = files.clone();
        let deferred = PendingExport::Deferred(std::thread::spawn(move || Ok(moved)))
            .wait("demo")
            .unwrap();

        assert_eq!(ready, files);
        assert_eq!(deferred, files);
    }

    #[test]
    fn deferred_error_is_propagated() {
        let pending = PendingExport::Deferred(std::thread::spawn(|| {
            Err(ExportError::invocation("demo", "rejected"))
        }));
        let err = pending.wait("demo").unwrap_err();
        assert!(matches!(err, ExportError::Invocation { ref message, .. } if message == "rejected"));
    }

    #[test]
    fn panicking_worker_becomes_an_error() {
        let pending = PendingExport::Deferred(std::thread::spawn(|| -> ExportResult<Vec<OutputFile>> {
            panic!("plugin crashed")
        }));
        assert!(pending.wait("demo").is_err());
    }
}
