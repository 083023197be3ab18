//! Reporter trait for dependency injection
//!
//! Core components report progress and recoverable failures through this
//! trait instead of printing, so the CLI decides how things look and tests
//! can run silently or record what was said.

use modsync_schema::{Dependency, ModId};

pub trait Reporter: Send + Sync {
    /// A new phase of the run has started (e.g. "Resolving Dependencies").
    fn section(&self, title: &str);

    /// Metadata for `id` is about to be fetched.
    fn checking(&self, id: &ModId);

    /// `parent` declared a dependency that was not seen before.
    fn dependency_found(&self, parent: &ModId, dep: &Dependency);

    /// Files for a mod are being copied into the mirror.
    fn syncing(&self, id: &ModId, name: &str);

    /// A mirror file is being deleted.
    fn removing(&self, path: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a recoverable problem.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display a final summary of the run.
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn checking(&self, id: &ModId) {
        (**self).checking(id);
    }
    fn dependency_found(&self, parent: &ModId, dep: &Dependency) {
        (**self).dependency_found(parent, dep);
    }
    fn syncing(&self, id: &ModId, name: &str) {
        (**self).syncing(id, name);
    }
    fn removing(&self, path: &str) {
        (**self).removing(path);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        (**self).summary(count, action, elapsed_secs);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn checking(&self, _: &ModId) {}
    fn dependency_found(&self, _: &ModId, _: &Dependency) {}
    fn syncing(&self, _: &ModId, _: &str) {}
    fn removing(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: &str, _: f64) {}
}

/// Keeps warnings, errors and removals so tests can assert on what was
/// surfaced.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    warnings: std::sync::Mutex<Vec<String>>,
    errors: std::sync::Mutex<Vec<String>>,
    removed: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub(crate) fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub(crate) fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn section(&self, _: &str) {}
    fn checking(&self, _: &ModId) {}
    fn dependency_found(&self, _: &ModId, _: &Dependency) {}
    fn syncing(&self, _: &ModId, _: &str) {}
    fn removing(&self, path: &str) {
        self.removed.lock().unwrap().push(path.to_string());
    }
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, msg: &str) {
        self.warnings.lock().unwrap().push(msg.to_string());
    }
    fn error(&self, msg: &str) {
        self.errors.lock().unwrap().push(msg.to_string());
    }
    fn summary(&self, _: usize, _: &str, _: f64) {}
}
