//! Console implementation of the core `Reporter`

use super::theme::Theme;
use crossterm::style::Stylize;
use modsync_core::Reporter;
use modsync_schema::{Dependency, ModId};

/// Prints progress to stdout and problems to stderr.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    theme: Theme,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            theme: Theme::default(),
            verbose,
        }
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        println!();
        println!("{}", format!("--- {title} ---").with(self.theme.colors.header).bold());
    }

    fn checking(&self, id: &ModId) {
        if self.verbose {
            println!(
                "  {} {}",
                self.theme.icons.pending.with(self.theme.colors.secondary),
                format!("Checking {id}").with(self.theme.colors.secondary)
            );
        }
    }

    fn dependency_found(&self, parent: &ModId, dep: &Dependency) {
        println!(
            "  {} {} {}",
            self.theme.icons.dependency.with(self.theme.colors.secondary),
            dep.name.as_str().with(self.theme.colors.mod_name),
            format!("({}, required by {parent})", dep.id).with(self.theme.colors.secondary)
        );
    }

    fn syncing(&self, id: &ModId, name: &str) {
        println!(
            "  {} {} {}",
            self.theme.icons.active.with(self.theme.colors.active),
            name.with(self.theme.colors.mod_name),
            format!("({id})").with(self.theme.colors.secondary)
        );
    }

    fn removing(&self, path: &str) {
        println!(
            "  {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            path.with(self.theme.colors.secondary)
        );
    }

    fn info(&self, msg: &str) {
        println!(
            "  {} {msg}",
            self.theme.icons.info.with(self.theme.colors.secondary)
        );
    }

    fn success(&self, msg: &str) {
        println!(
            "  {} {msg}",
            self.theme.icons.success.with(self.theme.colors.success)
        );
    }

    fn warning(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }

    fn error(&self, msg: &str) {
        eprintln!(
            "  {} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        );
    }

    fn summary(&self, count: usize, action: &str, elapsed_secs: f64) {
        let noun = if count == 1 { "mod" } else { "mods" };
        println!();
        println!(
            "{}",
            format!("{count} {noun} {action} in {elapsed_secs:.1}s").dark_grey()
        );
    }
}
