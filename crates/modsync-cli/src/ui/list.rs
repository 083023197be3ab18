//! Column-aligned listings for `resolve`, `sync --dry-run`, `check` and `identify`

use super::theme::{Theme, truncate};
use crossterm::style::{Color, Stylize};
use modsync_core::check::{CheckRow, CheckStatus};
use modsync_core::identify::Identification;
use modsync_core::planner::{DownloadPlan, Freshness};
use modsync_core::resolver::Resolution;

fn print_header(theme: &Theme, third: &str) {
    let header = format!(
        "  {:<iw$} {:<nw$} {}",
        "id",
        "name",
        third,
        iw = theme.layout.id_width,
        nw = theme.layout.name_width,
    );
    println!();
    println!("{}", header.dark_grey());
}

fn print_row(theme: &Theme, id: &str, name: &str, status: &str, color: Color) {
    let id_part = format!("{:<width$}", id, width = theme.layout.id_width);
    let name_part = format!(
        "{:<width$}",
        truncate(name, theme.layout.name_width),
        width = theme.layout.name_width
    );
    println!(
        "  {} {} {}",
        id_part.with(theme.colors.secondary),
        name_part.with(theme.colors.mod_name),
        status.with(color)
    );
}

/// Print every resolved mod.
pub fn print_resolution(resolution: &Resolution) {
    let theme = Theme::default();
    print_header(&theme, "updated");
    for (id, meta) in &resolution.resolved {
        let (status, color) = if resolution.unreachable.contains(id) {
            ("unreachable", theme.colors.warning)
        } else {
            (meta.updated.as_str(), theme.colors.secondary)
        };
        print_row(&theme, id.as_str(), &meta.name, status, color);
    }
}

/// Print the planner's decision for every resolved mod.
pub fn print_plan(resolution: &Resolution, plan: &DownloadPlan) {
    let theme = Theme::default();
    print_header(&theme, "plan");
    for (id, freshness) in &plan.decisions {
        let name = resolution
            .resolved
            .get(id)
            .map_or(id.as_str(), |m| m.name.as_str());
        let color = match freshness {
            Freshness::Current => theme.colors.secondary,
            Freshness::Retroactive => theme.colors.success,
            Freshness::Missing | Freshness::FilesMissing | Freshness::Stale => {
                theme.colors.warning
            }
        };
        print_row(&theme, id.as_str(), name, freshness.label(), color);
    }
}

/// Print freshness check rows.
pub fn print_check(rows: &[CheckRow]) {
    let theme = Theme::default();
    print_header(&theme, "status");
    for row in rows {
        let (status, color) = match &row.status {
            CheckStatus::UpToDate => (row.status.label().to_string(), theme.colors.success),
            CheckStatus::Outdated { remote } => (
                format!("outdated ({} → {remote})", row.locked),
                theme.colors.warning,
            ),
            CheckStatus::Untracked => (row.status.label().to_string(), theme.colors.secondary),
            CheckStatus::Unreachable { reason } => {
                (format!("unreachable: {reason}"), theme.colors.error)
            }
        };
        print_row(&theme, row.id.as_str(), &row.name, &status, color);
    }
}

/// Print package ownership.
pub fn print_identification(result: &Identification) {
    let theme = Theme::default();
    for (id, files) in &result.matches {
        println!();
        println!(
            "{} {}",
            id.as_str().with(theme.colors.mod_name),
            format!("({} files)", files.len()).dark_grey()
        );
        for file in files {
            println!("  {}", file.as_str().with(theme.colors.secondary));
        }
    }

    if !result.unidentified.is_empty() {
        println!();
        println!("{}", "Unidentified".with(theme.colors.warning));
        for file in &result.unidentified {
            println!("  {}", file.as_str().with(theme.colors.secondary));
        }
    }
}
