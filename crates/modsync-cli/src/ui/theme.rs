//! Colors, icons and column widths for console output

use crossterm::style::Color;

/// Console theme
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Colors for different UI elements
    pub colors: ColorScheme,
    /// Status icons
    pub icons: Icons,
    /// Column widths for tabular output
    pub layout: Layout,
}

/// Color scheme for UI elements
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// Mod names (primary content)
    pub mod_name: Color,
    /// Ids, paths and other secondary info
    pub secondary: Color,
    /// Section headers
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    /// Files being copied
    pub active: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            mod_name: Color::Cyan,
            secondary: Color::DarkGrey,
            header: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            active: Color::Blue,
        }
    }
}

/// Status icons
#[derive(Debug, Clone)]
pub struct Icons {
    pub pending: &'static str,
    pub active: &'static str,
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    /// Dependency edge (→)
    pub dependency: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            pending: "○",
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
            dependency: "→",
        }
    }
}

/// Column widths
#[derive(Debug, Clone)]
pub struct Layout {
    /// Width of the mod id column
    pub id_width: usize,
    /// Width of the mod name column
    pub name_width: usize,
    /// Width of the status column
    pub status_width: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            id_width: 12,
            name_width: 36,
            status_width: 16,
        }
    }
}

/// Cut `s` to at most `width` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = s.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("CBA_A3", 10), "CBA_A3");
        assert_eq!(truncate("Community Base Addons", 10), "Community…");
        assert_eq!(truncate("Ünïcödé", 4), "Ünï…");
    }

    #[test]
    fn test_theme_defaults() {
        let theme = Theme::default();
        assert_eq!(theme.icons.success, "✓");
        assert_eq!(theme.icons.warning, "⚠");
        assert!(theme.layout.name_width > theme.layout.id_width);
    }
}
