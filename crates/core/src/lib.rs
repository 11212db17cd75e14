//! Core domain types for Folio.

use std::time::Duration;

/// One navigable unit of the book: a title, a kind, and an ordered list of
/// display paragraphs. Paragraph order is display order and is never
/// reordered after creation; an empty string element is a deliberate vertical
/// spacer, not missing content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub kind: SectionKind,
    pub paragraphs: Vec<String>,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: SectionKind,
        paragraphs: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            paragraphs,
        }
    }

    pub fn from_raw_text(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: SectionKind,
        raw_text: &str,
    ) -> Self {
        Self::new(id, title, kind, split_paragraphs(raw_text))
    }
}

/// Splits freeform text into paragraphs on blank-line boundaries. Empty input
/// yields a single empty paragraph; runs of extra blank lines yield empty
/// paragraph elements, which render as vertical spacers.
pub fn split_paragraphs(raw_text: &str) -> Vec<String> {
    raw_text.split("\n\n").map(str::to_string).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Toc,
    Intro,
    Chapter,
    Bookmark,
    Note,
    Appendix,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Toc => "toc",
            SectionKind::Intro => "intro",
            SectionKind::Chapter => "chapter",
            SectionKind::Bookmark => "bookmark",
            SectionKind::Note => "note",
            SectionKind::Appendix => "appendix",
        }
    }

    pub fn cycle_next(self) -> Self {
        match self {
            SectionKind::Toc => SectionKind::Intro,
            SectionKind::Intro => SectionKind::Chapter,
            SectionKind::Chapter => SectionKind::Bookmark,
            SectionKind::Bookmark => SectionKind::Note,
            SectionKind::Note => SectionKind::Appendix,
            SectionKind::Appendix => SectionKind::Toc,
        }
    }

    pub fn cycle_prev(self) -> Self {
        match self {
            SectionKind::Toc => SectionKind::Appendix,
            SectionKind::Intro => SectionKind::Toc,
            SectionKind::Chapter => SectionKind::Intro,
            SectionKind::Bookmark => SectionKind::Chapter,
            SectionKind::Note => SectionKind::Bookmark,
            SectionKind::Appendix => SectionKind::Note,
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionKind {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "toc" => Ok(SectionKind::Toc),
            "intro" => Ok(SectionKind::Intro),
            "chapter" => Ok(SectionKind::Chapter),
            "bookmark" => Ok(SectionKind::Bookmark),
            "note" => Ok(SectionKind::Note),
            "appendix" => Ok(SectionKind::Appendix),
            _ => Err("unknown section kind"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err("unknown theme"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub flip_millis: u64,
    pub sidebar_open: bool,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            flip_millis: 600,
            sidebar_open: true,
            theme: Theme::Dark,
        }
    }
}

impl Settings {
    pub const MAX_FLIP_MILLIS: u64 = 5_000;

    pub fn normalize(&mut self) {
        self.flip_millis = self.flip_millis.min(Self::MAX_FLIP_MILLIS);
    }

    pub fn flip_duration(&self) -> Duration {
        Duration::from_millis(self.flip_millis)
    }

    pub fn cycle_theme(&mut self) {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current_page: u32,
    pub total_pages: u32,
}

impl Progress {
    pub fn percent(&self) -> f32 {
        if self.total_pages == 0 {
            0.0
        } else {
            (self.current_page as f32 / self.total_pages as f32) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_use_reference_flip_delay() {
        let settings = Settings::default();
        assert_eq!(settings.flip_millis, 600);
        assert!(settings.sidebar_open);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn settings_normalize_clamps_flip_delay() {
        let mut settings = Settings {
            flip_millis: 60_000,
            sidebar_open: false,
            theme: Theme::Light,
        };
        settings.normalize();
        assert_eq!(settings.flip_millis, Settings::MAX_FLIP_MILLIS);
        assert_eq!(settings.flip_duration(), Duration::from_millis(5_000));
    }

    #[test]
    fn cycle_theme_alternates() {
        let mut settings = Settings::default();
        settings.cycle_theme();
        assert_eq!(settings.theme, Theme::Light);
        settings.cycle_theme();
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn theme_parses_strings() {
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!(" DARK ".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn section_kind_parses_strings() {
        assert_eq!("toc".parse::<SectionKind>().unwrap(), SectionKind::Toc);
        assert_eq!(
            "Chapter".parse::<SectionKind>().unwrap(),
            SectionKind::Chapter
        );
        assert_eq!(
            " APPENDIX ".parse::<SectionKind>().unwrap(),
            SectionKind::Appendix
        );
        assert!("preface".parse::<SectionKind>().is_err());
    }

    #[test]
    fn section_kind_cycle_visits_every_kind() {
        let mut kind = SectionKind::Toc;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..6 {
            seen.insert(kind);
            kind = kind.cycle_next();
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(kind, SectionKind::Toc);
        assert_eq!(kind.cycle_prev(), SectionKind::Appendix);
    }

    #[test]
    fn splits_on_blank_line_boundaries() {
        assert_eq!(split_paragraphs("A\n\nB\n\nC"), vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_input_is_a_single_empty_paragraph() {
        assert_eq!(split_paragraphs(""), vec![String::new()]);
    }

    #[test]
    fn extra_blank_lines_become_spacer_paragraphs() {
        assert_eq!(split_paragraphs("A\n\n\n\nB"), vec!["A", "", "B"]);
    }

    #[test]
    fn from_raw_text_splits_paragraphs() {
        let section =
            Section::from_raw_text("ep", "Epilogue", SectionKind::Chapter, "First.\n\nSecond.");
        assert_eq!(section.paragraphs, vec!["First.", "Second."]);
        assert_eq!(section.kind, SectionKind::Chapter);
    }

    #[test]
    fn progress_is_a_percentage_of_total() {
        let progress = Progress {
            current_page: 1,
            total_pages: 4,
        };
        assert_eq!(progress.percent(), 25.0);
    }

    #[test]
    fn progress_handles_zero_pages() {
        let progress = Progress {
            current_page: 1,
            total_pages: 0,
        };
        assert_eq!(progress.percent(), 0.0);
    }
}
