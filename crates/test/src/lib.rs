//! Test helpers and fixtures.

use folio_application::AppContext;
use folio_core::{Section, SectionKind, Settings, Theme};

pub fn make_settings(flip_millis: u64) -> Settings {
    Settings {
        flip_millis,
        sidebar_open: true,
        theme: Theme::Dark,
    }
}

pub fn sample_sections(count: usize) -> Vec<Section> {
    (1..=count)
        .map(|n| {
            Section::new(
                format!("ch{n}"),
                format!("Chapter {n}"),
                SectionKind::Chapter,
                vec![format!("Paragraph one of chapter {n}.")],
            )
        })
        .collect()
}

pub fn sample_context(count: usize) -> AppContext {
    AppContext::new(make_settings(600), sample_sections(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_settings() {
        let settings = make_settings(250);
        assert_eq!(settings.flip_millis, 250);
    }

    #[test]
    fn builds_context() {
        let ctx = sample_context(3);
        assert_eq!(ctx.store.len(), 3);
        assert_eq!(ctx.nav.page(), 0);
        assert!(!ctx.nav.is_flipping());
    }
}
