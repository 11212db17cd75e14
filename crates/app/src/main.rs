use folio_application::AppContext;
use folio_core::{Section, SectionKind, Settings, Theme};
use folio_ui::Ui;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let settings = settings_from_env();
    let ctx = AppContext::new(settings, seed_sections());
    let mut ui = Ui::new(ctx);
    ui.run()
}

/// Session configuration comes from the environment; nothing is persisted.
/// Invalid values fall back to the defaults.
fn settings_from_env() -> Settings {
    let mut settings = Settings::default();

    if let Some(millis) = std::env::var("FOLIO_FLIP_MILLIS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
    {
        settings.flip_millis = millis;
    }

    if let Ok(value) = std::env::var("FOLIO_SIDEBAR") {
        let value = value.trim();
        settings.sidebar_open = !(value == "0" || value.eq_ignore_ascii_case("off"));
    }

    if let Some(theme) = std::env::var("FOLIO_THEME")
        .ok()
        .and_then(|s| s.parse::<Theme>().ok())
    {
        settings.theme = theme;
    }

    settings.normalize();
    settings
}

fn paragraphs(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// The fixed seed book. Empty-string paragraphs are deliberate vertical
/// spacers between passages.
fn seed_sections() -> Vec<Section> {
    vec![
        Section::new(
            "toc",
            "Table of Contents",
            SectionKind::Toc,
            paragraphs(&[
                "Introduction",
                "Chapter 1: The Journey Begins",
                "Chapter 2: Discoveries",
                "Chapter 3: The Trials",
                "Notes",
                "Appendices",
            ]),
        ),
        Section::new(
            "intro",
            "Introduction",
            SectionKind::Intro,
            paragraphs(&[
                "Welcome to this digital book with a real page-turn feel.",
                "",
                "This book was made with attention to detail and comfortable reading. \
                 The dark theme is designed for evening use, so it does not tire the eyes.",
                "",
                "Use the contents list on the left to move quickly between sections. \
                 Your bookmarks and reading progress follow you for the whole session.",
                "",
                "Enjoy the read!",
            ]),
        ),
        Section::new(
            "ch1",
            "Chapter 1: The Journey Begins",
            SectionKind::Chapter,
            paragraphs(&[
                "In a quiet town surrounded by forests and mountains lived a boy named \
                 Alex. He had always dreamed of adventure.",
                "",
                "Every day after school Alex slipped away to the old attic where his \
                 grandfather's books were kept. Among the dusty volumes he found stories \
                 of distant lands, ancient civilizations and improbable discoveries.",
                "",
                "Then one day he found something special: an old map covered in \
                 mysterious symbols. That discovery changed everything.",
                "",
                "The map pointed to a place in the forest where, according to legend, an \
                 ancient artifact lay hidden. Alex decided to set out the next morning.",
            ]),
        ),
        Section::new(
            "ch2",
            "Chapter 2: Discoveries",
            SectionKind::Chapter,
            paragraphs(&[
                "The morning came up foggy. Alex took his backpack, a compass and the map.",
                "",
                "The forest met him with rustling leaves and birdsong. The deeper he went \
                 into the thicket, the stranger the trees became, their trunks covered \
                 with curious marks.",
                "",
                "Suddenly Alex stepped out into a clearing. At its center rose a stone \
                 obelisk, carved all over with the same symbols as the map.",
                "",
                "Coming closer, he noticed a hollow in the shape of a hand. When he \
                 pressed his palm against it, the obelisk began to glow...",
            ]),
        ),
        Section::new(
            "ch3",
            "Chapter 3: The Trials",
            SectionKind::Chapter,
            paragraphs(&[
                "The ground trembled underfoot. A beam of light burst from the obelisk, \
                 pointing to a hidden passage beneath the roots of an ancient oak.",
                "",
                "Alex climbed down into the vault. Torches lit themselves as he passed, \
                 revealing a long corridor with frescoes on the walls.",
                "",
                "The frescoes told the story of an ancient civilization that had \
                 possessed remarkable knowledge. But that knowledge had to be earned.",
                "",
                "Ahead stood three doors, each bearing a riddle. Alex understood that \
                 this was a test of his wisdom...",
            ]),
        ),
        Section::new(
            "notes",
            "Notes",
            SectionKind::Note,
            paragraphs(&[
                "Note 1: The symbols on the map belong to an ancient language studied by \
                 Alex's grandfather.",
                "",
                "Note 2: The obelisk dates to roughly 3000 BC.",
                "",
                "Note 3: The vault was built as a repository of knowledge.",
            ]),
        ),
        Section::new(
            "appendix",
            "Appendices",
            SectionKind::Appendix,
            paragraphs(&[
                "Appendix A: Deciphering the ancient symbols",
                "Appendix B: Maps of the area",
                "Appendix C: Historical context",
            ]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_sections_have_unique_ids() {
        let sections = seed_sections();
        let mut ids = std::collections::HashSet::new();
        for section in &sections {
            assert!(ids.insert(section.id.clone()), "duplicate id {}", section.id);
        }
        assert!(!sections.is_empty());
    }

    #[test]
    fn seed_opens_on_the_table_of_contents() {
        let sections = seed_sections();
        assert_eq!(sections[0].kind, SectionKind::Toc);
        let ctx = AppContext::new(Settings::default(), sections);
        assert_eq!(ctx.nav.page(), 0);
        assert_eq!(ctx.current_section().kind, SectionKind::Toc);
    }
}
