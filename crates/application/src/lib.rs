//! Application orchestration layer for Folio: the section collection and the
//! page-navigation state machine the UI drives.

use std::collections::BTreeSet;

use folio_core::{Progress, Section, SectionKind, Settings};

/// Owns the ordered section collection and the set of bookmarked page
/// indices. Seed sections are immutable; user sections are appended at the
/// end and never edited or removed. The collection never shrinks, so growth
/// cannot invalidate existing bookmark indices.
#[derive(Debug, Clone)]
pub struct SectionStore {
    sections: Vec<Section>,
    bookmarks: BTreeSet<usize>,
    next_key: u64,
}

impl SectionStore {
    /// Navigation assumes at least one valid index at all times.
    pub fn new(seed: Vec<Section>) -> Self {
        assert!(!seed.is_empty(), "section collection must not be empty");
        Self {
            sections: seed,
            bookmarks: BTreeSet::new(),
            next_key: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Defensive invariant check: callers only ever pass the controller's
    /// current index, which is maintained as always valid. An out-of-range
    /// index means the controller and store have desynchronized, so this
    /// panics rather than recovers.
    pub fn section_at(&self, index: usize) -> &Section {
        &self.sections[index]
    }

    /// Splits `raw_text` into paragraphs on blank-line boundaries and appends
    /// a new section at the end of the collection. Empty titles are accepted
    /// and simply render empty.
    pub fn append(&mut self, title: &str, kind: SectionKind, raw_text: &str) -> &Section {
        let id = self.fresh_id();
        let index = self.sections.len();
        self.sections
            .push(Section::from_raw_text(id, title, kind, raw_text));
        &self.sections[index]
    }

    /// Toggles membership of `index` in the bookmark set. Silent no-op when
    /// out of bounds: there is no error channel here since the caller always
    /// passes its own validated current index.
    pub fn toggle_bookmark(&mut self, index: usize) {
        if index >= self.sections.len() {
            return;
        }
        if !self.bookmarks.insert(index) {
            self.bookmarks.remove(&index);
        }
    }

    pub fn is_bookmarked(&self, index: usize) -> bool {
        self.bookmarks.contains(&index)
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = format!("added-{}", self.next_key);
            self.next_key += 1;
            if !self.sections.iter().any(|s| s.id == id) {
                return id;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipDirection {
    Forward,
    Backward,
}

/// At most one flip is in flight at a time; `next`/`prev` are rejected while
/// `Flipping`. The guard prevents two page turns racing to commit, not a data
/// race — there is exactly one thread of control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Idle,
    Flipping {
        direction: FlipDirection,
        target: usize,
    },
}

/// Owns the current page index, the sidebar/fullscreen flags, and the flip
/// state machine. The index is always a valid position in the section
/// collection; it mutates only in [`finish_flip`](Self::finish_flip) (at the
/// idle re-entry) or in an instant [`jump_to`](Self::jump_to), never at flip
/// start.
///
/// The controller holds no timer. The caller arms one cancelable deadline
/// when `next`/`prev` return true and calls `finish_flip` when it elapses;
/// dropping the deadline at teardown discards the staged flip without
/// mutating state.
#[derive(Debug, Clone)]
pub struct NavigationController {
    page: usize,
    sidebar_open: bool,
    fullscreen: bool,
    transition: Transition,
}

impl NavigationController {
    pub fn new(sidebar_open: bool) -> Self {
        Self {
            page: 0,
            sidebar_open,
            fullscreen: false,
            transition: Transition::Idle,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    pub fn is_flipping(&self) -> bool {
        matches!(self.transition, Transition::Flipping { .. })
    }

    /// Stages a forward page turn. Returns true when a flip was staged, in
    /// which case the caller arms the flip timer. Rejected at the last index
    /// and while another flip is in flight.
    pub fn next(&mut self, len: usize) -> bool {
        if self.is_flipping() || self.page + 1 >= len {
            return false;
        }
        self.transition = Transition::Flipping {
            direction: FlipDirection::Forward,
            target: self.page + 1,
        };
        true
    }

    /// Stages a backward page turn; rejected at index zero and while another
    /// flip is in flight.
    pub fn prev(&mut self) -> bool {
        if self.is_flipping() || self.page == 0 {
            return false;
        }
        self.transition = Transition::Flipping {
            direction: FlipDirection::Backward,
            target: self.page - 1,
        };
        true
    }

    /// Direct selection is instantaneous: no flip staging. A flip already in
    /// flight is overridden and its staged target discarded — the caller must
    /// disarm its timer. Returns false when `index` is out of bounds.
    pub fn jump_to(&mut self, index: usize, len: usize) -> bool {
        if index >= len {
            return false;
        }
        self.page = index;
        self.transition = Transition::Idle;
        true
    }

    /// Commits the staged target index and re-enters idle in a single step.
    /// No-op when idle.
    pub fn finish_flip(&mut self) {
        if let Transition::Flipping { target, .. } = self.transition {
            self.page = target;
            self.transition = Transition::Idle;
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    /// Entering fullscreen always collapses the sidebar; leaving fullscreen
    /// does not reopen it.
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        if self.fullscreen {
            self.sidebar_open = false;
        }
    }

    pub fn progress(&self, len: usize) -> Progress {
        Progress {
            current_page: self.page as u32 + 1,
            total_pages: len as u32,
        }
    }
}

/// Everything the UI renders from and mutates through: settings, the section
/// store, and the navigation controller. The view never touches state except
/// through these components' methods.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub store: SectionStore,
    pub nav: NavigationController,
}

impl AppContext {
    pub fn new(mut settings: Settings, seed: Vec<Section>) -> Self {
        settings.normalize();
        let nav = NavigationController::new(settings.sidebar_open);
        Self {
            settings,
            store: SectionStore::new(seed),
            nav,
        }
    }

    pub fn current_section(&self) -> &Section {
        self.store.section_at(self.nav.page())
    }

    pub fn progress(&self) -> Progress {
        self.nav.progress(self.store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters(count: usize) -> Vec<Section> {
        (1..=count)
            .map(|n| {
                Section::from_raw_text(
                    format!("ch{n}"),
                    format!("Chapter {n}"),
                    SectionKind::Chapter,
                    "One paragraph.",
                )
            })
            .collect()
    }

    fn context(count: usize) -> AppContext {
        AppContext::new(Settings::default(), chapters(count))
    }

    #[test]
    fn jump_to_sets_index_and_stays_idle() {
        let mut ctx = context(5);
        for index in 0..5 {
            assert!(ctx.nav.jump_to(index, ctx.store.len()));
            assert_eq!(ctx.nav.page(), index);
            assert_eq!(ctx.nav.transition(), Transition::Idle);
        }
    }

    #[test]
    fn jump_to_out_of_bounds_is_rejected() {
        let mut ctx = context(3);
        assert!(!ctx.nav.jump_to(3, ctx.store.len()));
        assert_eq!(ctx.nav.page(), 0);
    }

    #[test]
    fn next_at_last_index_is_noop() {
        let mut ctx = context(2);
        assert!(ctx.nav.jump_to(1, 2));
        assert!(!ctx.nav.next(2));
        assert_eq!(ctx.nav.page(), 1);
        assert_eq!(ctx.nav.transition(), Transition::Idle);
    }

    #[test]
    fn prev_at_first_index_is_noop() {
        let mut ctx = context(2);
        assert!(!ctx.nav.prev());
        assert_eq!(ctx.nav.page(), 0);
        assert_eq!(ctx.nav.transition(), Transition::Idle);
    }

    #[test]
    fn second_next_during_flip_is_rejected() {
        let mut nav = NavigationController::new(true);
        assert!(nav.next(5));
        // The index commits at the idle re-entry, not at flip start.
        assert_eq!(nav.page(), 0);
        assert!(!nav.next(5));
        assert!(!nav.prev());
        assert_eq!(
            nav.transition(),
            Transition::Flipping {
                direction: FlipDirection::Forward,
                target: 1
            }
        );
        nav.finish_flip();
        assert_eq!(nav.page(), 1);
        assert_eq!(nav.transition(), Transition::Idle);
    }

    #[test]
    fn finish_flip_when_idle_is_noop() {
        let mut nav = NavigationController::new(true);
        nav.finish_flip();
        assert_eq!(nav.page(), 0);
        assert_eq!(nav.transition(), Transition::Idle);
    }

    #[test]
    fn backward_flip_stages_previous_index() {
        let mut nav = NavigationController::new(true);
        assert!(nav.jump_to(3, 5));
        assert!(nav.prev());
        assert_eq!(
            nav.transition(),
            Transition::Flipping {
                direction: FlipDirection::Backward,
                target: 2
            }
        );
        nav.finish_flip();
        assert_eq!(nav.page(), 2);
    }

    #[test]
    fn jump_during_flip_overrides_staged_target() {
        let mut nav = NavigationController::new(true);
        assert!(nav.next(6));
        assert!(nav.jump_to(4, 6));
        assert_eq!(nav.page(), 4);
        assert_eq!(nav.transition(), Transition::Idle);
        // The discarded flip must not resurface.
        nav.finish_flip();
        assert_eq!(nav.page(), 4);
    }

    #[test]
    fn toggle_bookmark_is_an_involution() {
        let mut store = SectionStore::new(chapters(3));
        assert!(!store.is_bookmarked(1));
        store.toggle_bookmark(1);
        assert!(store.is_bookmarked(1));
        store.toggle_bookmark(1);
        assert!(!store.is_bookmarked(1));
    }

    #[test]
    fn toggle_bookmark_out_of_bounds_is_silent() {
        let mut store = SectionStore::new(chapters(2));
        store.toggle_bookmark(7);
        assert!(!store.is_bookmarked(7));
    }

    #[test]
    fn bookmarks_survive_appends() {
        let mut store = SectionStore::new(chapters(2));
        store.toggle_bookmark(1);
        store.append("Epilogue", SectionKind::Chapter, "The end.");
        assert!(store.is_bookmarked(1));
        assert!(!store.is_bookmarked(2));
    }

    #[test]
    fn append_splits_on_blank_lines() {
        let mut store = SectionStore::new(chapters(1));
        let section = store.append("Epilogue", SectionKind::Chapter, "A\n\nB\n\nC");
        assert_eq!(section.paragraphs, vec!["A", "B", "C"]);
    }

    #[test]
    fn append_empty_text_yields_one_empty_paragraph() {
        let mut store = SectionStore::new(chapters(1));
        let section = store.append("", SectionKind::Note, "");
        assert_eq!(section.paragraphs, vec![String::new()]);
        assert_eq!(section.title, "");
    }

    #[test]
    fn append_places_section_at_the_end() {
        let mut ctx = context(3);
        let old_len = ctx.store.len();
        ctx.store
            .append("Epilogue", SectionKind::Appendix, "The end.");
        assert_eq!(ctx.store.len(), old_len + 1);
        assert_eq!(ctx.store.section_at(old_len).title, "Epilogue");
        assert!(ctx.nav.jump_to(old_len, ctx.store.len()));
        assert_eq!(ctx.nav.page(), old_len);
        assert_eq!(ctx.current_section().title, "Epilogue");
    }

    #[test]
    fn append_ids_skip_existing_keys() {
        let seed = vec![Section::from_raw_text(
            "added-1",
            "Taken",
            SectionKind::Chapter,
            "x",
        )];
        let mut store = SectionStore::new(seed);
        let first = store.append("New", SectionKind::Chapter, "y").id.clone();
        assert_ne!(first, "added-1");
        let second = store.append("Newer", SectionKind::Chapter, "z").id.clone();
        assert_ne!(second, first);
    }

    #[test]
    fn fullscreen_collapses_sidebar_without_restoring() {
        let mut nav = NavigationController::new(true);
        assert!(nav.sidebar_open());
        nav.toggle_fullscreen();
        assert!(nav.fullscreen());
        assert!(!nav.sidebar_open());
        nav.toggle_fullscreen();
        assert!(!nav.fullscreen());
        assert!(!nav.sidebar_open());
    }

    #[test]
    fn progress_is_one_based_over_len() {
        let nav = NavigationController::new(true);
        assert_eq!(nav.progress(7).percent(), (1.0f32 / 7.0) * 100.0);

        let mut nav = NavigationController::new(true);
        assert!(nav.jump_to(6, 7));
        assert_eq!(nav.progress(7).percent(), 100.0);

        let mut nav = NavigationController::new(true);
        assert!(nav.jump_to(1, 4));
        assert_eq!(nav.progress(4).percent(), 50.0);
    }

    #[test]
    #[should_panic]
    fn section_at_out_of_range_panics() {
        let store = SectionStore::new(chapters(1));
        let _ = store.section_at(9);
    }

    #[test]
    #[should_panic]
    fn empty_seed_is_rejected() {
        let _ = SectionStore::new(Vec::new());
    }
}
