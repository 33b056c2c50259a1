use std::path::{Path, PathBuf};

use crate::{
    config::Shortcut,
    drives::Drive,
    error::{Error, Result},
    fs_ops::{self, Entry},
};

// ============================================================================
// Panel identity
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanelId {
    PrimaryTree,
    SecondaryTree,
    Shortcuts,
    Drives,
}

/// Behaviour tag used by the dispatcher to pick a key handler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelKind {
    Tree,
    Shortcuts,
    Drives,
}

impl PanelId {
    /// Focus order for the cycle key
    pub const CYCLE: [PanelId; 4] = [
        PanelId::PrimaryTree,
        PanelId::SecondaryTree,
        PanelId::Drives,
        PanelId::Shortcuts,
    ];

    pub fn kind(self) -> PanelKind {
        match self {
            PanelId::PrimaryTree | PanelId::SecondaryTree => PanelKind::Tree,
            PanelId::Shortcuts => PanelKind::Shortcuts,
            PanelId::Drives => PanelKind::Drives,
        }
    }
}

// ============================================================================
// List model (cursor + scroll), shared by every panel
// ============================================================================

/// Items that can be tracked across refreshes by a stable identity.
pub trait Keyed {
    fn key(&self) -> &Path;
}

impl Keyed for Entry {
    fn key(&self) -> &Path {
        &self.path
    }
}

impl Keyed for Shortcut {
    fn key(&self) -> &Path {
        &self.path
    }
}

impl Keyed for Drive {
    fn key(&self) -> &Path {
        &self.device
    }
}

#[derive(Debug, Clone)]
pub struct ListModel<T> {
    items: Vec<T>,
    cursor: usize,
    scroll: usize,
}

impl<T> Default for ListModel<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            scroll: 0,
        }
    }
}

impl<T: Keyed> ListModel<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            cursor: 0,
            scroll: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.cursor)
    }

    /// Single steps wrap around both ends
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let next = (self.cursor as isize + delta).rem_euclid(len as isize);
        self.cursor = next as usize;
    }

    /// Page jumps clamp at the ends instead of wrapping
    pub fn page(&mut self, delta: isize) {
        let max = self.items.len().saturating_sub(1) as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, max) as usize;
    }

    pub fn select_first(&mut self) {
        self.cursor = 0;
    }

    pub fn select_last(&mut self) {
        self.cursor = self.items.len().saturating_sub(1);
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    pub fn select_key(&mut self, key: &Path) -> bool {
        match self.items.iter().position(|i| i.key() == key) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    /// Swap in a new item sequence, keeping the cursor on the same item by
    /// identity. When that item is gone the cursor clamps to the nearest index.
    pub fn replace(&mut self, items: Vec<T>) {
        let selected_key = self.selected().map(|i| i.key().to_path_buf());
        let previous = self.cursor;
        self.items = items;

        self.cursor = selected_key
            .and_then(|key| self.items.iter().position(|i| i.key() == key))
            .unwrap_or_else(|| previous.min(self.items.len().saturating_sub(1)));
    }

    /// Keep the scroll offset while the cursor stays in view, otherwise recenter.
    pub fn ensure_visible(&mut self, height: usize) {
        let len = self.items.len();
        if height == 0 || len <= height {
            self.scroll = 0;
            return;
        }

        let max_scroll = len - height;
        if self.cursor >= self.scroll && self.cursor < self.scroll + height {
            self.scroll = self.scroll.min(max_scroll);
        } else {
            self.scroll = self.cursor.saturating_sub(height / 2).min(max_scroll);
        }
    }
}

// ============================================================================
// Directory panel
// ============================================================================

/// Apply the hidden-entry and search filters to a sorted listing.
pub fn filter_visible(listing: &[Entry], show_hidden: bool, filter: &str) -> Vec<Entry> {
    let needle = filter.to_lowercase();
    listing
        .iter()
        .filter(|e| show_hidden || !e.hidden)
        .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

pub struct TreePanel {
    dir: PathBuf,
    /// Full sorted listing, before filters
    listing: Vec<Entry>,
    pub list: ListModel<Entry>,
    filter: String,
    show_hidden: bool,
    /// Marked paths in selection order
    marked: Vec<PathBuf>,
    error: Option<Error>,
}

impl TreePanel {
    pub fn new(dir: PathBuf, show_hidden: bool) -> Result<Self> {
        let listing = fs_ops::list_dir(&dir)?;
        let visible = filter_visible(&listing, show_hidden, "");
        Ok(Self {
            dir,
            listing,
            list: ListModel::new(visible),
            filter: String::new(),
            show_hidden,
            marked: Vec::new(),
            error: None,
        })
    }

    /// Open `dir`, or the nearest ancestor that can be listed.
    pub fn open(dir: PathBuf, show_hidden: bool) -> Self {
        match Self::new(dir.clone(), show_hidden) {
            Ok(panel) => panel,
            Err(e) => {
                tracing::warn!("cannot open {}: {}", dir.display(), e);
                let fallback = fs_ops::nearest_listable_ancestor(&dir);
                Self::new(fallback.clone(), show_hidden).unwrap_or_else(|e| Self {
                    dir: fallback,
                    listing: Vec::new(),
                    list: ListModel::default(),
                    filter: String::new(),
                    show_hidden,
                    marked: Vec::new(),
                    error: Some(e),
                })
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn marked(&self) -> &[PathBuf] {
        &self.marked
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn selected(&self) -> Option<&Entry> {
        self.list.selected()
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.list.move_cursor(delta);
    }

    /// Re-list the current directory. On failure the last good entries stay.
    pub fn reload(&mut self) -> Result<()> {
        match fs_ops::list_dir(&self.dir) {
            Ok(listing) => {
                self.apply_listing(listing);
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Merge a fresh listing, keeping the cursor on the same path.
    pub fn apply_listing(&mut self, listing: Vec<Entry>) {
        self.error = None;
        self.listing = listing;
        let listing = &self.listing;
        self.marked.retain(|p| listing.iter().any(|e| &e.path == p));
        self.rederive();
    }

    pub fn record_error(&mut self, error: Error) {
        self.error = Some(error);
    }

    fn rederive(&mut self) {
        let visible = filter_visible(&self.listing, self.show_hidden, &self.filter);
        self.list.replace(visible);
    }

    /// Change directory. The panel is untouched if `dir` cannot be listed.
    pub fn navigate(&mut self, dir: PathBuf) -> Result<()> {
        let listing = fs_ops::list_dir(&dir)?;
        self.dir = dir;
        self.listing = listing;
        self.filter.clear();
        self.marked.clear();
        self.error = None;
        self.list = ListModel::new(filter_visible(&self.listing, self.show_hidden, ""));
        Ok(())
    }

    /// Go up one level with the cursor on the directory we came from.
    pub fn navigate_up(&mut self) -> Result<()> {
        let Some(parent) = self.dir.parent().map(Path::to_path_buf) else {
            return Ok(());
        };
        let previous = self.dir.clone();
        self.navigate(parent)?;
        self.list.select_key(&previous);
        Ok(())
    }

    pub fn enter_selected(&mut self) -> Result<()> {
        let Some(entry) = self.selected().filter(|e| e.is_dir()).cloned() else {
            return Ok(());
        };
        self.navigate(entry.path)
    }

    /// Move to the nearest listable ancestor of `dir`.
    pub fn relocate(&mut self, dir: &Path) {
        let target = fs_ops::nearest_listable_ancestor(dir);
        if let Err(e) = self.navigate(target.clone()) {
            tracing::warn!("relocation to {} failed: {}", target.display(), e);
            self.dir = target;
            self.listing.clear();
            self.list = ListModel::default();
            self.error = Some(e);
        }
    }

    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.to_owned();
        self.rederive();
    }

    pub fn set_show_hidden(&mut self, show: bool) {
        if self.show_hidden != show {
            self.show_hidden = show;
            self.rederive();
        }
    }

    pub fn toggle_hidden(&mut self) {
        self.set_show_hidden(!self.show_hidden);
    }

    /// Mark or unmark the cursor entry and step down
    pub fn toggle_mark(&mut self) {
        let Some(path) = self.selected().map(|e| e.path.clone()) else {
            return;
        };
        if let Some(pos) = self.marked.iter().position(|p| p == &path) {
            self.marked.remove(pos);
        } else {
            self.marked.push(path);
        }
        self.list.move_cursor(1);
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear();
    }

    pub fn is_marked(&self, path: &Path) -> bool {
        self.marked.iter().any(|p| p == path)
    }

    /// Marked paths in order, or the cursor entry when nothing is marked
    pub fn selection(&self) -> Vec<PathBuf> {
        if self.marked.is_empty() {
            self.selected().map(|e| vec![e.path.clone()]).unwrap_or_default()
        } else {
            self.marked.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::fs_ops::EntryKind;

    fn entry(name: &str) -> Entry {
        Entry {
            path: PathBuf::from("/t").join(name),
            name: name.to_owned(),
            kind: EntryKind::File,
            target_is_dir: false,
            size: 0,
            modified: None,
            mode: 0o644,
            hidden: name.starts_with('.'),
        }
    }

    fn model(names: &[&str]) -> ListModel<Entry> {
        ListModel::new(names.iter().map(|n| entry(n)).collect())
    }

    #[test]
    fn test_cursor_wraps_both_directions() {
        for n in 1..=5 {
            let names: Vec<String> = (0..n).map(|i| format!("f{}", i)).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut list = model(&refs);

            list.select_last();
            list.move_cursor(1);
            assert_eq!(list.cursor(), 0, "down from last with n={}", n);

            list.move_cursor(-1);
            assert_eq!(list.cursor(), n - 1, "up from first with n={}", n);
        }
    }

    #[test]
    fn test_cursor_on_empty_list_is_noop() {
        let mut list: ListModel<Entry> = ListModel::default();
        list.move_cursor(1);
        list.move_cursor(-1);
        assert_eq!(list.cursor(), 0);
        assert!(list.selected().is_none());
    }

    #[test]
    fn test_page_clamps_instead_of_wrapping() {
        let mut list = model(&["a", "b", "c", "d"]);
        list.page(10);
        assert_eq!(list.cursor(), 3);
        list.page(-10);
        assert_eq!(list.cursor(), 0);
    }

    #[test]
    fn test_replace_keeps_cursor_on_same_entry() {
        let mut list = model(&["a", "b", "c"]);
        list.select_index(1);

        list.replace(vec![entry("a"), entry("b"), entry("c"), entry("d")]);
        assert_eq!(list.selected().unwrap().name, "b");

        list.replace(vec![entry("0"), entry("a"), entry("b")]);
        assert_eq!(list.cursor(), 2);
        assert_eq!(list.selected().unwrap().name, "b");
    }

    #[test]
    fn test_replace_clamps_when_selected_entry_removed() {
        let mut list = model(&["a", "b", "c"]);
        list.select_index(1);
        list.replace(vec![entry("a"), entry("c"), entry("d")]);
        assert_eq!(list.cursor(), 1);

        let mut list = model(&["a", "b", "c"]);
        list.select_index(2);
        list.replace(vec![entry("a")]);
        assert_eq!(list.cursor(), 0);
    }

    #[test]
    fn test_ensure_visible_keeps_or_recenters_scroll() {
        let names: Vec<String> = (0..50).map(|i| format!("f{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut list = model(&refs);

        list.select_index(5);
        list.ensure_visible(10);
        assert_eq!(list.scroll(), 0);

        list.select_index(30);
        list.ensure_visible(10);
        assert_eq!(list.scroll(), 25);

        // still visible, scroll unchanged
        list.select_index(27);
        list.ensure_visible(10);
        assert_eq!(list.scroll(), 25);

        list.select_last();
        list.ensure_visible(10);
        assert_eq!(list.scroll(), 40);
    }

    #[test]
    fn test_filter_is_case_insensitive_and_respects_hidden() {
        let listing = vec![entry(".Readme"), entry("README.md"), entry("main.rs")];
        let visible = filter_visible(&listing, false, "readme");
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "README.md");

        let visible = filter_visible(&listing, true, "READ");
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_tree_panel_filter_and_hidden_toggle() {
        let tmp = tempfile::tempdir().unwrap();
        for name in [".env", "Cargo.toml", "cargo.lock", "README.md"] {
            fs::write(tmp.path().join(name), b"").unwrap();
        }

        let mut panel = TreePanel::new(tmp.path().to_path_buf(), false).unwrap();
        assert_eq!(panel.list.len(), 3);

        panel.set_filter("CARGO");
        let names: Vec<_> = panel.list.items().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["cargo.lock", "Cargo.toml"]);

        panel.set_filter("");
        panel.toggle_hidden();
        assert_eq!(panel.list.len(), 4);
        assert_eq!(panel.list.items()[0].name, ".env");
    }

    #[test]
    fn test_reload_failure_keeps_last_good_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("work");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("a"), b"").unwrap();

        let mut panel = TreePanel::new(dir.clone(), false).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert!(panel.reload().unwrap_err().is_not_found());
        assert_eq!(panel.list.len(), 1);
        assert!(panel.error().is_some());
    }

    #[test]
    fn test_navigate_up_selects_previous_directory() {
        let tmp = tempfile::tempdir().unwrap();
        for dir in ["alpha", "beta", "gamma"] {
            fs::create_dir(tmp.path().join(dir)).unwrap();
        }

        let mut panel = TreePanel::new(tmp.path().join("gamma"), false).unwrap();
        panel.navigate_up().unwrap();
        assert_eq!(panel.dir(), tmp.path());
        assert_eq!(panel.selected().unwrap().name, "gamma");
    }

    #[test]
    fn test_marks_follow_selection_order_and_survive_refresh() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            fs::write(tmp.path().join(name), b"").unwrap();
        }
        let mut panel = TreePanel::new(tmp.path().to_path_buf(), false).unwrap();

        panel.list.select_index(2);
        panel.toggle_mark();
        panel.list.select_index(0);
        panel.toggle_mark();
        assert_eq!(
            panel.selection(),
            vec![tmp.path().join("c"), tmp.path().join("a")]
        );

        fs::remove_file(tmp.path().join("c")).unwrap();
        panel.reload().unwrap();
        assert_eq!(panel.selection(), vec![tmp.path().join("a")]);
    }
}
