//! # Selection
//!
//! Ordered multi-selection with an anchor for range selection.
//!
//! Ids are kept in click order, not tree order. The anchor is the
//! reference point for shift-click ranges and falls back to the reserved
//! root id when nothing has been clicked yet.

/// Selection state for one engine instance
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    ids: Vec<String>,
    anchor: String,
    root_id: String,
}

impl Selection {
    pub fn new(root_id: impl Into<String>) -> Self {
        let root_id = root_id.into();
        Self {
            ids: Vec::new(),
            anchor: root_id.clone(),
            root_id,
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Most recently clicked id
    pub fn primary(&self) -> Option<&str> {
        self.ids.last().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Replace the selection with a single id
    pub fn select(&mut self, id: &str) {
        self.ids.clear();
        self.ids.push(id.to_string());
        self.anchor = id.to_string();
    }

    /// Click handling with modifier keys
    ///
    /// `visible_order` is the depth-first, collapse-respecting row order the
    /// user sees. A range whose anchor or target is not visible degrades to
    /// a plain select.
    pub fn toggle_select(&mut self, id: &str, multi_select: bool, range_select: bool, visible_order: &[String]) {
        if range_select {
            let anchor = visible_order.iter().position(|row| *row == self.anchor);
            let target = visible_order.iter().position(|row| row == id);
            if let (Some(anchor), Some(target)) = (anchor, target) {
                let (start, end) = if anchor <= target {
                    (anchor, target)
                } else {
                    (target, anchor)
                };
                self.ids = visible_order[start..=end].to_vec();
                return;
            }
            self.select(id);
            return;
        }

        if multi_select {
            if let Some(index) = self.ids.iter().position(|s| s == id) {
                self.ids.remove(index);
            } else {
                self.ids.push(id.to_string());
                self.anchor = id.to_string();
            }
            return;
        }

        self.select(id);
    }

    /// Replace the selection wholesale, keeping click order as given
    pub fn set(&mut self, ids: Vec<String>) {
        let mut unique: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        if let Some(last) = unique.last() {
            self.anchor = last.clone();
        }
        self.ids = unique;
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.anchor = self.root_id.clone();
    }

    /// Drop ids that no longer exist; returns true if anything was removed
    pub fn prune(&mut self, exists: impl Fn(&str) -> bool) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| exists(id));
        if !exists(&self.anchor) {
            self.anchor = self.root_id.clone();
        }
        self.ids.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_anchor_is_root() {
        let selection = Selection::new("root");
        assert_eq!(selection.anchor(), "root");
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_replaces() {
        let mut selection = Selection::new("root");
        selection.select("A");
        selection.select("B");
        assert_eq!(selection.ids(), ["B"]);
        assert_eq!(selection.anchor(), "B");
    }

    #[test]
    fn test_range_select_from_anchor() {
        let visible = order(&["A", "B", "C", "D"]);
        let mut selection = Selection::new("root");
        selection.select("A");

        selection.toggle_select("C", false, true, &visible);
        assert_eq!(selection.ids(), ["A", "B", "C"]);
        assert_eq!(selection.anchor(), "A");
    }

    #[test]
    fn test_range_select_backwards() {
        let visible = order(&["A", "B", "C", "D"]);
        let mut selection = Selection::new("root");
        selection.select("D");

        selection.toggle_select("B", false, true, &visible);
        assert_eq!(selection.ids(), ["B", "C", "D"]);
    }

    #[test]
    fn test_range_without_visible_anchor_selects_target() {
        let visible = order(&["A", "B"]);
        let mut selection = Selection::new("root");

        selection.toggle_select("B", false, true, &visible);
        assert_eq!(selection.ids(), ["B"]);
        assert_eq!(selection.anchor(), "B");
    }

    #[test]
    fn test_multi_select_toggles_in_click_order() {
        let mut selection = Selection::new("root");
        selection.select("C");
        selection.toggle_select("A", true, false, &[]);
        selection.toggle_select("B", true, false, &[]);
        assert_eq!(selection.ids(), ["C", "A", "B"]);

        selection.toggle_select("A", true, false, &[]);
        assert_eq!(selection.ids(), ["C", "B"]);
        assert_eq!(selection.primary(), Some("B"));
    }

    #[test]
    fn test_clear_resets_anchor() {
        let mut selection = Selection::new("root");
        selection.select("A");
        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection.anchor(), "root");
    }

    #[test]
    fn test_prune_removes_missing() {
        let mut selection = Selection::new("root");
        selection.set(order(&["A", "B", "A"]));
        assert_eq!(selection.ids(), ["A", "B"]);

        assert!(selection.prune(|id| id == "A"));
        assert_eq!(selection.ids(), ["A"]);
        assert_eq!(selection.anchor(), "root");
    }
}
