use std::collections::HashSet;

use crate::model::{EntryKey, FeedEntry};

/// Offset pagination over the in-memory feed. The server's order is kept;
/// pages are only ever appended or substituted wholesale.
#[derive(Clone, Debug)]
pub struct Paginator {
    page_size: usize,
    has_more: bool,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self { page_size: page_size.max(1), has_more: true }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn next_offset(&self, entries: &[FeedEntry]) -> usize {
        entries.len()
    }

    /// Substitute the whole feed with a first page and recompute `has_more`.
    pub fn replace(&mut self, entries: &mut Vec<FeedEntry>, page: Vec<FeedEntry>) {
        self.has_more = page.len() >= self.page_size;
        entries.clear();
        append_unique(entries, page);
    }

    /// Append a follow-up page, dropping entries already in the feed.
    /// Returns how many entries were added.
    pub fn merge(&mut self, entries: &mut Vec<FeedEntry>, page: Vec<FeedEntry>) -> usize {
        if page.len() < self.page_size {
            self.has_more = false;
        }
        append_unique(entries, page)
    }
}

fn append_unique(entries: &mut Vec<FeedEntry>, page: Vec<FeedEntry>) -> usize {
    let mut seen: HashSet<EntryKey> = entries.iter().map(FeedEntry::key).collect();
    let before = entries.len();
    entries.extend(page.into_iter().filter(|e| seen.insert(e.key())));
    entries.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;

    fn ids(entries: &[FeedEntry]) -> Vec<i64> {
        entries.iter().map(|e| e.id).collect()
    }

    #[test]
    fn full_first_page_keeps_has_more() {
        let mut p = Paginator::new(20);
        let mut feed = Vec::new();
        p.replace(&mut feed, fixtures::posts(0..20));
        assert_eq!(feed.len(), 20);
        assert!(p.has_more());
        assert_eq!(p.next_offset(&feed), 20);
    }

    #[test]
    fn short_page_ends_pagination() {
        let mut p = Paginator::new(20);
        let mut feed = fixtures::posts(0..20);
        assert_eq!(p.merge(&mut feed, fixtures::posts(20..35)), 15);
        assert_eq!(feed.len(), 35);
        assert!(!p.has_more());

        // a later full page never revives it; only replace does
        p.merge(&mut feed, fixtures::posts(35..55));
        assert!(!p.has_more());
        p.replace(&mut feed, fixtures::posts(0..20));
        assert!(p.has_more());
        assert_eq!(feed.len(), 20);
    }

    #[test]
    fn merge_drops_known_identities_and_keeps_order() {
        let mut p = Paginator::new(4);
        let mut feed = fixtures::posts(0..4);
        let page = vec![fixtures::post(3), fixtures::post(5), fixtures::post(4), fixtures::post(5)];
        assert_eq!(p.merge(&mut feed, page), 2);
        assert_eq!(ids(&feed), vec![0, 1, 2, 3, 5, 4]);
        // raw page length decides has_more, not the deduplicated count
        assert!(p.has_more());
    }

    #[test]
    fn same_id_different_kind_is_not_a_duplicate() {
        let mut p = Paginator::new(20);
        let mut feed = vec![fixtures::post(1)];
        assert_eq!(p.merge(&mut feed, vec![fixtures::announcement(1)]), 1);
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn replace_deduplicates_within_the_page() {
        let mut p = Paginator::new(3);
        let mut feed = fixtures::posts(10..15);
        p.replace(&mut feed, vec![fixtures::post(1), fixtures::post(1), fixtures::post(2)]);
        assert_eq!(ids(&feed), vec![1, 2]);
        assert!(p.has_more());
    }

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(Paginator::new(0).page_size(), 1);
    }
}
