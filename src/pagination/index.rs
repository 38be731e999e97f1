use std::collections::BTreeMap;

/// Position of a block in the engine's per-report arena.
pub type BlockId = usize;

/// Which blocks were placed on which vertical page, in placement order.
/// Lateral pages are rebuilt from it after the main page is done.
#[derive(Debug, Default)]
pub struct PageBlockIndex {
    pages: BTreeMap<usize, Vec<BlockId>>,
}

impl PageBlockIndex {
    /// Register `id` on `vertical_page`. Returns false if it was already there.
    pub fn insert(&mut self, vertical_page: usize, id: BlockId) -> bool {
        let ids = self.pages.entry(vertical_page).or_default();
        if ids.contains(&id) {
            return false;
        }
        ids.push(id);
        true
    }

    pub fn blocks_on(&self, vertical_page: usize) -> &[BlockId] {
        self.pages
            .get(&vertical_page)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Vertical page numbers holding at least one block, ascending.
    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.keys().copied()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
