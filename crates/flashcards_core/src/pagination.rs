//! crates/flashcards_core/src/pagination.rs
//!
//! Page arithmetic shared by listings and the clients that page through them.

/// Number of pages needed to show `total` rows, never less than one.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 1;
    }
    total.div_ceil(u64::from(limit)).max(1)
}

/// The page to show after removing a row from `current_page`, which held
/// `items_on_page` rows before the removal. Deleting the only row of a page past the
/// first steps back one page instead of leaving an empty one.
pub fn page_after_removal(current_page: u32, items_on_page: usize) -> u32 {
    if items_on_page <= 1 && current_page > 1 {
        current_page - 1
    } else {
        current_page
    }
}
