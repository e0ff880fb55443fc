//! Picking one entry out of a scraped list by configured position.

use thiserror::Error;

/// Errors from choosing an entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("No {what} at index {index} (only {len} available)")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

/// Returns the entry at `index`, or an error naming what was being picked.
pub fn select<'a, T>(
    items: &'a [T],
    index: usize,
    what: &'static str,
) -> Result<&'a T, SelectionError> {
    items.get(index).ok_or(SelectionError::OutOfRange {
        what,
        index,
        len: items.len(),
    })
}
