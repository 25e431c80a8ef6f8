//! Table bookkeeping.
//!
//! A separator row (`|---|:--:|`) is not part of the table's output. It
//! turns the row before it into a header and sets the column alignments
//! used from then on.

use crate::ast::{Alignment, TableRow};

/// State of a table container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableData {
    /// Column alignments from the most recent separator row.
    pub aligns: Vec<Alignment>,
}

/// State of a row container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowData {
    /// Alignments contributed by separator cells in this row.
    pub separators: Vec<Alignment>,
}

impl RowData {
    /// Whether this row is a separator row.
    pub fn is_separator(&self) -> bool {
        !self.separators.is_empty()
    }
}

/// Apply column alignments to the cells of `row`.
pub fn align_cells(row: &mut TableRow<'_>, aligns: &[Alignment]) {
    for (cell, align) in row.children.iter_mut().zip(aligns) {
        cell.align = *align;
    }
}

/// Turn `row` into a header row with the given alignments.
pub fn mark_header(row: &mut TableRow<'_>, aligns: &[Alignment]) {
    row.head = true;
    for cell in &mut row.children {
        cell.head = true;
    }
    align_cells(row, aligns);
}
