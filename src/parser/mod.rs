pub mod cell;
pub mod cleanup;
pub mod record;

pub use record::{build_record, Record};

/// Cleaned text of the cell labelled `label`, or empty when not found.
pub fn extract_field(markup: &str, label: &str) -> String {
    cleanup::clean_cell(cell::raw_cell(markup, label))
}
