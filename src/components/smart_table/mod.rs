//! Editable data grid with inline editing, sorting and autocomplete.

mod autocomplete;
mod component;
mod state;
mod types;

pub use component::SmartTable;
pub use types::{CellChange, Column, Row, SelectOption, Sort};
