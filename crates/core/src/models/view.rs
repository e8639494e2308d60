use serde::{Deserialize, Serialize};

use super::record::TradeSide;

/// Field a record collection can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    /// Ticker symbol (case-insensitive)
    Symbol,
    /// Current price
    Price,
    /// Derived percentage change
    ChangePercent,
    /// Sector name (case-insensitive)
    Sector,
    /// Execution date (records without one sort first)
    Date,
    /// Derived total value
    TotalValue,
    /// Trade side (records without one sort first)
    Side,
}

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Equality filter applied before sorting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordFilter {
    /// Keep every record
    All,
    /// Keep records whose sector matches exactly
    Sector(String),
    /// Keep transactions on the given side
    Side(TradeSide),
}

/// Presentation settings for a screen: sort field, direction and filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewOptions {
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub filter: RecordFilter,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            sort_field: SortField::Symbol,
            sort_order: SortOrder::Ascending,
            filter: RecordFilter::All,
        }
    }
}

impl ViewOptions {
    /// Select `field` for sorting. Re-selecting the current field flips
    /// the direction; a new field resets to ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.flipped();
        } else {
            self.sort_field = field;
            self.sort_order = SortOrder::Ascending;
        }
    }
}
