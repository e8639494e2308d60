use std::cmp::Ordering;

use crate::models::enriched::EnrichedRecord;
use crate::models::view::{RecordFilter, SortField, SortOrder, ViewOptions};

/// Deterministic sorting and filtering over enriched records.
///
/// Pure presentation logic: the reconciled collection is never mutated,
/// every call builds a fresh copy. The sort is stable, so records that
/// compare equal keep their input order, and descending is the exact
/// reverse of ascending for unique keys.
pub struct ViewService;

impl ViewService {
    pub fn new() -> Self {
        Self
    }

    /// Apply the filter, then sort by the selected field and direction.
    pub fn apply(&self, records: &[EnrichedRecord], options: &ViewOptions) -> Vec<EnrichedRecord> {
        let mut view: Vec<EnrichedRecord> = records
            .iter()
            .filter(|r| Self::matches(r, &options.filter))
            .cloned()
            .collect();

        view.sort_by(|a, b| {
            let ordering = Self::compare(a, b, options.sort_field);
            match options.sort_order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });

        view
    }

    fn matches(record: &EnrichedRecord, filter: &RecordFilter) -> bool {
        match filter {
            RecordFilter::All => true,
            RecordFilter::Sector(sector) => record.sector == *sector,
            RecordFilter::Side(side) => record.record.side() == Some(*side),
        }
    }

    fn compare(a: &EnrichedRecord, b: &EnrichedRecord, field: SortField) -> Ordering {
        match field {
            SortField::Symbol => Self::cmp_str(&a.symbol, &b.symbol),
            SortField::Price => Self::cmp_f64(a.current_price, b.current_price),
            SortField::ChangePercent => {
                Self::cmp_f64(a.derived.change_percent, b.derived.change_percent)
            }
            SortField::Sector => Self::cmp_str(&a.sector, &b.sector),
            SortField::Date => a.record.executed_at().cmp(&b.record.executed_at()),
            SortField::TotalValue => Self::cmp_f64(a.derived.total_value, b.derived.total_value),
            SortField::Side => a.record.side().cmp(&b.record.side()),
        }
    }

    /// Case-insensitive string ordering.
    fn cmp_str(a: &str, b: &str) -> Ordering {
        a.to_lowercase().cmp(&b.to_lowercase())
    }

    /// Total ordering for floats; non-comparable values tie.
    fn cmp_f64(a: f64, b: f64) -> Ordering {
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    }
}

impl Default for ViewService {
    fn default() -> Self {
        Self::new()
    }
}
