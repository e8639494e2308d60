pub mod analytics;
pub mod enriched;
pub mod record;
pub mod stock;
pub mod view;
