pub mod analytics_service;
pub mod join_service;
pub mod lookup_service;
pub mod mutation_service;
pub mod view_service;
