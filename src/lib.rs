pub mod aggregator; // Pollers, slot subscription and the view model store
pub mod arguments;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod errors;
pub mod logger;
pub mod poller;
pub mod query; // On-demand transaction and wallet lookups
pub mod sources; // One adapter per upstream call
pub mod subscription;
