pub mod adjustment;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimation;
pub mod narrative;
pub mod state;
