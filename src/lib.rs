pub mod build_schema;
pub mod config;
pub mod error;
