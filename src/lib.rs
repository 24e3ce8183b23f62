pub mod config;
pub mod db;
pub mod entry;
pub mod error;
pub mod export;
pub mod football_api;
pub mod forms;
pub mod persist;
pub mod records;
pub mod reporting;
pub mod repo;
pub mod state;
pub mod summary;
pub mod sync;
