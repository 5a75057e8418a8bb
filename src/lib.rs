pub mod backend;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod report;
pub mod types;
pub mod verdict;
