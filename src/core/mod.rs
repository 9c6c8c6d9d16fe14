pub mod magnetic;
pub mod pdf;
pub mod extract;
pub mod config;
pub mod library;
pub mod compress;
pub mod catalog;
pub mod store;
pub mod publish;
