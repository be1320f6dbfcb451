pub mod config;
pub mod consumption;
pub mod db;
pub mod events;
pub mod memory;
pub mod store;
