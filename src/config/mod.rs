/// Database connection and schema management
pub mod database;

/// Base fares and route network loading from config.toml
pub mod network;
