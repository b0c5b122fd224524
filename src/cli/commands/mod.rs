pub mod config;
pub mod health;
pub mod migrate;
pub mod token;
