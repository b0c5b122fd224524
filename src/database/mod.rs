pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod store;
pub mod table;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::Db;
pub use store::{Row, Store, StoreError};
pub use table::Table;
