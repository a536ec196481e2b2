pub mod error;
pub mod ports;
pub mod schema_cache;
pub mod service;


pub use error::DomainError;
pub use ports::{Warehouse, WarehouseError, WarehouseRow};
