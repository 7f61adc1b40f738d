pub mod connection;
pub mod query;
pub mod repositories;
pub mod schema;

pub use connection::{Database, DbConnection, DbPool};
