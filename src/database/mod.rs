pub mod connection;
pub mod locks;
pub mod memory;
pub mod postgres;
pub mod store;

pub use connection::{DbPool, create_pool, run_migrations};
pub use locks::EstablishmentLocks;
pub use memory::MemoryStore;
pub use postgres::SeaOrmStore;
pub use store::GameStore;
