pub mod memory;
pub mod postgres;

pub use memory::MemoryOutboxAdapter;
pub use postgres::PostgresOutboxAdapter;
