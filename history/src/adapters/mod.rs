pub mod memory;
pub mod postgres;

pub use memory::MemoryHistoryAdapter;
pub use postgres::PostgresHistoryAdapter;
