pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerAdapter;
pub use postgres::PostgresLedgerAdapter;
