pub mod memory;
pub mod postgres;

pub use memory::{MemoryFeeAdapter, MemoryRateAdapter};
pub use postgres::PostgresPricingAdapter;
