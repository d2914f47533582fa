use std::sync::Arc;

use eventbus::Publisher;
use pricing::{FeeAdapter, RateAdapter};

#[derive(Clone)]
pub struct AppState {
    pub rates: Arc<dyn RateAdapter>,
    pub fees: Arc<dyn FeeAdapter>,
    pub publisher: Arc<dyn Publisher>,
}
