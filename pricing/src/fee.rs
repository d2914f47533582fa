#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fee {
    pub fee_rate: f64,
}
