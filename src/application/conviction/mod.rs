//! Adversarial conviction synthesis: growth builds the bull case, risk
//! builds the bear case, and the arbiter settles them. Three pure functions
//! chained sequentially; concurrency belongs to the fetch stage upstream,
//! not here.

pub mod arbiter;
pub mod growth;
pub mod risk;
