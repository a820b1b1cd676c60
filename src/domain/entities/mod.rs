pub mod canonical_entity;
pub mod conviction;
pub mod ground_truth;
pub mod resolution;
pub mod snapshot;
