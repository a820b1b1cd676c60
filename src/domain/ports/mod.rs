pub mod assessment_repository;
pub mod market_feed;
pub mod snapshot_store;
