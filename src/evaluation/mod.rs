pub mod client;
pub mod criteria;
pub mod runner;
pub mod scenarios;
pub mod summary;
