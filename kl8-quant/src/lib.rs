pub mod analysis;
pub mod assessment;
pub mod config;
pub mod features;
pub mod generator;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod providers;
pub mod ranking;
pub mod rng;
