pub mod metrics;
pub mod overview;
pub mod provider;
pub mod types;
pub mod upstream;
