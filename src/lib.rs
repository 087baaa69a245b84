// Library exports for shutterfeed
// This allows integration tests and the binary to share one module tree

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod relative_time;
pub mod routes;
pub mod state;
pub mod upload;
