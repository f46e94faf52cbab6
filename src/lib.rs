pub mod api;
pub mod cache;
pub mod config;
pub mod domain;
pub mod service;
pub mod telemetry;
pub mod upstream;
