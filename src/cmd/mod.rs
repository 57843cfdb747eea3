pub mod config;
pub mod incidents;
pub mod serve;
