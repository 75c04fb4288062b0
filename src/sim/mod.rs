pub mod config;

pub use config::{Config, SimConfig};
