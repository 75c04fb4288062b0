pub mod config;
pub mod driver;
pub mod patterns;
pub mod sink;

pub use config::{PatternSpec, TrafficConfig};
pub use driver::TrafficDriver;
pub use patterns::{Candidate, StrideStream};
pub use sink::HashSink;
