pub mod coord;
pub mod mapping;

pub use coord::{DramLocation, RowCoord};
pub use mapping::{AddressMapping, InterleavedMapping, MappingConfig};
