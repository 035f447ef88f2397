//! Demand-driven pipeline: algorithms, ports, executives and their caches.

/// The algorithm trait and handler helpers.
pub mod algorithm;
pub mod composite_cache;
pub mod disk_cache;
pub mod executive;
/// Stable configuration hashes.
pub mod fingerprint;
/// Typed key/value metadata.
pub mod information;
pub mod keys;
/// Pipeline vertices and their connections.
pub mod node;
pub mod streaming;

pub use algorithm::{
    Algorithm, InputPortSpec, OutputPortSpec, as_image, forward_information,
    forward_update_extent, grown_request, input_object, requested_extent, set_output,
};
pub use composite_cache::DataObjectCache;
pub use disk_cache::DiskCache;
pub use executive::{Executive, ExecutiveOpts, PortState, UpdateRequest};
pub use fingerprint::{Fingerprint, StableHasher};
pub use information::{InfoType, InfoValue, Information, Key};
pub use node::{Connection, Node};
pub use streaming::{ExtentTranslator, StreamedPiece, assemble_image};
