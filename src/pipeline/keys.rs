//! Built-in information keys.

use std::sync::Arc;

use crate::dataset::DataObject;
use crate::foundation::core::Extent;
use crate::pipeline::information::Key;

/// Largest extent the producer can generate.
pub const WHOLE_EXTENT: Key<Extent> = Key::new("WHOLE_EXTENT");
/// Extent requested downstream.
pub const UPDATE_EXTENT: Key<Extent> = Key::new("UPDATE_EXTENT");
/// Requested piece (0-based).
pub const UPDATE_PIECE_NUMBER: Key<i64> = Key::new("UPDATE_PIECE_NUMBER");
/// Number of pieces the request is split into.
pub const UPDATE_NUMBER_OF_PIECES: Key<i64> = Key::new("UPDATE_NUMBER_OF_PIECES");
/// Ghost layers requested around the piece.
pub const UPDATE_NUMBER_OF_GHOST_LEVELS: Key<i64> = Key::new("UPDATE_NUMBER_OF_GHOST_LEVELS");
/// Time values the producer can generate.
pub const TIME_STEPS: Key<Vec<f64>> = Key::new("TIME_STEPS");
/// `[t_min, t_max]` the producer can generate.
pub const TIME_RANGE: Key<[f64; 2]> = Key::new("TIME_RANGE");
/// Requested time value.
pub const UPDATE_TIME_STEP: Key<f64> = Key::new("UPDATE_TIME_STEP");
/// Produced data object.
pub const DATA_OBJECT: Key<Arc<DataObject>> = Key::new("DATA_OBJECT");
/// Data kind name of the port (see [`crate::dataset::DataKind::as_str`]).
pub const DATA_TYPE_NAME: Key<String> = Key::new("DATA_TYPE_NAME");
/// `[min, max]` of the active scalars.
pub const SCALAR_RANGE: Key<[f64; 2]> = Key::new("SCALAR_RANGE");
/// Image origin.
pub const ORIGIN: Key<[f64; 3]> = Key::new("ORIGIN");
/// Image spacing.
pub const SPACING: Key<[f64; 3]> = Key::new("SPACING");
/// Producer honours sub-extent requests.
pub const CAN_PRODUCE_SUB_EXTENT: Key<bool> = Key::new("CAN_PRODUCE_SUB_EXTENT");
/// Most pieces the producer can split its output into (-1 = unlimited).
pub const MAXIMUM_NUMBER_OF_PIECES: Key<i64> = Key::new("MAXIMUM_NUMBER_OF_PIECES");

/// Keys describing the request rather than the producer's capabilities.
pub(crate) const REQUEST_KEYS: [&str; 5] = [
    UPDATE_EXTENT.name(),
    UPDATE_PIECE_NUMBER.name(),
    UPDATE_NUMBER_OF_PIECES.name(),
    UPDATE_NUMBER_OF_GHOST_LEVELS.name(),
    UPDATE_TIME_STEP.name(),
];
