#![deny(missing_docs)]
#![doc = "Shared data model for market sizing: assumptions, provenance tags, errors and seeded randomness."]

pub mod assumption;
pub mod bindings;
pub mod errors;
pub mod magnitude;
pub mod provenance;
pub mod rng;
pub mod serde;

pub use assumption::{Assumption, AssumptionSet, ValueRole};
pub use bindings::Bindings;
pub use errors::{require_positive, require_unit_rate, ErrorInfo, MszError};
pub use magnitude::format_magnitude;
pub use provenance::Provenance;
pub use rng::{derive_substream_seed, RngHandle};
pub use self::serde::{from_flat_map, to_flat_map};
