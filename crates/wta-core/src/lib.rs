#![deny(missing_docs)]
#![doc = "Core error and provenance types shared by the WTA sweep crates."]

pub mod errors;
pub mod provenance;

pub use errors::{ErrorInfo, SweepError};
pub use provenance::{RunProvenance, SchemaVersion};
