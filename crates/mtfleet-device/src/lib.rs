//! mtfleet-device: RouterOS device interaction
//!
//! Holds the fixed command table, the positional output parsers, and the
//! read-only inspector and mutating actuator built on top of them.

pub mod actuator;
pub mod commands;
pub mod error;
pub mod inspector;
pub mod parser;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use actuator::UpdateActuator;
pub use commands::{CommandTable, DeviceCommand};
pub use error::{DeviceError, ParseError};
pub use inspector::DeviceInspector;
pub use parser::{FactParser, FirmwareLayout, PackageVersionLayout, ParserLayout};
pub use types::{ActionOutcome, FirmwareVersions, VersionFact};
