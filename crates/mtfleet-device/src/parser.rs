//! Positional parsers for RouterOS print output
//!
//! RouterOS `print` commands emit `key: value` lines whose layout only
//! changes between major releases. Fields are located by their position in
//! the whitespace-split output, not by key. The positions below match
//! RouterOS 6.49 and are configurable should a firmware change them.
//!
//! `system package update print`:
//!
//! ```text
//!            channel: stable
//!  installed-version: 6.49.7
//! ```
//!
//! `system routerboard print`:
//!
//! ```text
//!        routerboard: yes
//!         board-name: hAP
//!              model: RB951Ui-2nD
//!           revision: r2
//!      serial-number: D6F00C2A1B2C
//!      firmware-type: qca9531L
//!   factory-firmware: 6.45.9
//!   current-firmware: 6.49.7
//!   upgrade-firmware: 6.49.7
//! ```
//!
//! Tokens are counted across lines, so a multi-word board name such as
//! `hAP ac^2` or a missing `revision` line shifts the firmware fields.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::types::{FirmwareVersions, VersionFact};

/// Turns raw command output into a typed fact
pub trait FactParser {
    type Fact;

    /// Parse the full stdout of the inspection command
    ///
    /// # Errors
    /// Returns `ParseError` when the expected tokens are missing
    fn parse(&self, output: &str) -> Result<Self::Fact, ParseError>;
}

fn token_at(tokens: &[&str], index: usize, field: &'static str) -> Result<VersionFact, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyOutput);
    }

    tokens
        .get(index)
        .map(|t| VersionFact::new(*t))
        .ok_or(ParseError::MissingToken {
            field,
            index,
            found: tokens.len(),
        })
}

/// Location of the installed version in `system package update print`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVersionLayout {
    pub installed_version: usize,
}

impl Default for PackageVersionLayout {
    fn default() -> Self {
        Self {
            installed_version: 3,
        }
    }
}

impl FactParser for PackageVersionLayout {
    type Fact = VersionFact;

    fn parse(&self, output: &str) -> Result<VersionFact, ParseError> {
        let tokens: Vec<&str> = output.split_whitespace().collect();
        token_at(&tokens, self.installed_version, "installed-version")
    }
}

/// Location of the firmware fields in `system routerboard print`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareLayout {
    pub current: usize,
    pub stored: usize,
}

impl Default for FirmwareLayout {
    fn default() -> Self {
        Self {
            current: 15,
            stored: 17,
        }
    }
}

impl FactParser for FirmwareLayout {
    type Fact = FirmwareVersions;

    fn parse(&self, output: &str) -> Result<FirmwareVersions, ParseError> {
        let tokens: Vec<&str> = output.split_whitespace().collect();
        Ok(FirmwareVersions {
            current: token_at(&tokens, self.current, "current-firmware")?,
            stored: token_at(&tokens, self.stored, "upgrade-firmware")?,
        })
    }
}

/// Parser positions for every inspection command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserLayout {
    pub package: PackageVersionLayout,
    pub firmware: FirmwareLayout,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_parse_package_version() {
        let version = PackageVersionLayout::default().parse(PACKAGE_PRINT).unwrap();
        assert_eq!(version.as_str(), "6.49.7");
    }

    #[test]
    fn test_parse_firmware_positions() {
        let firmware = FirmwareLayout::default().parse(ROUTERBOARD_PRINT).unwrap();
        assert_eq!(firmware.current.as_str(), "6.49.7");
        assert_eq!(firmware.stored.as_str(), "6.49.7");

        let firmware = FirmwareLayout::default()
            .parse(ROUTERBOARD_PRINT_OUTDATED)
            .unwrap();
        assert_eq!(firmware.current.as_str(), "6.48.1");
        assert_eq!(firmware.stored.as_str(), "6.49.7");
    }

    #[test]
    fn test_short_output_is_typed_error() {
        let err = FirmwareLayout::default()
            .parse("routerboard: no")
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingToken {
                field: "current-firmware",
                index: 15,
                found: 2
            }
        );

        assert_eq!(
            PackageVersionLayout::default().parse(" \r\n").unwrap_err(),
            ParseError::EmptyOutput
        );
    }

    #[test]
    fn test_custom_layout() {
        let layout = PackageVersionLayout {
            installed_version: 1,
        };
        assert_eq!(layout.parse("version: 7.12").unwrap().as_str(), "7.12");
    }
}
