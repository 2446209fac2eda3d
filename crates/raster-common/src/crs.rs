//! Coordinate Reference System codes.
//!
//! The remote service identifies a CRS by its `"EPSG:<code>"` string; sample
//! rows carry the bare code of their UTM zone (`32613`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::RasterError;

/// An EPSG coordinate reference system code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CrsCode(u32);

impl CrsCode {
    /// Wrap a raw EPSG code.
    pub fn epsg(code: u32) -> Self {
        Self(code)
    }

    /// The numeric EPSG code.
    pub fn code(&self) -> u32 {
        self.0
    }

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:32613"
    /// - "epsg:32613"
    /// - "32613"
    pub fn parse(s: &str) -> Result<Self, RasterError> {
        let trimmed = s.trim();
        let digits = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("EPSG") => code,
            Some(_) => return Err(RasterError::InvalidCrs(s.to_string())),
            None => trimmed,
        };

        digits
            .trim()
            .parse::<u32>()
            .map(CrsCode)
            .map_err(|_| RasterError::InvalidCrs(s.to_string()))
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for CrsCode {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrsCode::parse(s)
    }
}

impl Serialize for CrsCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CrsCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CrsCode::parse(&s).map_err(serde::de::Error::custom)
    }
}
