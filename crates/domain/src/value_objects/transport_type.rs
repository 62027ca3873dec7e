//! Mode of travel for directions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mode of travel used when computing a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TransportType {
    /// Driving directions
    #[default]
    Automobile,
    /// Walking directions
    Walking,
}

impl TransportType {
    /// Wire name understood by the directions service
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Automobile => "Automobile",
            Self::Walking => "Walking",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "automobile" | "car" | "driving" => Ok(Self::Automobile),
            "walking" | "walk" => Ok(Self::Walking),
            _ => Err(format!(
                "Invalid transport type: {s}. Use 'automobile' or 'walking'"
            )),
        }
    }
}
