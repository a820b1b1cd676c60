use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The four signal categories every source feeds into. Corroboration is
/// counted across categories, not across individual sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Technical,
    Social,
    Financial,
    Predictive,
}

impl SourceCategory {
    pub const ALL: [SourceCategory; 4] = [
        SourceCategory::Technical,
        SourceCategory::Social,
        SourceCategory::Financial,
        SourceCategory::Predictive,
    ];
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceCategory::Technical => write!(f, "technical"),
            SourceCategory::Social => write!(f, "social"),
            SourceCategory::Financial => write!(f, "financial"),
            SourceCategory::Predictive => write!(f, "predictive"),
        }
    }
}

impl FromStr for SourceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "technical" => Ok(SourceCategory::Technical),
            "social" => Ok(SourceCategory::Social),
            "financial" => Ok(SourceCategory::Financial),
            "predictive" => Ok(SourceCategory::Predictive),
            _ => Err(format!("Unknown source category: {s}")),
        }
    }
}
