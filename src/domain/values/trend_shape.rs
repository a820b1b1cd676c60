use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of an entity's adoption curve over the observation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendShape {
    Exponential,
    Linear,
    Flat,
    Declining,
}

impl fmt::Display for TrendShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendShape::Exponential => write!(f, "exponential"),
            TrendShape::Linear => write!(f, "linear"),
            TrendShape::Flat => write!(f, "flat"),
            TrendShape::Declining => write!(f, "declining"),
        }
    }
}
