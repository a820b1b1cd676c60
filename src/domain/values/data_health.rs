use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of one source's contribution to a snapshot.
///
/// `Missing` means no output was found at all; `NoData` means the source ran
/// but produced an empty result. The validator treats these differently:
/// "nothing to check" vs "checked, found nothing."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataHealth {
    Available,
    Missing,
    Stale,
    NoData,
}

impl fmt::Display for DataHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataHealth::Available => write!(f, "available"),
            DataHealth::Missing => write!(f, "missing"),
            DataHealth::Stale => write!(f, "stale"),
            DataHealth::NoData => write!(f, "no_data"),
        }
    }
}
