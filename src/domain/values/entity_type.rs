use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Company,
    Org,
    Model,
    Repo,
    Person,
    Topic,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Company => write!(f, "company"),
            EntityType::Org => write!(f, "org"),
            EntityType::Model => write!(f, "model"),
            EntityType::Repo => write!(f, "repo"),
            EntityType::Person => write!(f, "person"),
            EntityType::Topic => write!(f, "topic"),
        }
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "company" => Ok(EntityType::Company),
            "org" => Ok(EntityType::Org),
            "model" => Ok(EntityType::Model),
            "repo" => Ok(EntityType::Repo),
            "person" => Ok(EntityType::Person),
            "topic" => Ok(EntityType::Topic),
            _ => Err(format!("Unknown entity type: {s}")),
        }
    }
}
