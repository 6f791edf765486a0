use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::Party;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub role: String,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
}

/// Role tag carried by every authenticated caller. `doctor` and `pharmacist`
/// are interchangeable for scheduling purposes; what matters is the
/// capability, not the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Patient,
    Doctor,
    Pharmacist,
}

impl ActorRole {
    pub fn can_handle_appointments(&self) -> bool {
        matches!(self, ActorRole::Doctor | ActorRole::Pharmacist)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Patient => write!(f, "patient"),
            ActorRole::Doctor => write!(f, "doctor"),
            ActorRole::Pharmacist => write!(f, "pharmacist"),
        }
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(ActorRole::Patient),
            "doctor" => Ok(ActorRole::Doctor),
            "pharmacist" => Ok(ActorRole::Pharmacist),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: ActorRole,
}

impl AuthUser {
    /// The directory party this caller acts as.
    pub fn party(&self) -> Party {
        if self.role.can_handle_appointments() {
            Party::Doctor(self.id)
        } else {
            Party::Patient(self.id)
        }
    }
}
