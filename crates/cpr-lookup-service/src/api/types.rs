//! API request and response types.

use cpr_client::FamilyMember;
use serde::{Deserialize, Serialize};

/// Query string of the lookup endpoint.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub cpr: Option<String>,
}

/// One child in the lookup response.
///
/// Field names follow the contract existing consumers read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub name: Option<String>,
    pub cpr: String,
}

impl From<FamilyMember> for ChildResponse {
    fn from(member: FamilyMember) -> Self {
        Self {
            name: member.display_name,
            cpr: member.birth_identifier,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}
