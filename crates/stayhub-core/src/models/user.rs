//! User identity models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Verified caller identity, supplied by the authentication layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
}

impl Principal {
    /// Check if this principal may act on a resource owned by `owner_id`
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.is_admin || self.id == owner_id
    }
}

/// User profile used for notifications and favorites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_admin: bool,

    /// Favourite accommodation ids
    #[serde(default)]
    pub favorites: BTreeSet<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
