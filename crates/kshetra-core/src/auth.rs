//! Roles, access levels and the auth seam
//!
//! Authentication itself lives outside the engine. All the engine needs from
//! it is the user's assigned region and the grant that bounds what they may
//! select.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::region::RegionId;

/// Worker role tied to a hierarchy level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    PrantKaryakarta,
    VibhagKaryakarta,
    JilaKaryakarta,
    NagarKaryakarta,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "ADMIN",
            Role::PrantKaryakarta => "PRANT_KARYAKARTA",
            Role::VibhagKaryakarta => "VIBHAG_KARYAKARTA",
            Role::JilaKaryakarta => "JILA_KARYAKARTA",
            Role::NagarKaryakarta => "NAGAR_KARYAKARTA",
        };
        f.write_str(name)
    }
}

/// Access level granted by a registration code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    /// May create team records; must resolve down to BASTI or GRAM
    ToliCreation,
    /// Read-only; selection stops at NAGAR/KHAND
    ViewOnly,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::ToliCreation => write!(f, "TOLI_CREATION"),
            AccessLevel::ViewOnly => write!(f, "VIEW_ONLY"),
        }
    }
}

/// What bounds a user's selection: a role or an explicit access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "grant", content = "value", rename_all = "snake_case")]
pub enum AccessGrant {
    Role(Role),
    Level(AccessLevel),
}

impl fmt::Display for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessGrant::Role(role) => write!(f, "{}", role),
            AccessGrant::Level(level) => write!(f, "{}", level),
        }
    }
}

impl From<Role> for AccessGrant {
    fn from(role: Role) -> Self {
        AccessGrant::Role(role)
    }
}

impl From<AccessLevel> for AccessGrant {
    fn from(level: AccessLevel) -> Self {
        AccessGrant::Level(level)
    }
}

/// The signed-in user, as far as the engine is concerned
pub trait AuthContext: Send + Sync {
    /// The user's assigned region, if any
    fn assigned_region(&self) -> Option<RegionId>;

    /// The grant bounding the user's selections
    fn grant(&self) -> AccessGrant;

    /// A stable user identifier for log context
    fn user_id(&self) -> Option<String> {
        None
    }
}

/// Fixed auth context, for tests and the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticAuth {
    pub user_id: Option<String>,
    pub assigned_region: Option<RegionId>,
    pub grant: AccessGrant,
}

impl StaticAuth {
    /// Create a context with the given assignment and grant
    pub fn new(assigned_region: Option<RegionId>, grant: impl Into<AccessGrant>) -> Self {
        Self {
            user_id: None,
            assigned_region,
            grant: grant.into(),
        }
    }

    /// Set the user id
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

impl AuthContext for StaticAuth {
    fn assigned_region(&self) -> Option<RegionId> {
        self.assigned_region
    }

    fn grant(&self) -> AccessGrant {
        self.grant
    }

    fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}
