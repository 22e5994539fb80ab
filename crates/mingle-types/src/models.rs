use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. New registrations always get `User`; `Admin` is assigned
/// out of band (directly in the database).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    /// Unknown values fall back to the least-privileged role.
    pub fn parse(s: &str) -> Role {
        match s {
            "ROLE_ADMIN" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// Full user profile as returned to clients. The password hash never leaves
/// the database layer, so there is no field for it here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub nickname: String,
    pub email: String,
    pub role: Role,
    pub image: Option<String>,
}

/// Short profile embedded in listings (follow pages, feeds, inboxes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub nickname: String,
    pub image: Option<String>,
}

/// Directed follow edge: `follower` follows `followed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEdge {
    pub id: Uuid,
    pub follower: Uuid,
    pub followed: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub id: Uuid,
    pub author: Uuid,
    pub text: String,
    pub file: Option<String>,
    /// Seconds since epoch, assigned by the server at creation.
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub emitter: Uuid,
    pub receiver: Uuid,
    pub text: String,
    pub viewed: bool,
    pub created_at: i64,
}
