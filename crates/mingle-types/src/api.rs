use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FollowEdge, Message, ProfileSummary, Role, UserProfile};

// -- JWT Claims --

/// JWT claims shared between the login handler (issuing) and the auth
/// middleware (validating). Canonical definition lives here in mingle-types
/// so both sides agree on the payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

/// Required fields default to empty strings so that an absent field and an
/// empty field fail the same non-empty validation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// When true the response carries the token only, no profile.
    #[serde(default)]
    pub gettoken: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

// -- Users --

#[derive(Debug, Serialize)]
pub struct UserWithRelations {
    pub user: UserProfile,
    /// Caller follows this user.
    pub following: bool,
    /// This user follows the caller.
    pub followed: bool,
}

// -- Pagination --

/// Envelope for every paginated listing: `pages` is the total page count for
/// the fixed page size, a page past the end yields an empty `items`.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub total: u64,
    pub pages: u64,
    pub page: u64,
    pub items: Vec<T>,
}

// -- Follows --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FollowRequest {
    pub followed: Option<Uuid>,
}

/// A follow edge joined with the profile on the far end of the edge
/// (the followed user when listing follows, the follower when listing
/// followers).
#[derive(Debug, Serialize)]
pub struct FollowWithPeer {
    #[serde(flatten)]
    pub follow: FollowEdge,
    pub peer: ProfileSummary,
}

/// A follow edge with both endpoint profiles joined.
#[derive(Debug, Serialize)]
pub struct FollowDetail {
    #[serde(flatten)]
    pub follow: FollowEdge,
    pub follower_profile: ProfileSummary,
    pub followed_profile: ProfileSummary,
}

/// Follow listing page, decorated with the relation sets of the decoration
/// subject (see `RelationDecoration`).
#[derive(Debug, Serialize)]
pub struct FollowsPage {
    pub total: u64,
    pub pages: u64,
    pub page: u64,
    pub follows: Vec<FollowWithPeer>,
    pub users_following: Vec<Uuid>,
    pub users_follow_me: Vec<Uuid>,
}

// -- Publications --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePublicationRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct PublicationWithAuthor {
    pub id: Uuid,
    pub text: String,
    pub file: Option<String>,
    pub created_at: i64,
    pub author: ProfileSummary,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: String,
    pub receiver: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MessageWithEmitter {
    #[serde(flatten)]
    pub message: Message,
    pub emitter_profile: ProfileSummary,
}

#[derive(Debug, Serialize)]
pub struct MessageWithPeers {
    #[serde(flatten)]
    pub message: Message,
    pub emitter_profile: ProfileSummary,
    pub receiver_profile: ProfileSummary,
}

// -- Counters --

#[derive(Debug, Serialize)]
pub struct CountersResponse {
    pub following: u64,
    pub followed: u64,
    pub publications: u64,
}
