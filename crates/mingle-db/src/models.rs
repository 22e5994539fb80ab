/// Database row types — these map directly to SQLite rows.
/// Distinct from mingle-types API models to keep the DB layer independent;
/// notably `UserRow` carries the password hash, which API models never do.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub nickname: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub image: Option<String>,
    pub created_at: String,
}

/// Short profile joined into listings.
pub struct ProfileRow {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub nickname: String,
    pub image: Option<String>,
}

pub struct FollowRow {
    pub id: String,
    pub follower_id: String,
    pub followed_id: String,
}

pub struct FollowWithPeerRow {
    pub follow: FollowRow,
    pub peer: ProfileRow,
}

pub struct FollowDetailRow {
    pub follow: FollowRow,
    pub follower: ProfileRow,
    pub followed: ProfileRow,
}

pub struct PublicationRow {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub file: Option<String>,
    pub created_at: i64,
}

pub struct PublicationWithAuthorRow {
    pub publication: PublicationRow,
    pub author: ProfileRow,
}

pub struct MessageRow {
    pub id: String,
    pub emitter_id: String,
    pub receiver_id: String,
    pub text: String,
    pub viewed: bool,
    pub created_at: i64,
}

pub struct MessageWithEmitterRow {
    pub message: MessageRow,
    pub emitter: ProfileRow,
}

pub struct MessageWithPeersRow {
    pub message: MessageRow,
    pub emitter: ProfileRow,
    pub receiver: ProfileRow,
}
