pub mod auth;
pub mod counters;
pub mod error;
pub mod follows;
pub mod messages;
pub mod middleware;
pub mod pagination;
pub mod publications;
pub mod relations;
pub mod storage;
pub mod users;

use tracing::warn;
use uuid::Uuid;

use mingle_db::models::{ProfileRow, UserRow};
use mingle_types::models::{ProfileSummary, Role, UserProfile};

/// Ids are stored as text; a row id that fails to parse is corrupt data, not
/// a request error.
pub(crate) fn uuid_or_nil(s: &str) -> Uuid {
    s.parse().unwrap_or_else(|e| {
        warn!("corrupt id '{}' in database: {}", s, e);
        Uuid::nil()
    })
}

pub(crate) fn user_profile(row: UserRow) -> UserProfile {
    UserProfile {
        id: uuid_or_nil(&row.id),
        name: row.name,
        surname: row.surname,
        nickname: row.nickname,
        email: row.email,
        role: Role::parse(&row.role),
        image: row.image,
    }
}

pub(crate) fn profile_summary(row: ProfileRow) -> ProfileSummary {
    ProfileSummary {
        id: uuid_or_nil(&row.id),
        name: row.name,
        surname: row.surname,
        nickname: row.nickname,
        image: row.image,
    }
}
