use std::collections::HashSet;

use anyhow::Result;
use tracing::warn;
use uuid::Uuid;

use mingle_db::Database;

/// Whose relation sets decorate the follow listings: the authenticated
/// caller's (historical behavior) or the user whose follows are being listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationDecoration {
    Caller,
    Subject,
}

impl RelationDecoration {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "caller" => Some(RelationDecoration::Caller),
            "subject" => Some(RelationDecoration::Subject),
            _ => None,
        }
    }

    pub fn subject_for(&self, caller: Uuid, subject: Uuid) -> Uuid {
        match self {
            RelationDecoration::Caller => caller,
            RelationDecoration::Subject => subject,
        }
    }
}

/// The two sides of a user's follow graph.
pub struct Relations {
    /// Accounts this user follows.
    pub following: HashSet<Uuid>,
    /// Accounts that follow this user.
    pub followed: HashSet<Uuid>,
}

/// Resolve both relation sets for a user with two independent edge queries,
/// each projected to the peer id only. Either query failing fails the whole
/// call — callers never see a partial result.
pub fn resolve_relations(db: &Database, user_id: &Uuid) -> Result<Relations> {
    let id = user_id.to_string();
    let following = parse_ids(db.following_ids(&id)?);
    let followed = parse_ids(db.follower_ids(&id)?);
    Ok(Relations {
        following,
        followed,
    })
}

/// The accounts whose publications appear in `user_id`'s feed: everyone they
/// follow plus themselves. Self is always included, follow edge or not.
pub fn visibility_scope(db: &Database, user_id: &Uuid) -> Result<HashSet<Uuid>> {
    let mut scope = resolve_relations(db, user_id)?.following;
    scope.insert(*user_id);
    Ok(scope)
}

fn parse_ids(ids: Vec<String>) -> HashSet<Uuid> {
    ids.into_iter()
        .filter_map(|s| match s.parse() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("corrupt user id '{}' in follows: {}", s, e);
                None
            }
        })
        .collect()
}
