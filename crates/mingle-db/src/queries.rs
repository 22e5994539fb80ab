use crate::Database;
use crate::models::{
    FollowDetailRow, FollowRow, FollowWithPeerRow, MessageRow, MessageWithEmitterRow,
    MessageWithPeersRow, ProfileRow, PublicationRow, PublicationWithAuthorRow, UserRow,
};
use anyhow::Result;
use rusqlite::Connection;

const PROFILE_COLS: &str = "u.id, u.name, u.surname, u.nickname, u.image";

impl Database {
    // -- Users --

    #[allow(clippy::too_many_arguments)]
    pub fn create_user(
        &self,
        id: &str,
        name: &str,
        surname: &str,
        nickname: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, surname, nickname, email, password, role)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, name, surname, nickname, email, password_hash, role],
            )?;
            Ok(())
        })
    }

    /// Lookup by email, case-insensitively.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn list_users(&self, limit: u64, offset: u64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, surname, nickname, email, password, role, image, created_at
                 FROM users ORDER BY created_at, id LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map([limit as i64, offset as i64], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| query_count(conn, "SELECT COUNT(*) FROM users", &[]))
    }

    // -- Follows --

    /// Insert a follow edge. Returns false when the (follower, followed) pair
    /// already exists — the unique index makes the write path the guard.
    pub fn insert_follow(&self, id: &str, follower_id: &str, followed_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO follows (id, follower_id, followed_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![id, follower_id, followed_id],
            )?;
            Ok(inserted == 1)
        })
    }

    /// Remove the edge follower -> followed. Returns the number of rows
    /// removed; zero is not an error.
    pub fn delete_follow(&self, follower_id: &str, followed_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                rusqlite::params![follower_id, followed_id],
            )?;
            Ok(n)
        })
    }

    /// Ids of everyone `user_id` follows.
    pub fn following_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT followed_id FROM follows WHERE follower_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Ids of everyone who follows `user_id`.
    pub fn follower_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT follower_id FROM follows WHERE followed_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    pub fn count_following(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            query_count(
                conn,
                "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
                &[&user_id],
            )
        })
    }

    pub fn count_followers(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            query_count(
                conn,
                "SELECT COUNT(*) FROM follows WHERE followed_id = ?1",
                &[&user_id],
            )
        })
    }

    /// Edges where `user_id` is the follower, joined with the followed
    /// profile. Newest follow first.
    pub fn list_following(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<FollowWithPeerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT f.id, f.follower_id, f.followed_id, {PROFILE_COLS}
                 FROM follows f
                 JOIN users u ON u.id = f.followed_id
                 WHERE f.follower_id = ?1
                 ORDER BY f.created_at DESC, f.id
                 LIMIT ?2 OFFSET ?3",
            ))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![user_id, limit as i64, offset as i64],
                    follow_with_peer_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Edges where `user_id` is the followed, joined with the follower
    /// profile.
    pub fn list_followers(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<FollowWithPeerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT f.id, f.follower_id, f.followed_id, {PROFILE_COLS}
                 FROM follows f
                 JOIN users u ON u.id = f.follower_id
                 WHERE f.followed_id = ?1
                 ORDER BY f.created_at DESC, f.id
                 LIMIT ?2 OFFSET ?3",
            ))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![user_id, limit as i64, offset as i64],
                    follow_with_peer_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// All of a user's edges with both endpoint profiles. `reverse` flips the
    /// direction: edges where the user is the followed one.
    pub fn list_follow_details(&self, user_id: &str, reverse: bool) -> Result<Vec<FollowDetailRow>> {
        let filter = if reverse {
            "f.followed_id = ?1"
        } else {
            "f.follower_id = ?1"
        };
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT f.id, f.follower_id, f.followed_id,
                        a.id, a.name, a.surname, a.nickname, a.image,
                        b.id, b.name, b.surname, b.nickname, b.image
                 FROM follows f
                 JOIN users a ON a.id = f.follower_id
                 JOIN users b ON b.id = f.followed_id
                 WHERE {filter}
                 ORDER BY f.created_at DESC, f.id",
            ))?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(FollowDetailRow {
                        follow: FollowRow {
                            id: row.get(0)?,
                            follower_id: row.get(1)?,
                            followed_id: row.get(2)?,
                        },
                        follower: profile_at(row, 3)?,
                        followed: profile_at(row, 8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Publications --

    pub fn insert_publication(
        &self,
        id: &str,
        author_id: &str,
        text: &str,
        created_at: i64,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO publications (id, author_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, author_id, text, created_at],
            )?;
            Ok(())
        })
    }

    pub fn get_publication(&self, id: &str) -> Result<Option<PublicationRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, author_id, text, file, created_at FROM publications WHERE id = ?1",
                [id],
                publication_from_row,
            )
            .optional()
        })
    }

    /// Delete a publication only when `author_id` owns it. Returns rows
    /// affected; zero means absent or owned by someone else.
    pub fn delete_publication(&self, id: &str, author_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM publications WHERE id = ?1 AND author_id = ?2",
                rusqlite::params![id, author_id],
            )?;
            Ok(n)
        })
    }

    pub fn set_publication_file(&self, id: &str, file: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE publications SET file = ?2 WHERE id = ?1",
                rusqlite::params![id, file],
            )?;
            Ok(n)
        })
    }

    /// Publications authored by any of `author_ids`, newest first, with the
    /// author profile joined in a single query.
    pub fn publications_by_authors(
        &self,
        author_ids: &[String],
        limit: u64,
        offset: u64,
    ) -> Result<Vec<PublicationWithAuthorRow>> {
        if author_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=author_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT p.id, p.author_id, p.text, p.file, p.created_at, {PROFILE_COLS}
                 FROM publications p
                 JOIN users u ON u.id = p.author_id
                 WHERE p.author_id IN ({})
                 ORDER BY p.created_at DESC, p.id
                 LIMIT ?{} OFFSET ?{}",
                placeholders.join(", "),
                author_ids.len() + 1,
                author_ids.len() + 2,
            );

            let limit = limit as i64;
            let offset = offset as i64;
            let mut params: Vec<&dyn rusqlite::types::ToSql> = author_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            params.push(&limit);
            params.push(&offset);

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params.as_slice(), publication_with_author_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_publications_by_authors(&self, author_ids: &[String]) -> Result<u64> {
        if author_ids.is_empty() {
            return Ok(0);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=author_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT COUNT(*) FROM publications WHERE author_id IN ({})",
                placeholders.join(", "),
            );
            let params: Vec<&dyn rusqlite::types::ToSql> = author_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();
            query_count(conn, &sql, params.as_slice())
        })
    }

    pub fn publications_by_author(
        &self,
        author_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<PublicationWithAuthorRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT p.id, p.author_id, p.text, p.file, p.created_at, {PROFILE_COLS}
                 FROM publications p
                 JOIN users u ON u.id = p.author_id
                 WHERE p.author_id = ?1
                 ORDER BY p.created_at DESC, p.id
                 LIMIT ?2 OFFSET ?3",
            ))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![author_id, limit as i64, offset as i64],
                    publication_with_author_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_publications_by_author(&self, author_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            query_count(
                conn,
                "SELECT COUNT(*) FROM publications WHERE author_id = ?1",
                &[&author_id],
            )
        })
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        id: &str,
        emitter_id: &str,
        receiver_id: &str,
        text: &str,
        created_at: i64,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, emitter_id, receiver_id, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, emitter_id, receiver_id, text, created_at],
            )?;
            Ok(())
        })
    }

    /// Messages addressed to `receiver_id`, newest first, emitter profile
    /// joined (eliminates N+1).
    pub fn inbox(
        &self,
        receiver_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<MessageWithEmitterRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT m.id, m.emitter_id, m.receiver_id, m.text, m.viewed, m.created_at,
                        {PROFILE_COLS}
                 FROM messages m
                 JOIN users u ON u.id = m.emitter_id
                 WHERE m.receiver_id = ?1
                 ORDER BY m.created_at DESC, m.id
                 LIMIT ?2 OFFSET ?3",
            ))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![receiver_id, limit as i64, offset as i64],
                    |row| {
                        Ok(MessageWithEmitterRow {
                            message: message_at(row)?,
                            emitter: profile_at(row, 6)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_inbox(&self, receiver_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            query_count(
                conn,
                "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1",
                &[&receiver_id],
            )
        })
    }

    /// Messages sent by `emitter_id`, newest first, both profiles joined.
    pub fn outbox(
        &self,
        emitter_id: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<MessageWithPeersRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.emitter_id, m.receiver_id, m.text, m.viewed, m.created_at,
                        a.id, a.name, a.surname, a.nickname, a.image,
                        b.id, b.name, b.surname, b.nickname, b.image
                 FROM messages m
                 JOIN users a ON a.id = m.emitter_id
                 JOIN users b ON b.id = m.receiver_id
                 WHERE m.emitter_id = ?1
                 ORDER BY m.created_at DESC, m.id
                 LIMIT ?2 OFFSET ?3",
            )?;
            let rows = stmt
                .query_map(
                    rusqlite::params![emitter_id, limit as i64, offset as i64],
                    |row| {
                        Ok(MessageWithPeersRow {
                            message: message_at(row)?,
                            emitter: profile_at(row, 6)?,
                            receiver: profile_at(row, 11)?,
                        })
                    },
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_outbox(&self, emitter_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            query_count(
                conn,
                "SELECT COUNT(*) FROM messages WHERE emitter_id = ?1",
                &[&emitter_id],
            )
        })
    }

    pub fn count_unviewed(&self, receiver_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            query_count(
                conn,
                "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1 AND viewed = 0",
                &[&receiver_id],
            )
        })
    }

    /// Mark every unread message addressed to `receiver_id` as viewed, across
    /// all senders. Returns the number of messages updated.
    pub fn mark_all_viewed(&self, receiver_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE messages SET viewed = 1 WHERE receiver_id = ?1 AND viewed = 0",
                [receiver_id],
            )?;
            Ok(n)
        })
    }
}

// -- Row mappers --

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        surname: row.get(2)?,
        nickname: row.get(3)?,
        email: row.get(4)?,
        password: row.get(5)?,
        role: row.get(6)?,
        image: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn profile_at(row: &rusqlite::Row, base: usize) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(base)?,
        name: row.get(base + 1)?,
        surname: row.get(base + 2)?,
        nickname: row.get(base + 3)?,
        image: row.get(base + 4)?,
    })
}

fn message_at(row: &rusqlite::Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        emitter_id: row.get(1)?,
        receiver_id: row.get(2)?,
        text: row.get(3)?,
        viewed: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn follow_with_peer_from_row(row: &rusqlite::Row) -> rusqlite::Result<FollowWithPeerRow> {
    Ok(FollowWithPeerRow {
        follow: FollowRow {
            id: row.get(0)?,
            follower_id: row.get(1)?,
            followed_id: row.get(2)?,
        },
        peer: profile_at(row, 3)?,
    })
}

fn publication_from_row(row: &rusqlite::Row) -> rusqlite::Result<PublicationRow> {
    Ok(PublicationRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        text: row.get(2)?,
        file: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn publication_with_author_from_row(
    row: &rusqlite::Row,
) -> rusqlite::Result<PublicationWithAuthorRow> {
    Ok(PublicationWithAuthorRow {
        publication: publication_from_row(row)?,
        author: profile_at(row, 5)?,
    })
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, surname, nickname, email, password, role, image, created_at
         FROM users WHERE lower(email) = lower(?1)",
    )?;
    stmt.query_row([email], user_from_row).optional()
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, surname, nickname, email, password, role, image, created_at
         FROM users WHERE id = ?1",
    )?;
    stmt.query_row([id], user_from_row).optional()
}

fn query_count(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(n as u64)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn add_user(db: &Database, id: &str) {
        db.create_user(
            id,
            "Test",
            "User",
            id,
            &format!("{id}@example.com"),
            "$argon2id$fake-hash",
            "ROLE_USER",
        )
        .unwrap();
    }

    #[test]
    fn email_lookup_is_case_insensitive() {
        let db = db();
        add_user(&db, "alice");

        let found = db.get_user_by_email("ALICE@Example.COM").unwrap();
        assert_eq!(found.unwrap().id, "alice");
        assert!(db.get_user_by_email("bob@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_violates_unique_index() {
        let db = db();
        add_user(&db, "alice");

        let dup = db.create_user(
            "alice2",
            "Other",
            "User",
            "alice2",
            "Alice@example.com",
            "$argon2id$fake-hash",
            "ROLE_USER",
        );
        assert!(dup.is_err());
    }

    #[test]
    fn duplicate_follow_is_not_inserted() {
        let db = db();
        add_user(&db, "a");
        add_user(&db, "b");

        assert!(db.insert_follow("f1", "a", "b").unwrap());
        assert!(!db.insert_follow("f2", "a", "b").unwrap());
        assert_eq!(db.count_following("a").unwrap(), 1);

        // The reverse edge is a different pair
        assert!(db.insert_follow("f3", "b", "a").unwrap());
    }

    #[test]
    fn delete_follow_is_idempotent() {
        let db = db();
        add_user(&db, "a");
        add_user(&db, "b");
        db.insert_follow("f1", "a", "b").unwrap();

        assert_eq!(db.delete_follow("a", "b").unwrap(), 1);
        assert_eq!(db.delete_follow("a", "b").unwrap(), 0);
    }

    #[test]
    fn following_and_follower_ids() {
        let db = db();
        for id in ["a", "b", "c"] {
            add_user(&db, id);
        }
        db.insert_follow("f1", "a", "b").unwrap();
        db.insert_follow("f2", "a", "c").unwrap();
        db.insert_follow("f3", "c", "a").unwrap();

        let mut following = db.following_ids("a").unwrap();
        following.sort();
        assert_eq!(following, vec!["b", "c"]);
        assert_eq!(db.follower_ids("a").unwrap(), vec!["c"]);
        assert_eq!(db.count_followers("b").unwrap(), 1);
    }

    #[test]
    fn feed_is_newest_first_and_paginated() {
        let db = db();
        add_user(&db, "a");
        add_user(&db, "b");
        for i in 0..6 {
            let author = if i % 2 == 0 { "a" } else { "b" };
            db.insert_publication(&format!("p{i}"), author, "text", 1_000 + i)
                .unwrap();
        }

        let authors = vec!["a".to_string(), "b".to_string()];
        assert_eq!(db.count_publications_by_authors(&authors).unwrap(), 6);

        let page1 = db.publications_by_authors(&authors, 4, 0).unwrap();
        let ids: Vec<&str> = page1.iter().map(|r| r.publication.id.as_str()).collect();
        assert_eq!(ids, vec!["p5", "p4", "p3", "p2"]);

        let page2 = db.publications_by_authors(&authors, 4, 4).unwrap();
        assert_eq!(page2.len(), 2);

        // Page past the end is empty, not an error
        let page3 = db.publications_by_authors(&authors, 4, 8).unwrap();
        assert!(page3.is_empty());

        // Scope excludes authors not in the list
        let only_a = db.publications_by_authors(&["a".to_string()], 10, 0).unwrap();
        assert_eq!(only_a.len(), 3);
        assert!(only_a.iter().all(|r| r.publication.author_id == "a"));
    }

    #[test]
    fn delete_publication_requires_author() {
        let db = db();
        add_user(&db, "a");
        add_user(&db, "b");
        db.insert_publication("p1", "a", "text", 1_000).unwrap();

        assert_eq!(db.delete_publication("p1", "b").unwrap(), 0);
        assert!(db.get_publication("p1").unwrap().is_some());
        assert_eq!(db.delete_publication("p1", "a").unwrap(), 1);
        assert!(db.get_publication("p1").unwrap().is_none());
    }

    #[test]
    fn attach_file_to_publication() {
        let db = db();
        add_user(&db, "a");
        db.insert_publication("p1", "a", "text", 1_000).unwrap();

        assert_eq!(db.set_publication_file("p1", "img.png").unwrap(), 1);
        let row = db.get_publication("p1").unwrap().unwrap();
        assert_eq!(row.file.as_deref(), Some("img.png"));
        assert_eq!(db.set_publication_file("missing", "img.png").unwrap(), 0);
    }

    #[test]
    fn unviewed_count_and_mark_viewed() {
        let db = db();
        add_user(&db, "a");
        add_user(&db, "b");
        db.insert_message("m1", "a", "b", "hi", 1_000).unwrap();
        db.insert_message("m2", "a", "b", "there", 1_001).unwrap();
        db.insert_message("m3", "b", "a", "hello", 1_002).unwrap();

        assert_eq!(db.count_unviewed("b").unwrap(), 2);
        assert_eq!(db.mark_all_viewed("b").unwrap(), 2);
        assert_eq!(db.count_unviewed("b").unwrap(), 0);
        // a's own unread mail is untouched
        assert_eq!(db.count_unviewed("a").unwrap(), 1);
        // Re-running updates nothing
        assert_eq!(db.mark_all_viewed("b").unwrap(), 0);
    }

    #[test]
    fn inbox_and_outbox_join_profiles() {
        let db = db();
        add_user(&db, "a");
        add_user(&db, "b");
        db.insert_message("m1", "a", "b", "hi", 1_000).unwrap();
        db.insert_message("m2", "b", "a", "yo", 1_001).unwrap();

        let inbox = db.inbox("b", 4, 0).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].emitter.id, "a");
        assert_eq!(db.count_inbox("b").unwrap(), 1);

        let outbox = db.outbox("a", 4, 0).unwrap();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].receiver.id, "b");
        assert_eq!(db.count_outbox("a").unwrap(), 1);
    }

    #[test]
    fn follow_listings_join_the_peer_profile() {
        let db = db();
        for id in ["a", "b", "c"] {
            add_user(&db, id);
        }
        db.insert_follow("f1", "a", "b").unwrap();
        db.insert_follow("f2", "c", "b").unwrap();

        let following = db.list_following("a", 4, 0).unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].peer.id, "b");

        let followers = db.list_followers("b", 4, 0).unwrap();
        assert_eq!(followers.len(), 2);
        assert!(followers.iter().all(|r| r.follow.followed_id == "b"));

        let mine = db.list_follow_details("a", false).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].follower.id, "a");
        assert_eq!(mine[0].followed.id, "b");

        let reverse = db.list_follow_details("b", true).unwrap();
        assert_eq!(reverse.len(), 2);
    }

    #[test]
    fn users_listing_paginates() {
        let db = db();
        for i in 0..5 {
            add_user(&db, &format!("u{i}"));
        }
        assert_eq!(db.count_users().unwrap(), 5);
        assert_eq!(db.list_users(4, 0).unwrap().len(), 4);
        assert_eq!(db.list_users(4, 4).unwrap().len(), 1);
        assert!(db.list_users(4, 8).unwrap().is_empty());
    }
}
