use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            surname     TEXT NOT NULL,
            nickname    TEXT NOT NULL,
            email       TEXT NOT NULL,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'ROLE_USER',
            image       TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Email uniqueness is case-insensitive
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email
            ON users(lower(email));

        CREATE TABLE IF NOT EXISTS follows (
            id          TEXT PRIMARY KEY,
            follower_id TEXT NOT NULL REFERENCES users(id),
            followed_id TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(follower_id, followed_id)
        );

        CREATE INDEX IF NOT EXISTS idx_follows_followed
            ON follows(followed_id);

        CREATE TABLE IF NOT EXISTS publications (
            id          TEXT PRIMARY KEY,
            author_id   TEXT NOT NULL REFERENCES users(id),
            text        TEXT NOT NULL,
            file        TEXT,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_publications_author
            ON publications(author_id, created_at);

        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            emitter_id  TEXT NOT NULL REFERENCES users(id),
            receiver_id TEXT NOT NULL REFERENCES users(id),
            text        TEXT NOT NULL,
            viewed      INTEGER NOT NULL DEFAULT 0,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_receiver
            ON messages(receiver_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_emitter
            ON messages(emitter_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
