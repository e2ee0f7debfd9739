// SPDX-FileCopyrightText: 2026 Loudbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message row operations.

use loudbot_core::{AssignedId, LoudbotError, MessageRecord};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

fn to_sql_views(views: u64) -> i64 {
    i64::try_from(views).unwrap_or(i64::MAX)
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    let views: i64 = row.get(4)?;
    Ok(MessageRecord {
        id: Some(row.get(0)?),
        text: row.get(1)?,
        author: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        score: row.get(3)?,
        views: u64::try_from(views).unwrap_or(0),
    })
}

/// Rows scoring above `floor`, least viewed first, at most `limit` of them.
pub async fn fetch_candidates(
    db: &Database,
    floor: i64,
    limit: usize,
) -> Result<Vec<MessageRecord>, LoudbotError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<Vec<MessageRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, text, author, score, views
                 FROM messages WHERE score > ?1
                 ORDER BY views LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![floor, limit], row_to_record)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// True if a row with exactly this text exists.
pub async fn text_exists(db: &Database, text: &str) -> Result<bool, LoudbotError> {
    let text = text.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let found = conn
                .query_row(
                    "SELECT id FROM messages WHERE text = ?1",
                    params![text],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of stored rows, including ones at or below the deletion floor.
pub async fn count_messages(db: &Database) -> Result<u64, LoudbotError> {
    let count = db
        .connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Inserts `inserted` and updates `updated` in one transaction.
///
/// Inserts upsert on `text`: a batch that already committed (for example
/// after its caller gave up waiting) can be written again and yields the
/// same ids. Updates go by id; records that never received one are matched
/// by text. Returns the rowid of each inserted record.
pub async fn write_batch(
    db: &Database,
    inserted: Vec<MessageRecord>,
    updated: Vec<MessageRecord>,
) -> Result<Vec<AssignedId>, LoudbotError> {
    db.connection()
        .call(move |conn| -> Result<Vec<AssignedId>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut assigned = Vec::with_capacity(inserted.len());
            {
                let mut insert = tx.prepare_cached(
                    "INSERT INTO messages (text, author, score, views) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(text) DO UPDATE SET score = excluded.score, views = excluded.views
                     RETURNING id",
                )?;
                for record in &inserted {
                    let id: i64 = insert.query_row(
                        params![
                            record.text,
                            record.author,
                            record.score,
                            to_sql_views(record.views)
                        ],
                        |row| row.get(0),
                    )?;
                    assigned.push(AssignedId {
                        text: record.text.clone(),
                        id,
                    });
                }

                let mut by_id =
                    tx.prepare_cached("UPDATE messages SET score = ?1, views = ?2 WHERE id = ?3")?;
                let mut by_text = tx
                    .prepare_cached("UPDATE messages SET score = ?1, views = ?2 WHERE text = ?3")?;
                for record in &updated {
                    let views = to_sql_views(record.views);
                    match record.id {
                        Some(id) => by_id.execute(params![record.score, views, id])?,
                        None => by_text.execute(params![record.score, views, record.text])?,
                    };
                }
            }
            tx.commit()?;
            Ok(assigned)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn record(text: &str, score: i64, views: u64) -> MessageRecord {
        MessageRecord {
            score,
            views,
            ..MessageRecord::new(text, "Tester")
        }
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let (db, _dir) = setup_db().await;
        let ids = write_batch(
            &db,
            vec![record("FIRST LOUD", 1, 0), record("SECOND LOUD", 1, 0)],
            vec![],
        )
        .await
        .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0].text, "FIRST LOUD");
        assert_ne!(ids[0].id, ids[1].id);
        assert_eq!(count_messages(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_by_id_and_by_text() {
        let (db, _dir) = setup_db().await;
        let ids = write_batch(&db, vec![record("BY ID", 1, 0), record("BY TEXT", 1, 0)], vec![])
            .await
            .unwrap();

        let mut by_id = record("BY ID", 5, 3);
        by_id.id = Some(ids[0].id);
        let by_text = record("BY TEXT", -1, 9);
        write_batch(&db, vec![], vec![by_id, by_text]).await.unwrap();

        let all = fetch_candidates(&db, i64::MIN, 10).await.unwrap();
        let find = |t: &str| all.iter().find(|r| r.text == t).cloned().unwrap();
        assert_eq!((find("BY ID").score, find("BY ID").views), (5, 3));
        assert_eq!((find("BY TEXT").score, find("BY TEXT").views), (-1, 9));
    }

    #[tokio::test]
    async fn rewriting_a_committed_insert_keeps_one_row() {
        let (db, _dir) = setup_db().await;
        let first = write_batch(&db, vec![record("ONLY ONCE", 1, 0)], vec![])
            .await
            .unwrap();

        let again = write_batch(
            &db,
            vec![record("BRAND NEW", 1, 0), record("ONLY ONCE", 2, 3)],
            vec![],
        )
        .await
        .unwrap();
        assert_eq!(again[1].text, "ONLY ONCE");
        assert_eq!(again[1].id, first[0].id);
        assert_eq!(count_messages(&db).await.unwrap(), 2);

        let rows = fetch_candidates(&db, i64::MIN, 10).await.unwrap();
        let once = rows.iter().find(|r| r.text == "ONLY ONCE").unwrap();
        assert_eq!((once.score, once.views, once.author.as_str()), (2, 3, "Tester"));
    }

    #[tokio::test]
    async fn candidates_skip_floor_and_order_by_views() {
        let (db, _dir) = setup_db().await;
        write_batch(
            &db,
            vec![
                record("MANY VIEWS", 3, 40),
                record("FEW VIEWS", 3, 2),
                record("DOWNVOTED", -1, 0),
            ],
            vec![],
        )
        .await
        .unwrap();

        let rows = fetch_candidates(&db, -1, 10).await.unwrap();
        let texts: Vec<_> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["FEW VIEWS", "MANY VIEWS"]);
        assert!(rows.iter().all(|r| r.id.is_some()));

        let limited = fetch_candidates(&db, -1, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].text, "FEW VIEWS");
    }

    #[tokio::test]
    async fn exists_is_exact_match() {
        let (db, _dir) = setup_db().await;
        write_batch(&db, vec![record("EXACT TEXT", 1, 0)], vec![]).await.unwrap();
        assert!(text_exists(&db, "EXACT TEXT").await.unwrap());
        assert!(!text_exists(&db, "exact text").await.unwrap());
        assert!(!text_exists(&db, "EXACT").await.unwrap());
    }
}
