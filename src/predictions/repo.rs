use sqlx::{Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use super::repo_types::HistoryRecord;

/// Insert a history entry within a transaction.
pub async fn insert_record_tx(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    image_path: &str,
    result: &str,
) -> sqlx::Result<HistoryRecord> {
    sqlx::query_as::<_, HistoryRecord>(
        r#"
        INSERT INTO history (user_id, image_path, result, created_at)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, user_id, image_path, result, created_at
        "#,
    )
    .bind(user_id)
    .bind(image_path)
    .bind(result)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(&mut **tx)
    .await
}

/// All records of a user, newest first.
pub async fn list_by_user(db: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<HistoryRecord>> {
    sqlx::query_as::<_, HistoryRecord>(
        r#"
        SELECT id, user_id, image_path, result, created_at
          FROM history
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo_types::User, db};

    #[tokio::test]
    async fn list_is_newest_first_and_scoped_to_owner() {
        let db = db::memory().await;
        let alice = User::create(&db, "alice", "h").await.unwrap();
        let bob = User::create(&db, "bob", "h").await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let first = insert_record_tx(&mut tx, alice.id, "1/a.png", "A").await.unwrap();
        let second = insert_record_tx(&mut tx, alice.id, "1/b.png", "B").await.unwrap();
        insert_record_tx(&mut tx, bob.id, "2/c.png", "C").await.unwrap();
        tx.commit().await.unwrap();

        let records = list_by_user(&db, alice.id).await.unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(records.iter().all(|r| r.user_id == alice.id));
        assert!(records
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn rolled_back_insert_leaves_nothing() {
        let db = db::memory().await;
        let alice = User::create(&db, "alice", "h").await.unwrap();

        let mut tx = db.begin().await.unwrap();
        insert_record_tx(&mut tx, alice.id, "1/a.png", "A").await.unwrap();
        tx.rollback().await.unwrap();

        assert!(list_by_user(&db, alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owner_must_exist() {
        let db = db::memory().await;
        let mut tx = db.begin().await.unwrap();
        assert!(insert_record_tx(&mut tx, 999, "x.png", "A").await.is_err());
    }
}
