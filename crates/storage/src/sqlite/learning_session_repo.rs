use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tutor_core::model::{CounterDelta, LearningSession, SessionId, UserId};

use super::SqliteRepository;
use super::mapping::{conn_err, id_i64, map_session_row, write_err};
use crate::repository::{LearningSessionRepository, NewSessionRecord, StorageError};

/// Adds a session's earned points to its user inside the caller's transaction.
async fn credit_user(
    conn: &mut SqliteConnection,
    user_id: UserId,
    points: u32,
) -> Result<(), StorageError> {
    if points == 0 {
        return Ok(());
    }
    sqlx::query("UPDATE users SET total_score = total_score + ?2 WHERE id = ?1")
        .bind(id_i64("user_id", user_id.value())?)
        .bind(i64::from(points))
        .execute(&mut *conn)
        .await
        .map_err(conn_err)?;
    Ok(())
}

const SESSION_COLUMNS: &str = "id, user_id, subject, start_time, end_time, problems_attempted, \
     problems_solved, hints_used, score, created_at";

#[async_trait]
impl LearningSessionRepository for SqliteRepository {
    async fn open_session(
        &self,
        user_id: UserId,
    ) -> Result<Option<LearningSession>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM learning_sessions \
             WHERE user_id = ?1 AND end_time IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn_err)?;

        row.as_ref().map(map_session_row).transpose()
    }

    async fn create_session(
        &self,
        record: NewSessionRecord,
    ) -> Result<LearningSession, StorageError> {
        let sql = format!(
            "INSERT INTO learning_sessions ( \
                 user_id, subject, start_time, problems_attempted, \
                 problems_solved, hints_used, score, created_at \
             ) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?3) \
             RETURNING {SESSION_COLUMNS}"
        );
        let mut tx = self.pool.begin().await.map_err(conn_err)?;
        let row = sqlx::query(&sql)
            .bind(id_i64("user_id", record.user_id.value())?)
            .bind(&record.subject)
            .bind(record.started_at)
            .bind(i64::from(record.initial.attempted))
            .bind(i64::from(record.initial.solved))
            .bind(i64::from(record.initial.hints))
            .bind(i64::from(record.initial.score))
            .fetch_one(&mut *tx)
            .await
            .map_err(write_err)?;
        let session = map_session_row(&row)?;
        credit_user(&mut *tx, session.user_id(), record.initial.score).await?;
        tx.commit().await.map_err(conn_err)?;

        Ok(session)
    }

    async fn apply_delta(
        &self,
        id: SessionId,
        delta: CounterDelta,
    ) -> Result<LearningSession, StorageError> {
        // Additive update so concurrent deltas on one row are not lost.
        let sql = format!(
            "UPDATE learning_sessions SET \
                 problems_attempted = problems_attempted + ?2, \
                 problems_solved = problems_solved + ?3, \
                 hints_used = hints_used + ?4, \
                 score = score + ?5 \
             WHERE id = ?1 \
             RETURNING {SESSION_COLUMNS}"
        );
        let mut tx = self.pool.begin().await.map_err(conn_err)?;
        let row = sqlx::query(&sql)
            .bind(id_i64("session_id", id.value())?)
            .bind(i64::from(delta.attempted))
            .bind(i64::from(delta.solved))
            .bind(i64::from(delta.hints))
            .bind(i64::from(delta.score))
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn_err)?
            .ok_or(StorageError::NotFound)?;
        let session = map_session_row(&row)?;
        credit_user(&mut *tx, session.user_id(), delta.score).await?;
        tx.commit().await.map_err(conn_err)?;

        Ok(session)
    }

    async fn end_session(
        &self,
        id: SessionId,
        ended_at: DateTime<Utc>,
    ) -> Result<LearningSession, StorageError> {
        let sql = format!(
            "UPDATE learning_sessions SET end_time = ?2 \
             WHERE id = ?1 AND end_time IS NULL \
             RETURNING {SESSION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id_i64("session_id", id.value())?)
            .bind(ended_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn_err)?
            .ok_or(StorageError::NotFound)?;

        map_session_row(&row)
    }

    async fn list_sessions(&self, user_id: UserId) -> Result<Vec<LearningSession>, StorageError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM learning_sessions \
             WHERE user_id = ?1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(id_i64("user_id", user_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn_err)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_session_row(&row)?);
        }
        Ok(out)
    }
}
