use async_trait::async_trait;
use tutor_core::model::{Language, User, UserId};

use super::SqliteRepository;
use super::mapping::{conn_err, id_i64, map_user_row, write_err};
use crate::repository::{NewUserRecord, StorageError, UserRepository};

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, record: NewUserRecord) -> Result<User, StorageError> {
        let row = sqlx::query(
            r"
                INSERT INTO users (username, email, preferred_language, total_score, created_at)
                VALUES (?1, ?2, ?3, 0, ?4)
                RETURNING id, username, email, preferred_language, total_score, created_at
            ",
        )
        .bind(&record.username)
        .bind(&record.email)
        .bind(record.preferred_language.code())
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(write_err)?;

        map_user_row(&row)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, username, email, preferred_language, total_score, created_at
                FROM users
                WHERE id = ?1
            ",
        )
        .bind(id_i64("user_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn set_preferred_language(
        &self,
        id: UserId,
        language: Language,
    ) -> Result<User, StorageError> {
        let row = sqlx::query(
            r"
                UPDATE users
                SET preferred_language = ?2
                WHERE id = ?1
                RETURNING id, username, email, preferred_language, total_score, created_at
            ",
        )
        .bind(id_i64("user_id", id.value())?)
        .bind(language.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn_err)?
        .ok_or(StorageError::NotFound)?;

        map_user_row(&row)
    }
}
