//! # Operator Repository
//!
//! Lookup of acting operators and their close-credential hashes. The engine
//! never creates operators on its own; rows arrive via seeding or an outer
//! administration surface.

use sqlx::SqlitePool;

use crate::error::DbResult;
use vero_core::Operator;

/// Repository for operator rows.
#[derive(Debug, Clone)]
pub struct OperatorRepository {
    pool: SqlitePool,
}

impl OperatorRepository {
    /// Creates a new OperatorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OperatorRepository { pool }
    }

    /// Inserts an operator with a pre-hashed credential.
    pub async fn insert(&self, operator: &Operator, password_hash: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO operators (id, name, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&operator.id)
        .bind(&operator.name)
        .bind(password_hash)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches an operator by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Operator>> {
        let operator = sqlx::query_as::<_, Operator>(
            r#"
            SELECT id, name
            FROM operators
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(operator)
    }

    /// Total number of operators, used by the seeder to stay idempotent.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM operators")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Fetches the stored bcrypt hash for an operator.
    pub async fn password_hash(&self, id: &str) -> DbResult<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            r#"
            SELECT password_hash
            FROM operators
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }
}
