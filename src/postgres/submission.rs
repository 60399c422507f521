use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::SiteError;
use crate::submissions::{
    NewSubmission, Submission, SubmissionQuery, SubmissionRepository, SubmissionUpdate,
};

const COLUMNS: &str = "id, kind, status, name, email, details, admin_notes, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresSubmissionRepository {
    pool: PgPool,
}

impl PostgresSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SubmissionRecord {
    id: i64,
    kind: String,
    status: String,
    name: String,
    email: String,
    details: Json<serde_json::Value>,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRecord> for Submission {
    type Error = SiteError;

    fn try_from(row: SubmissionRecord) -> Result<Self, Self::Error> {
        let corrupt = |e: SiteError| SiteError::Database(format!("row {}: {e}", row.id));

        Ok(Submission {
            id: row.id,
            kind: row.kind.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            name: row.name,
            email: row.email,
            details: row.details.0,
            admin_notes: row.admin_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(e: sqlx::Error) -> SiteError {
    SiteError::Database(e.to_string())
}

#[async_trait]
impl SubmissionRepository for PostgresSubmissionRepository {
    async fn insert(&self, submission: &NewSubmission) -> Result<Submission, SiteError> {
        let sql = format!(
            "INSERT INTO submissions (kind, name, email, details) VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        );
        let row: SubmissionRecord = sqlx::query_as(&sql)
            .bind(submission.kind().as_str())
            .bind(submission.name().trim())
            .bind(submission.email().trim())
            .bind(Json(submission.details()))
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        row.try_into()
    }

    async fn list(&self, query: &SubmissionQuery) -> Result<Vec<Submission>, SiteError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM submissions \
             WHERE ($1::text IS NULL OR kind = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        );
        let rows: Vec<SubmissionRecord> = sqlx::query_as(&sql)
            .bind(query.kind.map(|kind| kind.as_str()))
            .bind(query.status.map(|status| status.as_str()))
            .bind(i64::from(query.limit))
            .bind(i64::from(query.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: i64, update: &SubmissionUpdate) -> Result<Submission, SiteError> {
        let sql = format!(
            "UPDATE submissions SET status = COALESCE($1, status), \
             admin_notes = COALESCE($2, admin_notes), updated_at = NOW() \
             WHERE id = $3 RETURNING {COLUMNS}"
        );
        let row: Option<SubmissionRecord> = sqlx::query_as(&sql)
            .bind(update.status.map(|status| status.as_str()))
            .bind(update.admin_notes.as_deref())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.ok_or(SiteError::NotFound)?.try_into()
    }

    async fn delete(&self, id: i64) -> Result<(), SiteError> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(SiteError::NotFound);
        }

        Ok(())
    }
}
