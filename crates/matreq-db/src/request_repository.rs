use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use matreq_core::error::AppError;
use matreq_core::request::{
    CardStatus, Department, DepartmentCard, HistoryEntry, MaterialRequest, NewDepartmentCard,
    NewHistoryEntry, NewMaterialRequest, RequestDetail, RequestPatch, RequestStatus,
};

use crate::db_err;
use crate::site_repository::SiteRow;

/// Repository for material requests, department cards, and hand-off history.
///
/// Cards and history rows are exclusive children of a request; creation,
/// update, and deletion of the whole aggregate run inside a transaction so
/// no orphaned child rows can survive a partial write.
#[derive(Clone)]
pub struct RequestRepository {
    pool: Pool<Postgres>,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a request with its initial department cards and history.
    pub async fn create(
        &self,
        request: &NewMaterialRequest,
        cards: &[NewDepartmentCard],
        history: &[NewHistoryEntry],
    ) -> Result<RequestDetail, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            INSERT INTO requests (site_id, material_name, unit, released_qty, comments, status, current_department)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(request.site_id)
        .bind(&request.material_name)
        .bind(&request.unit)
        .bind(request.released_qty)
        .bind(request.comments.as_deref())
        .bind(request.status.as_str())
        .bind(request.current_department.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        upsert_cards(&mut tx, row.id, cards).await?;
        append_history(&mut tx, row.id, history).await?;

        tx.commit().await.map_err(db_err)?;

        self.get(row.id)
            .await?
            .ok_or_else(|| AppError::Database("request vanished after insert".to_string()))
    }

    /// All requests with site, cards, and history, newest first.
    pub async fn list(&self) -> Result<Vec<RequestDetail>, AppError> {
        let rows =
            sqlx::query_as::<_, RequestRow>("SELECT * FROM requests ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            details.push(self.assemble(row).await?);
        }
        Ok(details)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<RequestDetail>, AppError> {
        let row = sqlx::query_as::<_, RequestRow>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, AppError> {
        let (found,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM requests WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
        Ok(found)
    }

    /// Apply a partial update; cards are upserted per department, history
    /// entries are appended. Returns `None` when the request is unknown.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &RequestPatch,
        cards: &[NewDepartmentCard],
        history: &[NewHistoryEntry],
    ) -> Result<Option<RequestDetail>, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            UPDATE requests
            SET material_name = COALESCE($2, material_name),
                unit = COALESCE($3, unit),
                released_qty = COALESCE($4, released_qty),
                comments = COALESCE($5, comments),
                status = COALESCE($6, status),
                current_department = COALESCE($7, current_department),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.material_name.as_deref())
        .bind(patch.unit.as_deref())
        .bind(patch.released_qty)
        .bind(patch.comments.as_deref())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.current_department.map(|d| d.as_str()))
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        upsert_cards(&mut tx, row.id, cards).await?;
        append_history(&mut tx, row.id, history).await?;

        tx.commit().await.map_err(db_err)?;

        self.get(row.id)
            .await?
            .ok_or_else(|| AppError::Database("request vanished after update".to_string()))
            .map(Some)
    }

    /// Delete a request with its cards and history in one transaction.
    /// Returns `false` when the request does not exist.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM request_departments WHERE request_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM request_history WHERE request_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let result = sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn assemble(&self, row: RequestRow) -> Result<RequestDetail, AppError> {
        let site = sqlx::query_as::<_, SiteRow>("SELECT * FROM sites WHERE id = $1")
            .bind(row.site_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let cards = sqlx::query_as::<_, CardRow>(
            "SELECT * FROM request_departments WHERE request_id = $1 ORDER BY department",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let history = sqlx::query_as::<_, HistoryRow>(
            "SELECT * FROM request_history WHERE request_id = $1 ORDER BY received_at",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(RequestDetail {
            request: row.into(),
            site: site.into(),
            departments: cards.into_iter().map(Into::into).collect(),
            history: history.into_iter().map(Into::into).collect(),
        })
    }
}

async fn upsert_cards(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    request_id: Uuid,
    cards: &[NewDepartmentCard],
) -> Result<(), AppError> {
    for card in cards {
        sqlx::query(
            r#"
            INSERT INTO request_departments (request_id, department, status, comments, user_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (request_id, department)
            DO UPDATE SET status = EXCLUDED.status,
                          comments = EXCLUDED.comments,
                          user_id = EXCLUDED.user_id,
                          updated_at = NOW()
            "#,
        )
        .bind(request_id)
        .bind(card.department.as_str())
        .bind(card.status.as_str())
        .bind(card.comments.as_deref())
        .bind(card.user_id)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

async fn append_history(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    request_id: Uuid,
    entries: &[NewHistoryEntry],
) -> Result<(), AppError> {
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO request_history (request_id, department, user_id, received_at, forwarded_at)
            VALUES ($1, $2, $3, COALESCE($4, NOW()), $5)
            "#,
        )
        .bind(request_id)
        .bind(entry.department.as_str())
        .bind(entry.user_id)
        .bind(entry.received_at)
        .bind(entry.forwarded_at)
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    site_id: Uuid,
    material_name: String,
    unit: String,
    released_qty: f64,
    comments: Option<String>,
    status: String,
    current_department: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RequestRow> for MaterialRequest {
    fn from(row: RequestRow) -> Self {
        MaterialRequest {
            id: row.id,
            site_id: row.site_id,
            material_name: row.material_name,
            unit: row.unit,
            released_qty: row.released_qty,
            comments: row.comments,
            status: row.status.parse().unwrap_or(RequestStatus::Pending),
            current_department: row
                .current_department
                .parse()
                .unwrap_or(Department::Supervisor),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CardRow {
    id: Uuid,
    request_id: Uuid,
    department: String,
    status: String,
    comments: Option<String>,
    user_id: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

impl From<CardRow> for DepartmentCard {
    fn from(row: CardRow) -> Self {
        DepartmentCard {
            id: row.id,
            request_id: row.request_id,
            department: row.department.parse().unwrap_or(Department::Supervisor),
            status: row.status.parse().unwrap_or(CardStatus::Pending),
            comments: row.comments,
            user_id: row.user_id,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    request_id: Uuid,
    department: String,
    user_id: Option<Uuid>,
    received_at: DateTime<Utc>,
    forwarded_at: Option<DateTime<Utc>>,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        HistoryEntry {
            id: row.id,
            request_id: row.request_id,
            department: row.department.parse().unwrap_or(Department::Supervisor),
            user_id: row.user_id,
            received_at: row.received_at,
            forwarded_at: row.forwarded_at,
        }
    }
}
