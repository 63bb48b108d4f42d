use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use matreq_core::error::AppError;
use matreq_core::site::{
    NewSite, PurchaserAssignment, PurchaserOnSite, Site, SitePatch, SiteStatus, SiteWithCrew,
    SupervisorAssignment, SupervisorOnSite,
};
use matreq_core::user::{Role, User};

use crate::db_err;

/// Repository for sites and their crew assignments in PostgreSQL.
///
/// Crew assignment rows are exclusive children of a site; every write that
/// touches them runs inside a transaction so a crash can never leave the
/// site half-updated.
#[derive(Clone)]
pub struct SiteRepository {
    pool: Pool<Postgres>,
}

impl SiteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a site together with its crew assignments.
    pub async fn create(
        &self,
        site: &NewSite,
        supervisors: &[SupervisorAssignment],
        purchasers: &[PurchaserAssignment],
    ) -> Result<SiteWithCrew, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, SiteRow>(
            r#"
            INSERT INTO sites (name, address, client_name, city, province, plot_size, status, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&site.name)
        .bind(&site.address)
        .bind(site.client_name.as_deref())
        .bind(site.city.as_deref())
        .bind(site.province.as_deref())
        .bind(site.plot_size.as_deref())
        .bind(site.status.as_str())
        .bind(site.updated_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        insert_supervisors(&mut tx, row.id, supervisors).await?;
        insert_purchasers(&mut tx, row.id, purchasers).await?;

        tx.commit().await.map_err(db_err)?;

        self.get(row.id)
            .await?
            .ok_or_else(|| AppError::Database("site vanished after insert".to_string()))
    }

    /// All sites with their crews, newest first.
    pub async fn list(&self) -> Result<Vec<SiteWithCrew>, AppError> {
        let rows = sqlx::query_as::<_, SiteRow>("SELECT * FROM sites ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut sites = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id;
            sites.push(SiteWithCrew {
                site: row.into(),
                supervisors: self.supervisors_of(id).await?,
                purchasers: self.purchasers_of(id).await?,
            });
        }
        Ok(sites)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<SiteWithCrew>, AppError> {
        let row = sqlx::query_as::<_, SiteRow>("SELECT * FROM sites WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => Ok(Some(SiteWithCrew {
                site: row.into(),
                supervisors: self.supervisors_of(id).await?,
                purchasers: self.purchasers_of(id).await?,
            })),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, AppError> {
        let (found,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM sites WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(found)
    }

    /// Apply a partial update; crew lists, when given, replace the existing
    /// assignment rows wholesale. Returns `None` when the site is unknown.
    pub async fn update(
        &self,
        id: Uuid,
        patch: &SitePatch,
        supervisors: Option<&[SupervisorAssignment]>,
        purchasers: Option<&[PurchaserAssignment]>,
    ) -> Result<Option<SiteWithCrew>, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, SiteRow>(
            r#"
            UPDATE sites
            SET name = COALESCE($2, name),
                address = COALESCE($3, address),
                client_name = COALESCE($4, client_name),
                city = COALESCE($5, city),
                province = COALESCE($6, province),
                plot_size = COALESCE($7, plot_size),
                status = COALESCE($8, status),
                updated_by = COALESCE($9, updated_by),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.address.as_deref())
        .bind(patch.client_name.as_deref())
        .bind(patch.city.as_deref())
        .bind(patch.province.as_deref())
        .bind(patch.plot_size.as_deref())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.updated_by)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        if let Some(supervisors) = supervisors {
            sqlx::query("DELETE FROM site_supervisors WHERE site_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            insert_supervisors(&mut tx, id, supervisors).await?;
        }

        if let Some(purchasers) = purchasers {
            sqlx::query("DELETE FROM site_purchasers WHERE site_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            insert_purchasers(&mut tx, id, purchasers).await?;
        }

        tx.commit().await.map_err(db_err)?;

        self.get(row.id)
            .await?
            .ok_or_else(|| AppError::Database("site vanished after update".to_string()))
            .map(Some)
    }

    /// Delete a site and its crew assignments in one transaction.
    ///
    /// Refuses with `Conflict` while material requests still reference the
    /// site. Returns `false` when the site does not exist.
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let (has_requests,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM requests WHERE site_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_err)?;
        if has_requests {
            return Err(AppError::Conflict(
                "site still has material requests".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM site_supervisors WHERE site_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM site_purchasers WHERE site_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let result = sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn supervisors_of(&self, site_id: Uuid) -> Result<Vec<SupervisorOnSite>, AppError> {
        let rows = sqlx::query_as::<_, SupervisorRow>(
            r#"
            SELECT ss.id AS assignment_id, ss.status AS assignment_status,
                   u.id, u.name, u.email, u.password_hash, u.role, u.created_at, u.updated_at
            FROM site_supervisors ss
            JOIN users u ON u.id = ss.user_id
            WHERE ss.site_id = $1
            ORDER BY ss.id
            "#,
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn purchasers_of(&self, site_id: Uuid) -> Result<Vec<PurchaserOnSite>, AppError> {
        let rows = sqlx::query_as::<_, PurchaserRow>(
            r#"
            SELECT sp.id AS assignment_id, sp.status AS assignment_status, sp.material_type,
                   u.id, u.name, u.email, u.password_hash, u.role, u.created_at, u.updated_at
            FROM site_purchasers sp
            JOIN users u ON u.id = sp.user_id
            WHERE sp.site_id = $1
            ORDER BY sp.id
            "#,
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

async fn insert_supervisors(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    site_id: Uuid,
    supervisors: &[SupervisorAssignment],
) -> Result<(), AppError> {
    for assignment in supervisors {
        sqlx::query("INSERT INTO site_supervisors (site_id, user_id, status) VALUES ($1, $2, $3)")
            .bind(site_id)
            .bind(assignment.user_id)
            .bind(assignment.status.as_deref())
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

async fn insert_purchasers(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    site_id: Uuid,
    purchasers: &[PurchaserAssignment],
) -> Result<(), AppError> {
    for assignment in purchasers {
        sqlx::query(
            "INSERT INTO site_purchasers (site_id, user_id, status, material_type) VALUES ($1, $2, $3, $4)",
        )
        .bind(site_id)
        .bind(assignment.user_id)
        .bind(assignment.status.as_deref())
        .bind(assignment.material_type.as_deref())
        .execute(&mut **tx)
        .await
        .map_err(db_err)?;
    }
    Ok(())
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
pub(crate) struct SiteRow {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) address: String,
    pub(crate) client_name: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) province: Option<String>,
    pub(crate) plot_size: Option<String>,
    pub(crate) status: String,
    pub(crate) updated_by: Option<Uuid>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl From<SiteRow> for Site {
    fn from(row: SiteRow) -> Self {
        Site {
            id: row.id,
            name: row.name,
            address: row.address,
            client_name: row.client_name,
            city: row.city,
            province: row.province,
            plot_size: row.plot_size,
            status: row.status.parse().unwrap_or(SiteStatus::Active),
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SupervisorRow {
    assignment_id: Uuid,
    assignment_status: Option<String>,
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SupervisorRow> for SupervisorOnSite {
    fn from(row: SupervisorRow) -> Self {
        SupervisorOnSite {
            id: row.assignment_id,
            status: row.assignment_status,
            user: User {
                id: row.id,
                name: row.name,
                email: row.email,
                password_hash: row.password_hash,
                role: row.role.parse().unwrap_or(Role::Supervisor),
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct PurchaserRow {
    assignment_id: Uuid,
    assignment_status: Option<String>,
    material_type: Option<String>,
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PurchaserRow> for PurchaserOnSite {
    fn from(row: PurchaserRow) -> Self {
        PurchaserOnSite {
            id: row.assignment_id,
            status: row.assignment_status,
            material_type: row.material_type,
            user: User {
                id: row.id,
                name: row.name,
                email: row.email,
                password_hash: row.password_hash,
                role: row.role.parse().unwrap_or(Role::Purchaser),
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}
