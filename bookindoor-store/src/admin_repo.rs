use async_trait::async_trait;
use bookindoor_core::admin::{Admin, SettlementDetails};
use bookindoor_core::repository::AdminRepository;
use bookindoor_core::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{corrupt_row, db_error, is_unique_violation};

pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ADMIN_COLUMNS: &str =
    "id, name, email, phone, role, password_hash, settlement, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    role: String,
    password_hash: String,
    settlement: Option<Json<SettlementDetails>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for Admin {
    type Error = CoreError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|e| corrupt_row("admin", e))?;
        Ok(Admin {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role,
            password_hash: row.password_hash,
            settlement: row.settlement.map(|s| s.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn duplicate_email(email: &str) -> CoreError {
    CoreError::DuplicateRecord(format!("Admin with email {} already exists", email))
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn create_admin(&self, admin: &Admin) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO admins (id, name, email, phone, role, password_hash, settlement,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(admin.id)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.phone)
        .bind(admin.role.as_str())
        .bind(&admin.password_hash)
        .bind(admin.settlement.as_ref().map(Json))
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_email(&admin.email)
            } else {
                db_error(e)
            }
        })?;

        Ok(())
    }

    async fn get_admin(&self, id: Uuid) -> CoreResult<Option<Admin>> {
        sqlx::query_as::<_, AdminRow>(&format!("SELECT {} FROM admins WHERE id = $1", ADMIN_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Admin::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Admin>> {
        sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {} FROM admins WHERE email = $1",
            ADMIN_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(Admin::try_from)
        .transpose()
    }

    async fn list_admins(&self) -> CoreResult<Vec<Admin>> {
        sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {} FROM admins ORDER BY name, id",
            ADMIN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(Admin::try_from)
        .collect()
    }

    async fn update_admin(&self, admin: &Admin) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE admins
            SET name = $2, email = $3, phone = $4, password_hash = $5, settlement = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(admin.id)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.phone)
        .bind(&admin.password_hash)
        .bind(admin.settlement.as_ref().map(Json))
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate_email(&admin.email)
            } else {
                db_error(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(format!("Admin {}", admin.id)));
        }
        Ok(())
    }

    async fn delete_admin(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_admins(&self) -> CoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(count.max(0) as u64)
    }
}
