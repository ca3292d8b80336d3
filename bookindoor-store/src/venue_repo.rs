use async_trait::async_trait;
use bookindoor_catalog::{Location, OpeningHours, Sport, Venue, VenueRepository};
use bookindoor_core::{CoreError, CoreResult};
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_error;

pub struct PgVenueRepository {
    pool: PgPool,
}

impl PgVenueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const VENUE_COLUMNS: &str = "id, name, address, lat, lng, contact_number, venue_type, sports, \
     amenities, open_from, open_to, images, description, owner_id, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct VenueRow {
    id: Uuid,
    name: String,
    address: String,
    lat: Option<f64>,
    lng: Option<f64>,
    contact_number: String,
    venue_type: String,
    sports: Json<Vec<Sport>>,
    amenities: Json<Vec<String>>,
    open_from: NaiveTime,
    open_to: NaiveTime,
    images: Json<Vec<String>>,
    description: Option<String>,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VenueRow> for Venue {
    fn from(row: VenueRow) -> Self {
        Venue {
            id: row.id,
            name: row.name,
            location: Location {
                address: row.address,
                lat: row.lat,
                lng: row.lng,
            },
            contact_number: row.contact_number,
            venue_type: row.venue_type,
            sports: row.sports.0,
            amenities: row.amenities.0,
            available_time: OpeningHours {
                from: row.open_from,
                to: row.open_to,
            },
            images: row.images.0,
            description: row.description,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl VenueRepository for PgVenueRepository {
    async fn create_venue(&self, venue: &Venue) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO venues (id, name, address, lat, lng, contact_number, venue_type, sports,
                                amenities, open_from, open_to, images, description, owner_id,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(venue.id)
        .bind(&venue.name)
        .bind(&venue.location.address)
        .bind(venue.location.lat)
        .bind(venue.location.lng)
        .bind(&venue.contact_number)
        .bind(&venue.venue_type)
        .bind(Json(&venue.sports))
        .bind(Json(&venue.amenities))
        .bind(venue.available_time.from)
        .bind(venue.available_time.to)
        .bind(Json(&venue.images))
        .bind(&venue.description)
        .bind(venue.owner_id)
        .bind(venue.created_at)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn get_venue(&self, id: Uuid) -> CoreResult<Option<Venue>> {
        let row = sqlx::query_as::<_, VenueRow>(&format!(
            "SELECT {} FROM venues WHERE id = $1",
            VENUE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(Venue::from))
    }

    async fn list_venues(&self) -> CoreResult<Vec<Venue>> {
        let rows = sqlx::query_as::<_, VenueRow>(&format!(
            "SELECT {} FROM venues ORDER BY name, id",
            VENUE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Venue::from).collect())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Venue>> {
        let rows = sqlx::query_as::<_, VenueRow>(&format!(
            "SELECT {} FROM venues WHERE owner_id = $1 ORDER BY name, id",
            VENUE_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Venue::from).collect())
    }

    async fn update_venue(&self, venue: &Venue) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE venues
            SET name = $2, address = $3, lat = $4, lng = $5, contact_number = $6,
                venue_type = $7, sports = $8, amenities = $9, open_from = $10, open_to = $11,
                images = $12, description = $13, owner_id = $14, updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(venue.id)
        .bind(&venue.name)
        .bind(&venue.location.address)
        .bind(venue.location.lat)
        .bind(venue.location.lng)
        .bind(&venue.contact_number)
        .bind(&venue.venue_type)
        .bind(Json(&venue.sports))
        .bind(Json(&venue.amenities))
        .bind(venue.available_time.from)
        .bind(venue.available_time.to)
        .bind(Json(&venue.images))
        .bind(&venue.description)
        .bind(venue.owner_id)
        .bind(venue.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(format!("Venue {}", venue.id)));
        }
        Ok(())
    }

    async fn delete_venue(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_venues(&self) -> CoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM venues")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(count.max(0) as u64)
    }
}
