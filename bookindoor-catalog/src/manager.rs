use bookindoor_core::clock::Clock;
use bookindoor_core::identity::{Identity, Role};
use bookindoor_core::repository::AdminRepository;
use bookindoor_core::{CoreError, CoreResult};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::VenueRepository;
use crate::venue::{NewVenue, PublicVenue, Venue, VenueUpdate};

/// A venue shaped for whoever asked for it.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum VenueView {
    Full(Venue),
    Public(PublicVenue),
}

impl VenueView {
    fn for_caller(venue: Venue, caller: Option<&Identity>) -> Self {
        match caller {
            Some(identity) if identity.can_modify_venue(venue.owner_id) => VenueView::Full(venue),
            _ => VenueView::Public(venue.public_view()),
        }
    }
}

/// Venue lifecycle with ownership checks
pub struct VenueManager {
    venues: Arc<dyn VenueRepository>,
    admins: Arc<dyn AdminRepository>,
    clock: Arc<dyn Clock>,
}

impl VenueManager {
    pub fn new(
        venues: Arc<dyn VenueRepository>,
        admins: Arc<dyn AdminRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            venues,
            admins,
            clock,
        }
    }

    pub async fn create_venue(&self, identity: &Identity, mut new: NewVenue) -> CoreResult<Venue> {
        identity.ensure_venue_manager()?;

        let owner_id = match new.owner_id.take() {
            Some(owner_id) if owner_id != identity.id => {
                identity.ensure_super_admin()?;
                self.ensure_admin_account(owner_id).await?;
                owner_id
            }
            _ => identity.id,
        };

        let venue = Venue::create(new, owner_id, self.clock.now())?;
        self.venues.create_venue(&venue).await?;

        tracing::info!("Venue {} ({}) created, owner {}", venue.id, venue.name, venue.owner_id);
        Ok(venue)
    }

    /// Raw record, no visibility shaping. Used by the booking path.
    pub async fn find_venue(&self, id: Uuid) -> CoreResult<Venue> {
        self.venues
            .get_venue(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Venue {}", id)))
    }

    pub async fn get_venue(&self, id: Uuid, caller: Option<&Identity>) -> CoreResult<VenueView> {
        let venue = self.find_venue(id).await?;
        Ok(VenueView::for_caller(venue, caller))
    }

    pub async fn list_venues(&self, caller: Option<&Identity>) -> CoreResult<Vec<VenueView>> {
        let venues = match caller.map(|c| (c.id, c.role)) {
            Some((_, Role::SuperAdmin)) => self.venues.list_venues().await?,
            Some((id, Role::Admin)) => self.venues.list_by_owner(id).await?,
            _ => self.venues.list_venues().await?,
        };

        Ok(venues
            .into_iter()
            .map(|v| VenueView::for_caller(v, caller))
            .collect())
    }

    pub async fn update_venue(
        &self,
        identity: &Identity,
        id: Uuid,
        update: VenueUpdate,
    ) -> CoreResult<Venue> {
        identity.ensure_venue_manager()?;
        let mut venue = self.find_venue(id).await?;
        identity.ensure_can_modify_venue(venue.owner_id)?;

        if let Some(owner_id) = update.owner_id {
            if owner_id != venue.owner_id {
                identity.ensure_super_admin()?;
                self.ensure_admin_account(owner_id).await?;
            }
        }

        venue.apply(update, self.clock.now())?;
        self.venues.update_venue(&venue).await?;

        tracing::info!("Venue {} updated by {}", venue.id, identity.id);
        Ok(venue)
    }

    pub async fn delete_venue(&self, identity: &Identity, id: Uuid) -> CoreResult<()> {
        identity.ensure_venue_manager()?;
        let venue = self.find_venue(id).await?;
        identity.ensure_can_modify_venue(venue.owner_id)?;

        if !self.venues.delete_venue(id).await? {
            return Err(CoreError::not_found(format!("Venue {}", id)));
        }

        tracing::info!("Venue {} deleted by {}", id, identity.id);
        Ok(())
    }

    async fn ensure_admin_account(&self, admin_id: Uuid) -> CoreResult<()> {
        match self.admins.get_admin(admin_id).await? {
            Some(admin) if admin.role.can_manage_venues() => Ok(()),
            Some(_) => Err(CoreError::validation(format!(
                "Account {} cannot own venues",
                admin_id
            ))),
            None => Err(CoreError::not_found(format!("Admin {}", admin_id))),
        }
    }
}
