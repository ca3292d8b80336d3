use bookindoor_core::admin::{Admin, AdminUpdate, NewAdmin};
use bookindoor_core::clock::Clock;
use bookindoor_core::identity::{Identity, Role};
use bookindoor_core::repository::AdminRepository;
use bookindoor_core::{CoreError, CoreResult};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::repository::VenueRepository;
use crate::venue::Venue;

/// An admin account together with the venues it manages.
#[derive(Debug, Clone, Serialize)]
pub struct AdminProfile {
    #[serde(flatten)]
    pub admin: Admin,
    pub venues: Vec<Venue>,
}

pub struct AdminManager {
    admins: Arc<dyn AdminRepository>,
    venues: Arc<dyn VenueRepository>,
    clock: Arc<dyn Clock>,
}

impl AdminManager {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        venues: Arc<dyn VenueRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            admins,
            venues,
            clock,
        }
    }

    pub async fn create_admin(&self, identity: &Identity, new: NewAdmin) -> CoreResult<Admin> {
        identity.ensure_super_admin()?;

        let admin = Admin::create(new, Role::Admin, self.clock.now())?;
        self.admins.create_admin(&admin).await?;

        tracing::info!("Admin {} created by {}", admin.id, identity.id);
        Ok(admin)
    }

    pub async fn list_admins(&self, identity: &Identity) -> CoreResult<Vec<Admin>> {
        identity.ensure_super_admin()?;
        self.admins.list_admins().await
    }

    pub async fn get_profile(&self, identity: &Identity, id: Uuid) -> CoreResult<AdminProfile> {
        if !identity.can_access_admin(id) {
            return Err(CoreError::forbidden("Cannot read another admin's profile"));
        }
        let admin = self.find_admin(id).await?;
        let venues = self.venues.list_by_owner(id).await?;
        Ok(AdminProfile { admin, venues })
    }

    pub async fn update_admin(
        &self,
        identity: &Identity,
        id: Uuid,
        update: AdminUpdate,
    ) -> CoreResult<Admin> {
        if !identity.can_access_admin(id) {
            return Err(CoreError::forbidden("Cannot modify another admin's profile"));
        }
        let mut admin = self.find_admin(id).await?;
        admin.apply(update, self.clock.now())?;
        self.admins.update_admin(&admin).await?;

        tracing::info!("Admin {} updated by {}", admin.id, identity.id);
        Ok(admin)
    }

    pub async fn delete_admin(&self, identity: &Identity, id: Uuid) -> CoreResult<()> {
        identity.ensure_super_admin()?;
        if identity.id == id {
            return Err(CoreError::validation("A super-admin cannot delete their own account"));
        }

        self.find_admin(id).await?;
        let owned = self.venues.list_by_owner(id).await?;
        if !owned.is_empty() {
            return Err(CoreError::validation(format!(
                "Admin {} still manages {} venue(s); reassign them first",
                id,
                owned.len()
            )));
        }

        if !self.admins.delete_admin(id).await? {
            return Err(CoreError::not_found(format!("Admin {}", id)));
        }

        tracing::info!("Admin {} deleted by {}", id, identity.id);
        Ok(())
    }

    async fn find_admin(&self, id: Uuid) -> CoreResult<Admin> {
        self.admins
            .get_admin(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("Admin {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryVenueRepository;
    use crate::venue::tests::sample_new_venue;
    use bookindoor_core::clock::SystemClock;
    use bookindoor_core::repository::InMemoryAdminRepository;

    fn setup() -> (AdminManager, Arc<InMemoryVenueRepository>) {
        let venues = Arc::new(InMemoryVenueRepository::new());
        let manager = AdminManager::new(
            Arc::new(InMemoryAdminRepository::new()),
            venues.clone(),
            Arc::new(SystemClock),
        );
        (manager, venues)
    }

    fn new_admin(email: &str) -> NewAdmin {
        NewAdmin {
            name: "Nimali Silva".to_string(),
            email: email.to_string(),
            phone: "0771112223".to_string(),
            password: "sup3r-secret".into(),
            settlement: None,
        }
    }

    fn root() -> Identity {
        Identity::new(Uuid::new_v4(), Role::SuperAdmin)
    }

    #[tokio::test]
    async fn test_only_super_admin_creates() {
        let (manager, _) = setup();
        let admin = Identity::new(Uuid::new_v4(), Role::Admin);
        assert!(matches!(
            manager.create_admin(&admin, new_admin("x@example.com")).await,
            Err(CoreError::Forbidden(_))
        ));

        let created = manager.create_admin(&root(), new_admin("x@example.com")).await.unwrap();
        assert_eq!(created.role, Role::Admin);

        assert!(matches!(
            manager.create_admin(&root(), new_admin("X@example.com")).await,
            Err(CoreError::DuplicateRecord(_))
        ));
    }

    #[tokio::test]
    async fn test_self_service_profile() {
        let (manager, _) = setup();
        let created = manager.create_admin(&root(), new_admin("x@example.com")).await.unwrap();
        let me = Identity::new(created.id, Role::Admin);
        let stranger = Identity::new(Uuid::new_v4(), Role::Admin);

        assert!(manager.get_profile(&me, created.id).await.is_ok());
        assert!(matches!(
            manager.get_profile(&stranger, created.id).await,
            Err(CoreError::Forbidden(_))
        ));

        let updated = manager
            .update_admin(
                &me,
                created.id,
                AdminUpdate {
                    name: Some("Nimali S.".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Nimali S.");
        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_delete_guards() {
        let (manager, venues) = setup();
        let super_admin = root();
        assert!(matches!(
            manager.delete_admin(&super_admin, super_admin.id).await,
            Err(CoreError::ValidationError(_))
        ));

        let created = manager.create_admin(&super_admin, new_admin("x@example.com")).await.unwrap();
        let venue = Venue::create(sample_new_venue(), created.id, chrono::Utc::now()).unwrap();
        venues.create_venue(&venue).await.unwrap();

        assert!(matches!(
            manager.delete_admin(&super_admin, created.id).await,
            Err(CoreError::ValidationError(_))
        ));

        venues.delete_venue(venue.id).await.unwrap();
        manager.delete_admin(&super_admin, created.id).await.unwrap();
        assert!(matches!(
            manager.get_profile(&super_admin, created.id).await,
            Err(CoreError::NotFound(_))
        ));
    }
}
