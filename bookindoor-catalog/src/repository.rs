use async_trait::async_trait;
use bookindoor_core::{CoreError, CoreResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::venue::Venue;

/// Repository trait for venue persistence
#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn create_venue(&self, venue: &Venue) -> CoreResult<()>;

    async fn get_venue(&self, id: Uuid) -> CoreResult<Option<Venue>>;

    async fn list_venues(&self) -> CoreResult<Vec<Venue>>;

    async fn list_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Venue>>;

    /// Fails with `NotFound` when the venue is gone.
    async fn update_venue(&self, venue: &Venue) -> CoreResult<()>;

    async fn delete_venue(&self, id: Uuid) -> CoreResult<bool>;

    async fn count_venues(&self) -> CoreResult<u64>;
}

/// In-memory venue store for tests and local runs
#[derive(Default)]
pub struct InMemoryVenueRepository {
    venues: RwLock<HashMap<Uuid, Venue>>,
}

impl InMemoryVenueRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted(mut venues: Vec<Venue>) -> Vec<Venue> {
    venues.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    venues
}

#[async_trait]
impl VenueRepository for InMemoryVenueRepository {
    async fn create_venue(&self, venue: &Venue) -> CoreResult<()> {
        let mut venues = self.venues.write().await;
        if venues.contains_key(&venue.id) {
            return Err(CoreError::DuplicateRecord(format!("Venue {}", venue.id)));
        }
        venues.insert(venue.id, venue.clone());
        Ok(())
    }

    async fn get_venue(&self, id: Uuid) -> CoreResult<Option<Venue>> {
        Ok(self.venues.read().await.get(&id).cloned())
    }

    async fn list_venues(&self) -> CoreResult<Vec<Venue>> {
        Ok(sorted(self.venues.read().await.values().cloned().collect()))
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> CoreResult<Vec<Venue>> {
        Ok(sorted(
            self.venues
                .read()
                .await
                .values()
                .filter(|v| v.owner_id == owner_id)
                .cloned()
                .collect(),
        ))
    }

    async fn update_venue(&self, venue: &Venue) -> CoreResult<()> {
        match self.venues.write().await.get_mut(&venue.id) {
            Some(existing) => {
                *existing = venue.clone();
                Ok(())
            }
            None => Err(CoreError::not_found(format!("Venue {}", venue.id))),
        }
    }

    async fn delete_venue(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.venues.write().await.remove(&id).is_some())
    }

    async fn count_venues(&self) -> CoreResult<u64> {
        Ok(self.venues.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::tests::sample_new_venue;
    use chrono::Utc;

    #[tokio::test]
    async fn test_list_by_owner() {
        let repo = InMemoryVenueRepository::new();
        let owner = Uuid::new_v4();

        let mine = Venue::create(sample_new_venue(), owner, Utc::now()).unwrap();
        let theirs = Venue::create(sample_new_venue(), Uuid::new_v4(), Utc::now()).unwrap();
        repo.create_venue(&mine).await.unwrap();
        repo.create_venue(&theirs).await.unwrap();

        let owned = repo.list_by_owner(owner).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, mine.id);
        assert_eq!(repo.count_venues().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_venue() {
        let repo = InMemoryVenueRepository::new();
        let venue = Venue::create(sample_new_venue(), Uuid::new_v4(), Utc::now()).unwrap();
        assert!(matches!(
            repo.update_venue(&venue).await,
            Err(CoreError::NotFound(_))
        ));
        assert!(!repo.delete_venue(venue.id).await.unwrap());
    }
}
