use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::admin::Admin;
use crate::identity::Role;
use crate::{CoreError, CoreResult};

/// Repository trait for admin account access
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Fails with `DuplicateRecord` when the email is already registered.
    async fn create_admin(&self, admin: &Admin) -> CoreResult<()>;

    async fn get_admin(&self, id: Uuid) -> CoreResult<Option<Admin>>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Admin>>;

    async fn list_admins(&self) -> CoreResult<Vec<Admin>>;

    async fn update_admin(&self, admin: &Admin) -> CoreResult<()>;

    async fn delete_admin(&self, id: Uuid) -> CoreResult<bool>;

    /// Number of accounts with role `admin` (super-admins excluded).
    async fn count_admins(&self) -> CoreResult<u64>;
}

/// In-memory admin store for tests and local runs
#[derive(Default)]
pub struct InMemoryAdminRepository {
    admins: RwLock<HashMap<Uuid, Admin>>,
}

impl InMemoryAdminRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepository {
    async fn create_admin(&self, admin: &Admin) -> CoreResult<()> {
        let mut admins = self.admins.write().await;
        if admins.values().any(|a| a.email == admin.email) {
            return Err(CoreError::DuplicateRecord(format!("Email already registered: {}", admin.email)));
        }
        admins.insert(admin.id, admin.clone());
        Ok(())
    }

    async fn get_admin(&self, id: Uuid) -> CoreResult<Option<Admin>> {
        Ok(self.admins.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<Admin>> {
        Ok(self.admins.read().await.values().find(|a| a.email == email).cloned())
    }

    async fn list_admins(&self) -> CoreResult<Vec<Admin>> {
        let mut admins: Vec<Admin> = self.admins.read().await.values().cloned().collect();
        admins.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.email.cmp(&b.email)));
        Ok(admins)
    }

    async fn update_admin(&self, admin: &Admin) -> CoreResult<()> {
        let mut admins = self.admins.write().await;
        if admins.values().any(|a| a.id != admin.id && a.email == admin.email) {
            return Err(CoreError::DuplicateRecord(format!("Email already registered: {}", admin.email)));
        }
        match admins.get_mut(&admin.id) {
            Some(existing) => {
                *existing = admin.clone();
                Ok(())
            }
            None => Err(CoreError::not_found(format!("Admin {}", admin.id))),
        }
    }

    async fn delete_admin(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.admins.write().await.remove(&id).is_some())
    }

    async fn count_admins(&self) -> CoreResult<u64> {
        Ok(self
            .admins
            .read()
            .await
            .values()
            .filter(|a| a.role == Role::Admin)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::NewAdmin;
    use chrono::Utc;

    fn admin(email: &str, role: Role) -> Admin {
        Admin::create(
            NewAdmin {
                name: "Test Admin".to_string(),
                email: email.to_string(),
                phone: "0770000000".to_string(),
                password: "password123".into(),
                settlement: None,
            },
            role,
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryAdminRepository::new();
        repo.create_admin(&admin("a@example.com", Role::Admin)).await.unwrap();
        let result = repo.create_admin(&admin("a@example.com", Role::Admin)).await;
        assert!(matches!(result, Err(CoreError::DuplicateRecord(_))));
    }

    #[tokio::test]
    async fn test_count_excludes_super_admins() {
        let repo = InMemoryAdminRepository::new();
        repo.create_admin(&admin("a@example.com", Role::Admin)).await.unwrap();
        repo.create_admin(&admin("b@example.com", Role::Admin)).await.unwrap();
        repo.create_admin(&admin("root@example.com", Role::SuperAdmin)).await.unwrap();
        assert_eq!(repo.count_admins().await.unwrap(), 2);
        assert_eq!(repo.list_admins().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = InMemoryAdminRepository::new();
        let mut a = admin("a@example.com", Role::Admin);
        repo.create_admin(&a).await.unwrap();

        a.name = "Renamed".to_string();
        repo.update_admin(&a).await.unwrap();
        assert_eq!(repo.get_admin(a.id).await.unwrap().unwrap().name, "Renamed");
        assert!(repo.find_by_email("a@example.com").await.unwrap().is_some());

        assert!(repo.delete_admin(a.id).await.unwrap());
        assert!(!repo.delete_admin(a.id).await.unwrap());
    }
}
