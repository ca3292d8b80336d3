use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use bookindoor_shared::Masked;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Role;
use crate::{CoreError, CoreResult};

const MIN_PASSWORD_LEN: usize = 8;

/// Payout details a venue admin keeps on file for settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementDetails {
    pub nic_number: Option<Masked<String>>,
    pub bank_name: String,
    pub branch: Option<String>,
    pub account_number: Masked<String>,
    pub account_holder: String,
}

/// An admin or super-admin account. The credential hash never leaves the store.
#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub settlement: Option<SettlementDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: Masked<String>,
    pub settlement: Option<SettlementDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<Masked<String>>,
    pub settlement: Option<SettlementDetails>,
}

impl Admin {
    pub fn create(new: NewAdmin, role: Role, now: DateTime<Utc>) -> CoreResult<Self> {
        validate_name(&new.name)?;
        let email = normalize_email(&new.email)?;
        validate_phone(&new.phone)?;
        let password_hash = hash_password(new.password.expose())?;

        Ok(Self {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            email,
            phone: new.phone.trim().to_string(),
            role,
            password_hash,
            settlement: new.settlement,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply(&mut self, update: AdminUpdate, now: DateTime<Utc>) -> CoreResult<()> {
        if let Some(name) = update.name {
            validate_name(&name)?;
            self.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            self.email = normalize_email(&email)?;
        }
        if let Some(phone) = update.phone {
            validate_phone(&phone)?;
            self.phone = phone.trim().to_string();
        }
        if let Some(password) = update.password {
            self.password_hash = hash_password(password.expose())?;
        }
        if update.settlement.is_some() {
            self.settlement = update.settlement;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn verify_password(&self, candidate: &str) -> bool {
        verify_password(candidate, &self.password_hash)
    }
}

fn validate_name(name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::validation("Admin name is required"));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> CoreResult<()> {
    if phone.trim().is_empty() {
        return Err(CoreError::validation("Admin phone is required"));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> CoreResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(CoreError::validation(format!("Invalid email address: {}", email))),
    }
}

/// Argon2id hash with a fresh random salt, in PHC string format.
pub fn hash_password(password: &str) -> CoreResult<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(CoreError::internal)?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(CoreError::internal)
}

pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
