//! User accounts persisted in `users.json`

use crate::auth::passwords::{hash_password, verify_password};
use crate::auth::roles::Role;
use crate::storage::JsonStore;
use chrono::Utc;
use error_common::{DeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Shortest password accepted for a new account
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub full_name: String,
    /// Id of the incharge this employee reports to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_incharge_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// User as returned to clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub work_incharge_id: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            work_incharge_id: user.work_incharge_id.clone(),
            created_at: user.created_at.clone(),
            updated_at: user.updated_at.clone(),
        }
    }
}

/// Account to create; `role` is the requested one
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub work_incharge_id: Option<String>,
}

pub struct UserStore {
    store: JsonStore<Vec<User>>,
}

impl UserStore {
    /// Open `users.json`, seeding the `admin`/`admin` administrator on first start
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let seed = if tokio::fs::try_exists(path).await? {
            Vec::new()
        } else {
            tracing::warn!("Seeding default administrator account, change its password");
            vec![User {
                id: "1".to_string(),
                username: "admin".to_string(),
                password_hash: hash_password("admin")?,
                role: Role::Admin,
                full_name: "Administrator".to_string(),
                ..User::default()
            }]
        };
        Ok(Self {
            store: JsonStore::open(path, seed).await?,
        })
    }

    /// Every account in creation order
    pub async fn list(&self) -> Result<Vec<User>> {
        self.store.load().await
    }

    /// Case-insensitive username lookup
    pub async fn find(&self, username: &str) -> Result<Option<User>> {
        let wanted = username.trim().to_lowercase();
        Ok(self
            .store
            .load()
            .await?
            .into_iter()
            .find(|u| u.username.to_lowercase() == wanted))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.store.load().await?.into_iter().find(|u| u.id == id))
    }

    /// The user when the credentials match, `None` otherwise
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        Ok(self
            .find(username)
            .await?
            .filter(|user| verify_password(password, &user.password_hash)))
    }

    /// Add an account. `grant` runs under the store lock with the number of
    /// existing accounts and the requested role; it returns the role to
    /// store or refuses the creation. Usernames are unique ignoring case.
    pub async fn create<F, E>(&self, new: NewUser, grant: F) -> std::result::Result<User, E>
    where
        F: FnOnce(usize, Role) -> std::result::Result<Role, E>,
        E: From<DeskError>,
    {
        let username = new.username.trim().to_string();
        let password_hash = hash_password(&new.password)?;

        let mut locked = self.store.lock().await?;
        let role = grant(locked.value.len(), new.role)?;
        let key = username.to_lowercase();
        if locked.value.iter().any(|u| u.username.to_lowercase() == key) {
            return Err(DeskError::ConflictError("Username already exists".to_string()).into());
        }

        let now = Utc::now().to_rfc3339();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username,
            password_hash,
            role,
            full_name: new.full_name.trim().to_string(),
            work_incharge_id: new.work_incharge_id,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        locked.value.push(user.clone());
        locked.commit().await?;
        tracing::info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }

    /// Apply `change` to the account with `id` and refresh `updatedAt`;
    /// `None` when there is no such account
    pub async fn update<F>(&self, id: &str, change: F) -> Result<Option<User>>
    where
        F: FnOnce(&mut User),
    {
        let mut locked = self.store.lock().await?;
        let Some(user) = locked.value.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        change(user);
        user.updated_at = Some(Utc::now().to_rfc3339());
        let updated = user.clone();
        locked.commit().await?;
        Ok(Some(updated))
    }

    /// False when there is no account with `id`
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut locked = self.store.lock().await?;
        let before = locked.value.len();
        locked.value.retain(|u| u.id != id);
        if locked.value.len() == before {
            return Ok(false);
        }
        locked.commit().await?;
        tracing::info!(user_id = %id, "Account deleted");
        Ok(true)
    }
}
