//! Test doubles for the three hosted collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::auth::client::{AuthSession, AuthUser, IdentityError, SignUpMetadata};
use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::profile::{Profile, Role};
use crate::state::AppState;
use crate::storage::DocumentStorage;
use crate::store::memory::MemoryStore;

pub const ADMIN_SECRET: &str = "letmein";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        database_max_connections: 2,
        auth_url: "https://auth.example.com".to_string(),
        auth_anon_key: "anon".to_string(),
        auth_service_role_key: "service".to_string(),
        admin_secret: Some(ADMIN_SECRET.to_string()),
        s3_bucket: "documents".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        s3_region: "us-east-1".to_string(),
        s3_public_url: "https://cdn.example.com".to_string(),
        aws_access_key_id: "key".to_string(),
        aws_secret_access_key: "secret".to_string(),
        port: 8080,
        rust_log: "debug".to_string(),
    }
}

pub fn profile_with_role(role: Role) -> Profile {
    let mut p = Profile::new_student(Uuid::new_v4(), "user@univ.fr", "Ada", "Lovelace");
    p.role = role;
    p
}

/// Identity provider keyed by access token (`token-<profile id>`) and a
/// fixed password `hunter22`.
#[derive(Default)]
pub struct FakeIdentity {
    users: Mutex<HashMap<String, AuthUser>>,
    pub signed_out: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub fail_listing: AtomicBool,
}

pub const PASSWORD: &str = "hunter22";

pub fn token_for(id: Uuid) -> String {
    format!("token-{id}")
}

impl FakeIdentity {
    pub fn register(&self, id: Uuid, email: &str) {
        let user = AuthUser {
            id,
            email: Some(email.to_string()),
            created_at: None,
            last_sign_in_at: None,
            user_metadata: serde_json::Value::Null,
        };
        self.users.lock().unwrap().insert(email.to_string(), user);
    }

    fn check(&self) -> Result<(), IdentityError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(IdentityError::Api {
                status: 503,
                message: "identity provider unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        self.check()?;
        let user = self
            .users
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .filter(|_| password == PASSWORD)
            .ok_or(IdentityError::InvalidCredentials)?;
        Ok(AuthSession {
            access_token: token_for(user.id),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            user,
        })
    }

    async fn sign_up(
        &self,
        email: &str,
        _password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<AuthUser, IdentityError> {
        self.check()?;
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            created_at: None,
            last_sign_in_at: None,
            user_metadata: serde_json::to_value(metadata).unwrap(),
        };
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), user.clone());
        Ok(user)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        self.check()?;
        self.signed_out
            .lock()
            .unwrap()
            .push(access_token.to_string());
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        self.check()?;
        let id = access_token
            .strip_prefix("token-")
            .and_then(|s| s.parse::<Uuid>().ok())
            .ok_or(IdentityError::InvalidSession)?;
        Ok(AuthUser {
            id,
            email: None,
            created_at: None,
            last_sign_in_at: None,
            user_metadata: serde_json::Value::Null,
        })
    }

    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<AuthUser>, IdentityError> {
        self.check()?;
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(IdentityError::Api {
                status: 500,
                message: "admin listing failed".to_string(),
            });
        }
        let mut users: Vec<_> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        let skip = (page.saturating_sub(1) * per_page) as usize;
        Ok(users.into_iter().skip(skip).take(per_page as usize).collect())
    }
}

#[derive(Default)]
pub struct FakeStorage {
    pub uploads: Mutex<Vec<(String, usize, String)>>,
}

#[async_trait]
impl DocumentStorage for FakeStorage {
    async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, AppError> {
        self.uploads
            .lock()
            .unwrap()
            .push((key.to_string(), body.len(), content_type.to_string()));
        Ok(format!("https://cdn.example.com/documents/{key}"))
    }
}

pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub identity: Arc<FakeIdentity>,
    pub storage: Arc<FakeStorage>,
}

pub fn harness(store: MemoryStore) -> TestHarness {
    let store = Arc::new(store);
    let identity = Arc::new(FakeIdentity::default());
    let storage = Arc::new(FakeStorage::default());
    let state = AppState {
        store: store.clone(),
        identity: identity.clone(),
        storage: storage.clone(),
        config: test_config(),
    };
    TestHarness {
        state,
        store,
        identity,
        storage,
    }
}
