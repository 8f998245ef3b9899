//! Read-only lookups for users and service offerings
//!
//! The user and service directories are owned by collaborating systems and
//! assumed consistent at call time. The core only needs lookups by ID, so
//! the boundary is a small trait with a DashMap-backed in-memory
//! implementation for the server and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::model::directory::{ServiceOffering, User};

/// Read-only directory of users and service offerings
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a user by ID
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Look up a service offering by ID
    async fn get_service(&self, id: Uuid) -> Result<Option<ServiceOffering>>;
}

/// In-memory directory
pub struct InMemoryDirectory {
    /// Users by ID
    users: DashMap<Uuid, User>,
    /// Service offerings by ID
    services: DashMap<Uuid, ServiceOffering>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            services: DashMap::new(),
        }
    }

    /// Register a user
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Register a service offering
    pub fn insert_service(&self, service: ServiceOffering) {
        self.services.insert(service.id, service);
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn get_service(&self, id: Uuid) -> Result<Option<ServiceOffering>> {
        Ok(self.services.get(&id).map(|s| s.clone()))
    }
}
