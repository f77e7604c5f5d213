//! User profile repository trait

use crate::error::Result;
use crate::models::UserProfile;
use async_trait::async_trait;

#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Find a profile by its id (the auth user id).
    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>>;

    /// Insert or replace the profile row.
    async fn upsert(&self, profile: &UserProfile) -> Result<UserProfile>;
}
