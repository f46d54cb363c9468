//! Per-user favorite accommodations
//!
//! Favorites are a plain set of ids; adding and removing are idempotent.

use std::sync::Arc;

use stayhub_core::{
    models::{Accommodation, Principal},
    traits::{AccommodationRepository, UserRepository},
    AppError, AppResult,
};
use tracing::{debug, instrument};
use uuid::Uuid;

pub struct FavoritesService {
    users: Arc<dyn UserRepository>,
    accommodations: Arc<dyn AccommodationRepository>,
}

impl FavoritesService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        accommodations: Arc<dyn AccommodationRepository>,
    ) -> Self {
        Self {
            users,
            accommodations,
        }
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn add(&self, principal: &Principal, accommodation_id: Uuid) -> AppResult<()> {
        if self
            .accommodations
            .find_by_id(accommodation_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound(format!(
                "Accommodation {}",
                accommodation_id
            )));
        }

        let added = self
            .users
            .add_favorite(principal.id, accommodation_id)
            .await?;
        debug!("Favorite {} added: {}", accommodation_id, added);
        Ok(())
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn remove(&self, principal: &Principal, accommodation_id: Uuid) -> AppResult<()> {
        let removed = self
            .users
            .remove_favorite(principal.id, accommodation_id)
            .await?;
        debug!("Favorite {} removed: {}", accommodation_id, removed);
        Ok(())
    }

    pub async fn list(&self, principal: &Principal) -> AppResult<Vec<Accommodation>> {
        let user = self
            .users
            .find_by_id(principal.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", principal.id)))?;

        let ids: Vec<Uuid> = user.favorites.into_iter().collect();
        self.accommodations.find_by_ids(&ids).await
    }
}
