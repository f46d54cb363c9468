//! Favorite accommodation handlers

use crate::dto::ApiResponse;
use actix_web::{web, HttpResponse};
use stayhub_auth::AuthenticatedUser;
use stayhub_core::AppError;
use stayhub_services::FavoritesService;
use tracing::instrument;
use uuid::Uuid;

/// GET /api/v1/users/favorites
#[instrument(skip(favorites, user), fields(user_id = %user.id))]
pub async fn list_favorites(
    favorites: web::Data<FavoritesService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let list = favorites.list(&user).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(list)))
}

/// POST /api/v1/users/favorites/{id}
#[instrument(skip(favorites, user), fields(user_id = %user.id))]
pub async fn add_favorite(
    favorites: web::Data<FavoritesService>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let accommodation_id = path.into_inner();
    favorites.add(&user, accommodation_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        serde_json::json!({ "accommodation_id": accommodation_id }),
        "Added to favorites",
    )))
}

/// DELETE /api/v1/users/favorites/{id}
#[instrument(skip(favorites, user), fields(user_id = %user.id))]
pub async fn remove_favorite(
    favorites: web::Data<FavoritesService>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    favorites.remove(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure favorites routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users/favorites")
            .route("", web::get().to(list_favorites))
            .route("/{id}", web::post().to(add_favorite))
            .route("/{id}", web::delete().to(remove_favorite)),
    );
}
