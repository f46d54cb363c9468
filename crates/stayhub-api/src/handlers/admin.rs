//! Administrator handlers
//!
//! Listing and room maintenance plus the dashboard figures. Every route
//! requires an admin token.

use crate::dto::catalog::{
    CreateAccommodationRequest, RoomRequest, UpdateAccommodationRequest, UpdateRoomRequest,
};
use crate::dto::common::validated;
use crate::dto::ApiResponse;
use actix_web::{web, HttpResponse};
use stayhub_auth::AdminUser;
use stayhub_core::AppError;
use stayhub_services::CatalogService;
use tracing::{info, instrument};
use uuid::Uuid;

/// Create an accommodation
///
/// POST /api/v1/admin/accommodations
#[instrument(skip(catalog, admin, req), fields(user_id = %admin.id))]
pub async fn create_accommodation(
    catalog: web::Data<CatalogService>,
    admin: AdminUser,
    req: web::Json<CreateAccommodationRequest>,
) -> Result<HttpResponse, AppError> {
    validated(&req.0, "Accommodation creation")?;

    let created = catalog
        .create(req.into_inner().into_new()?, &admin)
        .await?;

    info!(accommodation_id = %created.id, "Accommodation created");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        created,
        "Accommodation created successfully",
    )))
}

/// Update an accommodation's fields
///
/// PUT /api/v1/admin/accommodations/{id}
#[instrument(skip(catalog, admin, req), fields(user_id = %admin.id))]
pub async fn update_accommodation(
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
    admin: AdminUser,
    req: web::Json<UpdateAccommodationRequest>,
) -> Result<HttpResponse, AppError> {
    validated(&req.0, "Accommodation update")?;

    let updated = catalog
        .update(path.into_inner(), req.into_inner().into_changes()?, &admin)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        updated,
        "Accommodation updated successfully",
    )))
}

/// Append a room
///
/// POST /api/v1/admin/accommodations/{id}/rooms
#[instrument(skip(catalog, admin, req), fields(user_id = %admin.id))]
pub async fn add_room(
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
    admin: AdminUser,
    req: web::Json<RoomRequest>,
) -> Result<HttpResponse, AppError> {
    validated(&req.0, "Room creation")?;

    let updated = catalog
        .add_room(path.into_inner(), req.into_inner().into(), &admin)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::with_message(updated, "Room added")))
}

/// Change a room
///
/// PUT /api/v1/admin/accommodations/{id}/rooms/{room_index}
#[instrument(skip(catalog, admin, req), fields(user_id = %admin.id))]
pub async fn update_room(
    catalog: web::Data<CatalogService>,
    path: web::Path<(Uuid, i32)>,
    admin: AdminUser,
    req: web::Json<UpdateRoomRequest>,
) -> Result<HttpResponse, AppError> {
    validated(&req.0, "Room update")?;

    let (accommodation_id, room_index) = path.into_inner();
    let updated = catalog
        .update_room(accommodation_id, room_index, req.into_inner().into(), &admin)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(updated, "Room updated")))
}

/// Close a room to new bookings; its index is kept
///
/// DELETE /api/v1/admin/accommodations/{id}/rooms/{room_index}
#[instrument(skip(catalog, admin), fields(user_id = %admin.id))]
pub async fn delete_room(
    catalog: web::Data<CatalogService>,
    path: web::Path<(Uuid, i32)>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let (accommodation_id, room_index) = path.into_inner();
    let updated = catalog
        .delete_room(accommodation_id, room_index, &admin)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(updated, "Room closed")))
}

/// Dashboard counts, newest bookings and most-booked listings
///
/// GET /api/v1/admin/stats
#[instrument(skip(catalog, admin), fields(user_id = %admin.id))]
pub async fn dashboard_stats(
    catalog: web::Data<CatalogService>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let stats = catalog.dashboard_stats(&admin).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

/// Configure administrator routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/stats", web::get().to(dashboard_stats))
        .service(
            web::scope("/admin/accommodations")
                .route("", web::post().to(create_accommodation))
                .route("/{id}", web::put().to(update_accommodation))
                .route("/{id}/rooms", web::post().to(add_room))
                .route("/{id}/rooms/{room_index}", web::put().to(update_room))
                .route("/{id}/rooms/{room_index}", web::delete().to(delete_room)),
        );
}
