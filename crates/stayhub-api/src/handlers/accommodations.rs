//! Accommodation handlers
//!
//! Catalog browsing, location search and the review endpoints nested under
//! an accommodation.

use crate::dto::accommodation::{InAreaQuery, NearMeQuery};
use crate::dto::catalog::{CatalogListQuery, PopularQuery};
use crate::dto::common::validated;
use crate::dto::review::{CreateReviewRequest, UpdateReviewRequest};
use crate::dto::ApiResponse;
use actix_web::{web, HttpResponse};
use stayhub_auth::AuthenticatedUser;
use stayhub_core::AppError;
use stayhub_services::{CatalogService, ReviewService, SearchService};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Active accommodations with filters, sorting and pagination
///
/// GET /api/v1/accommodations
#[instrument(skip(catalog, user))]
pub async fn list_accommodations(
    catalog: web::Data<CatalogService>,
    query: web::Query<CatalogListQuery>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    let catalog_query = query.to_query()?;
    let pagination = query.pagination()?;

    let page = catalog
        .list(&catalog_query, pagination, user.as_ref().map(|u| u.principal()))
        .await?;

    debug!(total = page.pagination.total, "catalog listing complete");
    Ok(HttpResponse::Ok().json(page))
}

/// Most-booked active accommodations
///
/// GET /api/v1/accommodations/popular
#[instrument(skip(catalog, user))]
pub async fn popular_accommodations(
    catalog: web::Data<CatalogService>,
    query: web::Query<PopularQuery>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    let list = catalog
        .popular(query.limit, user.as_ref().map(|u| u.principal()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(list)))
}

/// A single accommodation with its rooms
///
/// GET /api/v1/accommodations/{id}
#[instrument(skip(catalog, user))]
pub async fn get_accommodation(
    catalog: web::Data<CatalogService>,
    path: web::Path<Uuid>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    let entry = catalog
        .get(path.into_inner(), user.as_ref().map(|u| u.principal()))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(entry)))
}

/// Accommodations near a point, nearest first
///
/// GET /api/v1/accommodations/near-me
///
/// Authentication is optional; signed-in callers get `is_favorite` flags.
#[instrument(skip(search, user))]
pub async fn near_me(
    search: web::Data<SearchService>,
    query: web::Query<NearMeQuery>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    let origin = query.origin()?;
    let filters = query.filters()?;
    let pagination = query.pagination()?;

    let page = search
        .near_me(
            origin,
            query.distance,
            &filters,
            pagination,
            user.as_ref().map(|u| u.principal()),
        )
        .await?;

    debug!(total = page.pagination.total, "near-me search complete");
    Ok(HttpResponse::Ok().json(page))
}

/// Accommodations inside a bounding box
///
/// GET /api/v1/accommodations/in-area
#[instrument(skip(search, user))]
pub async fn in_area(
    search: web::Data<SearchService>,
    query: web::Query<InAreaQuery>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, AppError> {
    let bounds = query.bounds()?;
    let filters = query.filters()?;
    let pagination = query.pagination()?;

    let page = search
        .in_area(
            bounds,
            &filters,
            pagination,
            user.as_ref().map(|u| u.principal()),
        )
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Reviews of an accommodation, newest first
///
/// GET /api/v1/accommodations/{id}/reviews
#[instrument(skip(reviews))]
pub async fn list_reviews(
    reviews: web::Data<ReviewService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let list = reviews.list(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(list)))
}

/// Review an accommodation the caller has booked
///
/// POST /api/v1/accommodations/{id}/reviews
#[instrument(skip(reviews, user, req), fields(user_id = %user.id))]
pub async fn create_review(
    reviews: web::Data<ReviewService>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
    req: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    validated(&req.0, "Review creation")?;

    let req = req.into_inner();
    let review = reviews
        .create(path.into_inner(), req.rating, req.comment, &user)
        .await?;

    info!(review_id = %review.id, "Review created");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        review,
        "Review created successfully",
    )))
}

/// Update one's own review
///
/// PUT /api/v1/accommodations/{id}/reviews/{review_id}
#[instrument(skip(reviews, user, req))]
pub async fn update_review(
    reviews: web::Data<ReviewService>,
    path: web::Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
    req: web::Json<UpdateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    validated(&req.0, "Review update")?;

    let (accommodation_id, review_id) = path.into_inner();
    let review = reviews
        .update(accommodation_id, review_id, req.into_inner().into(), &user)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        review,
        "Review updated successfully",
    )))
}

/// Delete a review (author or admin)
///
/// DELETE /api/v1/accommodations/{id}/reviews/{review_id}
#[instrument(skip(reviews, user))]
pub async fn delete_review(
    reviews: web::Data<ReviewService>,
    path: web::Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (accommodation_id, review_id) = path.into_inner();
    reviews.delete(accommodation_id, review_id, &user).await?;

    info!(review_id = %review_id, "Review deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Configure accommodation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accommodations")
            .route("", web::get().to(list_accommodations))
            .route("/popular", web::get().to(popular_accommodations))
            .route("/near-me", web::get().to(near_me))
            .route("/in-area", web::get().to(in_area))
            .route("/{id}", web::get().to(get_accommodation))
            .route("/{id}/reviews", web::get().to(list_reviews))
            .route("/{id}/reviews", web::post().to(create_review))
            .route("/{id}/reviews/{review_id}", web::put().to(update_review))
            .route("/{id}/reviews/{review_id}", web::delete().to(delete_review)),
    );
}
