//! Booking handlers
//!
//! HTTP handlers for the booking lifecycle: create, read, update, cancel,
//! complete, the admin listing and check-in reminders.

use crate::dto::booking::{
    parse_booking_status, AdminBookingQuery, BookingListQuery, BookingResponse,
    CreateBookingRequest, ReminderQuery, ReminderResponse, UpdateBookingRequest,
};
use crate::dto::common::validated;
use crate::dto::ApiResponse;
use actix_web::{web, HttpResponse};
use stayhub_auth::{AdminUser, AuthenticatedUser};
use stayhub_core::models::StayDates;
use stayhub_core::traits::PaginatedResponse;
use stayhub_core::AppError;
use stayhub_services::BookingManager;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Create a booking
///
/// POST /api/v1/bookings
#[instrument(skip(manager, user, req), fields(user_id = %user.id))]
pub async fn create_booking(
    manager: web::Data<BookingManager>,
    user: AuthenticatedUser,
    req: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, AppError> {
    // Date order is reported ahead of field validation
    StayDates::new(req.check_in, req.check_out)?;
    validated(&req.0, "Booking creation")?;

    let booking = manager.create(req.into_inner().into(), &user).await?;

    info!(booking_id = %booking.id, "Booking created");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        BookingResponse::from(booking),
        "Booking created successfully",
    )))
}

/// List the caller's bookings
///
/// GET /api/v1/bookings
#[instrument(skip(manager, user), fields(user_id = %user.id))]
pub async fn list_my_bookings(
    manager: web::Data<BookingManager>,
    user: AuthenticatedUser,
    query: web::Query<BookingListQuery>,
) -> Result<HttpResponse, AppError> {
    let status = parse_booking_status(query.status.as_deref())?;

    let bookings = manager.list_for_user(&user, status).await?;
    debug!(count = bookings.len(), "Listed user bookings");

    let data: Vec<BookingResponse> = bookings.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// Get a single booking
///
/// GET /api/v1/bookings/{id}
#[instrument(skip(manager, user))]
pub async fn get_booking(
    manager: web::Data<BookingManager>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let booking = manager.get(path.into_inner(), &user).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(BookingResponse::from(booking))))
}

/// Update the guest-editable fields of a booking
///
/// PUT /api/v1/bookings/{id}
#[instrument(skip(manager, user, req))]
pub async fn update_booking(
    manager: web::Data<BookingManager>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
    req: web::Json<UpdateBookingRequest>,
) -> Result<HttpResponse, AppError> {
    validated(&req.0, "Booking update")?;

    let booking = manager
        .update(path.into_inner(), req.into_inner().into(), &user)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        BookingResponse::from(booking),
        "Booking updated successfully",
    )))
}

/// Cancel a booking
///
/// POST /api/v1/bookings/{id}/cancel
#[instrument(skip(manager, user))]
pub async fn cancel_booking(
    manager: web::Data<BookingManager>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let booking = manager.cancel(path.into_inner(), &user).await?;

    info!(booking_id = %booking.id, "Booking cancelled");

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        BookingResponse::from(booking),
        "Booking cancelled successfully",
    )))
}

/// Mark a confirmed booking as completed (admin only)
///
/// POST /api/v1/bookings/{id}/complete
#[instrument(skip(manager, admin))]
pub async fn complete_booking(
    manager: web::Data<BookingManager>,
    path: web::Path<Uuid>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let booking = manager.complete(path.into_inner(), &admin).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        BookingResponse::from(booking),
        "Booking completed",
    )))
}

/// List every booking with filters (admin only)
///
/// GET /api/v1/admin/bookings
#[instrument(skip(manager, admin))]
pub async fn list_all_bookings(
    manager: web::Data<BookingManager>,
    query: web::Query<AdminBookingQuery>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let pagination = query.pagination.to_pagination()?;
    let filter = query.filter()?;

    let page = manager.list_all(&admin, filter, pagination).await?;

    let response = PaginatedResponse {
        data: page
            .data
            .into_iter()
            .map(BookingResponse::from)
            .collect::<Vec<_>>(),
        pagination: page.pagination,
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Send check-in reminders for confirmed bookings (admin only)
///
/// POST /api/v1/admin/bookings/reminders?date=YYYY-MM-DD
#[instrument(skip(manager, _admin))]
pub async fn send_reminders(
    manager: web::Data<BookingManager>,
    query: web::Query<ReminderQuery>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let sent = manager.send_reminders(query.date).await?;

    info!(date = %query.date, sent, "Check-in reminders dispatched");

    Ok(HttpResponse::Ok().json(ApiResponse::success(ReminderResponse {
        date: query.date,
        sent,
    })))
}

/// Configure booking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bookings")
            .route("", web::post().to(create_booking))
            .route("", web::get().to(list_my_bookings))
            .route("/{id}", web::get().to(get_booking))
            .route("/{id}", web::put().to(update_booking))
            .route("/{id}/cancel", web::post().to(cancel_booking))
            .route("/{id}/complete", web::post().to(complete_booking)),
    )
    .service(
        web::scope("/admin/bookings")
            .route("", web::get().to(list_all_bookings))
            .route("/reminders", web::post().to(send_reminders)),
    );
}
