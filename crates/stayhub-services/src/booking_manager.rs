//! Booking lifecycle manager
//!
//! Owns the booking state machine:
//! - Create bookings in (pending, pending) after availability and pricing
//! - Guest updates and cancellation
//! - Completion of a confirmed stay (admin)
//! - Confirmation once a payment clears, with the overlap rescan that
//!   auto-cancels the later of two colliding confirmations
//!
//! Every status change is a compare-and-set through
//! [`BookingRepository::apply`]. When the guard fails the booking is re-read
//! and the caller gets the status that was actually observed.

use std::sync::Arc;

use chrono::NaiveDate;
use stayhub_core::{
    models::{
        Accommodation, Booking, BookingGuard, BookingPatch, BookingStatus, Payment,
        PaymentStatus, Principal, StayDates, UserProfile,
    },
    traits::{
        AccommodationRepository, BookingRepository, Notifier, PaginatedResponse, Pagination,
        PaginationMeta, UserRepository,
    },
    AppError, AppResult,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::availability::AvailabilityChecker;
use crate::pricing::price_stay;

/// Booking request from a guest
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub accommodation_id: Uuid,
    pub room_index: i32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i32,
    pub special_requests: Option<String>,
}

/// Guest-editable booking fields
#[derive(Debug, Clone, Default)]
pub struct BookingUpdate {
    /// New special requests; `None` clears them
    pub special_requests: Option<String>,
}

/// Admin listing filter
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub accommodation_id: Option<Uuid>,
}

/// Notification kinds dispatched for a booking
#[derive(Debug, Clone, Copy)]
pub(crate) enum Notice<'a> {
    Created,
    Receipt(&'a Payment),
    AutoCancelled,
    Reminder,
}

/// Booking lifecycle manager
pub struct BookingManager {
    accommodations: Arc<dyn AccommodationRepository>,
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserRepository>,
    availability: AvailabilityChecker,
    notifier: Arc<dyn Notifier>,
}

impl BookingManager {
    /// Create a new booking manager
    pub fn new(
        accommodations: Arc<dyn AccommodationRepository>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            availability: AvailabilityChecker::new(bookings.clone()),
            accommodations,
            bookings,
            users,
            notifier,
        }
    }

    /// Create a booking in state (pending, pending)
    ///
    /// # Errors
    ///
    /// - `InvalidDateRange` if check-out is not after check-in
    /// - `NotFound` if the accommodation or room does not exist
    /// - `RoomUnavailable` if the accommodation is inactive or the room is closed
    /// - `Validation` if the guest count does not fit the room
    /// - `DateConflict` if an active booking overlaps the stay
    #[instrument(skip(self, request, principal), fields(user_id = %principal.id))]
    pub async fn create(&self, request: CreateBooking, principal: &Principal) -> AppResult<Booking> {
        let dates = StayDates::new(request.check_in, request.check_out)?;

        let accommodation = self
            .accommodations
            .find_by_id(request.accommodation_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Accommodation {}", request.accommodation_id))
            })?;

        if !accommodation.is_active {
            warn!("Booking attempt on inactive accommodation {}", accommodation.id);
            return Err(AppError::RoomUnavailable(format!(
                "{} is not accepting bookings",
                accommodation.name
            )));
        }

        let room = accommodation.room(request.room_index).ok_or_else(|| {
            AppError::NotFound(format!(
                "Room {} in accommodation {}",
                request.room_index, accommodation.id
            ))
        })?;

        if !room.is_available {
            return Err(AppError::RoomUnavailable(format!(
                "{} is not available",
                room.name
            )));
        }

        if request.guests < 1 || request.guests > room.capacity {
            return Err(AppError::Validation(format!(
                "{} guest(s) requested, room {} holds 1 to {}",
                request.guests, room.name, room.capacity
            )));
        }

        let availability = self
            .availability
            .check(accommodation.id, request.room_index, &dates, None)
            .await?;
        if !availability.available {
            warn!(
                "Booking rejected: {} conflict(s) on {}#{}",
                availability.conflicts.len(),
                accommodation.id,
                request.room_index
            );
            return Err(AppError::DateConflict {
                conflicts: availability.conflicts,
            });
        }

        let total_price = price_stay(room.price_per_night, &dates)?;

        let booking = Booking::new(
            accommodation.id,
            request.room_index,
            principal.id,
            dates,
            request.guests,
            total_price,
            request.special_requests,
        );

        let booking = match self.bookings.create(&booking).await {
            Ok(created) => created,
            // Lost the race to a concurrent insert; report what holds the room now
            Err(AppError::DateConflict { conflicts }) if conflicts.is_empty() => {
                let rescan = self
                    .availability
                    .check(accommodation.id, request.room_index, &dates, None)
                    .await?;
                return Err(AppError::DateConflict {
                    conflicts: rescan.conflicts,
                });
            }
            Err(e) => return Err(e),
        };

        info!(
            "Booking {} created for {} nights at {}: {}",
            booking.id,
            dates.nights(),
            accommodation.name,
            booking.total_price
        );

        if let Err(e) = self
            .accommodations
            .increment_total_bookings(accommodation.id, 1)
            .await
        {
            warn!(
                "Failed to increment total_bookings for {}: {}",
                accommodation.id, e
            );
        }

        self.dispatch(&booking, Notice::Created).await;

        Ok(booking)
    }

    /// Fetch a booking visible to the principal
    ///
    /// Bookings of other users are reported as `NotFound`.
    #[instrument(skip(self, principal))]
    pub async fn get(&self, booking_id: Uuid, principal: &Principal) -> AppResult<Booking> {
        match self.bookings.find_by_id(booking_id).await? {
            Some(booking) if principal.can_access(booking.user_id) => Ok(booking),
            _ => Err(AppError::NotFound(format!("Booking {}", booking_id))),
        }
    }

    /// Bookings of the calling user, newest first
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn list_for_user(
        &self,
        principal: &Principal,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        self.bookings.list_by_user(principal.id, status).await
    }

    /// All bookings, for administrators
    #[instrument(skip(self, principal))]
    pub async fn list_all(
        &self,
        principal: &Principal,
        filter: BookingFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Booking>> {
        if !principal.is_admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        let (data, total) = self
            .bookings
            .list_filtered(
                filter.status,
                filter.accommodation_id,
                pagination.limit(),
                pagination.offset(),
            )
            .await?;

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(total, pagination.page, pagination.per_page),
        })
    }

    /// Update the guest-editable fields of an active booking
    #[instrument(skip(self, update, principal))]
    pub async fn update(
        &self,
        booking_id: Uuid,
        update: BookingUpdate,
        principal: &Principal,
    ) -> AppResult<Booking> {
        let booking = self.load_owned(booking_id, principal).await?;

        if booking.booking_status.is_terminal() {
            return Err(AppError::InvalidTransition {
                from: booking.booking_status,
                action: "update",
            });
        }

        let patch = BookingPatch {
            special_requests: Some(update.special_requests),
            ..BookingPatch::default()
        };

        match self
            .bookings
            .apply(booking_id, &BookingGuard::status_in(&BookingStatus::ACTIVE), &patch)
            .await?
        {
            Some(updated) => {
                debug!("Booking {} updated", booking_id);
                Ok(updated)
            }
            None => Err(self.transition_failed(booking_id, "update").await),
        }
    }

    /// Cancel an active booking, regardless of its payment status
    #[instrument(skip(self, principal))]
    pub async fn cancel(&self, booking_id: Uuid, principal: &Principal) -> AppResult<Booking> {
        let booking = self.load_owned(booking_id, principal).await?;

        if !booking
            .booking_status
            .can_transition_to(BookingStatus::Cancelled)
        {
            return Err(AppError::InvalidTransition {
                from: booking.booking_status,
                action: "cancel",
            });
        }

        match self
            .bookings
            .apply(
                booking_id,
                &BookingGuard::status_in(&BookingStatus::ACTIVE),
                &BookingPatch::status(BookingStatus::Cancelled),
            )
            .await?
        {
            Some(cancelled) => {
                info!(
                    "Booking {} cancelled (payment {})",
                    booking_id, cancelled.payment_status
                );
                Ok(cancelled)
            }
            None => Err(self.transition_failed(booking_id, "cancel").await),
        }
    }

    /// Mark a confirmed stay as completed
    #[instrument(skip(self, principal))]
    pub async fn complete(&self, booking_id: Uuid, principal: &Principal) -> AppResult<Booking> {
        if !principal.is_admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", booking_id)))?;

        if !booking
            .booking_status
            .can_transition_to(BookingStatus::Completed)
        {
            return Err(AppError::InvalidTransition {
                from: booking.booking_status,
                action: "complete",
            });
        }

        match self
            .bookings
            .apply(
                booking_id,
                &BookingGuard::status_in(&[BookingStatus::Confirmed]),
                &BookingPatch::status(BookingStatus::Completed),
            )
            .await?
        {
            Some(completed) => {
                info!("Booking {} completed", booking_id);
                Ok(completed)
            }
            None => Err(self.transition_failed(booking_id, "complete").await),
        }
    }

    /// Record a cleared payment on a booking and confirm it if it still can be
    ///
    /// Cancelled bookings stay cancelled. A pending booking whose room is
    /// already held by a confirmed overlapping booking is auto-cancelled, as
    /// is a freshly confirmed booking that a rescan shows was created after
    /// another confirmed overlapping one. Returns the booking's final state.
    #[instrument(skip(self))]
    pub async fn confirm_paid(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.apply_payment(booking_id).await.map(|(booking, _)| booking)
    }

    /// Same as [`confirm_paid`](Self::confirm_paid), also reporting whether
    /// this call moved the booking from pending to confirmed
    pub(crate) async fn apply_payment(&self, booking_id: Uuid) -> AppResult<(Booking, bool)> {
        let not_paid = BookingGuard::any().with_payment_in(&[
            PaymentStatus::Pending,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ]);

        let booking = match self
            .bookings
            .apply(booking_id, &not_paid, &BookingPatch::payment(PaymentStatus::Paid))
            .await?
        {
            Some(booking) => booking,
            None => self.reload(booking_id).await?,
        };

        if booking.booking_status != BookingStatus::Pending {
            debug!(
                "Booking {} is {}; payment recorded without confirmation",
                booking_id, booking.booking_status
            );
            return Ok((booking, false));
        }

        let dates = booking.dates()?;

        let held = self
            .availability
            .check_confirmed_only(
                booking.accommodation_id,
                booking.room_index,
                &dates,
                Some(booking.id),
            )
            .await?;
        if !held.is_empty() {
            let cancelled = self.auto_cancel(&booking, BookingStatus::Pending, &held).await?;
            return Ok((cancelled, false));
        }

        let confirmed = match self
            .bookings
            .apply(
                booking_id,
                &BookingGuard::status_in(&[BookingStatus::Pending]),
                &BookingPatch::status(BookingStatus::Confirmed),
            )
            .await?
        {
            Some(confirmed) => confirmed,
            None => return Ok((self.reload(booking_id).await?, false)),
        };

        info!("Booking {} confirmed", booking_id);

        // Two overlapping bookings may have confirmed at the same moment;
        // the one created later gives way
        let rivals = self
            .availability
            .check_confirmed_only(
                confirmed.accommodation_id,
                confirmed.room_index,
                &dates,
                Some(confirmed.id),
            )
            .await?;
        let earlier: Vec<Booking> = rivals
            .into_iter()
            .filter(|rival| rival.precedence() < confirmed.precedence())
            .collect();
        if !earlier.is_empty() {
            let cancelled = self
                .auto_cancel(&confirmed, BookingStatus::Confirmed, &earlier)
                .await?;
            return Ok((cancelled, true));
        }

        Ok((confirmed, true))
    }

    /// Send a reminder for every confirmed booking checking in on `date`
    ///
    /// Returns the number of reminders delivered.
    #[instrument(skip(self))]
    pub async fn send_reminders(&self, date: NaiveDate) -> AppResult<usize> {
        let due = self
            .bookings
            .list_checking_in(date, BookingStatus::Confirmed)
            .await?;

        let mut sent = 0;
        for booking in &due {
            if self.dispatch(booking, Notice::Reminder).await {
                sent += 1;
            }
        }

        info!("Sent {}/{} check-in reminders for {}", sent, due.len(), date);
        Ok(sent)
    }

    /// Deliver a notification, logging and swallowing any failure
    ///
    /// Returns whether the notifier accepted it.
    pub(crate) async fn dispatch(&self, booking: &Booking, notice: Notice<'_>) -> bool {
        let (accommodation, user) = match self.notification_context(booking).await {
            Some(context) => context,
            None => return false,
        };

        let result = match notice {
            Notice::Created => {
                self.notifier
                    .notify_booking_created(booking, &accommodation, &user)
                    .await
            }
            Notice::Receipt(payment) => {
                self.notifier
                    .notify_payment_receipt(payment, booking, &accommodation, &user)
                    .await
            }
            Notice::AutoCancelled => {
                self.notifier
                    .notify_booking_auto_cancelled(booking, &accommodation, &user)
                    .await
            }
            Notice::Reminder => {
                self.notifier
                    .notify_booking_reminder(booking, &accommodation, &user)
                    .await
            }
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Notification {:?} for booking {} failed: {}",
                    notice, booking.id, e
                );
                false
            }
        }
    }

    async fn notification_context(&self, booking: &Booking) -> Option<(Accommodation, UserProfile)> {
        let accommodation = match self.accommodations.find_by_id(booking.accommodation_id).await {
            Ok(Some(acc)) => acc,
            Ok(None) => {
                warn!(
                    "Accommodation {} missing, skipping notification",
                    booking.accommodation_id
                );
                return None;
            }
            Err(e) => {
                warn!("Failed to load accommodation for notification: {}", e);
                return None;
            }
        };

        let user = match self.users.find_by_id(booking.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("User {} missing, skipping notification", booking.user_id);
                return None;
            }
            Err(e) => {
                warn!("Failed to load user for notification: {}", e);
                return None;
            }
        };

        Some((accommodation, user))
    }

    async fn auto_cancel(
        &self,
        booking: &Booking,
        from: BookingStatus,
        holders: &[Booking],
    ) -> AppResult<Booking> {
        let cancelled = match self
            .bookings
            .apply(
                booking.id,
                &BookingGuard::status_in(&[from]),
                &BookingPatch::status(BookingStatus::Cancelled),
            )
            .await?
        {
            Some(cancelled) => cancelled,
            None => return self.reload(booking.id).await,
        };

        let holder_ids: Vec<Uuid> = holders.iter().map(|b| b.id).collect();
        warn!(
            booking_id = %cancelled.id,
            payment_status = %cancelled.payment_status,
            held_by = ?holder_ids,
            "Paid booking auto-cancelled after double booking; refund required"
        );

        self.dispatch(&cancelled, Notice::AutoCancelled).await;
        Ok(cancelled)
    }

    async fn load_owned(&self, booking_id: Uuid, principal: &Principal) -> AppResult<Booking> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", booking_id)))?;

        if !booking.is_owned_by(principal.id) {
            warn!(
                "User {} attempted to modify booking {} of another user",
                principal.id, booking_id
            );
            return Err(AppError::Forbidden(
                "Booking belongs to another user".to_string(),
            ));
        }

        Ok(booking)
    }

    async fn reload(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {}", booking_id)))
    }

    async fn transition_failed(&self, booking_id: Uuid, action: &'static str) -> AppError {
        match self.reload(booking_id).await {
            Ok(current) => {
                warn!(
                    "Lost race on booking {}: now {}",
                    booking_id, current.booking_status
                );
                AppError::InvalidTransition {
                    from: current.booking_status,
                    action,
                }
            }
            Err(e) => {
                error!("Failed to re-read booking {}: {}", booking_id, e);
                e
            }
        }
    }
}
