//! Availability checker
//!
//! A room is available for `[check_in, check_out)` when none of its active
//! bookings overlaps that interval. The check reads storage and is not atomic
//! with the insert that follows it; the booking table's overlap constraint
//! and the confirmation-time rescan close that window.

use std::sync::Arc;

use stayhub_core::{
    models::{Booking, BookingConflict, BookingStatus, StayDates},
    traits::BookingRepository,
    AppResult,
};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Active bookings among `existing` that overlap `dates`
pub fn find_conflicts<'a>(
    existing: impl IntoIterator<Item = &'a Booking>,
    dates: &StayDates,
) -> Vec<BookingConflict> {
    existing
        .into_iter()
        .filter(|b| b.booking_status.is_active() && dates.overlaps(b.check_in, b.check_out))
        .map(BookingConflict::from)
        .collect()
}

/// Result of an availability check
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    pub available: bool,
    pub conflicts: Vec<BookingConflict>,
}

pub struct AvailabilityChecker {
    bookings: Arc<dyn BookingRepository>,
}

impl AvailabilityChecker {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Check a room against its pending and confirmed bookings
    ///
    /// `exclude` skips one booking, so a booking can be checked against the
    /// others on its own room.
    #[instrument(skip(self))]
    pub async fn check(
        &self,
        accommodation_id: Uuid,
        room_index: i32,
        dates: &StayDates,
        exclude: Option<Uuid>,
    ) -> AppResult<Availability> {
        let existing = self
            .overlapping(
                accommodation_id,
                room_index,
                dates,
                &BookingStatus::ACTIVE,
                exclude,
            )
            .await?;
        let conflicts = find_conflicts(&existing, dates);

        debug!(
            "Room {}#{} {}..{}: {} conflict(s)",
            accommodation_id,
            room_index,
            dates.check_in(),
            dates.check_out(),
            conflicts.len()
        );

        Ok(Availability {
            available: conflicts.is_empty(),
            conflicts,
        })
    }

    /// Confirmed bookings on the room overlapping `dates`
    ///
    /// This is the authoritative rescan run when a payment clears.
    #[instrument(skip(self))]
    pub async fn check_confirmed_only(
        &self,
        accommodation_id: Uuid,
        room_index: i32,
        dates: &StayDates,
        exclude: Option<Uuid>,
    ) -> AppResult<Vec<Booking>> {
        self.overlapping(
            accommodation_id,
            room_index,
            dates,
            &[BookingStatus::Confirmed],
            exclude,
        )
        .await
    }

    async fn overlapping(
        &self,
        accommodation_id: Uuid,
        room_index: i32,
        dates: &StayDates,
        statuses: &[BookingStatus],
        exclude: Option<Uuid>,
    ) -> AppResult<Vec<Booking>> {
        Ok(self
            .bookings
            .find_for_room(accommodation_id, room_index, statuses)
            .await?
            .into_iter()
            .filter(|b| Some(b.id) != exclude)
            .filter(|b| dates.overlaps(b.check_in, b.check_out))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use stayhub_core::models::BookingPatch;
    use stayhub_db::MemoryStore;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn stay(a: u32, b: u32) -> StayDates {
        StayDates::new(date(a), date(b)).unwrap()
    }

    fn booking(acc: Uuid, room: i32, a: u32, b: u32) -> Booking {
        Booking::new(acc, room, Uuid::new_v4(), stay(a, b), 1, dec!(100), None)
    }

    #[test]
    fn test_find_conflicts_half_open() {
        let held = booking(Uuid::new_v4(), 0, 10, 15);
        let existing = vec![held.clone()];

        let conflicts = find_conflicts(&existing, &stay(12, 20));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].booking_id, held.id);

        assert!(find_conflicts(&existing, &stay(15, 20)).is_empty());
        assert!(find_conflicts(&existing, &stay(5, 10)).is_empty());
        assert_eq!(find_conflicts(&existing, &stay(10, 15)).len(), 1);
        assert_eq!(find_conflicts(&existing, &stay(11, 12)).len(), 1);
    }

    #[test]
    fn test_find_conflicts_ignores_inactive() {
        let mut cancelled = booking(Uuid::new_v4(), 0, 10, 15);
        BookingPatch::status(BookingStatus::Cancelled).apply_to(&mut cancelled);
        assert!(find_conflicts(&[cancelled], &stay(10, 15)).is_empty());
    }

    #[tokio::test]
    async fn test_check_scopes_to_room_and_excludes() {
        let store = Arc::new(MemoryStore::new());
        let acc = Uuid::new_v4();
        let held = booking(acc, 0, 10, 15);
        store.insert_booking(held.clone());
        store.insert_booking(booking(acc, 1, 10, 15));

        let checker = AvailabilityChecker::new(store.clone());

        let result = checker.check(acc, 0, &stay(12, 20), None).await.unwrap();
        assert!(!result.available);
        assert_eq!(result.conflicts.len(), 1);

        let result = checker.check(acc, 2, &stay(12, 20), None).await.unwrap();
        assert!(result.available);

        let result = checker
            .check(acc, 0, &stay(12, 20), Some(held.id))
            .await
            .unwrap();
        assert!(result.available);
    }

    #[tokio::test]
    async fn test_confirmed_only_skips_pending() {
        let store = Arc::new(MemoryStore::new());
        let acc = Uuid::new_v4();
        store.insert_booking(booking(acc, 0, 10, 15));

        let mut confirmed = booking(acc, 0, 12, 14);
        BookingPatch::status(BookingStatus::Confirmed).apply_to(&mut confirmed);
        store.insert_booking(confirmed.clone());

        let checker = AvailabilityChecker::new(store);
        let found = checker
            .check_confirmed_only(acc, 0, &stay(10, 20), None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, confirmed.id);
    }
}
