// Booking submission: validate the draft, price the stay, write the booking
// and its service links, then hand off to the payment step.

use crate::catalog::resolve_services;
use crate::domain::{
    BookingDraft, BookingStatus, NewBooking, NewBookingServiceLink, Room, BOOKINGS_TABLE,
    BOOKING_SERVICES_TABLE,
};
use crate::pricing::reservation_total;
use crate::store::{row_id, StoreError, TableStore};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

/// Input problem the guest can correct. Names the first offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Remote operation failed: {0}")]
    Remote(#[from] StoreError),
}

/// Handed to the payment step once the booking rows exist.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentHandoff {
    pub booking_id: String,
    pub total_amount: f64,
}

/// Structural validation of the draft. Returns the stay dates so the caller
/// never has to re-unwrap them.
pub fn validate_draft(draft: &BookingDraft) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let check_in = draft
        .check_in
        .ok_or_else(|| ValidationError::new("check_in", "check-in date is required"))?;
    let check_out = draft
        .check_out
        .ok_or_else(|| ValidationError::new("check_out", "check-out date is required"))?;

    if check_out <= check_in {
        return Err(ValidationError::new(
            "check_out",
            "check-out must be after check-in",
        ));
    }

    if draft.guests < 1 {
        return Err(ValidationError::new("guests", "at least one guest is required"));
    }

    Ok((check_in, check_out))
}

/// Submit a validated draft for the given room on behalf of `user_id`.
///
/// Writes one booking row in pending status, then one service link per
/// selected service. The writes are sequential and not transactional: a link
/// insert failing after the booking insert leaves the booking in place with
/// fewer links than selected.
pub async fn submit_booking(
    store: &dyn TableStore,
    draft: &BookingDraft,
    room: &Room,
    user_id: &str,
) -> Result<PaymentHandoff, BookingError> {
    let (check_in, check_out) = validate_draft(draft)?;

    let services = resolve_services(store, &draft.service_ids).await?;
    let service_prices: Vec<f64> = services.iter().map(|s| s.price).collect();
    let total_amount = reservation_total(
        room.price_per_night,
        Some(check_in),
        Some(check_out),
        &service_prices,
    );

    let new_booking = NewBooking {
        room_id: room.id.clone(),
        user_id: user_id.to_string(),
        check_in,
        check_out,
        guests: draft.guests,
        total_amount,
        status: BookingStatus::Pending,
        note: draft.note.clone(),
    };
    let row = serde_json::to_value(&new_booking).map_err(|e| StoreError::Decode(e.to_string()))?;
    let created = store.insert(BOOKINGS_TABLE, row).await?;
    let booking_id = row_id(&created)?;

    info!(%booking_id, total_amount, "booking created");

    for service in &services {
        let link = NewBookingServiceLink {
            booking_id: booking_id.clone(),
            service_id: service.id.clone(),
            quantity: 1,
        };
        let row = serde_json::to_value(&link).map_err(|e| StoreError::Decode(e.to_string()))?;

        if let Err(err) = store.insert(BOOKING_SERVICES_TABLE, row).await {
            // No compensating rollback: the booking row stays behind with
            // fewer links than the guest selected.
            warn!(
                %booking_id,
                service_id = service.id.as_str(),
                "service link insert failed, booking left without remaining links"
            );
            return Err(err.into());
        }
    }

    Ok(PaymentHandoff {
        booking_id,
        total_amount,
    })
}
