// Simulated payment: record the payment, confirm the booking, then ask the
// backend to generate the receipt.

use crate::domain::{
    BookingStatus, NewPayment, PaymentMethod, PaymentStatus, BOOKINGS_TABLE, PAYMENTS_TABLE,
};
use crate::store::{row_id, SelectQuery, StoreError, TableStore};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

pub const RECEIPT_FUNCTION: &str = "generate_receipt";

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Remote operation failed: {0}")]
    Remote(#[from] StoreError),

    #[error("Booking {0} not found")]
    UnknownBooking(String),

    #[error("Receipt generation failed for payment {payment_id}: {source}")]
    Receipt {
        payment_id: String,
        source: StoreError,
    },
}

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment_id: String,
    pub booking_id: String,
    pub receipt: Value,
}

/// Take payment for a pending booking. The payment itself is simulated, so
/// the row is written directly in completed status; the booking flips to
/// confirmed before the receipt hook runs.
pub async fn process_payment(
    store: &dyn TableStore,
    booking_id: &str,
    method: PaymentMethod,
    amount: f64,
) -> Result<PaymentReceipt, PaymentError> {
    let existing = store
        .select(BOOKINGS_TABLE, SelectQuery::new().eq("id", booking_id))
        .await?;
    if existing.is_empty() {
        return Err(PaymentError::UnknownBooking(booking_id.to_string()));
    }

    let new_payment = NewPayment {
        booking_id: booking_id.to_string(),
        method,
        amount,
        status: PaymentStatus::Completed,
    };
    let row = serde_json::to_value(&new_payment).map_err(|e| StoreError::Decode(e.to_string()))?;
    let created = store.insert(PAYMENTS_TABLE, row).await?;
    let payment_id = row_id(&created).map_err(PaymentError::Remote)?;

    store
        .update(
            BOOKINGS_TABLE,
            SelectQuery::new().eq("id", booking_id),
            json!({ "status": BookingStatus::Confirmed.as_str() }),
        )
        .await?;

    info!(booking_id, %payment_id, method = method.as_str(), "payment recorded");

    match store
        .invoke(RECEIPT_FUNCTION, json!({ "payment_id": payment_id }))
        .await
    {
        Ok(receipt) => Ok(PaymentReceipt {
            payment_id,
            booking_id: booking_id.to_string(),
            receipt,
        }),
        Err(err) => {
            // The booking is already confirmed at this point; only the
            // receipt is missing.
            warn!(%payment_id, "receipt generation failed");
            Err(PaymentError::Receipt {
                payment_id,
                source: err,
            })
        }
    }
}
