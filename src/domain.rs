use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// Table names in the remote store
pub const ROOMS_TABLE: &str = "rooms";
pub const SERVICES_TABLE: &str = "additional_services";
pub const BOOKINGS_TABLE: &str = "bookings";
pub const BOOKING_SERVICES_TABLE: &str = "booking_services";
pub const PAYMENTS_TABLE: &str = "payments";
pub const PROFILES_TABLE: &str = "profiles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            "completed" => BookingStatus::Completed,
            _ => BookingStatus::Pending,
        }
    }
}

/// The six payment methods accepted at the front desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Yape,
    Plin,
    Transfer,
    Deposit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Yape => "yape",
            PaymentMethod::Plin => "plin",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Deposit => "deposit",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "card" => PaymentMethod::Card,
            "yape" => PaymentMethod::Yape,
            "plin" => PaymentMethod::Plin,
            "transfer" => PaymentMethod::Transfer,
            "deposit" => PaymentMethod::Deposit,
            _ => PaymentMethod::Cash,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "available" => RoomStatus::Available,
            "occupied" => RoomStatus::Occupied,
            _ => RoomStatus::Maintenance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Single,
    Double,
    Suite,
    Presidential,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Single => "single",
            RoomType::Double => "double",
            RoomType::Suite => "suite",
            RoomType::Presidential => "presidential",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Receptionist,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Receptionist => "receptionist",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "receptionist" => UserRole::Receptionist,
            "admin" => UserRole::Admin,
            _ => UserRole::Client,
        }
    }

    /// Post-login landing route for this role.
    pub fn landing_path(&self) -> &'static str {
        match self {
            UserRole::Client => "/rooms",
            UserRole::Receptionist => "/desk",
            UserRole::Admin => "/admin",
        }
    }
}

// Row models for the remote tables

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Room {
    pub id: String,
    pub room_number: String,
    pub room_type: RoomType,
    pub status: RoomStatus,
    pub price_per_night: f64,
    pub capacity: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdditionalService {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Booking {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_amount: f64,
    pub status: BookingStatus,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub room_id: String,
    pub user_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub note: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookingServiceLink {
    pub id: String,
    pub booking_id: String,
    pub service_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBookingServiceLink {
    pub booking_id: String,
    pub service_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub method: PaymentMethod,
    pub amount: f64,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPayment {
    pub booking_id: String,
    pub method: PaymentMethod,
    pub amount: f64,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: UserRole,
}

/// Patch payload for profile updates. Fields left as `None` are not sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Reservation form state as entered by the guest, held until submission.
#[derive(Debug, Clone, Default)]
pub struct BookingDraft {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guests: u32,
    pub service_ids: BTreeSet<String>,
    pub note: String,
}
