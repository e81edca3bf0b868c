// Core library for the hotel booking application

pub mod booking;
pub mod cache;
pub mod catalog;
pub mod domain;
pub mod payment;
pub mod pricing;
pub mod store;

// Re-export key types for convenience
pub use booking::{submit_booking, validate_draft, BookingError, PaymentHandoff, ValidationError};
pub use cache::{CacheConfig, CacheStatsReport, ReferenceCache};
pub use catalog::{
    fetch_profile, get_room, list_active_services, list_available_rooms, resolve_services,
    update_profile, CatalogCache,
};
pub use domain::{
    AdditionalService, Booking, BookingDraft, BookingServiceLink, BookingStatus, NewBooking,
    NewBookingServiceLink, NewPayment, Payment, PaymentMethod, PaymentStatus, ProfileUpdate, Room,
    RoomStatus, RoomType, UserProfile, UserRole,
};
pub use payment::{process_payment, PaymentError, PaymentReceipt};
pub use pricing::{nights_between, reservation_total};
pub use store::{
    Filter, RestTableStore, SelectQuery, SortDirection, StoreConfig, StoreError, TableStore,
};
