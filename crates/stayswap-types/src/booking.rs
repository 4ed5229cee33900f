//! Booking types — the reservable asset being swapped.
//!
//! A booking exists independently of any proposal. Its status is mutated
//! only through the lock manager's conditional updates and by swap
//! completion:
//!
//! ```text
//!   ┌───────────┐   lock    ┌────────┐  complete  ┌─────────┐
//!   │ AVAILABLE ├──────────▶│ LOCKED ├───────────▶│ SWAPPED │
//!   └───────────┘◀──────────┴────────┘            └─────────┘
//!                  unlock
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BookingId, UserId};

/// Lifecycle status of a booking.
///
/// `Swapped` is terminal: a booking that has changed hands through a
/// completed swap never re-enters the pool under the same row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Open for browsing and proposals.
    Available,
    /// Held by exactly one in-flight proposal.
    Locked,
    /// A swap completed; ownership has been transferred.
    Swapped,
}

impl BookingStatus {
    /// Can this booking transition to the given target status?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Available, Self::Locked)
                | (Self::Locked, Self::Available | Self::Swapped)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "AVAILABLE"),
            Self::Locked => write!(f, "LOCKED"),
            Self::Swapped => write!(f, "SWAPPED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Accommodation
// ---------------------------------------------------------------------------

/// Accommodation category, normalized from free-form listing input.
///
/// [`Accommodation::parse`] never fails: unrecognized input maps to
/// [`Accommodation::Other`], and common aliases ("B&B", "condo", "lodge")
/// fold into their canonical category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accommodation {
    Hotel,
    Resort,
    Apartment,
    Villa,
    Cabin,
    Guesthouse,
    Hostel,
    Other,
}

/// Coarse grouping used by compatibility scoring: categories in the same
/// cluster swap more naturally than categories across clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccommodationCluster {
    /// Full-service stays: hotel, resort.
    Serviced,
    /// Self-catered units: apartment, villa, cabin.
    SelfCatered,
    /// Budget / shared stays: guesthouse, hostel.
    Budget,
    /// Unrecognized category.
    Unknown,
}

impl Accommodation {
    /// Normalize a free-form category string. Never errors.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "hotel" | "boutique hotel" | "motel" => Self::Hotel,
            "resort" | "all-inclusive" => Self::Resort,
            "apartment" | "flat" | "condo" | "studio" => Self::Apartment,
            "villa" | "house" | "home" | "cottage" => Self::Villa,
            "cabin" | "lodge" | "chalet" => Self::Cabin,
            "guesthouse" | "guest house" | "b&b" | "bnb" | "bed and breakfast" => Self::Guesthouse,
            "hostel" | "dorm" => Self::Hostel,
            _ => Self::Other,
        }
    }

    /// The cluster this category belongs to.
    #[must_use]
    pub fn cluster(&self) -> AccommodationCluster {
        match self {
            Self::Hotel | Self::Resort => AccommodationCluster::Serviced,
            Self::Apartment | Self::Villa | Self::Cabin => AccommodationCluster::SelfCatered,
            Self::Guesthouse | Self::Hostel => AccommodationCluster::Budget,
            Self::Other => AccommodationCluster::Unknown,
        }
    }
}

impl std::fmt::Display for Accommodation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hotel => write!(f, "HOTEL"),
            Self::Resort => write!(f, "RESORT"),
            Self::Apartment => write!(f, "APARTMENT"),
            Self::Villa => write!(f, "VILLA"),
            Self::Cabin => write!(f, "CABIN"),
            Self::Guesthouse => write!(f, "GUESTHOUSE"),
            Self::Hostel => write!(f, "HOSTEL"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

/// The stay window of a booking: check-in (inclusive) to check-out
/// (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether the range is well-formed (at least one night).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Number of nights. Zero for malformed ranges.
    #[must_use]
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    /// Whether two stay windows share at least one night.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

/// A reservable asset eligible for swapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    /// Current owner. Updated on swap completion; every derived-owner
    /// lookup reads this field rather than any copy on a proposal row.
    pub owner: UserId,
    /// Free-form "City, Country" location string.
    pub location: String,
    /// Stay window.
    pub stay: DateRange,
    /// Total monetary value of the booking.
    pub value: Decimal,
    pub accommodation: Accommodation,
    /// Number of guests the booking covers.
    pub guests: u32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Whether the booking appears in open-browse results.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == BookingStatus::Available
    }

    /// Whether the booking is still listed for negotiation. A locked
    /// booking stays listed (its pending proposal may yet fall through);
    /// only a swapped booking is gone for good.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        self.status != BookingStatus::Swapped
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Booking {
    /// Create a dummy available booking for unit tests.
    #[must_use]
    pub fn dummy(owner: UserId, location: &str, value: Decimal) -> Self {
        let start = NaiveDate::from_ymd_opt(2026, 7, 1).expect("valid date");
        let end = NaiveDate::from_ymd_opt(2026, 7, 8).expect("valid date");
        Self {
            id: BookingId::new(),
            owner,
            location: location.to_string(),
            stay: DateRange::new(start, end),
            value,
            accommodation: Accommodation::Hotel,
            guests: 2,
            status: BookingStatus::Available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Dummy booking with an explicit stay window.
    #[must_use]
    pub fn dummy_with_stay(owner: UserId, location: &str, value: Decimal, stay: DateRange) -> Self {
        let mut booking = Self::dummy(owner, location, value);
        booking.stay = stay;
        booking
    }
}
