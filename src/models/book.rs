//! Book (catalog entry) model and availability slots.
//!
//! Each catalog entry carries two lendable copy slots, modeled as the
//! independent flags `status` and `copy_status`. The slot order is a fixed
//! rule of the loan ledger: loans consume the primary flag first, returns
//! release the copy flag first.

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

/// Availability of a single copy slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Taken,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Taken => "taken",
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(Availability::Available),
            "taken" => Ok(Availability::Taken),
            _ => Err(format!("Invalid availability: {}", s)),
        }
    }
}

// SQLx conversion for Availability (stored as text)
impl sqlx::Type<Postgres> for Availability {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Availability {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Availability {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// The two copy slots of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopySlot {
    /// Backed by the `status` flag
    Primary,
    /// Backed by the `copy_status` flag
    Secondary,
}

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub year_published: i32,
    pub description: Option<String>,
    /// Stored cover image path, if one was uploaded
    pub cover: Option<String>,
    /// Loan duration tier code (1, 2 or 3)
    pub loan_type: i16,
    pub status: Availability,
    pub copy_status: Availability,
}

impl Book {
    /// A book is loanable iff at least one slot is available
    pub fn is_loanable(&self) -> bool {
        self.status == Availability::Available || self.copy_status == Availability::Available
    }

    /// Slot a new loan consumes: the primary flag wins the tie-break.
    pub fn slot_to_claim(&self) -> Option<CopySlot> {
        if self.status == Availability::Available {
            Some(CopySlot::Primary)
        } else if self.copy_status == Availability::Available {
            Some(CopySlot::Secondary)
        } else {
            None
        }
    }

    /// Slot a return releases, mirroring `slot_to_claim`: the copy flag
    /// is cleared first.
    pub fn slot_to_release(&self) -> Option<CopySlot> {
        if self.copy_status == Availability::Taken {
            Some(CopySlot::Secondary)
        } else if self.status == Availability::Taken {
            Some(CopySlot::Primary)
        } else {
            None
        }
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 100, message = "Author must be 1-100 characters"))]
    pub author: String,
    pub year_published: i32,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    /// Loan duration tier code (1, 2 or 3)
    pub loan_type: i16,
}

/// Update book request; omitted fields are left unchanged.
/// Availability flags belong to the loan ledger and cannot be edited here.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Author must be 1-100 characters"))]
    pub author: Option<String>,
    pub year_published: Option<i32>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub loan_type: Option<i16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(status: Availability, copy_status: Availability) -> Book {
        Book {
            id: 1,
            title: "The Master and Margarita".to_string(),
            author: "Mikhail Bulgakov".to_string(),
            year_published: 1967,
            description: None,
            cover: None,
            loan_type: 1,
            status,
            copy_status,
        }
    }

    #[test]
    fn loanable_iff_any_slot_available() {
        use Availability::*;
        assert!(book(Available, Available).is_loanable());
        assert!(book(Taken, Available).is_loanable());
        assert!(book(Available, Taken).is_loanable());
        assert!(!book(Taken, Taken).is_loanable());
    }

    #[test]
    fn claim_prefers_primary_slot() {
        use Availability::*;
        assert_eq!(book(Available, Available).slot_to_claim(), Some(CopySlot::Primary));
        assert_eq!(book(Taken, Available).slot_to_claim(), Some(CopySlot::Secondary));
        assert_eq!(book(Available, Taken).slot_to_claim(), Some(CopySlot::Primary));
        assert_eq!(book(Taken, Taken).slot_to_claim(), None);
    }

    #[test]
    fn release_prefers_copy_slot() {
        use Availability::*;
        assert_eq!(book(Taken, Taken).slot_to_release(), Some(CopySlot::Secondary));
        assert_eq!(book(Taken, Available).slot_to_release(), Some(CopySlot::Primary));
        assert_eq!(book(Available, Taken).slot_to_release(), Some(CopySlot::Secondary));
        assert_eq!(book(Available, Available).slot_to_release(), None);
    }

    #[test]
    fn claim_then_release_restores_flags() {
        use Availability::*;
        // Both slots free: a loan takes the primary flag, the matching
        // return clears it again.
        let mut b = book(Available, Available);
        assert_eq!(b.slot_to_claim(), Some(CopySlot::Primary));
        b.status = Taken;
        assert_eq!(b.slot_to_release(), Some(CopySlot::Primary));
        b.status = Available;
        assert_eq!((b.status, b.copy_status), (Available, Available));
    }

    #[test]
    fn availability_round_trips_through_text() {
        assert_eq!("available".parse::<Availability>().unwrap(), Availability::Available);
        assert_eq!("Taken".parse::<Availability>().unwrap(), Availability::Taken);
        assert!("lost".parse::<Availability>().is_err());
    }
}
