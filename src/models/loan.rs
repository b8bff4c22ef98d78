//! Loan model and duration policies

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan duration tiers. The numeric codes are part of the catalog data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[repr(i16)]
pub enum LoanType {
    Long = 1,
    Medium = 2,
    Short = 3,
}

impl LoanType {
    /// Resolve a catalog loan type code to its policy tier
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(LoanType::Long),
            2 => Some(LoanType::Medium),
            3 => Some(LoanType::Short),
            _ => None,
        }
    }

    /// Fixed loan duration for this tier
    pub fn duration(&self) -> Duration {
        let days = match self {
            LoanType::Long => 10,
            LoanType::Medium => 5,
            LoanType::Short => 2,
        };
        Duration::days(days)
    }
}

/// Active loan row. The row's existence means the copy is checked out;
/// returning a book deletes the row. Rows are never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl Loan {
    /// A loan is late once its due date is strictly in the past.
    /// The same comparison is used everywhere a `late` flag is reported.
    pub fn is_late(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now
    }
}

/// Loan summary attached to a book detail response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanSummary {
    pub loan_id: i32,
    pub due_date: DateTime<Utc>,
    pub late: bool,
}

impl LoanSummary {
    pub fn from_loan(loan: &Loan, now: DateTime<Utc>) -> Self {
        Self {
            loan_id: loan.id,
            due_date: loan.due_date,
            late: loan.is_late(now),
        }
    }
}

/// Active loan joined with book details for list endpoints.
/// `user_id` is populated only in the admin-wide listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanDetails {
    pub loan_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    pub book_id: i32,
    pub title: String,
    pub author: String,
    pub year_published: i32,
    pub description: Option<String>,
    pub cover: Option<String>,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub late: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn loan_type_codes_resolve_to_tiers() {
        assert_eq!(LoanType::from_code(1), Some(LoanType::Long));
        assert_eq!(LoanType::from_code(2), Some(LoanType::Medium));
        assert_eq!(LoanType::from_code(3), Some(LoanType::Short));
        assert_eq!(LoanType::from_code(0), None);
        assert_eq!(LoanType::from_code(4), None);
        assert_eq!(LoanType::from_code(-1), None);
    }

    #[test]
    fn tier_durations_are_fixed() {
        assert_eq!(LoanType::Long.duration(), Duration::days(10));
        assert_eq!(LoanType::Medium.duration(), Duration::days(5));
        assert_eq!(LoanType::Short.duration(), Duration::days(2));
    }

    #[test]
    fn late_uses_strict_past_comparison() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let loan = |due: DateTime<Utc>| Loan {
            id: 1,
            user_id: 1,
            book_id: 1,
            loan_date: now - Duration::days(3),
            due_date: due,
        };

        assert!(loan(now - Duration::seconds(1)).is_late(now));
        assert!(!loan(now + Duration::seconds(1)).is_late(now));
        // Boundary: due exactly now is not late
        assert!(!loan(now).is_late(now));
    }

    #[test]
    fn summary_mirrors_loan_late_flag() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let loan = Loan {
            id: 9,
            user_id: 1,
            book_id: 2,
            loan_date: now - Duration::days(11),
            due_date: now - Duration::days(1),
        };
        let summary = LoanSummary::from_loan(&loan, now);
        assert_eq!(summary.loan_id, 9);
        assert_eq!(summary.late, loan.is_late(now));
        assert!(summary.late);
    }
}
