//! Pure access-control decision logic.
//!
//! Reconciles a stored entitlement record with the current date into a single
//! verdict. License time always wins over trial credits: a premium-active
//! user is admitted (and never debited) even with zero credits left.

use chrono::NaiveDate;

use crate::db::UserRecord;

/// Why a user was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No record exists for this identity at all.
    NotRegistered,
    /// License lapsed (or never existed) and the trial quota is used up.
    Exhausted,
}

/// Admission verdict with enough detail to render the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessVerdict {
    Premium { days_left: i64 },
    Trial { credits: i32 },
    Denied(DenialReason),
}

impl AccessVerdict {
    #[must_use]
    pub const fn allows(&self) -> bool {
        !matches!(self, Self::Denied(_))
    }

    /// Human-readable status or rejection reason shown to the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Premium { days_left } => format!(
                "Premium access. {days_left} day(s) of active service left (unlimited generations)."
            ),
            Self::Trial { credits } => {
                format!("Free trial mode. {credits} generation(s) remaining.")
            }
            Self::Denied(DenialReason::NotRegistered) => {
                "You are not registered yet. Send /start to claim your 5 free trial generations."
                    .to_string()
            }
            Self::Denied(DenialReason::Exhausted) => {
                "Your access has expired and your trial quota is used up.\n\
                 Contact the operator to rent daily or monthly access, or join the \
                 community group for promo announcements."
                    .to_string()
            }
        }
    }
}

/// Evaluates a record against `today` (date-only, no time component).
///
/// Remaining days are counted inclusive of the current day: an expiry equal
/// to `today` still reads as one day left.
#[must_use]
pub fn evaluate(record: Option<&UserRecord>, today: NaiveDate) -> AccessVerdict {
    let Some(record) = record else {
        return AccessVerdict::Denied(DenialReason::NotRegistered);
    };

    if let Some(expiration) = record.expiration()
        && today <= expiration
    {
        return AccessVerdict::Premium {
            days_left: (expiration - today).num_days() + 1,
        };
    }

    if record.credits > 0 {
        return AccessVerdict::Trial {
            credits: record.credits,
        };
    }

    AccessVerdict::Denied(DenialReason::Exhausted)
}

/// Date rule shared with the debit path: a record counts as premium-active
/// when its expiry parses and is not in the past.
#[must_use]
pub fn is_premium_active(record: &UserRecord, today: NaiveDate) -> bool {
    record.expiration().is_some_and(|exp| today <= exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expiration: Option<&str>, credits: i32) -> UserRecord {
        UserRecord {
            user_id: "42".to_string(),
            display_name: "Tester".to_string(),
            expiration_date: expiration.map(str::to_string),
            credits,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn absent_record_is_denied_with_registration_hint() {
        let verdict = evaluate(None, day("2026-08-25"));
        assert_eq!(verdict, AccessVerdict::Denied(DenialReason::NotRegistered));
        assert!(verdict.message().contains("/start"));
    }

    #[test]
    fn future_expiry_is_premium_regardless_of_credits() {
        let today = day("2026-08-25");
        for credits in [0, 3, -1] {
            let verdict = evaluate(Some(&record(Some("2026-09-01"), credits)), today);
            assert!(matches!(verdict, AccessVerdict::Premium { .. }), "credits={credits}");
        }
    }

    #[test]
    fn expiry_today_counts_as_one_day_left() {
        let verdict = evaluate(Some(&record(Some("2026-08-25"), 0)), day("2026-08-25"));
        assert_eq!(verdict, AccessVerdict::Premium { days_left: 1 });
    }

    #[test]
    fn expiry_three_days_out_counts_as_four_days_left() {
        let verdict = evaluate(Some(&record(Some("2026-08-28"), 0)), day("2026-08-25"));
        assert_eq!(verdict, AccessVerdict::Premium { days_left: 4 });
    }

    #[test]
    fn lapsed_expiry_falls_back_to_trial_credits() {
        let verdict = evaluate(Some(&record(Some("2026-08-24"), 2)), day("2026-08-25"));
        assert_eq!(verdict, AccessVerdict::Trial { credits: 2 });
    }

    #[test]
    fn no_expiry_with_credits_is_trial() {
        let verdict = evaluate(Some(&record(None, 5)), day("2026-08-25"));
        assert_eq!(verdict, AccessVerdict::Trial { credits: 5 });
    }

    #[test]
    fn no_expiry_and_no_credits_is_denied() {
        let verdict = evaluate(Some(&record(None, 0)), day("2026-08-25"));
        assert_eq!(verdict, AccessVerdict::Denied(DenialReason::Exhausted));
    }

    #[test]
    fn unparseable_expiry_is_treated_as_no_license() {
        let verdict = evaluate(Some(&record(Some("not-a-date"), 1)), day("2026-08-25"));
        assert_eq!(verdict, AccessVerdict::Trial { credits: 1 });

        let verdict = evaluate(Some(&record(Some("not-a-date"), 0)), day("2026-08-25"));
        assert_eq!(verdict, AccessVerdict::Denied(DenialReason::Exhausted));
    }

    #[test]
    fn premium_active_shares_the_inclusive_date_rule() {
        let today = day("2026-08-25");
        assert!(is_premium_active(&record(Some("2026-08-25"), 0), today));
        assert!(!is_premium_active(&record(Some("2026-08-24"), 0), today));
        assert!(!is_premium_active(&record(None, 5), today));
    }
}
