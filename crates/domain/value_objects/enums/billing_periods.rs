use std::fmt::Display;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Weekly,
    Monthly,
    Yearly,
    Unlimited,
}

impl BillingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingPeriod::Weekly => "weekly",
            BillingPeriod::Monthly => "monthly",
            BillingPeriod::Yearly => "yearly",
            BillingPeriod::Unlimited => "unlimited",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekly" => Some(BillingPeriod::Weekly),
            "monthly" => Some(BillingPeriod::Monthly),
            "yearly" => Some(BillingPeriod::Yearly),
            "unlimited" => Some(BillingPeriod::Unlimited),
            _ => None,
        }
    }

    /// Stripe `recurring[interval]` value for the periods that can be purchased.
    pub fn stripe_interval(&self) -> Option<&'static str> {
        match self {
            BillingPeriod::Monthly => Some("month"),
            BillingPeriod::Yearly => Some("year"),
            BillingPeriod::Weekly | BillingPeriod::Unlimited => None,
        }
    }

    /// Expiry for a period starting at `start`. Calendar months clamp to the last
    /// day of the target month (Jan 31 + 1 month = Feb 29 in a leap year).
    /// `Unlimited` never expires.
    pub fn expiry_from(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            BillingPeriod::Weekly => start.checked_add_signed(Duration::days(7)),
            BillingPeriod::Monthly => start.checked_add_months(Months::new(1)),
            BillingPeriod::Yearly => start.checked_add_months(Months::new(12)),
            BillingPeriod::Unlimited => None,
        }
    }
}

impl Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn monthly_clamps_to_end_of_february_in_leap_year() {
        assert_eq!(
            BillingPeriod::Monthly.expiry_from(at(2024, 1, 31)),
            Some(at(2024, 2, 29))
        );
    }

    #[test]
    fn monthly_clamps_to_end_of_february_in_common_year() {
        assert_eq!(
            BillingPeriod::Monthly.expiry_from(at(2023, 1, 31)),
            Some(at(2023, 2, 28))
        );
    }

    #[test]
    fn monthly_rolls_over_year_boundary() {
        assert_eq!(
            BillingPeriod::Monthly.expiry_from(at(2024, 12, 15)),
            Some(at(2025, 1, 15))
        );
    }

    #[test]
    fn yearly_adds_one_calendar_year() {
        assert_eq!(
            BillingPeriod::Yearly.expiry_from(at(2024, 3, 10)),
            Some(at(2025, 3, 10))
        );
        assert_eq!(
            BillingPeriod::Yearly.expiry_from(at(2024, 2, 29)),
            Some(at(2025, 2, 28))
        );
    }

    #[test]
    fn unlimited_never_expires() {
        assert_eq!(BillingPeriod::Unlimited.expiry_from(at(2024, 1, 1)), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(BillingPeriod::parse("Yearly"), Some(BillingPeriod::Yearly));
        assert_eq!(BillingPeriod::parse("daily"), None);
    }
}
