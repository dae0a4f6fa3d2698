use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::enums::billing_periods::BillingPeriod;
use crate::domain::entities::notifications::InsertNotificationEntity;

/// Messages the service writes to a DJ's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemNotification {
    SubscriptionActivated { period: BillingPeriod },
    TrialStarted { days: i64 },
    SubscriptionExpired,
    SubscriptionCancelled { ends_at: Option<DateTime<Utc>> },
    CheckoutExpired,
    PaymentFailed,
    LifetimeUnlocked,
}

impl SystemNotification {
    pub fn title(&self) -> &'static str {
        match self {
            SystemNotification::SubscriptionActivated { .. } => "Subscription Activated",
            SystemNotification::TrialStarted { .. } => "Free Trial Started",
            SystemNotification::SubscriptionExpired => "Subscription Expired",
            SystemNotification::SubscriptionCancelled { .. } => "Subscription Cancelled",
            SystemNotification::CheckoutExpired => "Checkout Expired",
            SystemNotification::PaymentFailed => "Payment Failed",
            SystemNotification::LifetimeUnlocked => "Lifetime Access Unlocked",
        }
    }

    pub fn message(&self) -> String {
        match self {
            SystemNotification::SubscriptionActivated { period } => {
                format!("Your Hey DJ Pro {period} subscription is now active.")
            }
            SystemNotification::TrialStarted { days } => {
                format!("Your {days}-day Hey DJ Pro trial has started. Enjoy every premium feature.")
            }
            SystemNotification::SubscriptionExpired => {
                "Your Hey DJ Pro subscription has expired. Upgrade again to unlock premium features."
                    .to_string()
            }
            SystemNotification::SubscriptionCancelled { ends_at: Some(ends_at) } => format!(
                "Your subscription will not renew. Premium features stay available until {}.",
                ends_at.format("%Y-%m-%d")
            ),
            SystemNotification::SubscriptionCancelled { ends_at: None } => {
                "Your subscription will not renew.".to_string()
            }
            SystemNotification::CheckoutExpired => {
                "Your checkout session expired before payment was completed.".to_string()
            }
            SystemNotification::PaymentFailed => {
                "We could not process your payment. Please try again with another method."
                    .to_string()
            }
            SystemNotification::LifetimeUnlocked => {
                "Lifetime access is unlocked. Premium features never expire.".to_string()
            }
        }
    }

    pub fn to_insert(&self, user_id: Uuid, now: DateTime<Utc>) -> InsertNotificationEntity {
        InsertNotificationEntity {
            user_id,
            title: self.title().to_string(),
            message: self.message(),
            read: false,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_notice_is_unread() {
        let user_id = Uuid::new_v4();
        let insert = SystemNotification::SubscriptionExpired.to_insert(user_id, Utc::now());
        assert_eq!(insert.title, "Subscription Expired");
        assert!(insert.message.contains("has expired"));
        assert!(!insert.read);
        assert_eq!(insert.user_id, user_id);
    }
}
