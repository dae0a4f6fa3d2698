pub mod billing_periods;
pub mod song_statuses;
pub mod subscription_plans;
