pub mod attendees;
pub mod checkout;
pub mod dashboard;
pub mod enums;
pub mod events;
pub mod notifications;
pub mod plans;
pub mod profiles;
pub mod song_queue;
pub mod song_submissions;
pub mod user_metadata;
