pub mod account;
pub mod attendee;
pub mod billing;
pub mod events;
pub mod notifications;
pub mod song_queue;
