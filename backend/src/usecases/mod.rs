pub mod attendee_requests;
pub mod billing;
pub mod events;
pub mod expiry_sweep;
pub mod notifications;
pub mod plan_cache;
pub mod profile;
pub mod song_queue;
