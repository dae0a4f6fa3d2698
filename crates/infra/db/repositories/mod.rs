pub mod attendees;
pub mod events;
pub mod notifications;
pub mod song_requests;
