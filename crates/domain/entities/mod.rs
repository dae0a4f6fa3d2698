pub mod dj_users;
pub mod events;
pub mod notifications;
pub mod song_requests;
