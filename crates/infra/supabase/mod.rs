pub mod auth_admin;
