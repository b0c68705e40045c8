pub mod auth;
pub mod sensors;
