pub mod concepts;
mod details;
pub mod home;
pub mod not_found;
mod sample;
