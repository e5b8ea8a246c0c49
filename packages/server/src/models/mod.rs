pub mod admin;
pub mod auth;
pub mod case_study;
pub mod media;
pub mod shared;
pub mod showcase;
