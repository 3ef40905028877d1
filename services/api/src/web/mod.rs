pub mod analyze;
pub mod auth;
pub mod billing;
pub mod courses;
pub mod middleware;
pub mod practice;
pub mod profile;
pub mod rest;
pub mod review;
pub mod router;
pub mod state;
pub mod views;
pub mod words;

pub use middleware::require_auth;
pub use router::build_router;
