//! bootcamp-service: REST API backend for a bootcamp directory.
//!
//! CRUD over bootcamps, courses, reviews, and users, with JWT authentication,
//! role and ownership authorization, advanced query shaping, geospatial
//! radius search, and photo upload.

pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod startup;
pub mod utils;

pub use startup::{build_router, AppState, Application};
