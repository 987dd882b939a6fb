//! Bancarizate - educational banking platform backend
//!
//! Actix Web service where students, teachers and administrators move
//! play money between accounts.
//!
//! # Layout
//! - `cache`: object cache (Moka/Redis)
//! - `config`: configuration loading
//! - `entity`: SeaORM entities
//! - `errors`: crate error type
//! - `middlewares`: authentication, roles and rate limiting
//! - `models`: API and domain types
//! - `routes`: HTTP routing
//! - `runtime`: startup and shutdown
//! - `services`: business logic
//! - `storage`: persistence (SeaORM)
//! - `utils`: helpers (RUT, passwords, JWT, extractors)

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
