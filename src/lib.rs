//! Couchlist API: dashboard aggregation and title suggestions for shared
//! watchlists.
//!
//! The service sits behind an auth gateway that forwards user identity via
//! headers. It aggregates the watchlists a user owns or belongs to into a
//! dashboard payload, and turns their unwatched backlog into grounded title
//! suggestions via a completion model.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
