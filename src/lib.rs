// Library exports for Roastr
// This allows integration tests and external code to use Roastr modules

pub mod auth;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod graphql;
pub mod notify;
pub mod routes;
pub mod service;
pub mod state;
pub mod tags;
