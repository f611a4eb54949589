//! HTTP surface for a browser front end.
pub mod handlers;
pub mod routes;
