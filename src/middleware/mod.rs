// Middleware for the HTTP surface

pub mod cors;

pub use cors::*;
