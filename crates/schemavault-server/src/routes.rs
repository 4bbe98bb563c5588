//! HTTP routes

pub mod schemas;
