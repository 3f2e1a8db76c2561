//! Request handlers for the web interface

pub mod api;
pub mod pages;
