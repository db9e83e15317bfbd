//! The kiosk binary's library half: the layout file, the HTTP surface and
//! the wiring between providers and the display.

pub mod app;
pub mod config;
pub mod display_handler;
pub mod error;
pub mod escalation;
pub mod layout_config;
