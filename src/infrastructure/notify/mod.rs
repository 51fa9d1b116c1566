//! Built-in notification delivery channels.

pub mod inapp;
pub mod log;

pub use inapp::InAppChannel;
pub use log::LogChannel;
