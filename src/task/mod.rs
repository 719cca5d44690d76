//! Background tasks.

pub mod refresh_publisher;
