//! manga-sync - reading-state reconciliation and cache consistency for a
//! manga reader.
//!
//! This crate provides:
//! - Chapter ordering normalization across seasons and special chapters
//! - Local and confirmed reading progress reconciliation
//! - Scraper cache merging and new-chapter notification diffing
//! - Per-list reading overviews

pub mod config;
pub mod database;
pub mod error;
pub mod event;
pub mod logging;
pub mod model;
pub mod provider;
pub mod reconcile;
pub mod service;
pub mod subscriber;
pub mod task;
