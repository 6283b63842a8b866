//! Slate Core: PowerSchool reference-data sync engine, job ledger and SQLite store.

pub mod config;
pub mod connectors;
pub mod db;
pub mod error;
pub mod models;
pub mod sync;
