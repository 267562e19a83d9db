//! Catalog, tagging and AI enrichment for a sports photo portfolio.
//!
//! Photos live in one flat `photo_metadata` table (SQLite, or PostgreSQL with
//! the `postgres` feature). Around it sit the batch jobs: local import,
//! vision-model enrichment, sport-type backfill and album-name
//! canonicalization.

pub mod config;
pub mod db;
pub mod enrich;
pub mod export;
pub mod logging;
pub mod naming;
pub mod scanner;
pub mod taxonomy;
pub mod vision;
