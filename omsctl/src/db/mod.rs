//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (api::handlers - HTTP request handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries and specifications)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Transactions
//!
//! Read-only handlers acquire a pooled connection; handlers that check something before writing
//! open a transaction so the check and the write commit together:
//!
//! ```ignore
//! let mut tx = state.db.begin().await?;
//! let mut repo = Offices::new(&mut tx);
//! let office = repo.update(id, &request).await?;
//! tx.commit().await?;
//! ```
//!
//! Migrations live in `migrations/` and are applied by [`crate::migrator`] at startup.

pub mod errors;
pub mod handlers;
pub mod models;
