//! Application layer for Kudos.
//!
//! Wires the in-memory [`kudos_core::PointEngine`] to a
//! [`kudos_core::ProfileRepository`] and exposes every engine operation as an
//! async use case.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use kudos_application::{PointsService, init_tracing};
//! use kudos_core::{EngineConfig, PointEngine};
//! use kudos_core::catalog::ActivityKind;
//! use kudos_infrastructure::TomlProfileRepository;
//!
//! # async fn run() -> anyhow::Result<()> {
//! init_tracing("info")?;
//! let repository = Arc::new(TomlProfileRepository::default_location()?);
//! let service = PointsService::new(PointEngine::new(EngineConfig::default())?, repository);
//! service.bootstrap().await?;
//! service.register_user("alice", "Alice").await;
//! service.record_activity("alice", "post-1", ActivityKind::Post, 0.0).await;
//! # Ok(())
//! # }
//! ```

pub mod persistence;
pub mod points_service;
pub mod telemetry;

pub use persistence::{PendingWrites, PersistReport};
pub use points_service::PointsService;
pub use telemetry::init_tracing;
