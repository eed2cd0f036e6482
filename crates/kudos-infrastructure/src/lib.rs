//! Storage adapters for the Kudos engine.

pub mod config_storage;
pub mod dto;
pub mod in_memory_repository;
pub mod paths;
pub mod storage;
pub mod toml_profile_repository;

pub use crate::config_storage::{load_engine_config, save_engine_config};
pub use crate::dto::ProfileStoreDocument;
pub use crate::in_memory_repository::InMemoryProfileRepository;
pub use crate::paths::KudosPaths;
pub use crate::toml_profile_repository::TomlProfileRepository;
