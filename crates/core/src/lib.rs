//! Core domain types for freelancer platform provisioning.
//!
//! This crate has no I/O. It defines the vocabulary shared by the store,
//! event and workflow crates:
//!
//! - [`platform`]: the [`PlatformModule`](platform::PlatformModule) /
//!   [`PlatformSession`](platform::PlatformSession) integration contract.
//! - [`registry`]: the immutable, dependency-injected module registry.
//! - [`status`]: association / freelancer lifecycle enums and transitions.
//! - [`progress`]: the transient per-batch onboarding progress model.
//! - [`locks`]: per-key async mutexes used to serialize writes.

pub mod config_shape;
pub mod error;
pub mod locks;
pub mod platform;
pub mod progress;
pub mod registry;
pub mod status;
pub mod types;
