//! Row models for the three persisted tables.

pub mod association;
pub mod freelancer;
pub mod platform_configuration;

pub use association::FreelancerPlatformAssociation;
pub use freelancer::{CreateFreelancer, Freelancer};
pub use platform_configuration::{ConfigPatch, ConfigReadiness, PlatformConfiguration};
