//! Data models for premium profile linking.

pub mod binding;
pub mod owned_profile;

pub use binding::{Binding, DeactivationReason};
pub use owned_profile::OwnedProfile;
