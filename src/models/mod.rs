//! Resource builders
//!
//! Builders for the resource types Rosetta routinely creates. Each builder
//! validates its required fields and produces a [`Resource`] ready to hand
//! to [`ResourceClient::create`].
//!
//! [`Resource`]: crate::domain::Resource
//! [`ResourceClient::create`]: crate::client::ResourceClient::create

pub mod observation;
pub mod patient;

pub use observation::ObservationBuilder;
pub use patient::PatientBuilder;
