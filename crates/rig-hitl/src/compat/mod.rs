//! Compatibility layer for Rig framework integration
//!
//! Wraps Rig agents so they can serve as the [`ModelClient`](crate::llm::ModelClient)
//! behind analyst vertices.

pub mod rig_model_client;

pub use rig_model_client::RigModelClient;
