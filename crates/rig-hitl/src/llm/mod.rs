//! Model access for vertices
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            AnalystVertex                │
//! └─────────────────┬───────────────────────┘
//!                   │ uses
//!                   ▼
//! ┌─────────────────────────────────────────┐
//! │        ModelClient (trait)              │
//! │  - generate(conversation)               │
//! └─────────────────┬───────────────────────┘
//!          ┌────────┴────────┐
//!          ▼                 ▼
//! ┌─────────────────┐ ┌─────────────────────┐
//! │ RigModelClient  │ │ ScriptedModelClient │
//! │ (any Rig Agent) │ │ (offline / tests)   │
//! └─────────────────┘ └─────────────────────┘
//! ```

pub mod provider;
pub mod scripted;

pub use provider::{ModelClient, ModelError};
pub use scripted::{FallbackFn, ScriptedModelClient};
