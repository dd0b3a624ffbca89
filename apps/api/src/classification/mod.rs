// Job post classification: agent output → Schema Validator → Reconciler →
// Presentation Adapter. Agent calls go through llm_client only.

pub mod code;
pub mod handlers;
pub mod models;
pub mod presentation;
pub mod prompts;
pub mod reconcile;
pub mod schema;
pub mod service;
pub mod timer;
