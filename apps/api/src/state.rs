use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::AgentGateway;
use crate::reference::descriptions::DescriptionTable;
use crate::reference::ReferenceTable;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once in `main`; the tables are read-only after load, so no locking.
#[derive(Clone)]
pub struct AppState {
    pub reference: Arc<ReferenceTable>,
    /// `None` when the descriptions file is absent.
    pub descriptions: Option<Arc<DescriptionTable>>,
    /// Pluggable agent. Default: `AssistantClient`. Tests use a scripted fake.
    pub agent: Arc<dyn AgentGateway>,
    pub config: Config,
}
