//! Shared application state for the API server.

use storyweave_db::PostgresPool;
use storyweave_notify::JudgeNotifier;
use storyweave_types::AgentId;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. Everything in here is cheap to clone; the pool is itself a
/// handle.
#[derive(Clone)]
pub struct AppState {
    /// The shared database pool behind all stores.
    pub db: PostgresPool,
    /// Public base URL used to build claim URLs and judge callbacks.
    pub base_url: String,
    /// Webhook client; `None` disables the push notification and the judge
    /// falls back to pulling the context.
    pub notifier: Option<JudgeNotifier>,
    /// Shared admin secret trusted to judge, presented as `X-Admin-Key`.
    pub admin_key: Option<String>,
    /// The one agent identity trusted to judge.
    pub judge_agent_id: Option<AgentId>,
}

impl AppState {
    /// Create state with no notifier and no trusted judge configured.
    pub fn new(db: PostgresPool, base_url: &str) -> Self {
        Self {
            db,
            base_url: base_url.trim_end_matches('/').to_owned(),
            notifier: None,
            admin_key: None,
            judge_agent_id: None,
        }
    }

    /// Attach a judge webhook notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: JudgeNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set the admin secret trusted to judge.
    #[must_use]
    pub fn with_admin_key(mut self, key: &str) -> Self {
        self.admin_key = Some(key.to_owned());
        self
    }

    /// Designate the judge agent identity.
    #[must_use]
    pub const fn with_judge_agent(mut self, id: AgentId) -> Self {
        self.judge_agent_id = Some(id);
        self
    }

    /// The callback URL the external judge POSTs its judgment to.
    pub fn judge_endpoint(&self, story_id: storyweave_types::StoryId) -> String {
        format!("{}/api/stories/{story_id}/judge", self.base_url)
    }
}
