//! Visit event model for asynchronous visit recording.

use crate::domain::entities::VisitMetadata;

/// An in-memory visit event queued by the redirect handler.
///
/// Carries the short code rather than a record id: the worker resolves the
/// code to the link's durable identifier before appending the visit, so the
/// redirect path never waits on the store for telemetry.
#[derive(Debug, Clone)]
pub struct VisitEvent {
    pub code: String,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl VisitEvent {
    /// Creates a new visit event.
    pub fn new(
        code: String,
        client_ip: Option<String>,
        user_agent: Option<&str>,
        referer: Option<&str>,
    ) -> Self {
        Self {
            code,
            client_ip,
            user_agent: user_agent.map(str::to_string),
            referer: referer.map(str::to_string),
        }
    }

    /// Splits the event into the code and the metadata to persist.
    pub fn into_parts(self) -> (String, VisitMetadata) {
        (
            self.code,
            VisitMetadata {
                client_ip: self.client_ip,
                user_agent: self.user_agent,
                referer: self.referer,
            },
        )
    }
}
