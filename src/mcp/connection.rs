//! Connection lifecycle.
//!
//! Connecting is retried on transient failures; closing never fails the
//! caller. [`with_session`] ties the two together so every session opened
//! by a command is closed again on both the success and the error path.

use std::future::Future;
use std::sync::Arc;

use super::client::{Connector, Session};
use super::config::ServerConfig;
use super::error::McpError;
use crate::core::{with_retry, RetryBudget};

/// Connect to a server, retrying transient failures within `budget`.
pub async fn connect(
    connector: &dyn Connector,
    name: &str,
    config: &ServerConfig,
    budget: &RetryBudget,
) -> Result<Box<dyn Session>, McpError> {
    let label = format!("connect to {}", name);
    with_retry(budget, &label, move || connector.connect(name, config)).await
}

/// Close a session, logging instead of propagating failures.
pub async fn safe_close(name: &str, session: &dyn Session) {
    if let Err(e) = session.close().await {
        tracing::warn!(server = name, error = %e, "failed to close session");
    }
}

/// Connect, run `operation` against the session, and always close it.
pub async fn with_session<T, F, Fut>(
    connector: &dyn Connector,
    name: &str,
    config: &ServerConfig,
    budget: &RetryBudget,
    operation: F,
) -> Result<T, McpError>
where
    F: FnOnce(Arc<dyn Session>) -> Fut,
    Fut: Future<Output = Result<T, McpError>>,
{
    let session: Arc<dyn Session> = Arc::from(connect(connector, name, config, budget).await?);
    let outcome = operation(Arc::clone(&session)).await;
    safe_close(name, session.as_ref()).await;
    outcome
}
