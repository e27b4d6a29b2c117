//! Session manager: opens and closes device sessions
//!
//! No retries at this level. The verifier owns the reconnect policy and
//! sweeps skip unreachable devices.

use std::sync::Arc;

use mtfleet_exec::{Connector, DeviceTarget, RemoteSession};
use tracing::{error, info, warn};

/// Opens sessions through a [`Connector`] and logs classified failures
#[derive(Clone)]
pub struct SessionManager {
    connector: Arc<dyn Connector>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("connector", &self.connector.connector_type())
            .finish()
    }
}

impl SessionManager {
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Open a session, or log one classified error line and return `None`
    pub async fn open(&self, target: &DeviceTarget) -> Option<Box<dyn RemoteSession>> {
        match self.connector.open(target).await {
            Ok(session) => {
                info!(device = %target.address, "connect success");
                Some(session)
            }
            Err(e) => {
                error!(
                    device = %target.address,
                    kind = e.kind(),
                    error = %e,
                    "connection failed"
                );
                None
            }
        }
    }

    /// Close a session and drop it
    pub async fn close(&self, session: Box<dyn RemoteSession>) {
        if let Err(e) = session.close().await {
            warn!(device = %session.address(), error = %e, "session did not close cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use mtfleet_exec::ConnectionError;

    use super::*;
    use crate::testing::{StubConnector, capture_logs};

    fn target() -> DeviceTarget {
        DeviceTarget::new("10.0.0.1", "admin", "secret")
    }

    #[tokio::test]
    async fn test_failed_open_logs_one_classified_error() {
        let connector = StubConnector::new().opens(vec![Err(ConnectionError::Timeout)]);
        let sessions = SessionManager::new(Arc::new(connector));
        let (logs, _guard) = capture_logs();

        assert!(sessions.open(&target()).await.is_none());

        let lines = logs.lines_containing("connection failed");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR"));
        assert!(lines[0].contains("Timeout"));
        assert!(lines[0].contains("10.0.0.1"));
        assert!(logs.lines_containing("connect success").is_empty());
    }

    #[tokio::test]
    async fn test_each_failure_kind_is_labelled() {
        let connector = StubConnector::new().opens(vec![
            Err(ConnectionError::ServiceUnavailable("connection refused".to_string())),
            Err(ConnectionError::Unknown("auth failed".to_string())),
        ]);
        let sessions = SessionManager::new(Arc::new(connector));
        let (logs, _guard) = capture_logs();

        assert!(sessions.open(&target()).await.is_none());
        assert!(sessions.open(&target()).await.is_none());

        let lines = logs.lines_containing("connection failed");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ServiceUnavailable"));
        assert!(lines[1].contains("Unknown"));
    }

    #[tokio::test]
    async fn test_successful_open_logs_info() {
        let sessions = SessionManager::new(Arc::new(StubConnector::new()));
        let (logs, _guard) = capture_logs();

        let session = sessions.open(&target()).await.unwrap();
        assert!(session.is_open());

        let lines = logs.lines_containing("connect success");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert!(logs.lines_containing("ERROR").is_empty());
    }
}
