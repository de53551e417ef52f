use crate::core::config::ExchangeCredentials;
use crate::core::errors::ExchangeError;
use crate::core::types::ConnectionState;
use tracing::info;

/// Connection state and credentials of one connector instance
///
/// Credentials exist only while connected or while a connect attempt is in
/// flight. Every authenticated operation goes through [`Session::require_connected`]
/// before touching the network.
#[derive(Debug)]
pub struct Session {
    exchange: &'static str,
    state: ConnectionState,
    credentials: Option<ExchangeCredentials>,
}

impl Session {
    pub const fn new(exchange: &'static str) -> Self {
        Self {
            exchange,
            state: ConnectionState::Disconnected,
            credentials: None,
        }
    }

    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Guard for authenticated operations
    pub fn require_connected(&self) -> Result<&ExchangeCredentials, ExchangeError> {
        match (&self.state, &self.credentials) {
            (ConnectionState::Connected, Some(credentials)) => Ok(credentials),
            _ => Err(ExchangeError::NotConnected),
        }
    }

    /// Enters `Connecting` with the given credentials.
    ///
    /// An existing session is discarded first. The returned attempt rolls the
    /// session back to `Disconnected` when dropped without [`ConnectAttempt::commit`],
    /// which also covers a cancelled `connect` future.
    pub fn begin_connect(&mut self, credentials: ExchangeCredentials) -> ConnectAttempt<'_> {
        if self.state != ConnectionState::Disconnected {
            info!(exchange = self.exchange, "Discarding existing session before reconnect");
        }
        self.state = ConnectionState::Connecting;
        self.credentials = Some(credentials);
        ConnectAttempt {
            session: self,
            committed: false,
        }
    }

    /// Clears credentials and returns to `Disconnected`. Idempotent.
    pub fn disconnect(&mut self) -> bool {
        if self.state != ConnectionState::Disconnected {
            info!(exchange = self.exchange, "Disconnected");
        }
        self.reset();
        true
    }

    fn reset(&mut self) {
        self.credentials = None;
        self.state = ConnectionState::Disconnected;
    }
}

/// In-flight connect; see [`Session::begin_connect`]
#[derive(Debug)]
pub struct ConnectAttempt<'a> {
    session: &'a mut Session,
    committed: bool,
}

impl ConnectAttempt<'_> {
    /// Credentials under verification
    pub fn credentials(&self) -> Result<&ExchangeCredentials, ExchangeError> {
        self.session.credentials.as_ref().ok_or_else(|| {
            ExchangeError::CredentialError("connect attempt has no credentials".to_string())
        })
    }

    /// Verification succeeded: transition to `Connected`
    pub fn commit(mut self) {
        self.session.state = ConnectionState::Connected;
        self.committed = true;
        info!(exchange = self.session.exchange, "Connected");
    }
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if !self.committed {
            info!(
                exchange = self.session.exchange,
                "Connect did not complete, session reset"
            );
            self.session.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> ExchangeCredentials {
        ExchangeCredentials::new("k".to_string(), "cw==".to_string())
            .with_passphrase("p".to_string())
    }

    #[test]
    fn test_guard_rejects_until_committed() {
        let mut session = Session::new("test");
        assert!(matches!(
            session.require_connected(),
            Err(ExchangeError::NotConnected)
        ));

        let attempt = session.begin_connect(creds());
        assert!(attempt.credentials().is_ok());
        attempt.commit();

        assert_eq!(session.state(), ConnectionState::Connected);
        assert_eq!(session.require_connected().unwrap().api_key(), "k");
    }

    #[test]
    fn test_dropped_attempt_rolls_back() {
        let mut session = Session::new("test");
        {
            let _attempt = session.begin_connect(creds());
        }
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(session.require_connected().is_err());
    }

    #[test]
    fn test_failed_reconnect_drops_previous_session() {
        let mut session = Session::new("test");
        session.begin_connect(creds()).commit();

        drop(session.begin_connect(creds()));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut session = Session::new("test");
        assert!(session.disconnect());
        session.begin_connect(creds()).commit();
        assert!(session.disconnect());
        assert!(session.disconnect());
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }
}
