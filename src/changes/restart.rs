use log::{debug, trace};
use mockall::automock;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use ureq::{Agent, AgentBuilder};

/// The default control endpoint, that restarts a service of the stack.
pub const DEFAULT_RESTART_URL: &str = "http://localhost:6002/restart/service";
/// The default time to wait for the control endpoint.
pub const DEFAULT_RESTART_TIMEOUT: Duration = Duration::from_secs(10);

/// A custom error describing the error cases for the restart requests.
#[derive(Debug, Error)]
pub enum RestartError {
    /// The control endpoint cannot be reached, or it didn't answer in time.
    #[error("cannot reach restart endpoint: {0}")]
    Network(String),
    /// The response body cannot be read.
    #[error("cannot read restart response: {0}")]
    UnreadableResponse(#[from] std::io::Error),
}

/// The raw answer of the control endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartResponse {
    pub status: u16,
    pub body: String,
}

impl RestartResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The JSON body of a restart request.
#[derive(Debug, Serialize)]
struct RestartRequest<'a> {
    service: &'a str,
}

/// A notifier asks for a restart of a service.
#[automock]
pub trait Notifier {
    /// Request a restart of the service once, without retrying.
    fn restart(&self, service: &str) -> Result<RestartResponse, RestartError>;
}

/// A notifier sending an authenticated POST request to the control endpoint.
pub struct HttpNotifier {
    url: String,
    auth_key: String,
    agent: Agent,
}

impl HttpNotifier {
    /// Creates a notifier for the url, every request is bounded by the timeout.
    pub fn new(url: String, auth_key: String, timeout: Duration) -> Self {
        let agent = AgentBuilder::new().timeout(timeout).build();

        HttpNotifier {
            url,
            auth_key,
            agent,
        }
    }
}

impl Notifier for HttpNotifier {
    fn restart(&self, service: &str) -> Result<RestartResponse, RestartError> {
        debug!("Sending restart for {service} to {}.", self.url);

        let result = self
            .agent
            .post(&self.url)
            .set("X-From", "source")
            .set("X-Auth-Key", &self.auth_key)
            .send_json(RestartRequest { service });

        // Error statuses are still answers from the endpoint, we only report them.
        let response = match result {
            Ok(response) | Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(RestartError::Network(transport.to_string()))
            }
        };

        let status = response.status();
        let body = response.into_string()?;
        trace!("Restart endpoint answered {status}: {body}");

        Ok(RestartResponse { status, body })
    }
}
