use super::{Trigger, TriggerError};
use crate::context::Context;
use log::{debug, info, trace};
use std::{collections::HashMap, sync::mpsc::Sender};
use tiny_http::{Request, Response, Server};

const TRIGGER_NAME: &str = "HTTP";

/// A trigger that runs on an HTTP request.
///
/// This could be used to run the actions from git remotes (e.g. GitHub, GitLab) with webhooks.
/// Requests are only queued here, so the passes always run one after the other,
/// even if the webhooks arrive at the same time.
pub struct HttpTrigger {
    http: String,
    server: Server,
}

impl HttpTrigger {
    /// Bind a new HTTP trigger to an address, for example "0.0.0.0:1234".
    ///
    /// The server is bound here, so an unusable address fails before the triggers start.
    pub fn bind(http: String) -> Result<Self, TriggerError> {
        let server = Server::http(&http).map_err(|err| {
            TriggerError::Misconfigured(format!("cannot start server on {http}: {err}"))
        })?;

        Ok(Self { http, server })
    }

    fn request_context(request: &Request) -> Context {
        let url = request.url().to_string();
        let path = url.split('?').next().unwrap_or_default().to_string();
        let last_segment = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .last()
            .unwrap_or_default()
            .to_string();

        HashMap::from([
            ("TRIGGER_NAME".to_string(), TRIGGER_NAME.to_string()),
            ("HTTP_METHOD".to_string(), request.method().to_string()),
            ("HTTP_URL".to_string(), url),
            ("HTTP_PATH".to_string(), path),
            ("HTTP_PATH_LAST".to_string(), last_segment),
        ])
    }

}

impl Trigger for HttpTrigger {
    /// Serves a minimal HTTP 1.1 server, that triggers on every request.
    ///
    /// Every method and every URL returns 200 status code with plaintext "OK".
    fn listen(&self, tx: Sender<Option<Context>>) -> Result<(), TriggerError> {
        info!("Listening on {}...", self.http);
        for request in self.server.incoming_requests() {
            info!("Received request on {} {}", request.method(), request.url());
            let context = Self::request_context(&request);
            trace!("Request context: {context:?}.");

            tx.send(Some(context))?;

            if let Err(err) = request.respond(Response::from_string("OK")) {
                debug!("Failed responding to the request: {err}.");
            }
        }

        Ok(())
    }
}
