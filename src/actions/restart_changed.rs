use super::{Action, ActionError};
use crate::{
    changes::{
        checksum::{changed_configs, ChecksumError},
        manifest::{resolve_services, ManifestError},
        restart::Notifier,
    },
    context::Context,
    template::{render, TemplateError},
};
use log::{debug, error, info, warn};
use std::path::Path;
use thiserror::Error;

/// The manifest of the deployed stack, if it is not configured.
pub const DEFAULT_MANIFEST: &str = "/etc/config/docker-stack.yml";

/// An action to restart every service, which mounts a configuration file that changed.
///
/// The configuration directory contains a `<name>.md5sum` and a `<name>.md5sum.updated`
/// checksum file for every tracked configuration, maintained by another step of the
/// deployment. If they differ, every service of the manifest, that has a volume starting
/// with `<volume_base_dir>/<name>` gets a restart request.
///
/// The paths can contain `{{ NAME }}` placeholders, rendered from the context on every run.
pub struct RestartChangedAction {
    config_dir: String,
    volume_base_dir: String,
    manifest: String,
    notifier: Box<dyn Notifier>,
}

/// Custom error describing the error cases for the RestartChangedAction.
#[derive(Debug, Error)]
pub enum RestartChangedError {
    /// One of the paths cannot be rendered.
    #[error("cannot render path: {0}")]
    Template(#[from] TemplateError),
    /// The checksums cannot be compared.
    #[error("{0}")]
    Checksum(#[from] ChecksumError),
    /// The services cannot be resolved from the manifest.
    #[error("{0}")]
    Manifest(#[from] ManifestError),
}

impl From<RestartChangedError> for ActionError {
    fn from(value: RestartChangedError) -> Self {
        match value {
            RestartChangedError::Template(_) => ActionError::Misconfigured(value.to_string()),
            RestartChangedError::Checksum(_) | RestartChangedError::Manifest(_) => {
                ActionError::FailedAction(value.to_string())
            }
        }
    }
}

/// What happened during one pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RestartSummary {
    /// The names of the changed configurations.
    pub changed: Vec<String>,
    /// The services which got a restart request, in order.
    pub restarted: Vec<String>,
    /// The services where the restart request couldn't be sent.
    pub failed: Vec<String>,
}

impl RestartChangedAction {
    /// Creates a new action reading the checksums from `config_dir`.
    pub fn new(
        config_dir: String,
        volume_base_dir: String,
        manifest: String,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        RestartChangedAction {
            config_dir,
            volume_base_dir,
            manifest,
            notifier,
        }
    }

    fn restart(&self, service: &str, summary: &mut RestartSummary) {
        info!("Restarting {service}...");
        match self.notifier.restart(service) {
            Ok(response) if response.is_success() => {
                info!("Restarted {service}: {} {}", response.status, response.body);
                summary.restarted.push(service.to_string());
            }
            Ok(response) => {
                warn!(
                    "Restart endpoint refused {service}: {} {}",
                    response.status, response.body
                );
                summary.restarted.push(service.to_string());
            }
            Err(err) => {
                error!("Failed restarting {service}: {err}.");
                summary.failed.push(service.to_string());
            }
        }
    }

    /// Compare the checksums, resolve the services and notify them one by one.
    ///
    /// Failing to read the checksums or the manifest stops the pass, but failing
    /// to reach the restart endpoint only skips that service.
    pub fn run_pass(&self, context: &Context) -> Result<RestartSummary, RestartChangedError> {
        let config_dir = render(&self.config_dir, context)?;
        let volume_base_dir = render(&self.volume_base_dir, context)?;
        let manifest = render(&self.manifest, context)?;

        let mut summary = RestartSummary::default();
        for change in changed_configs(&config_dir)? {
            let services = resolve_services(Path::new(&manifest), &volume_base_dir, &change.name)?;
            if services.is_empty() {
                debug!("No service mounts {}.", change.name);
            }

            for service in services {
                self.restart(&service, &mut summary);
            }
            summary.changed.push(change.name);
        }

        Ok(summary)
    }
}

impl Action for RestartChangedAction {
    fn run(&self, context: &Context) -> Result<(), ActionError> {
        debug!(
            "Checking changed configs in {} against {}.",
            self.config_dir, self.manifest
        );

        match self.run_pass(context) {
            Ok(summary) => {
                if summary.changed.is_empty() {
                    debug!("There are no changed configs.");
                } else {
                    info!(
                        "Changed configs: {}, restarted services: {}.",
                        summary.changed.join(", "),
                        summary.restarted.len()
                    );
                }
                Ok(())
            }
            Err(err) => {
                error!("Failed: {err}.");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        changes::restart::{
            HttpNotifier, MockNotifier, RestartError, RestartResponse, DEFAULT_RESTART_TIMEOUT,
        },
        scratch::ScratchDir,
    };
    use mockall::{predicate::eq, Sequence};
    use std::{collections::HashMap, error::Error, sync::mpsc, thread};
    use tiny_http::{Response, Server};

    const MANIFEST: &str = "
services:
  web:
    volumes:
      - /data/app:/app
  db:
    volumes:
      - /data/db:/var/lib/db
  cache:
    image: redis
";

    fn ok_response() -> Result<RestartResponse, RestartError> {
        Ok(RestartResponse {
            status: 200,
            body: String::from("OK"),
        })
    }

    fn create_action(dir: &ScratchDir, notifier: MockNotifier) -> RestartChangedAction {
        RestartChangedAction::new(
            dir.path().to_string(),
            String::from("/data"),
            format!("{}/docker-stack.yml", dir.path()),
            Box::new(notifier),
        )
    }

    #[test]
    fn it_should_restart_the_services_of_changed_configs() -> Result<(), Box<dyn Error>> {
        let dir = ScratchDir::new()?;
        dir.write("docker-stack.yml", MANIFEST)?;
        dir.write("app.md5sum", "abc")?;
        dir.write("app.md5sum.updated", "def")?;
        dir.write("db.md5sum", "abc")?;
        dir.write("db.md5sum.updated", "abc")?;

        let mut notifier = MockNotifier::new();
        notifier
            .expect_restart()
            .with(eq("web"))
            .times(1)
            .returning(|_| ok_response());
        let action = create_action(&dir, notifier);

        let summary = action.run_pass(&HashMap::new())?;
        assert_eq!(
            RestartSummary {
                changed: vec![String::from("app")],
                restarted: vec![String::from("web")],
                failed: vec![],
            },
            summary
        );

        Ok(())
    }

    #[test]
    fn it_should_not_restart_anything_if_nothing_changed() -> Result<(), Box<dyn Error>> {
        let dir = ScratchDir::new()?;
        dir.write("docker-stack.yml", MANIFEST)?;
        dir.write("app.md5sum", "abc")?;
        dir.write("app.md5sum.updated", "abc")?;

        let mut notifier = MockNotifier::new();
        notifier.expect_restart().times(0);
        let action = create_action(&dir, notifier);

        let summary = action.run_pass(&HashMap::new())?;
        assert_eq!(RestartSummary::default(), summary);

        Ok(())
    }

    #[test]
    fn it_should_restart_in_config_order() -> Result<(), Box<dyn Error>> {
        let dir = ScratchDir::new()?;
        dir.write("docker-stack.yml", MANIFEST)?;
        dir.write("db.md5sum", "abc")?;
        dir.write("app.md5sum", "abc")?;

        let mut sequence = Sequence::new();
        let mut notifier = MockNotifier::new();
        notifier
            .expect_restart()
            .with(eq("web"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| ok_response());
        notifier
            .expect_restart()
            .with(eq("db"))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| ok_response());
        let action = create_action(&dir, notifier);

        let summary = action.run_pass(&HashMap::new())?;
        assert_eq!(vec!["app", "db"], summary.changed);
        assert_eq!(vec!["web", "db"], summary.restarted);

        Ok(())
    }

    #[test]
    fn it_should_continue_after_a_failed_restart() -> Result<(), Box<dyn Error>> {
        let dir = ScratchDir::new()?;
        dir.write("docker-stack.yml", MANIFEST)?;
        dir.write("app.md5sum", "abc")?;
        dir.write("db.md5sum", "abc")?;

        let mut notifier = MockNotifier::new();
        notifier
            .expect_restart()
            .with(eq("web"))
            .times(1)
            .returning(|_| Err(RestartError::Network(String::from("timed out"))));
        notifier
            .expect_restart()
            .with(eq("db"))
            .times(1)
            .returning(|_| {
                Ok(RestartResponse {
                    status: 500,
                    body: String::from("no such service"),
                })
            });
        let action = create_action(&dir, notifier);

        let summary = action.run_pass(&HashMap::new())?;
        assert_eq!(vec!["db"], summary.restarted);
        assert_eq!(vec!["web"], summary.failed);

        Ok(())
    }

    #[test]
    fn it_should_stop_if_the_manifest_is_missing() -> Result<(), Box<dyn Error>> {
        let dir = ScratchDir::new()?;
        dir.write("app.md5sum", "abc")?;

        let mut notifier = MockNotifier::new();
        notifier.expect_restart().times(0);
        let action = create_action(&dir, notifier);

        let result = action.run_pass(&HashMap::new());
        assert!(
            matches!(result, Err(RestartChangedError::Manifest(_))),
            "{result:?} should be Manifest"
        );

        let error = action.run(&HashMap::new()).err().unwrap();
        assert!(
            matches!(error, ActionError::FailedAction(_)),
            "{error:?} should be FailedAction"
        );

        Ok(())
    }

    #[test]
    fn it_should_stop_if_the_config_dir_is_missing() {
        let mut notifier = MockNotifier::new();
        notifier.expect_restart().times(0);
        let action = RestartChangedAction::new(
            String::from("/path/to/nowhere"),
            String::from("/data"),
            String::from(DEFAULT_MANIFEST),
            Box::new(notifier),
        );

        let result = action.run_pass(&HashMap::new());
        assert!(
            matches!(result, Err(RestartChangedError::Checksum(_))),
            "{result:?} should be Checksum"
        );
    }

    #[test]
    fn it_should_render_the_paths_from_the_context() -> Result<(), Box<dyn Error>> {
        let dir = ScratchDir::new()?;
        dir.write("docker-stack.yml", MANIFEST)?;
        dir.write("app.md5sum", "abc")?;

        let mut notifier = MockNotifier::new();
        notifier
            .expect_restart()
            .with(eq("web"))
            .times(1)
            .returning(|_| ok_response());
        let action = RestartChangedAction::new(
            String::from("{{ DIRECTORY }}"),
            String::from("/{{ BASE }}"),
            String::from("{{ DIRECTORY }}/docker-stack.yml"),
            Box::new(notifier),
        );

        let context: Context = HashMap::from([
            ("DIRECTORY".to_string(), dir.path().to_string()),
            ("BASE".to_string(), "data".to_string()),
        ]);
        let summary = action.run_pass(&context)?;
        assert_eq!(vec!["web"], summary.restarted);

        let error = action.run(&HashMap::new()).err().unwrap();
        assert!(
            matches!(error, ActionError::Misconfigured(_)),
            "{error:?} should be Misconfigured"
        );

        Ok(())
    }

    #[test]
    fn it_should_post_the_restart_for_the_changed_service() -> Result<(), Box<dyn Error>> {
        let dir = ScratchDir::new()?;
        dir.write("docker-stack.yml", MANIFEST)?;
        dir.write("app.md5sum", "abc")?;
        dir.write("app.md5sum.updated", "def")?;

        let server = Server::http("127.0.0.1:0").map_err(|err| err.to_string())?;
        let address = server.server_addr().to_ip().unwrap();
        let (tx, rx) = mpsc::channel::<String>();
        thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                request.as_reader().read_to_string(&mut body).unwrap();
                tx.send(body).unwrap();
                request.respond(Response::from_string("OK")).unwrap();
            }
        });

        let notifier = HttpNotifier::new(
            format!("http://{address}/restart/service"),
            String::from("s3cr3t"),
            DEFAULT_RESTART_TIMEOUT,
        );
        let action = RestartChangedAction::new(
            dir.path().to_string(),
            String::from("/data"),
            format!("{}/docker-stack.yml", dir.path()),
            Box::new(notifier),
        );

        action.run(&HashMap::new())?;

        let bodies: Vec<String> = rx.try_iter().collect();
        assert_eq!(vec![r#"{"service":"web"}"#], bodies);

        Ok(())
    }
}
