use log::{debug, trace};
use serde::Deserialize;
use std::{collections::BTreeMap, fs, io, path::Path};
use thiserror::Error;

/// A custom error describing the error cases for reading the service manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file doesn't exist or cannot be read.
    #[error("cannot read manifest {0}: {1}")]
    Unreadable(String, io::Error),
    /// The manifest is not valid YAML or doesn't have a `services` mapping.
    #[error("cannot parse manifest {0}: {1}")]
    Malformed(String, serde_yaml::Error),
}

/// A volume of a service, either in the short `source[:target[:mode]]` form
/// or in the long form with named keys.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VolumeEntry {
    Short(String),
    Long {
        source: Option<String>,
        target: Option<String>,
        #[serde(default)]
        read_only: bool,
    },
}

/// A parsed volume mount specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    pub source: String,
    pub target: Option<String>,
    pub mode: Option<String>,
}

impl VolumeSpec {
    /// Split a `source[:target[:mode]]` string into its parts.
    pub fn parse(spec: &str) -> Self {
        let mut parts = spec.splitn(3, ':');
        let source = parts.next().unwrap_or_default().to_string();
        let target = parts.next().map(String::from);
        let mode = parts.next().map(String::from);

        VolumeSpec {
            source,
            target,
            mode,
        }
    }
}

impl From<&VolumeEntry> for VolumeSpec {
    fn from(entry: &VolumeEntry) -> Self {
        match entry {
            VolumeEntry::Short(spec) => VolumeSpec::parse(spec),
            VolumeEntry::Long {
                source,
                target,
                read_only,
            } => VolumeSpec {
                source: source.clone().unwrap_or_default(),
                target: target.clone(),
                mode: read_only.then(|| String::from("ro")),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ServiceEntry {
    #[serde(default)]
    volumes: Option<Vec<VolumeEntry>>,
}

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    services: BTreeMap<String, Option<ServiceEntry>>,
}

/// A service declared in the manifest with its volume mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDeclaration {
    pub name: String,
    pub volumes: Vec<VolumeSpec>,
}

impl ServiceDeclaration {
    /// Checks if any of the volume sources starts with the path.
    ///
    /// This is a prefix match on purpose, so directory mounts are also found. It also means
    /// that the path `/data/db` matches a volume from `/data/db-backup`.
    pub fn mounts(&self, path: &str) -> bool {
        self.volumes
            .iter()
            .any(|volume| volume.source.starts_with(path))
    }
}

/// The services of a multi-service stack file, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceManifest {
    pub services: Vec<ServiceDeclaration>,
}

impl ServiceManifest {
    /// Parse the manifest from a YAML string, the `path` is only used for errors.
    pub fn parse(contents: &str, path: &str) -> Result<Self, ManifestError> {
        let malformed = |err| ManifestError::Malformed(path.to_string(), err);
        // Anchors are resolved by the parser, but merge keys have to be applied.
        let mut value: serde_yaml::Value = serde_yaml::from_str(contents).map_err(malformed)?;
        value.apply_merge().map_err(malformed)?;
        let document: ManifestDocument = serde_yaml::from_value(value).map_err(malformed)?;

        let services = document
            .services
            .into_iter()
            .map(|(name, entry)| ServiceDeclaration {
                name,
                volumes: entry
                    .unwrap_or_default()
                    .volumes
                    .unwrap_or_default()
                    .iter()
                    .map(VolumeSpec::from)
                    .collect(),
            })
            .collect();

        Ok(ServiceManifest { services })
    }

    /// Read and parse the manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let display = path.to_string_lossy().to_string();
        let contents =
            fs::read_to_string(path).map_err(|err| ManifestError::Unreadable(display.clone(), err))?;

        ServiceManifest::parse(&contents, &display)
    }

    /// Find every service that mounts the given path.
    pub fn services_mounting(&self, path: &str) -> Vec<String> {
        self.services
            .iter()
            .filter(|service| !service.volumes.is_empty())
            .filter(|service| service.mounts(path))
            .map(|service| service.name.clone())
            .collect()
    }
}

/// Find the services that mount the configuration under the volume base directory.
///
/// The manifest is parsed again on every call, so it always reflects the file on disk.
pub fn resolve_services(
    manifest_path: &Path,
    volume_base_dir: &str,
    config_name: &str,
) -> Result<Vec<String>, ManifestError> {
    let manifest = ServiceManifest::load(manifest_path)?;
    trace!(
        "Loaded {} services from {}.",
        manifest.services.len(),
        manifest_path.to_string_lossy()
    );

    let config_path = Path::new(volume_base_dir).join(config_name);
    let config_path = config_path.to_string_lossy();
    let services = manifest.services_mounting(&config_path);
    debug!("Services mounting {config_path}: {services:?}.");

    Ok(services)
}
