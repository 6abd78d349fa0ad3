use crate::events::{Event, EventList};
use anyhow::Context;
use migwatch_core::ResourceCollection;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Everything one refresh tick renders from.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Migrations, plans and providers of the watched namespace.
    pub resources: ResourceCollection,
    /// Storage transfers of every namespace.
    pub transfers: ResourceCollection,
    pub events: Vec<Event>,
}

pub trait SnapshotSource {
    fn fetch(&self, with_events: bool) -> anyhow::Result<Snapshot>;
}

/// Reads the cluster through the `oc` client.
pub struct OcSource {
    namespace: String,
}

impl OcSource {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
        }
    }

    /// Run `oc <args> -o json`. A failed call yields an empty value so the
    /// dashboard keeps rendering.
    fn oc_json<T: DeserializeOwned + Default>(&self, args: &[&str]) -> T {
        debug!("oc {}", args.join(" "));
        let output = Command::new("oc")
            .args(args)
            .args(["-o", "json"])
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) if output.status.success() => serde_json::from_slice(&output.stdout)
                .unwrap_or_else(|err| {
                    warn!("Could not decode `oc {}` output: {}", args.join(" "), err);
                    T::default()
                }),
            Ok(output) => {
                warn!("`oc {}` exited with {}", args.join(" "), output.status);
                T::default()
            }
            Err(err) => {
                warn!("Could not run oc: {}", err);
                T::default()
            }
        }
    }
}

impl SnapshotSource for OcSource {
    fn fetch(&self, with_events: bool) -> anyhow::Result<Snapshot> {
        let ns = self.namespace.as_str();
        let resources = self.oc_json(&["-n", ns, "get", "migration,plan,provider"]);
        let transfers = self.oc_json(&["get", "datavolume", "-A"]);
        let events = if with_events {
            self.oc_json::<EventList>(&["-n", ns, "get", "events"]).items
        } else {
            Vec::new()
        };

        Ok(Snapshot {
            resources,
            transfers,
            events,
        })
    }
}

/// Reads previously saved `oc ... -o json` output.
pub struct FileSource {
    pub resources: PathBuf,
    pub transfers: Option<PathBuf>,
    pub events: Option<PathBuf>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents =
        fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&contents).with_context(|| format!("decoding {}", path.display()))
}

impl SnapshotSource for FileSource {
    fn fetch(&self, with_events: bool) -> anyhow::Result<Snapshot> {
        let resources = read_json(&self.resources)?;
        let transfers = match &self.transfers {
            Some(path) => read_json(path)?,
            None => ResourceCollection::default(),
        };
        let events = match (&self.events, with_events) {
            (Some(path), true) => read_json::<EventList>(path)?.items,
            _ => Vec::new(),
        };

        Ok(Snapshot {
            resources,
            transfers,
            events,
        })
    }
}
