//! Manifest files for `gpuinfod apply`.
//!
//! ```toml
//! [[nodes]]
//! name = "worker-1"
//!
//! [[requests]]
//! namespace = "ml"
//! name = "train"
//! spec = { desAccTime = 350, gpuRequired = true }
//! ```

use std::path::Path;

use gpuinfo_core::PlacementRequest;
use gpuinfo_state::{GpuInfo, NodeInfo, StateStore};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub nodes: Vec<NodeInfo>,
    pub requests: Vec<RequestEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RequestEntry {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub name: String,
    pub spec: PlacementRequest,
}

fn default_namespace() -> String {
    "default".to_string()
}

/// What `apply` wrote.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Applied {
    pub nodes: usize,
    pub requests: usize,
}

impl Manifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Write every node and request into the store. Existing requests keep
    /// their status.
    pub fn apply(&self, store: &StateStore) -> anyhow::Result<Applied> {
        for node in &self.nodes {
            store.put_node(node)?;
        }
        for entry in &self.requests {
            let request = GpuInfo::new(&entry.namespace, &entry.name, entry.spec);
            let version = store.put_request(&request)?;
            info!(request = %request.table_key(), version, "request applied");
        }
        Ok(Applied {
            nodes: self.nodes.len(),
            requests: self.requests.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[[nodes]]
name = "worker-1"

[[nodes]]
name = "worker-2"
labels = { zone = "a" }

[[requests]]
namespace = "ml"
name = "train"
spec = { desAccTime = 350, gpuRequired = true }

[[requests]]
name = "batch"
spec = { desAccTime = 0, gpuRequired = false }
"#;

    #[test]
    fn parses_and_applies() {
        let manifest: Manifest = toml::from_str(MANIFEST).unwrap();
        let store = StateStore::open_in_memory().unwrap();

        let applied = manifest.apply(&store).unwrap();

        assert_eq!(
            applied,
            Applied {
                nodes: 2,
                requests: 2
            }
        );
        let nodes = store.list_nodes().unwrap();
        assert_eq!(nodes.len(), 2);
        let train = store.get_request("ml/train").unwrap().unwrap();
        assert_eq!(train.spec.desired_access_time, 350);
        assert!(train.spec.gpu_required);
        assert!(store.get_request("default/batch").unwrap().is_some());
    }

    #[test]
    fn negative_access_time_is_rejected() {
        let manifest: Manifest = toml::from_str(
            r#"
[[requests]]
name = "bad"
spec = { desAccTime = -1, gpuRequired = false }
"#,
        )
        .unwrap();
        let store = StateStore::open_in_memory().unwrap();

        assert!(manifest.apply(&store).is_err());
        assert!(store.get_request("default/bad").unwrap().is_none());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.toml");
        std::fs::write(&path, MANIFEST).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.nodes.len(), 2);
        assert_eq!(manifest.requests[1].namespace, "default");
    }
}
