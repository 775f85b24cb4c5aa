//! Toolchain listing: read-only lookup over the registry of known installations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One installed toolchain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    pub name: String,
    pub path: PathBuf,
}

pub trait ToolchainRegistry {
    fn installations(&self) -> Vec<Installation>;
}

/// Registry backed by a fixed list (from settings).
#[derive(Clone, Debug, Default)]
pub struct StaticToolchainRegistry {
    installations: Vec<Installation>,
}

impl StaticToolchainRegistry {
    pub fn new(installations: Vec<Installation>) -> Self {
        Self { installations }
    }
}

impl ToolchainRegistry for StaticToolchainRegistry {
    fn installations(&self) -> Vec<Installation> {
        self.installations.clone()
    }
}

pub struct ToolchainQueryService<R> {
    registry: R,
}

impl<R: ToolchainRegistry> ToolchainQueryService<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    /// `* name (path)` per installation, newline separated. Empty when none are known.
    pub fn query(&self) -> String {
        self.registry
            .installations()
            .iter()
            .map(|i| format!("* {} ({})", i.name, i.path.display()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
