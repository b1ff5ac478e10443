//! Template filesystem loading from TOML.
//!
//! A template is a flat list of `[[node]]` tables inserted in document order.
//! Every session starts from a deep clone of one parsed template.

use std::path::Path;

use archterm_types::error::{Result, ShellError};
use serde::Deserialize;

use crate::memory::{EPOCH_LABEL, MemoryVfs};
use crate::node::{DIR_SIZE, Node, NodeKind};
use crate::path::normalize;

/// The Arch-flavoured tree shipped with the binary.
pub const DEFAULT_TEMPLATE: &str = include_str!("../template/default_fs.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindDef {
    File,
    Dir,
}

/// One `[[node]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeDef {
    path: String,
    kind: KindDef,
    perms: Option<String>,
    #[serde(default = "default_owner")]
    owner: String,
    size: Option<u64>,
    mtime: Option<String>,
    content: Option<String>,
}

fn default_owner() -> String {
    "root".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct TemplateDoc {
    #[serde(default)]
    node: Vec<NodeDef>,
}

impl NodeDef {
    fn into_entry(self) -> Result<(String, Node)> {
        if normalize(&self.path) != self.path {
            return Err(ShellError::Config(format!(
                "template path '{}' is not canonical",
                self.path
            )));
        }
        let mtime = self.mtime.unwrap_or_else(|| EPOCH_LABEL.to_string());
        let node = match self.kind {
            KindDef::Dir => {
                if self.content.is_some() {
                    return Err(ShellError::Config(format!(
                        "template directory '{}' has content",
                        self.path
                    )));
                }
                Node {
                    kind: NodeKind::Dir,
                    perms: self.perms.unwrap_or_else(|| "drwxr-xr-x".to_string()),
                    owner: self.owner,
                    size: self.size.unwrap_or(DIR_SIZE),
                    mtime,
                }
            },
            KindDef::File => {
                let content = self.content.unwrap_or_default();
                Node {
                    size: self.size.unwrap_or(content.len() as u64),
                    kind: NodeKind::File { content },
                    perms: self.perms.unwrap_or_else(|| "-rw-r--r--".to_string()),
                    owner: self.owner,
                    mtime,
                }
            },
        };
        Ok((self.path, node))
    }
}

/// Parse a template document into a filesystem.
pub fn from_toml_str(text: &str) -> Result<MemoryVfs> {
    let doc: TemplateDoc = toml::from_str(text)?;
    let mut vfs = MemoryVfs::new();
    for def in doc.node {
        let (path, node) = def.into_entry()?;
        if path == "/" && !node.is_dir() {
            return Err(ShellError::Config("template root must be a directory".into()));
        }
        vfs.insert(path, node);
    }
    log::debug!("parsed template with {} entries", vfs.len());
    Ok(vfs)
}

/// Read and parse a template file.
pub fn load(path: &Path) -> Result<MemoryVfs> {
    let text = std::fs::read_to_string(path)?;
    log::info!("loading template filesystem from {}", path.display());
    from_toml_str(&text)
}

/// The built-in template.
pub fn default_template() -> Result<MemoryVfs> {
    from_toml_str(DEFAULT_TEMPLATE)
}
