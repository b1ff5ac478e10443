//! Filesystem entries.

/// What a node is. Content lives inside the `File` variant, so a directory
/// can never carry any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File { content: String },
    Dir,
}

/// One filesystem entry with its `ls -l` metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Permission string, e.g. `-rw-r--r--`.
    pub perms: String,
    pub owner: String,
    pub size: u64,
    /// Modification-time label, e.g. `Jan  1 00:00`.
    pub mtime: String,
}

/// Directory size reported by `ls -l`.
pub const DIR_SIZE: u64 = 4096;

/// Owner of nodes created by the session user.
pub const DEFAULT_OWNER: &str = "user";

impl Node {
    /// A fresh `drwxr-xr-x` directory owned by the session user.
    pub fn dir(mtime: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Dir,
            perms: "drwxr-xr-x".to_string(),
            owner: DEFAULT_OWNER.to_string(),
            size: DIR_SIZE,
            mtime: mtime.into(),
        }
    }

    /// A fresh, empty `-rw-r--r--` file owned by the session user.
    pub fn empty_file(mtime: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::File {
                content: String::new(),
            },
            perms: "-rw-r--r--".to_string(),
            owner: DEFAULT_OWNER.to_string(),
            size: 0,
            mtime: mtime.into(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Dir)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// File content, or `None` for directories.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content } => Some(content),
            NodeKind::Dir => None,
        }
    }

    /// Number of 512-byte blocks, rounded up.
    pub fn blocks(&self) -> u64 {
        self.size.div_ceil(512)
    }

    /// Octal form of the permission string (`-rw-r--r--` -> `0644`).
    pub fn octal_mode(&self) -> String {
        let bits: Vec<char> = self.perms.chars().skip(1).collect();
        let mut out = String::from("0");
        for triple in bits.chunks(3) {
            let mut digit = 0u8;
            for (i, weight) in [4u8, 2, 1].iter().enumerate() {
                if triple.get(i).is_some_and(|c| *c != '-') {
                    digit += weight;
                }
            }
            out.push(char::from(b'0' + digit));
        }
        out
    }
}
