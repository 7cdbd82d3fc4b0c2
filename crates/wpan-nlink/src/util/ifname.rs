//! Network interface name and index resolution through sysfs.

use std::path::Path;

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

const SYS_CLASS_NET: &str = "/sys/class/net";

/// Error type for interface and PHY lookups.
#[derive(Debug, thiserror::Error)]
pub enum IfError {
    #[error("interface not found: {0}")]
    NotFound(String),

    #[error("invalid interface name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IfError>;

/// Validate an interface name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(IfError::InvalidName("empty name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(IfError::InvalidName(format!(
            "name too long (max {} chars)",
            IFNAMSIZ - 1
        )));
    }

    if name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(IfError::InvalidName(
            "name contains invalid characters".to_string(),
        ));
    }

    if name.chars().any(|c| c.is_whitespace()) {
        return Err(IfError::InvalidName("name contains whitespace".to_string()));
    }

    Ok(())
}

/// Convert an interface name to index.
pub fn name_to_index(name: &str) -> Result<u32> {
    validate(name)?;
    read_index(Path::new(SYS_CLASS_NET), name, "ifindex")
}

/// Convert an interface index to name.
pub fn index_to_name(index: u32) -> Result<String> {
    find_by_index(Path::new(SYS_CLASS_NET), index, "ifindex")
}

/// Interface name, or `if<N>` when the index no longer resolves.
pub fn index_to_name_or_fallback(index: u32) -> String {
    index_to_name(index).unwrap_or_else(|_| format!("if{}", index))
}

/// Read `<root>/<name>/<file>` as a decimal index.
pub(crate) fn read_index(root: &Path, name: &str, file: &str) -> Result<u32> {
    let path = root.join(name).join(file);
    let content =
        std::fs::read_to_string(&path).map_err(|_| IfError::NotFound(name.to_string()))?;

    content
        .trim()
        .parse()
        .map_err(|_| IfError::NotFound(name.to_string()))
}

/// Find the entry under `root` whose `<file>` holds `index`.
pub(crate) fn find_by_index(root: &Path, index: u32, file: &str) -> Result<String> {
    let entries = std::fs::read_dir(root)?;

    for entry in entries.flatten() {
        let path = entry.path().join(file);
        if let Ok(content) = std::fs::read_to_string(&path)
            && let Ok(idx) = content.trim().parse::<u32>()
            && idx == index
        {
            return Ok(entry.file_name().to_string_lossy().to_string());
        }
    }

    Err(IfError::NotFound(format!("index {}", index)))
}
