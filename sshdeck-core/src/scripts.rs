//! Auxiliary script directory listing.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local};

/// Timestamp format used for the modification column
pub const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Kind of directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory
    Dir,
    /// Anything else
    File,
}

impl EntryKind {
    /// Column label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dir => "DIR",
            Self::File => "FILE",
        }
    }
}

/// One entry of the scripts directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    /// File name
    pub name: String,
    /// `drwxr-xr-x` style permission string
    pub permissions: String,
    /// Owner uid, where the platform has one
    pub owner: Option<u32>,
    /// Last modification time
    pub modified: DateTime<Local>,
    /// Entry kind
    pub kind: EntryKind,
}

impl ScriptEntry {
    /// Modification time formatted with [`MODIFIED_FORMAT`]
    #[must_use]
    pub fn modified_display(&self) -> String {
        self.modified.format(MODIFIED_FORMAT).to_string()
    }
}

/// Lists `dir`, sorted by name
///
/// # Errors
///
/// Returns an error if the directory cannot be read, including when it does
/// not exist.
pub fn list_scripts(dir: &Path) -> io::Result<Vec<ScriptEntry>> {
    let mut entries = Vec::new();
    for item in fs::read_dir(dir)? {
        let item = item?;
        let metadata = item.metadata()?;
        let kind = if metadata.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        entries.push(ScriptEntry {
            name: item.file_name().to_string_lossy().into_owned(),
            permissions: permission_string(&metadata),
            owner: owner_uid(&metadata),
            modified: metadata.modified().map_or_else(|_| Local::now(), DateTime::from),
            kind,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(dir = %dir.display(), count = entries.len(), "Listed scripts");
    Ok(entries)
}

#[cfg(unix)]
fn permission_string(metadata: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format_mode(metadata.is_dir(), metadata.permissions().mode())
}

#[cfg(not(unix))]
fn permission_string(metadata: &fs::Metadata) -> String {
    let mode = if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    };
    format_mode(metadata.is_dir(), mode)
}

#[cfg(unix)]
fn owner_uid(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.uid())
}

#[cfg(not(unix))]
const fn owner_uid(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

/// Renders permission bits as `drwxr-xr-x`
#[must_use]
pub fn format_mode(is_dir: bool, mode: u32) -> String {
    const FLAGS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    let mut out = String::with_capacity(10);
    out.push(if is_dir { 'd' } else { '-' });
    for (bit, ch) in FLAGS {
        out.push(if mode & bit == 0 { '-' } else { ch });
    }
    out
}
