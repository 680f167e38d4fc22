//! Reader for the kernel's per-process mount table.
//!
//! Each line of `/proc/self/mountinfo` looks like
//!
//! ```text
//! 36 35 98:0 /mnt1 /mnt2 rw,noatime master:1 - ext3 /dev/root rw,errors=continue
//! (1)(2)(3)   (4)   (5)      (6)      (7)   (8) (9)    (10)        (11)
//! ```
//!
//! Field 7 is a variable-length list of tagged optional fields terminated by
//! the lone `-` at position 8. The filesystem type follows the separator.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ports::LimitSource;

pub const MOUNTINFO_PATH: &str = "/proc/self/mountinfo";

const SEPARATOR: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub mount_id: String,
    pub parent_id: String,
    pub major_minor: String,
    pub mount_root: PathBuf,
    pub mount_point: PathBuf,
    pub flags: BTreeSet<String>,
    pub optional_fields: Vec<String>,
    pub fs_type: String,
}

impl MountRecord {
    /// Parses one mountinfo line. Returns `None` for blank lines and for
    /// lines missing the separator or the filesystem type.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let mut fields = line.split_whitespace();
        let mount_id = fields.next()?;
        let parent_id = fields.next()?;
        let major_minor = fields.next()?;
        let mount_root = fields.next()?;
        let mount_point = fields.next()?;
        let flags = fields.next()?;

        let mut optional_fields = Vec::new();
        loop {
            let field = fields.next()?;
            if field == SEPARATOR {
                break;
            }
            optional_fields.push(field.to_string());
        }
        let fs_type = fields.next()?;

        Some(Self {
            mount_id: mount_id.to_string(),
            parent_id: parent_id.to_string(),
            major_minor: major_minor.to_string(),
            mount_root: PathBuf::from(unescape(mount_root)),
            mount_point: PathBuf::from(unescape(mount_point)),
            flags: flags
                .split(',')
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
            optional_fields,
            fs_type: fs_type.to_string(),
        })
    }
}

/// Parses a whole mount table, skipping lines that do not parse.
pub fn parse_mount_table(content: &str) -> Vec<MountRecord> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let record = MountRecord::parse(line);
            if record.is_none() {
                debug!(line = %line, "skipping malformed mountinfo line");
            }
            record
        })
        .collect()
}

/// Reads and parses the mount table at `path`. Any failure degrades to an
/// empty table.
#[cfg(target_os = "linux")]
pub fn read_mounts(source: &dyn LimitSource, path: &Path) -> Vec<MountRecord> {
    match source.read_to_string(path) {
        Ok(content) => parse_mount_table(&content),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not read mount table");
            Vec::new()
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn read_mounts(_source: &dyn LimitSource, _path: &Path) -> Vec<MountRecord> {
    Vec::new()
}

/// Decodes the `\ooo` octal escapes the kernel uses for whitespace and
/// backslashes in paths.
fn unescape(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
