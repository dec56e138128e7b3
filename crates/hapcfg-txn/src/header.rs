//! The `# _version=N` header line.
//!
//! The committed file and every staged snapshot record their version on the
//! first line. To the engine it is an ordinary comment and is carried
//! through load/save untouched; only commit rewrites it.

use std::fs;
use std::path::Path;

use hapcfg_types::Version;

use crate::error::{TxnError, TxnResult};

pub const VERSION_PREFIX: &str = "# _version=";

/// Read the version recorded in the file at `path`.
///
/// A file without a header has never been committed to and is at
/// [`Version::INITIAL`].
pub fn read_version(path: &Path) -> TxnResult<Version> {
    let text = fs::read_to_string(path)?;
    version_of(&text).ok_or_else(|| TxnError::InvalidVersionHeader {
        path: path.to_path_buf(),
        line: text.lines().next().unwrap_or_default().to_string(),
    })
}

/// The version recorded in `text`, or `None` if the header is malformed.
pub fn version_of(text: &str) -> Option<Version> {
    match text.lines().next().and_then(|l| l.strip_prefix(VERSION_PREFIX)) {
        Some(value) => value.parse().ok(),
        None => Some(Version::INITIAL),
    }
}

/// Return `text` with its header set to `version`, adding one if missing.
pub fn stamp_version(text: &str, version: Version) -> String {
    let body = match text.split_once('\n') {
        Some((first, rest)) if first.starts_with(VERSION_PREFIX) => rest,
        None if text.starts_with(VERSION_PREFIX) => "",
        _ => text,
    };
    format!("{VERSION_PREFIX}{version}\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_header() {
        assert_eq!(version_of("# _version=12\nglobal\n"), Some(Version::new(12)));
    }

    #[test]
    fn missing_header_is_initial() {
        assert_eq!(version_of("global\n  daemon\n"), Some(Version::INITIAL));
        assert_eq!(version_of(""), Some(Version::INITIAL));
    }

    #[test]
    fn malformed_header() {
        assert_eq!(version_of("# _version=abc\n"), None);
    }

    #[test]
    fn stamp_replaces_existing_header() {
        let out = stamp_version("# _version=3\nglobal\n", Version::new(4));
        assert_eq!(out, "# _version=4\nglobal\n");
    }

    #[test]
    fn stamp_adds_missing_header() {
        let out = stamp_version("global\n", Version::new(2));
        assert_eq!(out, "# _version=2\nglobal\n");
    }

    #[test]
    fn stamp_header_only_file() {
        assert_eq!(stamp_version("# _version=1", Version::new(2)), "# _version=2\n");
    }

    #[test]
    fn read_version_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.cfg");
        fs::write(&path, "# _version=x\n").unwrap();
        assert!(matches!(
            read_version(&path),
            Err(TxnError::InvalidVersionHeader { .. })
        ));
        fs::write(&path, "# _version=9\n").unwrap();
        assert_eq!(read_version(&path).unwrap(), Version::new(9));
    }
}
