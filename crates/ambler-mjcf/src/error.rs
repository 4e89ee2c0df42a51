//! Error types for MJCF parsing and asset resolution.

use std::path::PathBuf;

/// Errors that can occur while loading a scene description.
#[derive(Debug, thiserror::Error)]
pub enum MjcfError {
    /// Failed to read the scene file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Malformed XML or structurally invalid document.
    #[error("MJCF parse error: {0}")]
    Parse(String),

    /// A required attribute is missing.
    #[error("missing attribute `{attr}` on <{tag}>")]
    MissingAttribute { tag: String, attr: String },

    /// An attribute value could not be parsed.
    #[error("bad attribute `{attr}` on <{tag}>: {value}")]
    BadAttribute {
        tag: String,
        attr: String,
        value: String,
    },

    /// Invalid or unsupported joint type.
    #[error("unsupported joint type: {0}")]
    UnsupportedJointType(String),

    /// Invalid or unsupported geom type.
    #[error("unsupported geom type: {0}")]
    UnsupportedGeomType(String),

    /// A mesh asset was referenced but not provided in the asset map nor
    /// found on disk next to the scene file.
    #[error("missing asset: {0}")]
    MissingAsset(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = MjcfError::Parse("unexpected end of document".into());
        assert_eq!(e.to_string(), "MJCF parse error: unexpected end of document");

        let e = MjcfError::MissingAttribute {
            tag: "motor".into(),
            attr: "joint".into(),
        };
        assert_eq!(e.to_string(), "missing attribute `joint` on <motor>");

        let e = MjcfError::BadAttribute {
            tag: "body".into(),
            attr: "pos".into(),
            value: "a b c".into(),
        };
        assert_eq!(e.to_string(), "bad attribute `pos` on <body>: a b c");

        let e = MjcfError::UnsupportedJointType("planar".into());
        assert_eq!(e.to_string(), "unsupported joint type: planar");

        let e = MjcfError::MissingAsset("trunk.stl".into());
        assert_eq!(e.to_string(), "missing asset: trunk.stl");
    }

    #[test]
    fn io_error_includes_path() {
        let e = MjcfError::Io {
            path: PathBuf::from("/tmp/scene.xml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/scene.xml"));
        assert!(msg.contains("not found"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_is_send_sync() {
        assert_send_sync::<MjcfError>();
    }
}
