//! Error types for model compilation and named lookups.

use thiserror::Error;

/// Errors raised while compiling or querying a scene model.
///
/// All of these are terminal configuration errors: they surface once, at
/// construction or lookup, and are never retried.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene description error: {0}")]
    Mjcf(#[from] ambler_mjcf::MjcfError),

    #[error("missing body: {0}")]
    MissingBody(String),

    #[error("missing joint: {0}")]
    MissingJoint(String),

    #[error("missing site: {0}")]
    MissingSite(String),

    #[error("missing keyframe: {0}")]
    MissingKeyframe(String),

    #[error("keyframe index {index} out of range (model has {nkey} keyframes)")]
    KeyframeIndex { index: usize, nkey: usize },

    #[error("keyframe `{key}` {field} has length {got}, expected {expected}")]
    KeyframeSize {
        key: String,
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("free joint must be the only joint on body `{0}`")]
    FreeJointNotAlone(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            SceneError::MissingBody("base".into()).to_string(),
            "missing body: base"
        );
        assert_eq!(
            SceneError::MissingSite("lidar".into()).to_string(),
            "missing site: lidar"
        );
        assert_eq!(
            SceneError::MissingKeyframe("home".into()).to_string(),
            "missing keyframe: home"
        );
        assert_eq!(
            SceneError::KeyframeIndex { index: 3, nkey: 1 }.to_string(),
            "keyframe index 3 out of range (model has 1 keyframes)"
        );
        assert_eq!(
            SceneError::KeyframeSize {
                key: "home".into(),
                field: "qpos",
                expected: 19,
                got: 7
            }
            .to_string(),
            "keyframe `home` qpos has length 7, expected 19"
        );
        assert_eq!(
            SceneError::FreeJointNotAlone("base".into()).to_string(),
            "free joint must be the only joint on body `base`"
        );
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_is_send_sync() {
        assert_send_sync::<SceneError>();
    }
}
