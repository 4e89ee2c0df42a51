//! Ray-tracer contract errors.

use thiserror::Error;

/// Errors raised by tracer backends. Both indicate caller mistakes caught
/// at the call site; neither is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TracerError {
    /// The cached backend requires one `update()` before the first scan.
    #[error("tracer cache not synchronized: call update() before scan()")]
    NotSynchronized,

    /// The mount pose batch does not match the geometry snapshot batch.
    #[error("mount pose batch mismatch: expected {expected} environments, got {got}")]
    MountBatchMismatch { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            TracerError::NotSynchronized.to_string(),
            "tracer cache not synchronized: call update() before scan()"
        );
        assert_eq!(
            TracerError::MountBatchMismatch {
                expected: 4,
                got: 1
            }
            .to_string(),
            "mount pose batch mismatch: expected 4 environments, got 1"
        );
    }
}
