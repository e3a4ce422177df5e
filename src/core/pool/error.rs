//=========================================================================
// Pool Errors
//=========================================================================

//=== PoolError ===========================================================

/// Recoverable failures reported by [`super::ObjectPool`].
///
/// None of these leave the pool in an inconsistent state. Callers driving
/// a frame loop typically log and move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The template key was never registered with this pool.
    PoolNotFound(String),

    /// A template with the same key is already registered; the first wins.
    DuplicateTemplate(String),

    /// The instance was created by a different pool.
    ForeignInstance,

    /// The instance is no longer attached to a live pool.
    Detached,

    /// The pooled object is borrowed by the host; its state was left as is.
    Busy,
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PoolNotFound(key) => write!(f, "No pool registered for template {}", key),
            Self::DuplicateTemplate(key) => write!(f, "Template {} has already been pooled", key),
            Self::ForeignInstance => write!(f, "Instance belongs to a different pool"),
            Self::Detached => write!(f, "Instance is not attached to a live pool"),
            Self::Busy => write!(f, "Pooled object is borrowed elsewhere"),
        }
    }
}

impl std::error::Error for PoolError {}

//=========================================================================
// Unit Tests
//=========================================================================
