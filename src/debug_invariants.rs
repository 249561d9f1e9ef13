//! Opt-in structural self-checks.
//!
//! Builders and containers implement [`DebugInvariants`]; the checks run on
//! construction in debug builds or when the `strict-invariants` /
//! `check-invariants` features are on, and are always available on demand via
//! [`DebugInvariants::validate_invariants`].

use crate::graph_error::GraphError;

/// Whether construction-time invariant checks are compiled in.
pub const INVARIANTS_ENABLED: bool = cfg!(any(
    debug_assertions,
    feature = "strict-invariants",
    feature = "check-invariants"
));

/// Structures that can validate their own invariants.
pub trait DebugInvariants {
    /// Validate invariants and return the first violation found.
    fn validate_invariants(&self) -> Result<(), GraphError>;

    /// Panic on a violation when invariant checking is enabled.
    fn debug_assert_invariants(&self) {
        if INVARIANTS_ENABLED {
            if let Err(e) = self.validate_invariants() {
                panic!("[invariants] {e}");
            }
        }
    }
}

/// Run a fallible check and panic with context when invariant checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
