//! Runtime invariants with contract-test support.
//!
//! Production code asserts structural invariants of the capture bundle with
//! [`assert_invariant!`]. Every assertion is recorded per thread, so a test
//! can drive a scenario and then demand that the invariants it cares about
//! were actually evaluated along the way.
//!
//! ```rust
//! use backgroundcam::assert_invariant;
//! use backgroundcam::invariant_ppt::{contract_test, clear_invariant_log};
//!
//! clear_invariant_log();
//! let sinks = 1;
//! assert_invariant!(sinks > 0, "Session needs at least one sink", "example");
//! contract_test("example", &["Session needs at least one sink"]);
//! ```

use std::cell::RefCell;
use std::collections::BTreeSet;

thread_local! {
    static CHECKED: RefCell<BTreeSet<String>> = const { RefCell::new(BTreeSet::new()) };
}

/// Assert an invariant and record that it was evaluated.
///
/// Panics with the invariant text when the condition is false.
#[macro_export]
macro_rules! assert_invariant {
    ($condition:expr, $message:expr) => {
        $crate::invariant_ppt::__check_invariant($condition, $message, None)
    };
    ($condition:expr, $message:expr, $context:expr) => {
        $crate::invariant_ppt::__check_invariant($condition, $message, Some($context))
    };
}

#[doc(hidden)]
pub fn __check_invariant(condition: bool, message: &str, context: Option<&str>) {
    CHECKED.with(|checked| {
        checked.borrow_mut().insert(message.to_string());
    });

    if !condition {
        panic!(
            "invariant violated [{}]: {}",
            context.unwrap_or("backgroundcam"),
            message
        );
    }
}

/// Invariants evaluated on this thread since the last clear.
pub fn checked_invariants() -> Vec<String> {
    CHECKED.with(|checked| checked.borrow().iter().cloned().collect())
}

/// Panic unless every invariant in `required` was evaluated on this thread.
pub fn contract_test(test_name: &str, required: &[&str]) {
    let checked = CHECKED.with(|checked| checked.borrow().clone());
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|inv| !checked.contains(*inv))
        .collect();

    if !missing.is_empty() {
        panic!(
            "contract '{}' not exercised, unchecked invariants:\n  - {}",
            test_name,
            missing.join("\n  - ")
        );
    }
}

pub fn clear_invariant_log() {
    CHECKED.with(|checked| checked.borrow_mut().clear());
}
