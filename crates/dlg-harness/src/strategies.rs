//! Proptest strategies for random dialog activity.

use proptest::prelude::*;

/// One step of simulated user activity against a harness.
#[derive(Debug, Clone, PartialEq)]
pub enum StackOp {
    /// Open a dialog; `overlay` selects the backdrop.
    Open { overlay: bool, vetoing: bool },
    /// Activate the n-th dialog (modulo length).
    Activate(usize),
    /// Confirm the n-th dialog.
    Confirm(usize),
    /// Cancel the n-th dialog.
    Cancel(usize),
    /// Force-destroy the n-th dialog.
    Destroy(usize),
    Hide(usize),
    CloseAll,
}

/// Weighted towards opening so sequences build real stacks.
pub fn stack_op() -> impl Strategy<Value = StackOp> {
    prop_oneof![
        4 => (any::<bool>(), prop::bool::weighted(0.2))
            .prop_map(|(overlay, vetoing)| StackOp::Open { overlay, vetoing }),
        3 => (0usize..32).prop_map(StackOp::Activate),
        2 => (0usize..32).prop_map(StackOp::Confirm),
        1 => (0usize..32).prop_map(StackOp::Cancel),
        1 => (0usize..32).prop_map(StackOp::Destroy),
        1 => (0usize..32).prop_map(StackOp::Hide),
        1 => Just(StackOp::CloseAll),
    ]
}

/// A sequence of `len` operations.
pub fn stack_ops(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<StackOp>> {
    prop::collection::vec(stack_op(), len)
}
