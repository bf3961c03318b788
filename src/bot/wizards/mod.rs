//! Wizard state machines.
//!
//! Three independent finite-state machines share the single wizard slot in
//! each session. The common shape: validated input advances the step,
//! invalid input re-prompts without touching what was already collected,
//! and the terminal step performs its side effect and resets to idle on
//! both success and failure, so a stuck dialog can never persist.

/// Admin wizard - adduser, deleteuser, promote
pub mod admin;
/// Call wizard - collects outbound-call parameters
pub mod call;
/// Invoice wizard - simple actions and the create flow
pub mod invoice;
