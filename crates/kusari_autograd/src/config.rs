use std::cell::Cell;

/// How multiple gradient contributions flowing into the same node are combined.
///
/// `Eager` adds each new contribution into a single running gradient as soon as
/// it arrives. `Lazy` keeps every contribution in a list and sums the list once
/// when the total is needed. The two policies produce bitwise-different floats
/// for three or more contributions because the summation order differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradAccumPolicy {
    Eager,
    Lazy,
}

thread_local! {
    static BACKPROP_ENABLED: Cell<bool> = const { Cell::new(true) };
    static DEBUG_MODE: Cell<bool> = const { Cell::new(false) };
    static GRAD_ACCUM_POLICY: Cell<GradAccumPolicy> = const { Cell::new(GradAccumPolicy::Eager) };
    static STRICT_NONFINITE_CHECK: Cell<bool> = const { Cell::new(false) };
}

pub fn backprop_enabled() -> bool {
    BACKPROP_ENABLED.with(|flag| flag.get())
}

pub fn set_backprop_enabled(enabled: bool) {
    BACKPROP_ENABLED.with(|flag| flag.set(enabled));
}

pub fn debug_mode() -> bool {
    DEBUG_MODE.with(|flag| flag.get())
}

pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.with(|flag| flag.set(enabled));
}

pub fn grad_accum_policy() -> GradAccumPolicy {
    GRAD_ACCUM_POLICY.with(|policy| policy.get())
}

pub fn set_grad_accum_policy(policy: GradAccumPolicy) {
    GRAD_ACCUM_POLICY.with(|p| p.set(policy));
}

pub fn strict_nonfinite_check() -> bool {
    STRICT_NONFINITE_CHECK.with(|flag| flag.get())
}

pub fn set_strict_nonfinite_check(enabled: bool) {
    STRICT_NONFINITE_CHECK.with(|flag| flag.set(enabled));
}

/// Restores the previous backprop flag when dropped.
pub struct BackpropGuard {
    prev: bool,
}

impl Drop for BackpropGuard {
    fn drop(&mut self) {
        set_backprop_enabled(self.prev);
    }
}

/// Disables graph construction for the current thread until the guard drops.
///
/// Operations applied inside the scope produce detached variables with no
/// creator, so memory for the backward graph is never allocated.
pub fn no_grad() -> BackpropGuard {
    let prev = backprop_enabled();
    set_backprop_enabled(false);
    BackpropGuard { prev }
}

/// Re-enables graph construction inside an outer `no_grad` scope.
pub fn force_backprop() -> BackpropGuard {
    let prev = backprop_enabled();
    set_backprop_enabled(true);
    BackpropGuard { prev }
}

pub struct DebugModeGuard {
    prev: bool,
}

impl Drop for DebugModeGuard {
    fn drop(&mut self) {
        set_debug_mode(self.prev);
    }
}

/// Enables creation-site capture on function application until the guard drops.
pub fn with_debug_mode() -> DebugModeGuard {
    let prev = debug_mode();
    set_debug_mode(true);
    DebugModeGuard { prev }
}

pub struct GradAccumPolicyGuard {
    prev: GradAccumPolicy,
}

impl Drop for GradAccumPolicyGuard {
    fn drop(&mut self) {
        set_grad_accum_policy(self.prev);
    }
}

pub fn with_grad_accum_policy(policy: GradAccumPolicy) -> GradAccumPolicyGuard {
    let prev = grad_accum_policy();
    set_grad_accum_policy(policy);
    GradAccumPolicyGuard { prev }
}

pub struct StrictNonfiniteGuard {
    prev: bool,
}

impl Drop for StrictNonfiniteGuard {
    fn drop(&mut self) {
        set_strict_nonfinite_check(self.prev);
    }
}

pub fn with_strict_nonfinite_check() -> StrictNonfiniteGuard {
    let prev = strict_nonfinite_check();
    set_strict_nonfinite_check(true);
    StrictNonfiniteGuard { prev }
}
