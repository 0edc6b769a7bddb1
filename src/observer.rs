//! Step observer trait for monitoring simulation progress.

use crate::world::{MassKey, MemberKey};

/// Trait for observing world steps.
///
/// Implement this to follow the phases of a tick and the entities that leave
/// the world (e.g., for effects, scoring, or profiling). All methods have
/// default no-op implementations.
pub trait StepObserver {
    /// Called once every member has written its force into its endpoints.
    fn on_forces_accumulated(&mut self) {}

    /// Called after the contact phase has run.
    fn on_contacts_resolved(&mut self) {}

    /// Called when a member exceeds its maximum force and starts failing.
    fn on_member_failed(&mut self, _member: MemberKey) {}

    /// Called when a member leaves the world during a tick.
    fn on_member_removed(&mut self, _member: MemberKey) {}

    /// Called when a mass marked for deletion is reaped.
    fn on_mass_reaped(&mut self, _mass: MassKey) {}

    /// Called after all masses have been integrated.
    fn on_integrate(&mut self) {}

    /// Called when a step is fully complete.
    fn on_step_complete(&mut self) {}
}

/// A no-op observer that does nothing. Use as default when no observation needed.
pub struct NoOpStepObserver;

impl StepObserver for NoOpStepObserver {}
