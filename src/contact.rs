//! Probe-versus-member contacts and the contact phase of a tick.
//!
//! Probes are moving points, usually vehicle wheels, tested against solid
//! members. A collaborator that drives probes implements [`ContactResolver`];
//! [`World::step`](crate::world::World::step) calls it after every member has
//! accumulated its force and before any mass integrates, handing it a
//! [`ContactPhase`] that exists only for that window.

use slotmap::SlotMap;

use crate::float::Float;
use crate::member::Member;
use crate::point_mass::PointMass;
use crate::vec::Vec2;
use crate::world::{MassKey, MemberKey};

/// A point tested against a member: where it is and how hard it pushes down.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Probe<F: Float> {
    pub position: Vec2<F>,
    pub force_y: F,
}

/// A resolved overlap between a probe and a member.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact<F: Float> {
    /// Probe position after being pushed out of the member.
    pub position: Vec2<F>,
    /// Vertical force transferred into the member's first endpoint.
    pub load_a: F,
    /// Vertical force transferred into the member's second endpoint.
    pub load_b: F,
}

/// Phase-2 collaborator of a tick.
///
/// Implemented for any `FnMut(&mut ContactPhase<F>)`.
pub trait ContactResolver<F: Float> {
    fn resolve(&mut self, phase: &mut ContactPhase<'_, F>);
}

impl<F: Float, T> ContactResolver<F> for T
where
    T: FnMut(&mut ContactPhase<'_, F>),
{
    fn resolve(&mut self, phase: &mut ContactPhase<'_, F>) {
        self(phase)
    }
}

/// A contact phase that does nothing. Used by [`World::tick`](crate::world::World::tick).
pub struct NoContacts;

impl<F: Float> ContactResolver<F> for NoContacts {
    fn resolve(&mut self, _phase: &mut ContactPhase<'_, F>) {}
}

/// Collision access to the world between force accumulation and integration.
pub struct ContactPhase<'w, F: Float> {
    masses: &'w mut SlotMap<MassKey, PointMass<F>>,
    members: &'w SlotMap<MemberKey, Member<F>>,
}

impl<'w, F: Float> ContactPhase<'w, F> {
    pub(crate) fn new(
        masses: &'w mut SlotMap<MassKey, PointMass<F>>,
        members: &'w SlotMap<MemberKey, Member<F>>,
    ) -> Self {
        ContactPhase { masses, members }
    }

    /// Members eligible for probe collisions.
    pub fn solid_members(&self) -> impl Iterator<Item = (MemberKey, &Member<F>)> + '_ {
        self.members.iter().filter(|(_, m)| m.is_solid() && !m.is_removed())
    }

    pub fn mass(&self, key: MassKey) -> Option<&PointMass<F>> {
        self.masses.get(key)
    }

    /// Add `force` into a mass's accumulator, e.g. to brake a wheel that touched
    /// the deck. Returns false for unknown handles.
    pub fn apply_force(&mut self, key: MassKey, force: Vec2<F>) -> bool {
        match self.masses.get_mut(key) {
            Some(mass) => {
                mass.apply_force(force);
                true
            }
            None => false,
        }
    }

    /// Resolve the probe mass `probe` against one solid member.
    ///
    /// On contact the probe is moved out of the member, its vertical force is
    /// zeroed and that force is shared between the member's endpoints.
    pub fn collide(&mut self, member: MemberKey, probe: MassKey) -> bool {
        match self.members.get(member) {
            Some(m) if m.is_solid() && !m.is_removed() => collide_mass(self.masses, m, probe),
            _ => false,
        }
    }

    /// Resolve the probe mass against every solid member, in arena order.
    /// Returns the number of contacts.
    pub fn collide_solid(&mut self, probe: MassKey) -> usize {
        let members = self.members;
        let mut contacts = 0;
        for member in members.values().filter(|m| m.is_solid() && !m.is_removed()) {
            if collide_mass(self.masses, member, probe) {
                contacts += 1;
            }
        }
        contacts
    }

    /// Resolve a probe that is not a world mass against one solid member.
    pub fn collide_probe(&mut self, member: MemberKey, probe: &mut Probe<F>) -> bool {
        let Some(m) = self.members.get(member).filter(|m| m.is_solid() && !m.is_removed()) else {
            return false;
        };
        let (a, b) = m.endpoints();
        let Some([ma, mb]) = self.masses.get_disjoint_mut([a, b]) else {
            return false;
        };
        let Some(contact) = m.resolve_probe(ma.pos, mb.pos, probe) else {
            return false;
        };
        ma.apply_force(Vec2::new(F::zero(), contact.load_a));
        mb.apply_force(Vec2::new(F::zero(), contact.load_b));
        probe.position = contact.position;
        probe.force_y = F::zero();
        true
    }
}

fn collide_mass<F: Float>(
    masses: &mut SlotMap<MassKey, PointMass<F>>,
    member: &Member<F>,
    probe: MassKey,
) -> bool {
    let (a, b) = member.endpoints();
    // a probe that is one of the member's own endpoints cannot touch it
    let Some([ma, mb, mp]) = masses.get_disjoint_mut([a, b, probe]) else {
        return false;
    };
    if mp.is_anchored() {
        return false;
    }
    let query = Probe { position: mp.pos, force_y: mp.force.y };
    let Some(contact) = member.resolve_probe(ma.pos, mb.pos, &query) else {
        return false;
    };
    mp.pos = contact.position;
    mp.force.y = F::zero();
    ma.apply_force(Vec2::new(F::zero(), contact.load_a));
    mb.apply_force(Vec2::new(F::zero(), contact.load_b));
    true
}
