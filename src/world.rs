//! The world: arenas of masses and members advanced in three ordered phases.

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, trace};

use crate::config::WorldConfig;
use crate::contact::{ContactPhase, ContactResolver, NoContacts};
use crate::error::PhysicsError;
use crate::float::Float;
use crate::material::{MassKind, MassProperties, MemberKind, MemberProperties};
use crate::member::{Member, Transition};
use crate::observer::{NoOpStepObserver, StepObserver};
use crate::point_mass::PointMass;
use crate::vec::Vec2;

new_key_type! {
    /// Stable handle of a point mass, assigned at creation.
    pub struct MassKey;
    /// Stable handle of a member, assigned at creation.
    pub struct MemberKey;
}

/// Owner of every mass and member in a simulation.
///
/// A tick runs three phases in a fixed order:
///
/// 1. every member updates its state and writes its force into its endpoints;
/// 2. the contact resolver, if any, collides probes with solid members;
/// 3. masses marked for deletion are reaped and the rest integrate.
pub struct World<F: Float> {
    pub(crate) masses: SlotMap<MassKey, PointMass<F>>,
    pub(crate) members: SlotMap<MemberKey, Member<F>>,
    pub(crate) config: WorldConfig<F>,
    pub(crate) budget: F,
}

impl<F: Float> World<F> {
    pub fn new(config: WorldConfig<F>) -> Self {
        World {
            masses: SlotMap::with_key(),
            members: SlotMap::with_key(),
            config,
            budget: F::zero(),
        }
    }

    pub fn config(&self) -> &WorldConfig<F> { &self.config }
    pub fn config_mut(&mut self) -> &mut WorldConfig<F> { &mut self.config }

    /// Remaining budget of the player.
    pub fn budget(&self) -> F { self.budget }
    pub fn set_budget(&mut self, budget: F) { self.budget = budget; }

    pub fn add_mass(&mut self, pos: Vec2<F>, kind: MassKind) -> Result<MassKey, PhysicsError> {
        self.add_mass_with(pos, kind.properties())
    }

    pub fn add_mass_with(&mut self, pos: Vec2<F>, props: MassProperties<F>) -> Result<MassKey, PhysicsError> {
        let mut mass = PointMass::with_properties(pos, props)?;
        mass.reset_force(self.config.gravity);
        Ok(self.masses.insert(mass))
    }

    /// Connect two masses with a member of `kind` at their current separation.
    ///
    /// Returns `Ok(None)` when the masses coincide: such a member is dropped
    /// immediately.
    pub fn add_member(&mut self, a: MassKey, b: MassKey, kind: MemberKind) -> Result<Option<MemberKey>, PhysicsError> {
        self.add_member_with(a, b, kind.properties(), None)
    }

    /// Connect two masses with explicit properties and, optionally, an explicit
    /// rest length before preload.
    pub fn add_member_with(
        &mut self,
        a: MassKey,
        b: MassKey,
        props: MemberProperties<F>,
        rest_length: Option<F>,
    ) -> Result<Option<MemberKey>, PhysicsError> {
        let member = self.build_member(a, b, props, rest_length)?;
        Ok(self.insert_member(member))
    }

    /// Like [`add_member`](World::add_member), but charge the member's cost to
    /// the budget. Nothing is charged for a dropped zero-length member.
    pub fn purchase_member(&mut self, a: MassKey, b: MassKey, kind: MemberKind) -> Result<Option<MemberKey>, PhysicsError> {
        let member = self.build_member(a, b, kind.properties(), None)?;
        if member.is_removed() {
            return Ok(None);
        }
        let cost = member.cost();
        if cost > self.budget {
            return Err(PhysicsError::InsufficientBudget {
                required: cost.to_f64(),
                available: self.budget.to_f64(),
            });
        }
        self.budget = self.budget - cost;
        Ok(self.insert_member(member))
    }

    fn build_member(
        &self,
        a: MassKey,
        b: MassKey,
        props: MemberProperties<F>,
        rest_length: Option<F>,
    ) -> Result<Member<F>, PhysicsError> {
        props.validate()?;
        if let Some(rest) = rest_length {
            if !(rest.is_finite() && rest > F::zero()) {
                return Err(PhysicsError::configuration("rest length must be finite and > 0"));
            }
        }
        let a_pos = self.masses.get(a).ok_or(PhysicsError::MassNotFound)?.pos;
        let b_pos = self.masses.get(b).ok_or(PhysicsError::MassNotFound)?.pos;
        Ok(Member::new(a, a_pos, b, b_pos, props, rest_length))
    }

    fn insert_member(&mut self, member: Member<F>) -> Option<MemberKey> {
        if member.is_removed() {
            debug!(kind = %member.kind(), "dropping zero-length member");
            return None;
        }
        Some(self.members.insert(member))
    }

    /// Delete a member now and refund its cost.
    pub fn remove_member(&mut self, key: MemberKey) -> Option<Member<F>> {
        let member = self.members.remove(key)?;
        self.budget = self.budget + member.cost();
        Some(member)
    }

    /// Delete a mass now, together with every member attached to it.
    pub fn remove_mass(&mut self, key: MassKey) -> Option<PointMass<F>> {
        let mass = self.masses.remove(key)?;
        let incident: Vec<MemberKey> = self
            .members
            .iter()
            .filter(|(_, m)| {
                let (a, b) = m.endpoints();
                a == key || b == key
            })
            .map(|(k, _)| k)
            .collect();
        for member in incident {
            self.remove_member(member);
        }
        Some(mass)
    }

    /// Flag a mass for deletion. Its members detach on the next tick and the
    /// mass is reaped right after.
    pub fn mark_for_deletion(&mut self, key: MassKey) -> bool {
        match self.masses.get_mut(key) {
            Some(mass) => {
                mass.mark_for_deletion();
                true
            }
            None => false,
        }
    }

    /// Drop every mass and member.
    pub fn remove_all(&mut self) {
        self.masses.clear();
        self.members.clear();
    }

    /// Drop everything the player or traffic added, keeping anchored masses and
    /// ground members, and reset the budget to the level's allowance.
    pub fn remove_player_built(&mut self, budget: F) {
        self.budget = budget;
        self.masses.retain(|_, m| m.is_anchored());
        let masses = &self.masses;
        self.members.retain(|_, m| {
            let (a, b) = m.endpoints();
            m.kind() == MemberKind::Ground && masses.contains_key(a) && masses.contains_key(b)
        });
    }

    pub fn mass(&self, key: MassKey) -> Option<&PointMass<F>> { self.masses.get(key) }
    pub fn mass_mut(&mut self, key: MassKey) -> Option<&mut PointMass<F>> { self.masses.get_mut(key) }
    pub fn member(&self, key: MemberKey) -> Option<&Member<F>> { self.members.get(key) }

    pub fn masses(&self) -> impl Iterator<Item = (MassKey, &PointMass<F>)> + '_ {
        self.masses.iter()
    }

    pub fn members(&self) -> impl Iterator<Item = (MemberKey, &Member<F>)> + '_ {
        self.members.iter()
    }

    /// Members eligible for probe collisions.
    pub fn solid_members(&self) -> impl Iterator<Item = (MemberKey, &Member<F>)> + '_ {
        self.members.iter().filter(|(_, m)| m.is_solid() && !m.is_removed())
    }

    pub fn mass_count(&self) -> usize { self.masses.len() }
    pub fn member_count(&self) -> usize { self.members.len() }

    pub fn kinetic_energy(&self) -> F {
        self.masses.values().fold(F::zero(), |acc, m| acc + m.kinetic_energy())
    }

    /// Advance one tick with no probes and no observer.
    pub fn tick(&mut self, dt: F) {
        self.step(dt, &mut NoContacts, &mut NoOpStepObserver);
    }

    /// Advance one tick, running `contacts` between force accumulation and
    /// integration.
    pub fn step<C, O>(&mut self, dt: F, contacts: &mut C, observer: &mut O)
    where
        C: ContactResolver<F>,
        O: StepObserver,
    {
        trace!(masses = self.masses.len(), members = self.members.len(), "step");

        self.accumulate_forces(observer);
        observer.on_forces_accumulated();

        contacts.resolve(&mut ContactPhase::new(&mut self.masses, &self.members));
        observer.on_contacts_resolved();

        self.integrate(dt, observer);
        observer.on_step_complete();
    }

    fn accumulate_forces<O: StepObserver>(&mut self, observer: &mut O) {
        let failures = self.config.failures;
        let mut removed = Vec::new();

        for (key, member) in self.members.iter_mut() {
            let (a, b) = member.endpoints();
            let transition = match self.masses.get_disjoint_mut([a, b]) {
                Some([ma, mb]) => member.update(ma, mb, failures),
                None => Transition::Detached,
            };
            match transition {
                Transition::Steady => {}
                Transition::Failed => {
                    debug!(?key, kind = %member.kind(), force = ?member.force_total(), "member overstressed");
                    observer.on_member_failed(key);
                }
                Transition::Detached => removed.push((key, true)),
                Transition::Broken => removed.push((key, false)),
            }
        }

        for (key, refund) in removed {
            if let Some(member) = self.members.remove(key) {
                if refund {
                    self.budget = self.budget + member.cost();
                }
                debug!(?key, kind = %member.kind(), broken = !refund, "member removed");
                observer.on_member_removed(key);
            }
        }
    }

    fn integrate<O: StepObserver>(&mut self, dt: F, observer: &mut O) {
        let reaped: Vec<MassKey> = self
            .masses
            .iter()
            .filter(|(_, m)| m.is_pending_deletion())
            .map(|(k, _)| k)
            .collect();
        for key in reaped {
            self.masses.remove(key);
            debug!(?key, "mass reaped");
            observer.on_mass_reaped(key);
        }

        for mass in self.masses.values_mut() {
            mass.integrate(dt, &self.config);
        }
        observer.on_integrate();
    }
}

impl<F: Float> Default for World<F> {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}
