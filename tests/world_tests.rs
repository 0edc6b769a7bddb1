use approx::assert_relative_eq;
use trestle::{
    ContactPhase, MassKey, MassKind, MemberKey, MemberKind, NoContacts, PhysicsError, StepObserver, Vec2, World,
    WorldConfig,
};

#[derive(Debug, PartialEq)]
enum Event {
    Forces,
    Contacts,
    MemberRemoved(MemberKey),
    MassReaped(MassKey),
    Integrate,
    Complete,
}

#[derive(Default)]
struct Recorder {
    events: Vec<Event>,
}

impl StepObserver for Recorder {
    fn on_forces_accumulated(&mut self) {
        self.events.push(Event::Forces);
    }

    fn on_contacts_resolved(&mut self) {
        self.events.push(Event::Contacts);
    }

    fn on_member_removed(&mut self, member: MemberKey) {
        self.events.push(Event::MemberRemoved(member));
    }

    fn on_mass_reaped(&mut self, mass: MassKey) {
        self.events.push(Event::MassReaped(mass));
    }

    fn on_integrate(&mut self) {
        self.events.push(Event::Integrate);
    }

    fn on_step_complete(&mut self) {
        self.events.push(Event::Complete);
    }
}

fn bridge(world: &mut World<f64>) -> (MassKey, MassKey, MassKey) {
    let left = world.add_mass(Vec2::new(100.0, 500.0), MassKind::Based).unwrap();
    let mid = world.add_mass(Vec2::new(200.0, 500.0), MassKind::Normal).unwrap();
    let right = world.add_mass(Vec2::new(300.0, 500.0), MassKind::Based).unwrap();
    world.add_member(left, mid, MemberKind::Paved).unwrap();
    world.add_member(mid, right, MemberKind::Paved).unwrap();
    (left, mid, right)
}

#[test]
fn phases_run_in_order() {
    let mut world = World::<f64>::default();
    bridge(&mut world);
    let mut recorder = Recorder::default();
    world.step(0.016, &mut NoContacts, &mut recorder);
    assert_eq!(
        recorder.events,
        vec![Event::Forces, Event::Contacts, Event::Integrate, Event::Complete]
    );
}

#[test]
fn contact_phase_sees_forces_before_integration() {
    let mut world = World::<f64>::new(WorldConfig::new().with_gravity(false));
    let a = world.add_mass(Vec2::new(100.0, 100.0), MassKind::Normal).unwrap();
    let b = world.add_mass(Vec2::new(200.0, 100.0), MassKind::Normal).unwrap();
    world
        .add_member_with(a, b, MemberKind::Normal.properties(), Some(95.0))
        .unwrap();

    let mut seen = None;
    world.step(
        0.016,
        &mut |phase: &mut ContactPhase<'_, f64>| {
            let mass = phase.mass(b).unwrap();
            seen = Some((mass.pos, mass.force));
        },
        &mut trestle::NoOpStepObserver,
    );

    let (pos, force) = seen.unwrap();
    assert_eq!(pos, Vec2::new(200.0, 100.0));
    assert_relative_eq!(force.x, -5.0 * 20_000.0, epsilon = 1e-6);
    assert!(world.mass(b).unwrap().pos.x < 200.0);
    assert_eq!(world.mass(b).unwrap().force, Vec2::zero());
}

#[test]
fn marked_mass_detaches_members_then_is_reaped() {
    let mut world = World::<f64>::default();
    let (_, mid, _) = bridge(&mut world);
    let members: Vec<MemberKey> = world.members().map(|(k, _)| k).collect();
    assert!(world.mark_for_deletion(mid));

    let mut recorder = Recorder::default();
    world.step(0.016, &mut NoContacts, &mut recorder);

    assert_eq!(world.member_count(), 0);
    assert_eq!(world.mass_count(), 2);
    assert!(world.mass(mid).is_none());
    assert_eq!(
        recorder.events,
        vec![
            Event::MemberRemoved(members[0]),
            Event::MemberRemoved(members[1]),
            Event::Forces,
            Event::Contacts,
            Event::MassReaped(mid),
            Event::Integrate,
            Event::Complete,
        ]
    );
}

#[test]
fn remove_player_built_keeps_ground_and_anchors() {
    let mut world = World::<f64>::default();
    let g1 = world.add_mass(Vec2::new(0.0, 600.0), MassKind::Ground).unwrap();
    let g2 = world.add_mass(Vec2::new(100.0, 600.0), MassKind::Ground).unwrap();
    world.add_member(g1, g2, MemberKind::Ground).unwrap();
    bridge(&mut world);
    let wheel = world.add_mass(Vec2::new(150.0, 480.0), MassKind::VehicleWheel).unwrap();
    let body = world.add_mass(Vec2::new(170.0, 470.0), MassKind::VehicleLight).unwrap();
    world.add_member(wheel, body, MemberKind::VehicleSpring).unwrap();

    world.set_budget(120.0);

    world.remove_player_built(500.0);

    assert_eq!(world.budget(), 500.0);
    assert_eq!(world.mass_count(), 4);
    assert!(world.masses().all(|(_, m)| m.is_anchored()));
    assert_eq!(world.member_count(), 1);
    assert!(world.members().all(|(_, m)| m.kind() == MemberKind::Ground));
}

#[test]
fn remove_all_empties_world() {
    let mut world = World::<f64>::default();
    bridge(&mut world);
    world.remove_all();
    assert_eq!(world.mass_count(), 0);
    assert_eq!(world.member_count(), 0);
    world.tick(0.016);
}

#[test]
fn solid_members_lists_only_decks() {
    let mut world = World::<f64>::default();
    let (left, mid, right) = bridge(&mut world);
    world.add_member(left, right, MemberKind::Cable).unwrap();
    world.add_member(mid, right, MemberKind::Normal).unwrap();
    assert_eq!(world.member_count(), 4);
    assert_eq!(world.solid_members().count(), 2);
    assert!(world.solid_members().all(|(_, m)| m.kind() == MemberKind::Paved));
}

#[test]
fn purchase_charges_and_removal_refunds() {
    let mut world = World::<f64>::new(WorldConfig::new().builder_mode());
    world.set_budget(500.0);
    let a = world.add_mass(Vec2::new(100.0, 100.0), MassKind::Normal).unwrap();
    let b = world.add_mass(Vec2::new(200.0, 100.0), MassKind::Normal).unwrap();

    let key = world.purchase_member(a, b, MemberKind::Normal).unwrap().unwrap();
    assert_relative_eq!(world.budget(), 490.0, epsilon = 1e-9);

    world.remove_member(key).unwrap();
    assert_relative_eq!(world.budget(), 500.0, epsilon = 1e-9);
}

#[test]
fn purchase_beyond_budget_is_refused() {
    let mut world = World::<f64>::new(WorldConfig::new().builder_mode());
    world.set_budget(5.0);
    let a = world.add_mass(Vec2::new(100.0, 100.0), MassKind::Normal).unwrap();
    let b = world.add_mass(Vec2::new(200.0, 100.0), MassKind::Normal).unwrap();

    match world.purchase_member(a, b, MemberKind::Normal) {
        Err(PhysicsError::InsufficientBudget { required, available }) => {
            assert_relative_eq!(required, 10.0, epsilon = 1e-9);
            assert_eq!(available, 5.0);
        }
        other => panic!("expected InsufficientBudget, got {:?}", other),
    }
    assert_eq!(world.member_count(), 0);
    assert_eq!(world.budget(), 5.0);
}

#[test]
fn detached_member_is_refunded_but_broken_member_is_not() {
    let mut world = World::<f64>::new(WorldConfig::new().with_gravity(false));
    world.set_budget(500.0);
    let a = world.add_mass(Vec2::new(100.0, 100.0), MassKind::Normal).unwrap();
    let b = world.add_mass(Vec2::new(200.0, 100.0), MassKind::Normal).unwrap();
    let c = world.add_mass(Vec2::new(100.0, 300.0), MassKind::Normal).unwrap();
    let d = world.add_mass(Vec2::new(200.0, 300.0), MassKind::Normal).unwrap();
    world.purchase_member(a, b, MemberKind::Normal).unwrap().unwrap();
    let doomed = world.purchase_member(c, d, MemberKind::Normal).unwrap().unwrap();
    assert_relative_eq!(world.budget(), 480.0, epsilon = 1e-9);

    world.mark_for_deletion(b);
    // overstress c-d: 10 units of stretch is 200000 against a 30000 limit
    world.mass_mut(d).unwrap().pos.x = 210.0;
    world.tick(0.001);
    assert_relative_eq!(world.budget(), 490.0, epsilon = 1e-9);
    assert!(world.member(doomed).unwrap().is_failing());

    for _ in 0..15 {
        world.tick(0.001);
    }
    assert!(world.member(doomed).is_none());
    assert_relative_eq!(world.budget(), 490.0, epsilon = 1e-9);
}

#[test]
fn explicit_rest_length_must_be_positive() {
    let mut world = World::<f64>::default();
    let a = world.add_mass(Vec2::new(0.0, 0.0), MassKind::Normal).unwrap();
    let b = world.add_mass(Vec2::new(10.0, 0.0), MassKind::Normal).unwrap();
    let result = world.add_member_with(a, b, MemberKind::Normal.properties(), Some(-3.0));
    assert!(matches!(result, Err(PhysicsError::Configuration { .. })));
}

#[test]
fn custom_vehicle_mass_needs_overrides() {
    let mut world = World::<f64>::default();
    assert!(matches!(
        world.add_mass(Vec2::new(0.0, 0.0), MassKind::VehicleCustom),
        Err(PhysicsError::Configuration { .. })
    ));
    let props = MassKind::VehicleCustom.properties().with_overrides(800.0, 400.0);
    let key = world.add_mass_with(Vec2::new(0.0, 0.0), props).unwrap();
    assert_eq!(world.mass(key).unwrap().mass(), 400.0);
}

#[test]
fn loaded_bridge_sags_and_holds() {
    let mut world = World::<f64>::new(WorldConfig::new().simulation_mode());
    let (_, mid, _) = bridge(&mut world);
    let mut deepest: f64 = 500.0;
    for _ in 0..600 {
        world.tick(1.0 / 60.0);
        let y = world.mass(mid).unwrap().pos.y;
        assert!(y > 499.9 && y < 520.0, "mid sag = {}", y - 500.0);
        deepest = deepest.max(y);
    }
    assert!(deepest > 505.0, "deepest sag = {}", deepest - 500.0);
    assert_eq!(world.member_count(), 2);
}

#[test]
fn varying_timestep_keeps_truss_in_playfield() {
    let mut world = World::<f64>::new(WorldConfig::new().simulation_mode());
    let spans = 6;
    let mut bottom = Vec::new();
    let mut top = Vec::new();
    for i in 0..=spans {
        let x = 400.0 + 60.0 * i as f64;
        let kind = if i == 0 || i == spans { MassKind::Based } else { MassKind::Normal };
        bottom.push(world.add_mass(Vec2::new(x, 600.0), kind).unwrap());
        top.push(world.add_mass(Vec2::new(x, 540.0), MassKind::Normal).unwrap());
    }
    for i in 0..spans {
        world.add_member(bottom[i], bottom[i + 1], MemberKind::Paved).unwrap();
        world.add_member(top[i], top[i + 1], MemberKind::Normal).unwrap();
        world.add_member(bottom[i], top[i + 1], MemberKind::Normal).unwrap();
        world.add_member(top[i], bottom[i + 1], MemberKind::Cable).unwrap();
    }
    for i in 0..=spans {
        world.add_member(bottom[i], top[i], MemberKind::Normal).unwrap();
    }
    let anchors: Vec<_> = [bottom[0], bottom[spans]]
        .into_iter()
        .map(|key| (key, world.mass(key).unwrap().pos))
        .collect();

    let bounds = world.config().bounds;
    let margin = world.config().deletion_margin;
    let steps = [0.005, 0.03, 0.016, 0.05, 0.001];
    for tick in 0..2000 {
        world.tick(steps[tick % steps.len()]);
        for (_, mass) in world.masses() {
            let p = mass.pos;
            assert!(p.is_finite(), "tick {}: non-finite position", tick);
            assert!(
                p.x >= bounds.min.x - margin
                    && p.x <= bounds.max.x + margin
                    && p.y >= bounds.min.y - margin
                    && p.y <= bounds.max.y + margin,
                "tick {}: {:?} left the playfield",
                tick,
                p
            );
        }
        let energy = world.kinetic_energy();
        assert!(energy.is_finite() && energy < 1.0e12, "tick {}: energy {}", tick, energy);
    }
    for (key, start) in anchors {
        assert_eq!(world.mass(key).unwrap().pos, start);
    }
}
