//! Structural physics core for a 2D bridge-building sandbox.
//!
//! `trestle` simulates a graph of point masses joined by elastic members. Members
//! stiffen differently in tension and compression, fail after a visible
//! countdown when overstressed, and carry solid decks that vehicle wheels can
//! drive on. Worlds serialize to a flat, index-addressed snapshot.
//!
//! # Features
//!
//! - **Point masses**: explicit Euler with quadratic drag, anchoring and playfield bounds
//! - **Members**: asymmetric stiffness, preload, failure countdown
//! - **Contacts**: probe-versus-deck collision that loads the deck's endpoints
//! - **Ordered ticks**: forces, then contacts, then integration, enforced by [`World::step`]
//! - **Snapshots**: save and restore the player's construction as JSON
//! - **Observable**: follow ticks through the `StepObserver` trait and `tracing` events
//!
//! # Example
//! ```
//! use trestle::{MassKind, MemberKind, Vec2, World, WorldConfig};
//!
//! let mut world: World<f64> = World::new(WorldConfig::new().simulation_mode());
//! let left = world.add_mass(Vec2::new(100.0, 500.0), MassKind::Based).unwrap();
//! let right = world.add_mass(Vec2::new(300.0, 500.0), MassKind::Based).unwrap();
//! let mid = world.add_mass(Vec2::new(200.0, 500.0), MassKind::Normal).unwrap();
//! world.add_member(left, mid, MemberKind::Paved).unwrap();
//! world.add_member(mid, right, MemberKind::Paved).unwrap();
//!
//! for _ in 0..60 {
//!     world.tick(1.0 / 60.0);
//! }
//! assert!(world.mass(mid).unwrap().pos.y > 500.0);
//! ```

pub mod float;
pub mod vec;
pub mod material;
pub mod point_mass;
pub mod member;
pub mod contact;
pub mod world;
pub mod snapshot;
pub mod observer;
pub mod config;
pub mod error;

// Re-export primary API
pub use float::Float;
pub use vec::Vec2;
pub use material::{MassKind, MassProperties, MemberKind, MemberProperties};
pub use point_mass::PointMass;
pub use member::{Load, Member, MemberState, Transition};
pub use contact::{Contact, ContactPhase, ContactResolver, NoContacts, Probe};
pub use world::{MassKey, MemberKey, World};
pub use snapshot::{MassRecord, MemberRecord, Snapshot};
pub use config::{Bounds, WorldConfig};
pub use observer::{StepObserver, NoOpStepObserver};
pub use error::PhysicsError;
