// Contact flyweights and the listener traits they are handed to

use super::fixture::Fixture;
use super::handle::{BodyId, FixtureId};
use glam::Vec2;

/// Maximum number of points in a 2D contact manifold
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Contact manifold in the local frame of fixture A
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Manifold {
    pub local_normal: Vec2,
    pub local_points: [Vec2; MAX_MANIFOLD_POINTS],
    pub point_count: usize,
}

impl Manifold {
    /// The populated local points
    pub fn points(&self) -> &[Vec2] {
        &self.local_points[..self.point_count]
    }
}

/// Contact manifold resolved into world space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldManifold {
    /// Normal pointing from fixture A to fixture B
    pub normal: Vec2,
    pub points: [Vec2; MAX_MANIFOLD_POINTS],
    /// Negative values mean overlap
    pub separations: [f32; MAX_MANIFOLD_POINTS],
    pub point_count: usize,
}

impl WorldManifold {
    pub fn points(&self) -> &[Vec2] {
        &self.points[..self.point_count]
    }

    pub fn separations(&self) -> &[f32] {
        &self.separations[..self.point_count]
    }
}

/// Impulses the solver applied at each manifold point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactImpulse {
    pub normal_impulses: [f32; MAX_MANIFOLD_POINTS],
    pub tangent_impulses: [f32; MAX_MANIFOLD_POINTS],
    pub count: usize,
}

impl ContactImpulse {
    pub fn normal_impulses(&self) -> &[f32] {
        &self.normal_impulses[..self.count]
    }

    pub fn tangent_impulses(&self) -> &[f32] {
        &self.tangent_impulses[..self.count]
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Raw per-contact state as read back from the native engine
///
/// One instance lives inside the native world and is overwritten for every
/// callback. Fields written by a listener during pre-solve (enabled,
/// friction, restitution, tangent speed) are read back before the solver
/// runs.
#[derive(Debug, Clone, Default)]
pub struct ContactRecord {
    pub(crate) fixture_a: Option<super::Handle>,
    pub(crate) fixture_b: Option<super::Handle>,
    pub(crate) touching: bool,
    pub(crate) enabled: bool,
    pub(crate) friction: f32,
    pub(crate) restitution: f32,
    pub(crate) tangent_speed: f32,
    pub(crate) manifold: Manifold,
    pub(crate) world_manifold: WorldManifold,
}

impl ContactRecord {
    /// Reset for a new pair; previous tenant state must not leak through
    pub(crate) fn begin(&mut self, fixture_a: super::Handle, fixture_b: super::Handle) {
        *self = Self {
            fixture_a: Some(fixture_a),
            fixture_b: Some(fixture_b),
            enabled: true,
            ..Self::default()
        };
    }
}

/// View of one contact, valid only for the callback or query that produced it
///
/// The underlying record is a single instance per world that the engine
/// overwrites for every reported pair. The lifetime ties the view to the
/// callback, so it cannot be retained; copy out what you need instead.
pub struct Contact<'a> {
    fixture_a: &'a Fixture,
    fixture_b: &'a Fixture,
    record: &'a mut ContactRecord,
}

impl<'a> Contact<'a> {
    pub(crate) fn new(
        fixture_a: &'a Fixture,
        fixture_b: &'a Fixture,
        record: &'a mut ContactRecord,
    ) -> Self {
        Self {
            fixture_a,
            fixture_b,
            record,
        }
    }

    pub fn fixture_a(&self) -> &Fixture {
        self.fixture_a
    }

    pub fn fixture_b(&self) -> &Fixture {
        self.fixture_b
    }

    pub fn fixture_ids(&self) -> (FixtureId, FixtureId) {
        (self.fixture_a.id(), self.fixture_b.id())
    }

    pub fn body_ids(&self) -> (BodyId, BodyId) {
        (self.fixture_a.body(), self.fixture_b.body())
    }

    /// Whether the fixtures' shapes are actually touching
    pub fn is_touching(&self) -> bool {
        self.record.touching
    }

    pub fn is_enabled(&self) -> bool {
        self.record.enabled
    }

    /// Disable the contact for the current step (pre-solve only)
    pub fn set_enabled(&mut self, enabled: bool) {
        self.record.enabled = enabled;
    }

    pub fn friction(&self) -> f32 {
        self.record.friction
    }

    /// Override the mixed friction for the current step (pre-solve only)
    pub fn set_friction(&mut self, friction: f32) {
        self.record.friction = friction;
    }

    pub fn restitution(&self) -> f32 {
        self.record.restitution
    }

    /// Override the mixed restitution for the current step (pre-solve only)
    pub fn set_restitution(&mut self, restitution: f32) {
        self.record.restitution = restitution;
    }

    pub fn tangent_speed(&self) -> f32 {
        self.record.tangent_speed
    }

    /// Conveyor-belt style surface speed (pre-solve only)
    pub fn set_tangent_speed(&mut self, speed: f32) {
        self.record.tangent_speed = speed;
    }

    pub fn manifold(&self) -> &Manifold {
        &self.record.manifold
    }

    pub fn world_manifold(&self) -> &WorldManifold {
        &self.record.world_manifold
    }
}

/// Decides whether two fixtures may generate contacts
///
/// Installing a filter replaces the default category/mask/group rule
/// entirely. Called synchronously from inside `World::step`.
pub trait ContactFilter: Send {
    fn should_collide(&mut self, fixture_a: &Fixture, fixture_b: &Fixture) -> bool;
}

impl<F> ContactFilter for F
where
    F: FnMut(&Fixture, &Fixture) -> bool + Send,
{
    fn should_collide(&mut self, fixture_a: &Fixture, fixture_b: &Fixture) -> bool {
        self(fixture_a, fixture_b)
    }
}

/// Receives contact events synchronously from inside `World::step`
///
/// The world is borrowed for the whole step, so listeners cannot mutate it
/// from here; queue structural changes and apply them after `step` returns.
pub trait ContactListener: Send {
    /// Two fixtures started touching
    fn begin_contact(&mut self, _contact: &mut Contact<'_>) {}

    /// Two fixtures stopped touching
    fn end_contact(&mut self, _contact: &mut Contact<'_>) {}

    /// Called before the solver; the contact can still be disabled or tuned
    fn pre_solve(&mut self, _contact: &mut Contact<'_>, _manifold: &Manifold) {}

    /// Called after the solver with the impulses it applied
    fn post_solve(&mut self, _contact: &mut Contact<'_>, _impulse: &ContactImpulse) {}
}
