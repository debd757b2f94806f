use super::body::{Body, BodyDef, BodyMut, BodyRef};
use super::callbacks::StepDispatch;
use super::contact::{Contact, ContactFilter, ContactListener};
use super::fixture::{Fixture, FixtureDef, FixtureInit, FixtureMut, FixtureRef, Shape};
use super::handle::{BodyId, FixtureId, JointId};
use super::joint::{Joint, JointDef, JointMut, JointRef};
use super::joint_factory::JointFactory;
use super::native::{NativeWorld, RayHit};
use super::pool::ObjectPool;
use super::registry::HandleRegistry;
use super::PhysicsError;
use crate::config::WorldConfig;
use crate::core::math::Aabb;
use glam::Vec2;
use log::{debug, trace};

/// A simulated world: the native engine plus the managed proxies of every
/// live body, fixture and joint
///
/// All structural mutation goes through the world. Contact filters and
/// listeners run synchronously inside [`step`](World::step), while the world
/// is mutably borrowed, so they cannot create or destroy anything; collect
/// what needs to change and apply it once `step` has returned.
pub struct World {
    native: NativeWorld,

    bodies: HandleRegistry<Body>,
    fixtures: HandleRegistry<Fixture>,
    joints: HandleRegistry<Joint>,

    body_pool: ObjectPool<Body>,
    fixture_pool: ObjectPool<Fixture>,

    contact_filter: Option<Box<dyn ContactFilter>>,
    contact_listener: Option<Box<dyn ContactListener>>,

    config: WorldConfig,

    /// Set for the duration of a step
    locked: bool,
}

impl World {
    /// Create a world with custom gravity and default settings
    pub fn new(gravity: Vec2) -> Self {
        Self::with_config(WorldConfig::with_gravity(gravity))
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            native: NativeWorld::new(config.gravity),
            bodies: HandleRegistry::with_capacity("body", config.body_pool.initial_capacity),
            fixtures: HandleRegistry::with_capacity(
                "fixture",
                config.fixture_pool.initial_capacity,
            ),
            joints: HandleRegistry::new("joint"),
            body_pool: ObjectPool::new(config.body_pool),
            fixture_pool: ObjectPool::new(config.fixture_pool),
            contact_filter: None,
            contact_listener: None,
            config,
            locked: false,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    fn check_unlocked(&self) -> Result<(), PhysicsError> {
        if self.locked {
            Err(PhysicsError::Locked)
        } else {
            Ok(())
        }
    }

    // Bodies

    pub fn create_body(&mut self, def: &BodyDef) -> Result<BodyId, PhysicsError> {
        self.check_unlocked()?;
        let handle = self.native.create_body(def, self.config.allow_sleep);
        let body = self.body_pool.obtain(handle);
        let id = body.id();
        self.bodies.register(handle, body);

        debug!("created {:?} body {}", def.body_type, handle);
        Ok(id)
    }

    /// Destroy a body with all its joints and fixtures
    pub fn destroy_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        self.check_unlocked()?;
        let handle = id.handle();
        if !self.bodies.contains(handle) {
            return Err(PhysicsError::StaleBody(id));
        }

        // Joints reference the body, so they go first, then the fixtures it owns.
        while let Some(edge) = self.bodies.resolve(handle).joint_edges().first().copied() {
            JointFactory::new(&mut self.native, &mut self.bodies, &mut self.joints)
                .destroy(edge.joint)?;
        }
        while let Some(fixture) = self.bodies.resolve(handle).fixtures().last().copied() {
            self.destroy_fixture(id, fixture)?;
        }

        self.native.destroy_body(handle);
        let body = self
            .bodies
            .unregister(handle)
            .ok_or(PhysicsError::StaleBody(id))?;
        self.body_pool.free(body);

        debug!("destroyed body {}", handle);
        Ok(())
    }

    pub fn body(&self, id: BodyId) -> Result<BodyRef<'_>, PhysicsError> {
        self.bodies
            .lookup(id.handle())
            .map(|body| BodyRef::new(body, &self.native))
            .ok_or(PhysicsError::StaleBody(id))
    }

    pub fn body_mut(&mut self, id: BodyId) -> Result<BodyMut<'_>, PhysicsError> {
        let body = self
            .bodies
            .lookup_mut(id.handle())
            .ok_or(PhysicsError::StaleBody(id))?;
        Ok(BodyMut::new(body, &mut self.native))
    }

    /// Live bodies, in no particular order
    pub fn bodies(&self) -> impl Iterator<Item = BodyRef<'_>> + '_ {
        self.bodies
            .values()
            .map(move |body| BodyRef::new(body, &self.native))
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Activate or deactivate a body
    ///
    /// Inactive bodies keep their fixtures and joints but take no part in
    /// stepping, contacts or queries. Deactivating a body ends its contacts
    /// right away, reporting each to the contact listener.
    pub fn set_body_active(&mut self, id: BodyId, active: bool) -> Result<(), PhysicsError> {
        self.check_unlocked()?;
        let handle = id.handle();
        let body = self.bodies.lookup(handle).ok_or(PhysicsError::StaleBody(id))?;
        if !active && self.native.body_is_active(handle) {
            let fixtures = body.fixtures().to_vec();
            self.end_contacts_of(&fixtures);
        }
        self.native.set_body_active(handle, active);

        debug!("body {} {}", handle, if active { "activated" } else { "deactivated" });
        Ok(())
    }

    // Fixtures

    pub fn create_fixture(
        &mut self,
        body: BodyId,
        def: &FixtureDef,
    ) -> Result<FixtureId, PhysicsError> {
        self.check_unlocked()?;
        if !self.bodies.contains(body.handle()) {
            return Err(PhysicsError::StaleBody(body));
        }

        let handle = self.native.create_fixture(body.handle(), def)?;
        let fixture = self.fixture_pool.obtain(FixtureInit {
            handle,
            body,
            shape_type: def.shape.shape_type(),
            filter: def.filter,
        });
        let id = fixture.id();
        self.fixtures.register(handle, fixture);
        self.bodies.resolve_mut(body.handle()).push_fixture(id);

        debug!(
            "created {:?} fixture {} on body {}",
            def.shape.shape_type(),
            handle,
            body.handle()
        );
        Ok(id)
    }

    /// Shorthand for a fixture with default material
    pub fn create_fixture_with_shape(
        &mut self,
        body: BodyId,
        shape: Shape,
        density: f32,
    ) -> Result<FixtureId, PhysicsError> {
        self.create_fixture(body, &FixtureDef::new(shape).density(density))
    }

    pub fn destroy_fixture(&mut self, body: BodyId, fixture: FixtureId) -> Result<(), PhysicsError> {
        self.check_unlocked()?;
        if !self.fixtures.contains(fixture.handle()) {
            return Err(PhysicsError::StaleFixture(fixture));
        }
        let owner = self
            .bodies
            .lookup_mut(body.handle())
            .ok_or(PhysicsError::StaleBody(body))?;
        if !owner.remove_fixture(fixture) {
            return Err(PhysicsError::FixtureNotOnBody { body, fixture });
        }

        self.end_contacts_of(&[fixture]);
        self.native.destroy_fixture(fixture.handle());
        let proxy = self
            .fixtures
            .unregister(fixture.handle())
            .ok_or(PhysicsError::StaleFixture(fixture))?;
        self.fixture_pool.free(proxy);

        debug!("destroyed fixture {}", fixture.handle());
        Ok(())
    }

    /// Report the end of every touching pair of these fixtures
    fn end_contacts_of(&mut self, fixtures: &[FixtureId]) {
        let mut dispatch =
            StepDispatch::new(&self.fixtures, None, self.contact_listener.as_mut());
        for fixture in fixtures {
            self.native.end_contacts_of(fixture.handle(), &mut dispatch);
        }
    }

    pub fn fixture(&self, id: FixtureId) -> Result<FixtureRef<'_>, PhysicsError> {
        self.fixtures
            .lookup(id.handle())
            .map(|fixture| FixtureRef::new(fixture, &self.native))
            .ok_or(PhysicsError::StaleFixture(id))
    }

    pub fn fixture_mut(&mut self, id: FixtureId) -> Result<FixtureMut<'_>, PhysicsError> {
        let fixture = self
            .fixtures
            .lookup_mut(id.handle())
            .ok_or(PhysicsError::StaleFixture(id))?;
        Ok(FixtureMut::new(fixture, &mut self.native))
    }

    pub fn fixtures(&self) -> impl Iterator<Item = FixtureRef<'_>> + '_ {
        self.fixtures
            .values()
            .map(move |fixture| FixtureRef::new(fixture, &self.native))
    }

    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    // Joints

    pub fn create_joint(&mut self, def: &JointDef) -> Result<JointId, PhysicsError> {
        self.check_unlocked()?;
        JointFactory::new(&mut self.native, &mut self.bodies, &mut self.joints).create(def)
    }

    /// Destroy a joint; gear joints coupling it are destroyed first
    pub fn destroy_joint(&mut self, id: JointId) -> Result<(), PhysicsError> {
        self.check_unlocked()?;
        JointFactory::new(&mut self.native, &mut self.bodies, &mut self.joints).destroy(id)
    }

    pub fn joint(&self, id: JointId) -> Result<JointRef<'_>, PhysicsError> {
        self.joints
            .lookup(id.handle())
            .map(|joint| JointRef::new(joint, &self.native))
            .ok_or(PhysicsError::StaleJoint(id))
    }

    pub fn joint_mut(&mut self, id: JointId) -> Result<JointMut<'_>, PhysicsError> {
        let joint = self
            .joints
            .lookup_mut(id.handle())
            .ok_or(PhysicsError::StaleJoint(id))?;
        Ok(JointMut::new(joint, &mut self.native))
    }

    pub fn joints(&self) -> impl Iterator<Item = JointRef<'_>> + '_ {
        self.joints
            .values()
            .map(move |joint| JointRef::new(joint, &self.native))
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    // Simulation

    /// Advance the simulation by `dt` seconds
    ///
    /// Blocks until the step and every callback it triggers have finished.
    /// `position_iterations` is accepted for API compatibility; the native
    /// solver only takes an iteration count for velocities.
    pub fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        if dt <= 0.0 {
            return;
        }
        trace!(
            "step dt={} velocity_iterations={} position_iterations={}",
            dt,
            velocity_iterations,
            position_iterations
        );

        let lock = StepLock::engage(&mut self.locked);
        let mut dispatch = StepDispatch::new(
            &self.fixtures,
            self.contact_filter.as_mut(),
            self.contact_listener.as_mut(),
        );
        self.native.step(dt, velocity_iterations, &mut dispatch);
        drop(lock);

        if self.config.auto_clear_forces {
            self.native.clear_forces();
        }
    }

    /// Step with the iteration counts from the world config
    pub fn step_default(&mut self, dt: f32) {
        self.step(
            dt,
            self.config.velocity_iterations,
            self.config.position_iterations,
        );
    }

    /// Whether the world is in the middle of a step
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn gravity(&self) -> Vec2 {
        self.native.gravity()
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
        self.native.set_gravity(gravity);
    }

    /// Reset accumulated forces and torques on every body
    pub fn clear_forces(&mut self) {
        self.native.clear_forces();
    }

    pub fn auto_clear_forces(&self) -> bool {
        self.config.auto_clear_forces
    }

    pub fn set_auto_clear_forces(&mut self, enabled: bool) {
        self.config.auto_clear_forces = enabled;
    }

    // Listeners

    /// Replace the default category/mask/group rule with a custom filter
    pub fn set_contact_filter(&mut self, filter: impl ContactFilter + 'static) {
        self.contact_filter = Some(Box::new(filter));
    }

    /// Remove the custom filter, restoring the default rule
    pub fn take_contact_filter(&mut self) -> Option<Box<dyn ContactFilter>> {
        self.contact_filter.take()
    }

    pub fn set_contact_listener(&mut self, listener: impl ContactListener + 'static) {
        self.contact_listener = Some(Box::new(listener));
    }

    pub fn take_contact_listener(&mut self) -> Option<Box<dyn ContactListener>> {
        self.contact_listener.take()
    }

    // Queries

    /// Report every fixture whose bounding box overlaps `aabb`
    ///
    /// Return `false` from the callback to end the query early.
    pub fn query_aabb(&self, aabb: &Aabb, mut callback: impl FnMut(&Fixture) -> bool) {
        let fixtures = &self.fixtures;
        self.native
            .query_aabb(aabb, &mut |handle| callback(fixtures.resolve(handle)));
    }

    /// Report fixtures crossed by the segment from `p1` to `p2`
    ///
    /// The callback's return value controls the rest of the cast:
    /// * `0` stops immediately
    /// * a negative value ignores this fixture and continues
    /// * a positive value clips the ray to that fraction, so `1` continues
    ///   unclipped and `hit.fraction` keeps only closer hits
    ///
    /// Fixtures are not reported in order of distance.
    pub fn ray_cast(
        &self,
        p1: Vec2,
        p2: Vec2,
        mut callback: impl FnMut(&Fixture, &RayHit) -> f32,
    ) {
        let fixtures = &self.fixtures;
        self.native.ray_cast(p1, p2, &mut |handle, hit| {
            callback(fixtures.resolve(handle), hit)
        });
    }

    // Contacts

    /// Number of touching contacts, sensor overlaps included
    pub fn contact_count(&self) -> usize {
        self.native.contact_count()
    }

    /// Visit every touching contact
    ///
    /// The same `Contact` storage is reused for every pair.
    pub fn contacts(&mut self, mut visit: impl FnMut(&mut Contact<'_>)) {
        let fixtures = &self.fixtures;
        self.native.for_each_contact(&mut |record| {
            let (Some(a), Some(b)) = (record.fixture_a, record.fixture_b) else {
                return;
            };
            let mut contact = Contact::new(fixtures.resolve(a), fixtures.resolve(b), record);
            visit(&mut contact);
        });
    }

    // Diagnostics

    pub fn body_pool(&self) -> &ObjectPool<Body> {
        &self.body_pool
    }

    pub fn fixture_pool(&self) -> &ObjectPool<Fixture> {
        &self.fixture_pool
    }
}

/// Holds the world's lock flag for one step, releasing it even when a
/// callback panics
struct StepLock<'a>(&'a mut bool);

impl<'a> StepLock<'a> {
    fn engage(locked: &'a mut bool) -> Self {
        *locked = true;
        Self(locked)
    }
}

impl Drop for StepLock<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::with_config(WorldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolConfig, DEFAULT_TIMESTEP};
    use crate::physics::joint::*;
    use crate::physics::{Filter, Manifold};
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn dynamic_ball(world: &mut World, x: f32, y: f32) -> BodyId {
        let body = world
            .create_body(&BodyDef::dynamic().position(x, y))
            .unwrap();
        world
            .create_fixture_with_shape(body, Shape::circle(0.5), 1.0)
            .unwrap();
        body
    }

    fn static_ball(world: &mut World, x: f32) -> FixtureId {
        let body = world.create_body(&BodyDef::fixed().position(x, 0.0)).unwrap();
        world
            .create_fixture_with_shape(body, Shape::circle(0.5), 0.0)
            .unwrap()
    }

    /// Ground box with its top surface at y = 0.5
    fn ground(world: &mut World) -> BodyId {
        let ground = world.create_body(&BodyDef::fixed()).unwrap();
        world
            .create_fixture_with_shape(ground, Shape::boxed(10.0, 0.5), 0.0)
            .unwrap();
        ground
    }

    fn run(world: &mut World, steps: usize) {
        for _ in 0..steps {
            world.step_default(DEFAULT_TIMESTEP);
        }
    }

    #[test]
    fn test_matched_create_destroy_empties_registries() {
        let mut world = World::default();
        let bodies: Vec<_> = (0..5)
            .map(|i| dynamic_ball(&mut world, i as f32 * 2.0, 5.0))
            .collect();
        for body in &bodies {
            world
                .create_fixture_with_shape(*body, Shape::boxed(0.2, 0.2), 1.0)
                .unwrap();
        }
        for pair in bodies.windows(2) {
            world
                .create_joint(&JointDef::new(pair[0], pair[1], RopeJointDef::default()))
                .unwrap();
        }
        run(&mut world, 5);

        for body in bodies {
            world.destroy_body(body).unwrap();
        }

        assert_eq!(world.body_count(), 0);
        assert_eq!(world.fixture_count(), 0);
        assert_eq!(world.joint_count(), 0);
        assert!(world.body_pool().free_count() <= world.body_pool().max());
        assert!(world.fixture_pool().free_count() <= world.fixture_pool().max());
    }

    #[test]
    fn test_pool_stops_retaining_at_max() {
        let config = WorldConfig::default()
            .body_pool(PoolConfig::new(0, 2))
            .fixture_pool(PoolConfig::new(0, 3));
        let mut world = World::with_config(config);
        let bodies: Vec<_> = (0..5)
            .map(|i| dynamic_ball(&mut world, i as f32, 0.0))
            .collect();
        for body in bodies {
            world.destroy_body(body).unwrap();
        }

        assert_eq!(world.body_pool().free_count(), 2);
        assert_eq!(world.fixture_pool().free_count(), 3);
    }

    #[test]
    fn test_recycled_body_carries_nothing_over() {
        let mut world = World::default();
        let other = world.create_body(&BodyDef::fixed()).unwrap();
        let body = dynamic_ball(&mut world, 0.0, 0.0);
        world
            .create_fixture_with_shape(body, Shape::boxed(1.0, 1.0), 1.0)
            .unwrap();
        world
            .create_joint(&JointDef::new(other, body, WeldJointDef::default()))
            .unwrap();
        world.body_mut(body).unwrap().set_user_data("previous tenant");
        world.destroy_body(body).unwrap();
        assert_eq!(world.body_pool().free_count(), 1);

        let body = world.create_body(&BodyDef::dynamic()).unwrap();
        assert_eq!(world.body_pool().free_count(), 0, "Proxy should be recycled");

        let view = world.body(body).unwrap();
        assert!(view.fixtures().is_empty());
        assert!(view.joint_edges().is_empty());
        assert!(view.user_data::<&str>().is_none());
        assert!(world.body(other).unwrap().joint_edges().is_empty());
    }

    #[test]
    fn test_recycled_fixture_carries_nothing_over() {
        let mut world = World::default();
        let body = world.create_body(&BodyDef::fixed()).unwrap();
        let fixture = world
            .create_fixture(
                body,
                &FixtureDef::new(Shape::circle(1.0)).filter(Filter::new(4, 4, -2)),
            )
            .unwrap();
        world.fixture_mut(fixture).unwrap().set_user_data(7u32);
        world.destroy_fixture(body, fixture).unwrap();

        let fixture = world
            .create_fixture_with_shape(body, Shape::circle(1.0), 0.0)
            .unwrap();
        let view = world.fixture(fixture).unwrap();
        assert!(view.user_data::<u32>().is_none());
        assert_eq!(view.filter(), Filter::default());
        assert_eq!(world.body(body).unwrap().fixtures(), &[fixture]);
    }

    #[test]
    fn test_destroying_middle_of_chain_removes_both_joints() {
        let mut world = World::default();
        let a = dynamic_ball(&mut world, 0.0, 0.0);
        let b = dynamic_ball(&mut world, 1.0, 0.0);
        let c = dynamic_ball(&mut world, 2.0, 0.0);
        world
            .create_joint(&JointDef::new(a, b, RevoluteJointDef::default()))
            .unwrap();
        world
            .create_joint(&JointDef::new(b, c, RevoluteJointDef::default()))
            .unwrap();
        assert_eq!(world.body(b).unwrap().joint_edges().len(), 2);

        world.destroy_body(b).unwrap();

        assert_eq!(world.joint_count(), 0);
        assert!(world.body(a).unwrap().joint_edges().is_empty());
        assert!(world.body(c).unwrap().joint_edges().is_empty());
        assert!(matches!(world.body(b), Err(PhysicsError::StaleBody(_))));
    }

    #[test]
    fn test_every_joint_kind_wires_one_edge_per_endpoint() {
        let mut world = World::new(Vec2::ZERO);
        let ground = world.create_body(&BodyDef::fixed()).unwrap();

        let wheel_a = dynamic_ball(&mut world, -2.0, 0.0);
        let wheel_b = dynamic_ball(&mut world, 2.0, 0.0);
        let axle_a = world
            .create_joint(&JointDef::new(ground, wheel_a, RevoluteJointDef::default()))
            .unwrap();
        let axle_b = world
            .create_joint(&JointDef::new(ground, wheel_b, PrismaticJointDef::default()))
            .unwrap();

        let kinds: Vec<JointKind> = vec![
            DistanceJointDef::default().into(),
            FrictionJointDef::default().into(),
            MotorJointDef::default().into(),
            MouseJointDef {
                target: Vec2::new(1.0, 1.0),
                max_force: 100.0,
                ..MouseJointDef::default()
            }
            .into(),
            PrismaticJointDef::default().into(),
            PulleyJointDef::default().into(),
            RevoluteJointDef::default().into(),
            RopeJointDef {
                max_length: 2.0,
                ..RopeJointDef::default()
            }
            .into(),
            WeldJointDef::default().into(),
            WheelJointDef::default().into(),
        ];

        let mut checked = vec![(JointType::Gear, wheel_a, wheel_b, {
            let def = JointDef::new(wheel_a, wheel_b, GearJointDef::new(axle_a, axle_b));
            world.create_joint(&def).unwrap()
        })];
        for kind in kinds {
            let a = dynamic_ball(&mut world, 0.0, 3.0);
            let b = dynamic_ball(&mut world, 1.0, 3.0);
            let joint = world.create_joint(&JointDef::new(a, b, kind)).unwrap();
            checked.push((kind.joint_type(), a, b, joint));
        }
        assert_eq!(checked.len(), 11);

        for (joint_type, a, b, joint) in checked {
            assert_eq!(world.joint(joint).unwrap().joint_type(), joint_type);
            for (body, other) in [(a, b), (b, a)] {
                let edges: Vec<_> = world
                    .body(body)
                    .unwrap()
                    .joint_edges()
                    .iter()
                    .filter(|edge| edge.joint == joint)
                    .copied()
                    .collect();
                assert_eq!(edges.len(), 1, "{:?} joint edge on {:?}", joint_type, body);
                assert_eq!(edges[0].other, other);
            }
        }

        run(&mut world, 3);
    }

    #[test]
    fn test_joint_to_same_body_is_rejected() {
        let mut world = World::default();
        let body = dynamic_ball(&mut world, 0.0, 0.0);
        let result = world.create_joint(&JointDef::new(body, body, WeldJointDef::default()));
        assert!(matches!(result, Err(PhysicsError::InvalidJoint(_))));
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn test_gear_needs_revolute_or_prismatic_joints() {
        let mut world = World::default();
        let a = dynamic_ball(&mut world, 0.0, 0.0);
        let b = dynamic_ball(&mut world, 1.0, 0.0);
        let rope = world
            .create_joint(&JointDef::new(a, b, RopeJointDef::default()))
            .unwrap();
        let hinge = world
            .create_joint(&JointDef::new(a, b, RevoluteJointDef::default()))
            .unwrap();

        let result = world.create_joint(&JointDef::new(a, b, GearJointDef::new(rope, hinge)));
        assert!(matches!(result, Err(PhysicsError::InvalidJoint(_))));
    }

    #[test]
    fn test_destroying_coupled_joint_destroys_gear() {
        let mut world = World::default();
        let ground = world.create_body(&BodyDef::fixed()).unwrap();
        let a = dynamic_ball(&mut world, -1.0, 0.0);
        let b = dynamic_ball(&mut world, 1.0, 0.0);
        let hinge_a = world
            .create_joint(&JointDef::new(ground, a, RevoluteJointDef::default()))
            .unwrap();
        let hinge_b = world
            .create_joint(&JointDef::new(ground, b, RevoluteJointDef::default()))
            .unwrap();
        let gear = world
            .create_joint(&JointDef::new(a, b, GearJointDef::new(hinge_a, hinge_b)))
            .unwrap();

        world.destroy_joint(hinge_a).unwrap();

        assert_eq!(world.joint_count(), 1);
        assert!(world.joint(hinge_b).is_ok());
        assert!(matches!(world.joint(gear), Err(PhysicsError::StaleJoint(_))));
        assert!(world.body(a).unwrap().joint_edges().is_empty());
        assert_eq!(world.body(b).unwrap().joint_edges().len(), 1);
    }

    #[test]
    fn test_stale_ids_are_errors() {
        let mut world = World::default();
        let body = dynamic_ball(&mut world, 0.0, 0.0);
        let fixture = world.body(body).unwrap().fixtures()[0];
        world.destroy_body(body).unwrap();

        assert!(matches!(world.destroy_body(body), Err(PhysicsError::StaleBody(_))));
        assert!(matches!(world.fixture(fixture), Err(PhysicsError::StaleFixture(_))));
        assert!(world.body_mut(body).is_err());
    }

    #[test]
    fn test_destroy_fixture_checks_owner() {
        let mut world = World::default();
        let a = dynamic_ball(&mut world, 0.0, 0.0);
        let b = dynamic_ball(&mut world, 3.0, 0.0);
        let fixture = world.body(a).unwrap().fixtures()[0];

        let result = world.destroy_fixture(b, fixture);
        assert!(matches!(result, Err(PhysicsError::FixtureNotOnBody { .. })));
        assert!(world.fixture(fixture).is_ok());
    }

    #[test]
    fn test_invalid_shape_leaves_no_trace() {
        let mut world = World::default();
        let body = world.create_body(&BodyDef::dynamic()).unwrap();
        let result = world.create_fixture_with_shape(body, Shape::circle(-1.0), 1.0);

        assert!(matches!(result, Err(PhysicsError::InvalidShape(_))));
        assert_eq!(world.fixture_count(), 0);
        assert!(world.body(body).unwrap().fixtures().is_empty());
    }

    fn ray_scene() -> World {
        let mut world = World::new(Vec2::ZERO);
        // Arena order differs from distance order along the ray.
        static_ball(&mut world, 4.0);
        static_ball(&mut world, 6.0);
        static_ball(&mut world, 2.0);
        world
    }

    fn cast(world: &World, mut answer: impl FnMut(&RayHit) -> f32) -> Vec<f32> {
        let mut hits = Vec::new();
        world.ray_cast(Vec2::ZERO, Vec2::new(10.0, 0.0), |_, hit| {
            hits.push(hit.fraction);
            answer(hit)
        });
        hits
    }

    #[test]
    fn test_ray_cast_zero_stops_after_first_hit() {
        let world = ray_scene();
        assert_eq!(cast(&world, |_| 0.0).len(), 1);
    }

    #[test]
    fn test_ray_cast_one_reports_everything() {
        let world = ray_scene();
        let hits = cast(&world, |_| 1.0);
        assert_eq!(hits.len(), 3);
        assert_relative_eq!(hits[0], 0.35, epsilon = 1e-4);
    }

    #[test]
    fn test_ray_cast_fraction_clips_later_hits() {
        let world = ray_scene();
        let hits = cast(&world, |hit| hit.fraction);

        // 4.0 clips the ray to 0.35; 6.0 lies beyond it, 2.0 is closer.
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0], 0.35, epsilon = 1e-4);
        assert_relative_eq!(hits[1], 0.15, epsilon = 1e-4);
    }

    #[test]
    fn test_ray_cast_negative_ignores_hit() {
        let world = ray_scene();
        assert_eq!(cast(&world, |_| -1.0).len(), 3);
    }

    #[test]
    fn test_ray_starting_inside_a_fixture_skips_it() {
        let mut world = World::new(Vec2::ZERO);
        static_ball(&mut world, 0.0);
        static_ball(&mut world, 4.0);
        static_ball(&mut world, 6.0);

        let closest = cast(&world, |hit| hit.fraction);
        assert_eq!(closest.len(), 1);
        assert_relative_eq!(closest[0], 0.35, epsilon = 1e-4);

        let all = cast(&world, |_| 1.0);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|fraction| *fraction > 0.0));
    }

    #[test]
    fn test_ray_hit_geometry() {
        let world = ray_scene();
        let mut first = None;
        world.ray_cast(Vec2::ZERO, Vec2::new(10.0, 0.0), |_, hit| {
            first.get_or_insert(*hit);
            0.0
        });
        let hit = first.unwrap();
        assert_relative_eq!(hit.point.x, 3.5, epsilon = 1e-4);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_query_aabb_false_stops_early() {
        let world = ray_scene();
        let bounds = Aabb::new(Vec2::new(0.0, -1.0), Vec2::new(10.0, 1.0));

        let mut reported = 0;
        world.query_aabb(&bounds, |_| {
            reported += 1;
            false
        });
        assert_eq!(reported, 1);

        let mut reported = 0;
        world.query_aabb(&bounds, |_| {
            reported += 1;
            true
        });
        assert_eq!(reported, 3);
    }

    #[test]
    fn test_inactive_bodies_are_not_queried() {
        let mut world = World::new(Vec2::ZERO);
        let fixture = static_ball(&mut world, 0.0);
        let body = world.fixture(fixture).unwrap().body();
        world.set_body_active(body, false).unwrap();

        let mut reported = 0;
        world.query_aabb(&Aabb::from_center(Vec2::ZERO, Vec2::ONE), |_| {
            reported += 1;
            true
        });
        assert_eq!(reported, 0);
    }

    struct BeginCounter(Arc<AtomicUsize>);

    impl ContactListener for BeginCounter {
        fn begin_contact(&mut self, _contact: &mut Contact<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_listener_sees_begin_contact() {
        let mut world = World::default();
        ground(&mut world);
        let ball = dynamic_ball(&mut world, 0.0, 2.0);
        let begins = Arc::new(AtomicUsize::new(0));
        world.set_contact_listener(BeginCounter(begins.clone()));

        run(&mut world, 120);

        assert!(begins.load(Ordering::SeqCst) >= 1);
        assert!(world.body(ball).unwrap().position().y > 0.5);
        assert!(world.contact_count() >= 1);
    }

    #[derive(Default, Clone)]
    struct Tally {
        begins: Arc<AtomicUsize>,
        ends: Arc<AtomicUsize>,
    }

    impl Tally {
        fn counts(&self) -> (usize, usize) {
            (
                self.begins.load(Ordering::SeqCst),
                self.ends.load(Ordering::SeqCst),
            )
        }
    }

    impl ContactListener for Tally {
        fn begin_contact(&mut self, _contact: &mut Contact<'_>) {
            self.begins.fetch_add(1, Ordering::SeqCst);
        }

        fn end_contact(&mut self, _contact: &mut Contact<'_>) {
            self.ends.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Ball resting on the ground with a tallying listener installed
    fn resting_ball() -> (World, BodyId, Tally) {
        let mut world = World::default();
        ground(&mut world);
        let ball = dynamic_ball(&mut world, 0.0, 2.0);
        let tally = Tally::default();
        world.set_contact_listener(tally.clone());
        run(&mut world, 60);
        let (begins, ends) = tally.counts();
        assert!(begins >= 1);
        assert_eq!(ends, begins - 1, "ball should be touching the ground");
        (world, ball, tally)
    }

    fn visited_contacts(world: &mut World) -> usize {
        let mut visited = 0;
        world.contacts(|_| visited += 1);
        visited
    }

    #[test]
    fn test_destroy_body_ends_its_contacts() {
        let (mut world, ball, tally) = resting_ball();

        world.destroy_body(ball).unwrap();
        let (begins, ends) = tally.counts();
        assert_eq!(ends, begins);
        assert_eq!(world.contact_count(), 0);
        assert_eq!(visited_contacts(&mut world), 0);

        run(&mut world, 5);
        assert_eq!(tally.counts(), (begins, ends));
    }

    #[test]
    fn test_destroy_fixture_ends_its_contacts() {
        let (mut world, ball, tally) = resting_ball();
        let fixture = world.body(ball).unwrap().fixtures()[0];

        world.destroy_fixture(ball, fixture).unwrap();
        let (begins, ends) = tally.counts();
        assert_eq!(ends, begins);
        assert_eq!(world.contact_count(), 0);
        assert_eq!(visited_contacts(&mut world), 0);

        run(&mut world, 5);
        assert_eq!(tally.counts(), (begins, ends));
    }

    #[test]
    fn test_deactivating_a_body_ends_its_contacts_once() {
        let (mut world, ball, tally) = resting_ball();

        world.set_body_active(ball, false).unwrap();
        assert!(!world.body(ball).unwrap().is_active());
        let (begins, ends) = tally.counts();
        assert_eq!(ends, begins);
        assert_eq!(world.contact_count(), 0);
        assert_eq!(visited_contacts(&mut world), 0);

        run(&mut world, 5);
        assert_eq!(tally.counts(), (begins, ends));

        // Deactivating twice has nothing left to end.
        world.set_body_active(ball, false).unwrap();
        assert_eq!(tally.counts(), (begins, ends));
    }

    struct Panicking;

    impl ContactListener for Panicking {
        fn begin_contact(&mut self, _contact: &mut Contact<'_>) {
            panic!("listener failure");
        }
    }

    #[test]
    fn test_panicking_listener_releases_the_lock() {
        let mut world = World::default();
        ground(&mut world);
        dynamic_ball(&mut world, 0.0, 2.0);
        world.set_contact_listener(Panicking);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run(&mut world, 120);
        }));
        assert!(result.is_err());
        assert!(!world.is_locked());
        assert!(world.create_body(&BodyDef::dynamic()).is_ok());
    }

    #[test]
    fn test_contacts_visits_touching_pairs() {
        let mut world = World::default();
        let ground = ground(&mut world);
        let ball = dynamic_ball(&mut world, 0.0, 2.0);
        run(&mut world, 120);

        let mut pairs = Vec::new();
        world.contacts(|contact| {
            assert!(contact.is_touching());
            pairs.push(contact.body_ids());
        });
        assert!(pairs.contains(&(ground, ball)) || pairs.contains(&(ball, ground)));
    }

    #[test]
    fn test_rejecting_filter_lets_body_fall_through() {
        let mut world = World::default();
        ground(&mut world);
        let ball = dynamic_ball(&mut world, 0.0, 2.0);
        world.set_contact_filter(|_: &Fixture, _: &Fixture| false);

        run(&mut world, 120);
        assert!(world.body(ball).unwrap().position().y < -1.0);

        assert!(world.take_contact_filter().is_some());
        assert!(world.take_contact_filter().is_none());
    }

    #[test]
    fn test_default_rule_applies_without_filter() {
        let mut world = World::default();
        let ground_body = world.create_body(&BodyDef::fixed()).unwrap();
        world
            .create_fixture(
                ground_body,
                &FixtureDef::new(Shape::boxed(10.0, 0.5)).filter(Filter::new(0x0002, 0xFFFF, 0)),
            )
            .unwrap();
        let ball = world
            .create_body(&BodyDef::dynamic().position(0.0, 2.0))
            .unwrap();
        world
            .create_fixture(
                ball,
                &FixtureDef::new(Shape::circle(0.5))
                    .density(1.0)
                    .filter(Filter::new(0x0001, 0x0001, 0)),
            )
            .unwrap();

        run(&mut world, 120);
        assert!(
            world.body(ball).unwrap().position().y < -1.0,
            "Ball mask excludes the ground category"
        );
    }

    struct Phantom;

    impl ContactListener for Phantom {
        fn pre_solve(&mut self, contact: &mut Contact<'_>, _manifold: &Manifold) {
            contact.set_enabled(false);
        }
    }

    #[test]
    fn test_pre_solve_disable_lets_body_fall_through() {
        let mut world = World::default();
        ground(&mut world);
        let ball = dynamic_ball(&mut world, 0.0, 2.0);
        world.set_contact_listener(Phantom);

        run(&mut world, 120);
        assert!(world.body(ball).unwrap().position().y < -1.0);
    }

    #[test]
    fn test_step_with_zero_dt_is_a_no_op() {
        let mut world = World::default();
        let ball = dynamic_ball(&mut world, 0.0, 2.0);
        world.step(0.0, 8, 3);
        assert_relative_eq!(world.body(ball).unwrap().position().y, 2.0);
        assert!(!world.is_locked());
    }

    #[test]
    fn test_mass_follows_density() {
        let mut world = World::default();
        let ball = dynamic_ball(&mut world, 0.0, 0.0);
        run(&mut world, 1);
        let mass = world.body(ball).unwrap().mass();
        assert_relative_eq!(mass, std::f32::consts::PI * 0.25, epsilon = 1e-3);
    }

    #[test]
    fn test_gravity_roundtrip() {
        let mut world = World::default();
        assert_eq!(world.gravity(), Vec2::new(0.0, -10.0));
        world.set_gravity(Vec2::new(1.0, 0.0));
        assert_eq!(world.gravity(), Vec2::new(1.0, 0.0));
        assert_eq!(world.config().gravity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_motor_speed_only_on_motorized_joints() {
        let mut world = World::default();
        let a = dynamic_ball(&mut world, 0.0, 0.0);
        let b = dynamic_ball(&mut world, 1.0, 0.0);
        let hinge = world
            .create_joint(&JointDef::new(a, b, RevoluteJointDef::default()))
            .unwrap();
        let rope = world
            .create_joint(&JointDef::new(a, b, RopeJointDef::default()))
            .unwrap();

        let mut joint = world.joint_mut(hinge).unwrap();
        joint.enable_motor(true).unwrap();
        joint.set_motor_speed(2.0).unwrap();
        let JointKind::Revolute(def) = *joint.get().kind() else {
            panic!("kind changed");
        };
        assert!(def.enable_motor);
        assert_eq!(def.motor_speed, 2.0);

        let result = world.joint_mut(rope).unwrap().set_motor_speed(1.0);
        assert!(matches!(result, Err(PhysicsError::InvalidJoint(_))));
    }

    fn friction_slide(max_force: f32) -> f32 {
        let mut world = World::new(Vec2::ZERO);
        let ground = world.create_body(&BodyDef::fixed()).unwrap();
        let puck = world
            .create_body(&BodyDef::dynamic().linear_velocity(5.0, 0.0))
            .unwrap();
        world
            .create_fixture_with_shape(puck, Shape::circle(0.5), 1.0)
            .unwrap();
        let def = FrictionJointDef {
            max_force,
            max_torque: max_force,
            ..FrictionJointDef::default()
        };
        world.create_joint(&JointDef::new(ground, puck, def)).unwrap();

        run(&mut world, 60);
        world.body(puck).unwrap().linear_velocity().length()
    }

    #[test]
    fn test_friction_joint_brakes_within_its_force() {
        assert!(friction_slide(1000.0) < 0.5);
        assert!(friction_slide(0.1) > 4.0);
    }

    #[test]
    fn test_friction_joint_force_is_adjustable() {
        let mut world = World::new(Vec2::ZERO);
        let ground = world.create_body(&BodyDef::fixed()).unwrap();
        let puck = world
            .create_body(&BodyDef::dynamic().linear_velocity(5.0, 0.0))
            .unwrap();
        world
            .create_fixture_with_shape(puck, Shape::circle(0.5), 1.0)
            .unwrap();
        let joint = world
            .create_joint(&JointDef::new(ground, puck, FrictionJointDef::default()))
            .unwrap();

        run(&mut world, 10);
        assert!(world.body(puck).unwrap().linear_velocity().x > 4.5);

        world.joint_mut(joint).unwrap().set_max_force(1000.0).unwrap();
        run(&mut world, 60);
        assert!(world.body(puck).unwrap().linear_velocity().length() < 0.5);
    }

    #[test]
    fn test_wheel_joint_only_slides_along_its_axis() {
        let mut world = World::new(Vec2::ZERO);
        let chassis = world.create_body(&BodyDef::fixed()).unwrap();
        let wheel = world
            .create_body(&BodyDef::dynamic().linear_velocity(5.0, 0.0))
            .unwrap();
        world
            .create_fixture_with_shape(wheel, Shape::circle(0.5), 1.0)
            .unwrap();
        let def = WheelJointDef::initialize(
            &world.body(chassis).unwrap(),
            &world.body(wheel).unwrap(),
            Vec2::ZERO,
            Vec2::Y,
        );
        world.create_joint(&def).unwrap();

        run(&mut world, 30);
        assert!(world.body(wheel).unwrap().position().x.abs() < 0.1);
    }

    #[test]
    fn test_initialize_converts_world_anchor() {
        let mut world = World::default();
        let a = world.create_body(&BodyDef::fixed().position(1.0, 0.0)).unwrap();
        let b = world
            .create_body(&BodyDef::dynamic().position(3.0, 0.0))
            .unwrap();
        let def = RevoluteJointDef::initialize(
            &world.body(a).unwrap(),
            &world.body(b).unwrap(),
            Vec2::new(2.0, 0.0),
        );
        let joint = world.create_joint(&def).unwrap();

        let view = world.joint(joint).unwrap();
        assert_relative_eq!(view.anchor_a().x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(view.anchor_b().x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(view.proxy().local_anchor_b().x, -1.0, epsilon = 1e-5);
    }
}
