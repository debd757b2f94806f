// Adapter over the rapier2d pipeline
//
// Everything above this module talks in `Handle`s and plain definitions;
// rapier types do not leak out.

mod hooks;
mod joints;

pub(crate) use hooks::StepCallbacks;

use super::body::{BodyDef, BodyType};
use super::contact::{ContactImpulse, ContactRecord};
use super::fixture::{FixtureDef, Shape};
use super::joint::JointKind;
use super::{Handle, PhysicsError};
use crate::core::math::{Aabb, Transform};
use glam::Vec2;
use hooks::StepHooks;
use log::error;
use rapier2d::parry::bounding_volume::{Aabb as NativeAabb, BoundingVolume};
use rapier2d::prelude::*;
use std::collections::HashSet;
use std::num::NonZeroUsize;

/// Where a ray entered a fixture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec2,
    pub normal: Vec2,
    /// Position along the ray, `0` at the start point and `1` at the end point
    pub fraction: f32,
}

/// The native simulation: rapier's pipeline plus the per-world contact scratch
pub(crate) struct NativeWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,

    /// Single contact record overwritten for every reported pair
    contact: ContactRecord,

    /// Single impulse buffer overwritten for every post-solve report
    impulse: ContactImpulse,

    /// Pairs whose end was already reported outside a step; rapier's own
    /// stop event for them during the next step is dropped
    ended_pairs: HashSet<(Handle, Handle)>,
}

#[cold]
#[track_caller]
fn native_miss(kind: &str, handle: Handle) -> ! {
    error!("native {} {} is gone while its proxy is live", kind, handle);
    panic!("native {} {} is gone while its proxy is live", kind, handle);
}

fn body_handle(handle: Handle) -> RigidBodyHandle {
    let (index, generation) = handle.parts();
    RigidBodyHandle::from_raw_parts(index, generation)
}

fn collider_handle(handle: Handle) -> ColliderHandle {
    let (index, generation) = handle.parts();
    ColliderHandle::from_raw_parts(index, generation)
}

fn joint_handle(handle: Handle) -> ImpulseJointHandle {
    let (index, generation) = handle.parts();
    ImpulseJointHandle::from_raw_parts(index, generation)
}

fn from_collider(handle: ColliderHandle) -> Handle {
    let (index, generation) = handle.into_raw_parts();
    Handle::from_parts(index, generation)
}

/// Order-independent key of a collider pair
fn pair_key(collider1: ColliderHandle, collider2: ColliderHandle) -> (Handle, Handle) {
    let (a, b) = (from_collider(collider1), from_collider(collider2));
    if a.as_u64() <= b.as_u64() {
        (a, b)
    } else {
        (b, a)
    }
}

fn to_point(v: Vec2) -> Point<Real> {
    point![v.x, v.y]
}

fn to_vector(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn from_vector(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn from_point(p: &Point<Real>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

fn collider_builder(shape: &Shape) -> Result<ColliderBuilder, PhysicsError> {
    shape.validate().map_err(PhysicsError::InvalidShape)?;
    let builder = match shape {
        Shape::Circle { radius, center } => {
            ColliderBuilder::ball(*radius).translation(to_vector(*center))
        }
        Shape::Polygon { vertices } => {
            let points: Vec<_> = vertices.iter().copied().map(to_point).collect();
            ColliderBuilder::convex_hull(&points).ok_or_else(|| {
                PhysicsError::InvalidShape("polygon vertices are degenerate".to_string())
            })?
        }
        Shape::Box {
            half_extents,
            center,
            angle,
        } => ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            .translation(to_vector(*center))
            .rotation(*angle),
        Shape::Edge { v1, v2 } => ColliderBuilder::segment(to_point(*v1), to_point(*v2)),
        Shape::Chain { vertices, looped } => {
            let points: Vec<_> = vertices.iter().copied().map(to_point).collect();
            let indices = looped.then(|| {
                let n = points.len() as u32;
                (0..n).map(|i| [i, (i + 1) % n]).collect()
            });
            ColliderBuilder::polyline(points, indices)
        }
    };
    Ok(builder)
}

impl NativeWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            contact: ContactRecord::default(),
            impulse: ContactImpulse::default(),
            ended_pairs: HashSet::new(),
        }
    }

    pub fn gravity(&self) -> Vec2 {
        from_vector(&self.gravity)
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = to_vector(gravity);
    }

    /// Advance the simulation, dispatching callbacks synchronously
    ///
    /// Position iterations have no rapier counterpart; the solver runs
    /// `velocity_iterations` iterations per step.
    pub fn step(&mut self, dt: f32, velocity_iterations: u32, callbacks: &mut dyn StepCallbacks) {
        self.integration_parameters.dt = dt;
        self.integration_parameters.num_solver_iterations =
            NonZeroUsize::new(velocity_iterations as usize).unwrap_or(NonZeroUsize::MIN);

        let hooks = StepHooks::new(
            callbacks,
            &mut self.contact,
            &mut self.impulse,
            &self.ended_pairs,
        );

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &hooks,
            &hooks,
        );
        self.ended_pairs.clear();
    }

    /// Reset user forces and torques on every body
    pub fn clear_forces(&mut self) {
        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }
    }

    // Bodies

    pub fn create_body(&mut self, def: &BodyDef, allow_sleep: bool) -> Handle {
        let builder = match def.body_type {
            BodyType::Static => RigidBodyBuilder::fixed(),
            BodyType::Kinematic => RigidBodyBuilder::kinematic_velocity_based(),
            BodyType::Dynamic => RigidBodyBuilder::dynamic(),
        };
        let mut builder = builder
            .translation(to_vector(def.position))
            .rotation(def.angle)
            .linvel(to_vector(def.linear_velocity))
            .angvel(def.angular_velocity)
            .linear_damping(def.linear_damping)
            .angular_damping(def.angular_damping)
            .can_sleep(def.allow_sleep && allow_sleep)
            .sleeping(!def.awake)
            .ccd_enabled(def.bullet)
            .enabled(def.active)
            .gravity_scale(def.gravity_scale);
        if def.fixed_rotation {
            builder = builder.lock_rotations();
        }

        let handle = self.rigid_body_set.insert(builder.build());
        let (index, generation) = handle.into_raw_parts();
        Handle::from_parts(index, generation)
    }

    /// Remove a body; its colliders and joints must already be gone
    pub fn destroy_body(&mut self, handle: Handle) {
        let removed = self.rigid_body_set.remove(
            body_handle(handle),
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        if removed.is_none() {
            native_miss("body", handle);
        }
    }

    fn body(&self, handle: Handle) -> &RigidBody {
        self.rigid_body_set
            .get(body_handle(handle))
            .unwrap_or_else(|| native_miss("body", handle))
    }

    fn body_mut(&mut self, handle: Handle) -> &mut RigidBody {
        self.rigid_body_set
            .get_mut(body_handle(handle))
            .unwrap_or_else(|| native_miss("body", handle))
    }

    pub fn body_type(&self, handle: Handle) -> BodyType {
        match self.body(handle).body_type() {
            RigidBodyType::Fixed => BodyType::Static,
            RigidBodyType::Dynamic => BodyType::Dynamic,
            RigidBodyType::KinematicPositionBased | RigidBodyType::KinematicVelocityBased => {
                BodyType::Kinematic
            }
        }
    }

    pub fn set_body_type(&mut self, handle: Handle, body_type: BodyType) {
        let native = match body_type {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicVelocityBased,
            BodyType::Dynamic => RigidBodyType::Dynamic,
        };
        self.body_mut(handle).set_body_type(native, true);
    }

    pub fn body_transform(&self, handle: Handle) -> Transform {
        let position = self.body(handle).position();
        Transform::new(
            from_vector(&position.translation.vector),
            position.rotation.angle(),
        )
    }

    pub fn set_body_transform(&mut self, handle: Handle, transform: Transform) {
        let position = Isometry::new(to_vector(transform.position), transform.angle);
        self.body_mut(handle).set_position(position, true);
    }

    pub fn body_world_center(&self, handle: Handle) -> Vec2 {
        from_point(self.body(handle).center_of_mass())
    }

    pub fn body_local_center(&self, handle: Handle) -> Vec2 {
        from_point(&self.body(handle).mass_properties().local_mprops.local_com)
    }

    pub fn body_linear_velocity(&self, handle: Handle) -> Vec2 {
        from_vector(self.body(handle).linvel())
    }

    pub fn set_body_linear_velocity(&mut self, handle: Handle, velocity: Vec2) {
        self.body_mut(handle).set_linvel(to_vector(velocity), true);
    }

    pub fn body_angular_velocity(&self, handle: Handle) -> f32 {
        self.body(handle).angvel()
    }

    pub fn set_body_angular_velocity(&mut self, handle: Handle, omega: f32) {
        self.body_mut(handle).set_angvel(omega, true);
    }

    pub fn body_mass(&self, handle: Handle) -> f32 {
        self.body(handle).mass()
    }

    pub fn body_inertia(&self, handle: Handle) -> f32 {
        self.body(handle)
            .mass_properties()
            .local_mprops
            .principal_inertia()
    }

    pub fn body_velocity_at_point(&self, handle: Handle, point: Vec2) -> Vec2 {
        from_vector(&self.body(handle).velocity_at_point(&to_point(point)))
    }

    /// Force at a world point, or at the centre of mass when `point` is `None`
    pub fn apply_body_force(&mut self, handle: Handle, force: Vec2, point: Option<Vec2>, wake: bool) {
        let body = self.body_mut(handle);
        match point {
            Some(point) => body.add_force_at_point(to_vector(force), to_point(point), wake),
            None => body.add_force(to_vector(force), wake),
        }
    }

    pub fn apply_body_torque(&mut self, handle: Handle, torque: f32, wake: bool) {
        self.body_mut(handle).add_torque(torque, wake);
    }

    pub fn apply_body_impulse(
        &mut self,
        handle: Handle,
        impulse: Vec2,
        point: Option<Vec2>,
        wake: bool,
    ) {
        let body = self.body_mut(handle);
        match point {
            Some(point) => body.apply_impulse_at_point(to_vector(impulse), to_point(point), wake),
            None => body.apply_impulse(to_vector(impulse), wake),
        }
    }

    pub fn apply_body_angular_impulse(&mut self, handle: Handle, impulse: f32, wake: bool) {
        self.body_mut(handle).apply_torque_impulse(impulse, wake);
    }

    pub fn body_linear_damping(&self, handle: Handle) -> f32 {
        self.body(handle).linear_damping()
    }

    pub fn set_body_linear_damping(&mut self, handle: Handle, damping: f32) {
        self.body_mut(handle).set_linear_damping(damping);
    }

    pub fn body_angular_damping(&self, handle: Handle) -> f32 {
        self.body(handle).angular_damping()
    }

    pub fn set_body_angular_damping(&mut self, handle: Handle, damping: f32) {
        self.body_mut(handle).set_angular_damping(damping);
    }

    pub fn body_gravity_scale(&self, handle: Handle) -> f32 {
        self.body(handle).gravity_scale()
    }

    pub fn set_body_gravity_scale(&mut self, handle: Handle, scale: f32) {
        self.body_mut(handle).set_gravity_scale(scale, true);
    }

    pub fn body_is_bullet(&self, handle: Handle) -> bool {
        self.body(handle).is_ccd_enabled()
    }

    pub fn set_body_bullet(&mut self, handle: Handle, bullet: bool) {
        self.body_mut(handle).enable_ccd(bullet);
    }

    pub fn body_is_awake(&self, handle: Handle) -> bool {
        !self.body(handle).is_sleeping()
    }

    pub fn set_body_awake(&mut self, handle: Handle, awake: bool) {
        let body = self.body_mut(handle);
        if awake {
            body.wake_up(true);
        } else {
            body.sleep();
        }
    }

    pub fn body_is_active(&self, handle: Handle) -> bool {
        self.body(handle).is_enabled()
    }

    pub fn set_body_active(&mut self, handle: Handle, active: bool) {
        self.body_mut(handle).set_enabled(active);
    }

    pub fn body_is_fixed_rotation(&self, handle: Handle) -> bool {
        self.body(handle)
            .locked_axes()
            .contains(LockedAxes::ROTATION_LOCKED)
    }

    pub fn set_body_fixed_rotation(&mut self, handle: Handle, fixed: bool) {
        self.body_mut(handle).lock_rotations(fixed, true);
    }

    // Fixtures

    /// Attach a collider to a body
    ///
    /// Every collider reports collision and force events and runs the
    /// filtering and solver-modification hooks, so listeners see all pairs.
    pub fn create_fixture(&mut self, body: Handle, def: &FixtureDef) -> Result<Handle, PhysicsError> {
        let collider = collider_builder(&def.shape)?
            .friction(def.friction)
            .restitution(def.restitution)
            .density(def.density)
            .sensor(def.is_sensor)
            .active_events(ActiveEvents::COLLISION_EVENTS | ActiveEvents::CONTACT_FORCE_EVENTS)
            .active_hooks(
                ActiveHooks::FILTER_CONTACT_PAIRS
                    | ActiveHooks::FILTER_INTERSECTION_PAIR
                    | ActiveHooks::MODIFY_SOLVER_CONTACTS,
            )
            .contact_force_event_threshold(0.0)
            .build();

        let parent = body_handle(body);
        if !self.rigid_body_set.contains(parent) {
            native_miss("body", body);
        }
        let handle =
            self.collider_set
                .insert_with_parent(collider, parent, &mut self.rigid_body_set);
        Ok(from_collider(handle))
    }

    pub fn destroy_fixture(&mut self, handle: Handle) {
        let removed = self.collider_set.remove(
            collider_handle(handle),
            &mut self.island_manager,
            &mut self.rigid_body_set,
            true,
        );
        if removed.is_none() {
            native_miss("fixture", handle);
        }
    }

    fn collider(&self, handle: Handle) -> &Collider {
        self.collider_set
            .get(collider_handle(handle))
            .unwrap_or_else(|| native_miss("fixture", handle))
    }

    fn collider_mut(&mut self, handle: Handle) -> &mut Collider {
        self.collider_set
            .get_mut(collider_handle(handle))
            .unwrap_or_else(|| native_miss("fixture", handle))
    }

    pub fn fixture_is_sensor(&self, handle: Handle) -> bool {
        self.collider(handle).is_sensor()
    }

    pub fn set_fixture_sensor(&mut self, handle: Handle, is_sensor: bool) {
        self.collider_mut(handle).set_sensor(is_sensor);
    }

    pub fn fixture_friction(&self, handle: Handle) -> f32 {
        self.collider(handle).friction()
    }

    pub fn set_fixture_friction(&mut self, handle: Handle, friction: f32) {
        self.collider_mut(handle).set_friction(friction);
    }

    pub fn fixture_restitution(&self, handle: Handle) -> f32 {
        self.collider(handle).restitution()
    }

    pub fn set_fixture_restitution(&mut self, handle: Handle, restitution: f32) {
        self.collider_mut(handle).set_restitution(restitution);
    }

    pub fn fixture_density(&self, handle: Handle) -> f32 {
        self.collider(handle).density()
    }

    pub fn set_fixture_density(&mut self, handle: Handle, density: f32) {
        self.collider_mut(handle).set_density(density);
    }

    pub fn fixture_test_point(&self, handle: Handle, point: Vec2) -> bool {
        let collider = self.collider(handle);
        collider
            .shape()
            .contains_point(collider.position(), &to_point(point))
    }

    pub fn fixture_aabb(&self, handle: Handle) -> Aabb {
        let aabb = self.collider(handle).compute_aabb();
        Aabb::new(from_point(&aabb.mins), from_point(&aabb.maxs))
    }

    // Joints

    pub fn create_joint(
        &mut self,
        body_a: Handle,
        body_b: Handle,
        kind: &JointKind,
        anchors: (Vec2, Vec2),
        collide_connected: bool,
    ) -> Handle {
        let data = joints::build(kind, anchors, collide_connected);
        let handle =
            self.impulse_joint_set
                .insert(body_handle(body_a), body_handle(body_b), data, true);
        let (index, generation) = handle.into_raw_parts();
        Handle::from_parts(index, generation)
    }

    /// Replace the constraint data of a live joint and wake its bodies
    pub fn rebuild_joint(
        &mut self,
        handle: Handle,
        kind: &JointKind,
        anchors: (Vec2, Vec2),
        collide_connected: bool,
    ) {
        let data = joints::build(kind, anchors, collide_connected);
        let joint = self
            .impulse_joint_set
            .get_mut(joint_handle(handle))
            .unwrap_or_else(|| native_miss("joint", handle));
        joint.data = data;
        let bodies = [joint.body1, joint.body2];
        for body in bodies {
            if let Some(body) = self.rigid_body_set.get_mut(body) {
                body.wake_up(true);
            }
        }
    }

    pub fn destroy_joint(&mut self, handle: Handle) {
        if self
            .impulse_joint_set
            .remove(joint_handle(handle), true)
            .is_none()
        {
            native_miss("joint", handle);
        }
    }

    /// Linear and angular impulses the solver applied in the last step
    pub fn joint_impulses(&self, handle: Handle) -> (Vec2, f32) {
        let joint = self
            .impulse_joint_set
            .get(joint_handle(handle))
            .unwrap_or_else(|| native_miss("joint", handle));
        let impulses = joint.impulses;
        (Vec2::new(impulses[0], impulses[1]), impulses[2])
    }

    // Queries

    /// Report every collider whose bounding box overlaps `aabb`
    ///
    /// Returning `false` from `report` ends the query.
    pub fn query_aabb(&self, aabb: &Aabb, report: &mut dyn FnMut(Handle) -> bool) {
        let bounds = NativeAabb::new(to_point(aabb.lower), to_point(aabb.upper));
        for (handle, collider) in self.collider_set.iter() {
            if !collider_is_live(&self.rigid_body_set, &self.collider_set, handle) {
                continue;
            }
            if collider.compute_aabb().intersects(&bounds) && !report(from_collider(handle)) {
                return;
            }
        }
    }

    /// Report colliders crossed by the segment `p1..p2`
    ///
    /// Colliders containing `p1` are skipped.
    ///
    /// The value `report` returns steers the query: `0` stops it, a
    /// negative value ignores the hit, and a positive value becomes the new
    /// clip fraction for all later candidates.
    pub fn ray_cast(
        &self,
        p1: Vec2,
        p2: Vec2,
        report: &mut dyn FnMut(Handle, &RayHit) -> f32,
    ) {
        let direction = p2 - p1;
        if direction.length_squared() <= f32::EPSILON {
            return;
        }
        let ray = Ray::new(to_point(p1), to_vector(direction));
        let mut clip = 1.0;

        for (handle, collider) in self.collider_set.iter() {
            if !collider_is_live(&self.rigid_body_set, &self.collider_set, handle) {
                continue;
            }
            let Some(intersection) =
                collider
                    .shape()
                    .cast_ray_and_get_normal(collider.position(), &ray, clip, true)
            else {
                continue;
            };
            // A solid cast hits at zero when the ray starts inside the shape;
            // such fixtures are not reported.
            if intersection.time_of_impact <= 0.0 {
                continue;
            }

            let hit = RayHit {
                point: from_point(&ray.point_at(intersection.time_of_impact)),
                normal: from_vector(&intersection.normal),
                fraction: intersection.time_of_impact,
            };
            let value = report(from_collider(handle), &hit);
            if value == 0.0 {
                return;
            }
            if value > 0.0 {
                clip = value;
            }
        }
    }

    // Contacts

    /// Touching contact pairs plus overlapping sensor pairs
    ///
    /// Pairs with a destroyed or inactive side are left out even before the
    /// next step drops them natively.
    pub fn contact_count(&self) -> usize {
        let touching = self
            .narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .filter(|pair| self.pair_is_live(pair.collider1, pair.collider2))
            .count();
        let overlapping = self
            .narrow_phase
            .intersection_pairs()
            .filter(|(a, b, intersecting)| *intersecting && self.pair_is_live(*a, *b))
            .count();
        touching + overlapping
    }

    /// Load every touching pair into the shared contact record in turn
    pub fn for_each_contact(&mut self, visit: &mut dyn FnMut(&mut ContactRecord)) {
        let record = &mut self.contact;
        let live = |a, b| {
            collider_is_live(&self.rigid_body_set, &self.collider_set, a)
                && collider_is_live(&self.rigid_body_set, &self.collider_set, b)
        };
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact || !live(pair.collider1, pair.collider2) {
                continue;
            }
            load_pair(record, pair);
            record.touching = true;
            visit(record);
        }
        for (collider1, collider2, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting || !live(collider1, collider2) {
                continue;
            }
            record.begin(from_collider(collider1), from_collider(collider2));
            record.touching = true;
            visit(record);
        }
    }

    /// Report the end of every touching pair `fixture` is part of
    ///
    /// Used right before the fixture is destroyed or its body deactivated,
    /// while both proxies are still registered. rapier's own stop event for
    /// these pairs during the next step is suppressed.
    pub fn end_contacts_of(&mut self, fixture: Handle, callbacks: &mut dyn StepCallbacks) {
        let collider = collider_handle(fixture);
        if !collider_is_live(&self.rigid_body_set, &self.collider_set, collider) {
            return;
        }
        let record = &mut self.contact;

        for pair in self.narrow_phase.contact_pairs_with(collider) {
            if !pair.has_any_active_contact {
                continue;
            }
            let key = pair_key(pair.collider1, pair.collider2);
            if !self.ended_pairs.insert(key) {
                continue;
            }
            load_pair(record, pair);
            record.touching = false;
            callbacks.end_contact(record);
        }
        for (collider1, collider2, intersecting) in self.narrow_phase.intersection_pairs_with(collider)
        {
            if !intersecting || !self.ended_pairs.insert(pair_key(collider1, collider2)) {
                continue;
            }
            record.begin(from_collider(collider1), from_collider(collider2));
            record.touching = false;
            callbacks.end_contact(record);
        }
    }

    fn pair_is_live(&self, collider1: ColliderHandle, collider2: ColliderHandle) -> bool {
        collider_is_live(&self.rigid_body_set, &self.collider_set, collider1)
            && collider_is_live(&self.rigid_body_set, &self.collider_set, collider2)
    }
}

/// Whether a collider still exists and takes part in the simulation
fn collider_is_live(bodies: &RigidBodySet, colliders: &ColliderSet, handle: ColliderHandle) -> bool {
    colliders.get(handle).is_some_and(|collider| {
        collider.is_enabled()
            && collider
                .parent()
                .and_then(|parent| bodies.get(parent))
                .map_or(true, |body| body.is_enabled())
    })
}

/// Point the shared record at a native pair and copy its first manifold
fn load_pair(record: &mut ContactRecord, pair: &ContactPair) {
    record.begin(from_collider(pair.collider1), from_collider(pair.collider2));
    if let Some(manifold) = pair.manifolds.iter().find(|m| !m.points.is_empty()) {
        hooks::fill_manifold(
            record,
            manifold,
            &manifold.data.solver_contacts,
            &manifold.data.normal,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Silent;

    impl StepCallbacks for Silent {
        fn should_collide(&mut self, _a: Handle, _b: Handle) -> bool {
            true
        }
        fn begin_contact(&mut self, _contact: &mut ContactRecord) {}
        fn end_contact(&mut self, _contact: &mut ContactRecord) {}
        fn pre_solve(&mut self, _contact: &mut ContactRecord) {}
        fn post_solve(&mut self, _contact: &mut ContactRecord, _impulse: &ContactImpulse) {}
    }

    #[test]
    fn test_body_roundtrips_initial_state() {
        let mut world = NativeWorld::new(Vec2::new(0.0, -10.0));
        let def = BodyDef::dynamic()
            .position(1.0, 2.0)
            .angle(0.5)
            .linear_velocity(3.0, 0.0)
            .fixed_rotation(true);
        let body = world.create_body(&def, true);

        let transform = world.body_transform(body);
        assert_relative_eq!(transform.position.x, 1.0);
        assert_relative_eq!(transform.position.y, 2.0);
        assert_relative_eq!(transform.angle, 0.5, epsilon = 1e-6);
        assert_relative_eq!(world.body_linear_velocity(body).x, 3.0);
        assert_eq!(world.body_type(body), BodyType::Dynamic);
        assert!(world.body_is_fixed_rotation(body));
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = NativeWorld::new(Vec2::new(0.0, -10.0));
        let body = world.create_body(&BodyDef::dynamic(), true);
        world
            .create_fixture(body, &FixtureDef::new(Shape::circle(0.5)).density(1.0))
            .unwrap();

        for _ in 0..10 {
            world.step(1.0 / 60.0, 8, &mut Silent);
        }
        assert!(world.body_transform(body).position.y < 0.0);
    }

    #[test]
    fn test_stale_handle_does_not_resolve() {
        let mut world = NativeWorld::new(Vec2::ZERO);
        let first = world.create_body(&BodyDef::fixed(), true);
        world.destroy_body(first);
        let second = world.create_body(&BodyDef::fixed(), true);

        assert_eq!(first.parts().0, second.parts().0, "Slot should be reused");
        assert_ne!(first, second);
        assert!(world.rigid_body_set.get(body_handle(first)).is_none());
    }

    #[test]
    fn test_fixture_aabb_and_point() {
        let mut world = NativeWorld::new(Vec2::ZERO);
        let body = world.create_body(&BodyDef::fixed().position(2.0, 0.0), true);
        let fixture = world
            .create_fixture(body, &FixtureDef::new(Shape::boxed(1.0, 0.5)))
            .unwrap();

        let aabb = world.fixture_aabb(fixture);
        assert_relative_eq!(aabb.lower.x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(aabb.upper.y, 0.5, epsilon = 1e-4);
        assert!(world.fixture_test_point(fixture, Vec2::new(2.5, 0.0)));
        assert!(!world.fixture_test_point(fixture, Vec2::new(3.5, 0.0)));
    }

    #[test]
    fn test_zero_length_ray_reports_nothing() {
        let mut world = NativeWorld::new(Vec2::ZERO);
        let body = world.create_body(&BodyDef::fixed(), true);
        world
            .create_fixture(body, &FixtureDef::new(Shape::circle(1.0)))
            .unwrap();

        let mut reports = 0;
        world.ray_cast(Vec2::ZERO, Vec2::ZERO, &mut |_, _| {
            reports += 1;
            1.0
        });
        assert_eq!(reports, 0);
    }
}
