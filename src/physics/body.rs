use super::handle::{BodyId, FixtureId, Handle, JointId};
use super::native::NativeWorld;
use super::pool::Poolable;
use super::UserData;
use crate::core::math::Transform;
use glam::Vec2;
use std::any::Any;

/// How a body participates in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyType {
    /// Zero velocity, infinite mass, never moves
    #[default]
    Static,
    /// Moved by its velocity only, unaffected by forces
    Kinematic,
    /// Fully simulated
    Dynamic,
}

/// Full initial state of a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: Vec2,
    pub angle: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub allow_sleep: bool,
    pub awake: bool,
    pub fixed_rotation: bool,
    /// Continuous collision detection against other dynamic bodies
    pub bullet: bool,
    pub active: bool,
    pub gravity_scale: f32,
}

impl BodyDef {
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            allow_sleep: true,
            awake: true,
            fixed_rotation: false,
            bullet: false,
            active: true,
            gravity_scale: 1.0,
        }
    }

    /// Create a new dynamic body (affected by forces and collisions)
    pub fn dynamic() -> Self {
        Self::new(BodyType::Dynamic)
    }

    /// Create a new kinematic body
    pub fn kinematic() -> Self {
        Self::new(BodyType::Kinematic)
    }

    /// Create a new static body (completely immovable)
    pub fn fixed() -> Self {
        Self::new(BodyType::Static)
    }

    /// Set the initial position of the body
    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    /// Set the initial rotation (radians)
    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn linear_velocity(mut self, x: f32, y: f32) -> Self {
        self.linear_velocity = Vec2::new(x, y);
        self
    }

    pub fn angular_velocity(mut self, omega: f32) -> Self {
        self.angular_velocity = omega;
        self
    }

    pub fn damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn allow_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }

    pub fn awake(mut self, awake: bool) -> Self {
        self.awake = awake;
        self
    }

    /// Lock rotation (useful for player characters)
    pub fn fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    pub fn bullet(mut self, bullet: bool) -> Self {
        self.bullet = bullet;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the gravity scale (1.0 = normal gravity, 0.0 = no gravity)
    pub fn gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }
}

impl Default for BodyDef {
    fn default() -> Self {
        Self::new(BodyType::Static)
    }
}

/// One endpoint's participation in a joint
///
/// Every live joint has exactly two edges: the one on body A names body B,
/// the one on body B names body A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointEdge {
    /// The body at the other end of the joint
    pub other: BodyId,
    pub joint: JointId,
}

/// Managed proxy of a native rigid body
pub struct Body {
    id: BodyId,
    fixtures: Vec<FixtureId>,
    joint_edges: Vec<JointEdge>,
    user_data: Option<UserData>,
}

impl Poolable for Body {
    type Init = Handle;

    fn create(handle: Handle) -> Self {
        Self {
            id: BodyId::new(handle),
            fixtures: Vec::new(),
            joint_edges: Vec::new(),
            user_data: None,
        }
    }

    fn rebind(&mut self, handle: Handle) {
        self.id = BodyId::new(handle);
    }

    fn reset(&mut self) {
        self.fixtures.clear();
        self.joint_edges.clear();
        self.user_data = None;
    }
}

impl Body {
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Fixtures in creation order
    pub fn fixtures(&self) -> &[FixtureId] {
        &self.fixtures
    }

    pub fn joint_edges(&self) -> &[JointEdge] {
        &self.joint_edges
    }

    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.as_ref()?.downcast_ref()
    }

    pub fn has_user_data(&self) -> bool {
        self.user_data.is_some()
    }

    pub(crate) fn handle(&self) -> Handle {
        self.id.handle()
    }

    pub(crate) fn push_fixture(&mut self, fixture: FixtureId) {
        self.fixtures.push(fixture);
    }

    /// Returns false if the fixture was not attached here
    pub(crate) fn remove_fixture(&mut self, fixture: FixtureId) -> bool {
        match self.fixtures.iter().position(|f| *f == fixture) {
            Some(index) => {
                self.fixtures.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn push_edge(&mut self, edge: JointEdge) {
        self.joint_edges.push(edge);
    }

    pub(crate) fn remove_edge(&mut self, joint: JointId) {
        self.joint_edges.retain(|edge| edge.joint != joint);
    }

    pub(crate) fn set_user_data_boxed(&mut self, data: Option<UserData>) {
        self.user_data = data;
    }

    pub(crate) fn take_user_data(&mut self) -> Option<UserData> {
        self.user_data.take()
    }
}

/// Read access to a live body and its native state
pub struct BodyRef<'w> {
    body: &'w Body,
    native: &'w NativeWorld,
}

impl<'w> BodyRef<'w> {
    pub(crate) fn new(body: &'w Body, native: &'w NativeWorld) -> Self {
        Self { body, native }
    }

    /// The managed proxy
    pub fn proxy(&self) -> &'w Body {
        self.body
    }

    pub fn id(&self) -> BodyId {
        self.body.id
    }

    pub fn fixtures(&self) -> &'w [FixtureId] {
        &self.body.fixtures
    }

    pub fn joint_edges(&self) -> &'w [JointEdge] {
        &self.body.joint_edges
    }

    pub fn user_data<T: Any>(&self) -> Option<&'w T> {
        self.body.user_data.as_ref()?.downcast_ref()
    }

    pub fn body_type(&self) -> BodyType {
        self.native.body_type(self.body.handle())
    }

    pub fn transform(&self) -> Transform {
        self.native.body_transform(self.body.handle())
    }

    /// World position of the body origin
    pub fn position(&self) -> Vec2 {
        self.transform().position
    }

    pub fn angle(&self) -> f32 {
        self.transform().angle
    }

    /// World position of the centre of mass
    pub fn world_center(&self) -> Vec2 {
        self.native.body_world_center(self.body.handle())
    }

    /// Centre of mass in body coordinates
    pub fn local_center(&self) -> Vec2 {
        self.native.body_local_center(self.body.handle())
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.native.body_linear_velocity(self.body.handle())
    }

    pub fn angular_velocity(&self) -> f32 {
        self.native.body_angular_velocity(self.body.handle())
    }

    pub fn mass(&self) -> f32 {
        self.native.body_mass(self.body.handle())
    }

    /// Rotational inertia about the centre of mass
    pub fn inertia(&self) -> f32 {
        self.native.body_inertia(self.body.handle())
    }

    pub fn world_point(&self, local_point: Vec2) -> Vec2 {
        self.transform().mul_point(local_point)
    }

    pub fn world_vector(&self, local_vector: Vec2) -> Vec2 {
        self.transform().mul_vector(local_vector)
    }

    pub fn local_point(&self, world_point: Vec2) -> Vec2 {
        self.transform().inv_mul_point(world_point)
    }

    pub fn local_vector(&self, world_vector: Vec2) -> Vec2 {
        self.transform().inv_mul_vector(world_vector)
    }

    pub fn linear_velocity_from_world_point(&self, world_point: Vec2) -> Vec2 {
        self.native
            .body_velocity_at_point(self.body.handle(), world_point)
    }

    pub fn linear_velocity_from_local_point(&self, local_point: Vec2) -> Vec2 {
        self.linear_velocity_from_world_point(self.world_point(local_point))
    }

    pub fn linear_damping(&self) -> f32 {
        self.native.body_linear_damping(self.body.handle())
    }

    pub fn angular_damping(&self) -> f32 {
        self.native.body_angular_damping(self.body.handle())
    }

    pub fn gravity_scale(&self) -> f32 {
        self.native.body_gravity_scale(self.body.handle())
    }

    pub fn is_bullet(&self) -> bool {
        self.native.body_is_bullet(self.body.handle())
    }

    pub fn is_awake(&self) -> bool {
        self.native.body_is_awake(self.body.handle())
    }

    pub fn is_active(&self) -> bool {
        self.native.body_is_active(self.body.handle())
    }

    pub fn is_fixed_rotation(&self) -> bool {
        self.native.body_is_fixed_rotation(self.body.handle())
    }
}

/// Write access to a live body and its native state
pub struct BodyMut<'w> {
    body: &'w mut Body,
    native: &'w mut NativeWorld,
}

impl<'w> BodyMut<'w> {
    pub(crate) fn new(body: &'w mut Body, native: &'w mut NativeWorld) -> Self {
        Self { body, native }
    }

    /// Reborrow as a read-only view
    pub fn get(&self) -> BodyRef<'_> {
        BodyRef::new(self.body, self.native)
    }

    pub fn id(&self) -> BodyId {
        self.body.id
    }

    /// Teleport the body origin; contacts are re-evaluated on the next step
    pub fn set_transform(&mut self, position: Vec2, angle: f32) {
        self.native
            .set_body_transform(self.body.handle(), Transform::new(position, angle));
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.native
            .set_body_linear_velocity(self.body.handle(), velocity);
    }

    pub fn set_angular_velocity(&mut self, omega: f32) {
        self.native
            .set_body_angular_velocity(self.body.handle(), omega);
    }

    /// Apply a force at a world point
    pub fn apply_force(&mut self, force: Vec2, point: Vec2, wake: bool) {
        self.native
            .apply_body_force(self.body.handle(), force, Some(point), wake);
    }

    pub fn apply_force_to_center(&mut self, force: Vec2, wake: bool) {
        self.native
            .apply_body_force(self.body.handle(), force, None, wake);
    }

    pub fn apply_torque(&mut self, torque: f32, wake: bool) {
        self.native
            .apply_body_torque(self.body.handle(), torque, wake);
    }

    /// Apply an impulse at a world point
    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2, wake: bool) {
        self.native
            .apply_body_impulse(self.body.handle(), impulse, Some(point), wake);
    }

    pub fn apply_linear_impulse_to_center(&mut self, impulse: Vec2, wake: bool) {
        self.native
            .apply_body_impulse(self.body.handle(), impulse, None, wake);
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32, wake: bool) {
        self.native
            .apply_body_angular_impulse(self.body.handle(), impulse, wake);
    }

    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.native.set_body_type(self.body.handle(), body_type);
    }

    pub fn set_linear_damping(&mut self, damping: f32) {
        self.native
            .set_body_linear_damping(self.body.handle(), damping);
    }

    pub fn set_angular_damping(&mut self, damping: f32) {
        self.native
            .set_body_angular_damping(self.body.handle(), damping);
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.native
            .set_body_gravity_scale(self.body.handle(), scale);
    }

    pub fn set_bullet(&mut self, bullet: bool) {
        self.native.set_body_bullet(self.body.handle(), bullet);
    }

    pub fn set_awake(&mut self, awake: bool) {
        self.native.set_body_awake(self.body.handle(), awake);
    }

    pub fn set_fixed_rotation(&mut self, fixed: bool) {
        self.native
            .set_body_fixed_rotation(self.body.handle(), fixed);
    }

    pub fn set_user_data<T: Any + Send + Sync>(&mut self, data: T) {
        self.body.set_user_data_boxed(Some(Box::new(data)));
    }

    pub fn take_user_data(&mut self) -> Option<UserData> {
        self.body.take_user_data()
    }
}
