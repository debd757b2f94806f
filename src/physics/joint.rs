// Joint definitions and the managed joint proxy
//
// The same `JointKind` union describes a joint before creation and the live
// joint's parameters afterwards, so the two can never drift apart.

use super::body::BodyRef;
use super::handle::{BodyId, Handle, JointId};
use super::native::NativeWorld;
use super::{PhysicsError, UserData};
use glam::Vec2;
use std::any::Any;

/// Discriminant of a joint kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    Distance,
    Friction,
    Gear,
    Motor,
    Mouse,
    Prismatic,
    Pulley,
    Revolute,
    Rope,
    Weld,
    Wheel,
}

/// Keeps two anchor points at a fixed distance, optionally soft
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length: f32,
    /// Spring frequency; zero makes the joint rigid
    pub frequency_hz: f32,
    pub damping_ratio: f32,
}

impl DistanceJointDef {
    /// Anchor at world points on each body; the length is their current distance
    pub fn initialize(
        body_a: &BodyRef<'_>,
        body_b: &BodyRef<'_>,
        anchor_a: Vec2,
        anchor_b: Vec2,
    ) -> JointDef {
        let def = Self {
            local_anchor_a: body_a.local_point(anchor_a),
            local_anchor_b: body_b.local_point(anchor_b),
            length: anchor_a.distance(anchor_b),
            ..Self::default()
        };
        JointDef::new(body_a.id(), body_b.id(), def)
    }
}

impl Default for DistanceJointDef {
    fn default() -> Self {
        Self {
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            length: 1.0,
            frequency_hz: 0.0,
            damping_ratio: 0.0,
        }
    }
}

/// Top-down friction between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrictionJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_force: f32,
    pub max_torque: f32,
}

impl FrictionJointDef {
    pub fn initialize(body_a: &BodyRef<'_>, body_b: &BodyRef<'_>, anchor: Vec2) -> JointDef {
        let def = Self {
            local_anchor_a: body_a.local_point(anchor),
            local_anchor_b: body_b.local_point(anchor),
            ..Self::default()
        };
        JointDef::new(body_a.id(), body_b.id(), def)
    }
}

/// Couples two revolute/prismatic joints: `coordinate1 + ratio * coordinate2 = constant`
///
/// The coupling is not enforced by the solver: the native joint leaves both
/// bodies free and only the parameters are stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearJointDef {
    pub joint1: JointId,
    pub joint2: JointId,
    pub ratio: f32,
}

impl GearJointDef {
    pub fn new(joint1: JointId, joint2: JointId) -> Self {
        Self {
            joint1,
            joint2,
            ratio: 1.0,
        }
    }
}

/// Drives body B towards a target offset relative to body A
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorJointDef {
    /// Position of body B in body A's frame
    pub linear_offset: Vec2,
    pub angular_offset: f32,
    pub max_force: f32,
    pub max_torque: f32,
    pub correction_factor: f32,
}

impl MotorJointDef {
    /// Use the bodies' current relative placement as the target
    pub fn initialize(body_a: &BodyRef<'_>, body_b: &BodyRef<'_>) -> JointDef {
        let def = Self {
            linear_offset: body_a.local_point(body_b.position()),
            angular_offset: body_b.angle() - body_a.angle(),
            ..Self::default()
        };
        JointDef::new(body_a.id(), body_b.id(), def)
    }
}

impl Default for MotorJointDef {
    fn default() -> Self {
        Self {
            linear_offset: Vec2::ZERO,
            angular_offset: 0.0,
            max_force: 1.0,
            max_torque: 1.0,
            correction_factor: 0.3,
        }
    }
}

/// Soft pull of body B towards a world target, typically for mouse dragging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseJointDef {
    pub target: Vec2,
    pub max_force: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
}

impl Default for MouseJointDef {
    fn default() -> Self {
        Self {
            target: Vec2::ZERO,
            max_force: 0.0,
            frequency_hz: 5.0,
            damping_ratio: 0.7,
        }
    }
}

/// One translational degree of freedom along an axis fixed in body A
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrismaticJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Unit axis in body A's frame
    pub local_axis_a: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub max_motor_force: f32,
    pub motor_speed: f32,
}

impl PrismaticJointDef {
    pub fn initialize(
        body_a: &BodyRef<'_>,
        body_b: &BodyRef<'_>,
        anchor: Vec2,
        axis: Vec2,
    ) -> JointDef {
        let def = Self {
            local_anchor_a: body_a.local_point(anchor),
            local_anchor_b: body_b.local_point(anchor),
            local_axis_a: body_a.local_vector(axis),
            reference_angle: body_b.angle() - body_a.angle(),
            ..Self::default()
        };
        JointDef::new(body_a.id(), body_b.id(), def)
    }
}

impl Default for PrismaticJointDef {
    fn default() -> Self {
        Self {
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            local_axis_a: Vec2::X,
            reference_angle: 0.0,
            enable_limit: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
            enable_motor: false,
            max_motor_force: 0.0,
            motor_speed: 0.0,
        }
    }
}

/// Two bodies hung from fixed ground anchors by a shared rope
///
/// The rope is not enforced by the solver: the native joint leaves both
/// bodies free and only the parameters are stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulleyJointDef {
    pub ground_anchor_a: Vec2,
    pub ground_anchor_b: Vec2,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length_a: f32,
    pub length_b: f32,
    pub ratio: f32,
}

impl PulleyJointDef {
    pub fn initialize(
        body_a: &BodyRef<'_>,
        body_b: &BodyRef<'_>,
        ground_anchor_a: Vec2,
        ground_anchor_b: Vec2,
        anchor_a: Vec2,
        anchor_b: Vec2,
        ratio: f32,
    ) -> JointDef {
        let def = Self {
            ground_anchor_a,
            ground_anchor_b,
            local_anchor_a: body_a.local_point(anchor_a),
            local_anchor_b: body_b.local_point(anchor_b),
            length_a: anchor_a.distance(ground_anchor_a),
            length_b: anchor_b.distance(ground_anchor_b),
            ratio,
        };
        JointDef::new(body_a.id(), body_b.id(), def)
    }
}

impl Default for PulleyJointDef {
    fn default() -> Self {
        Self {
            ground_anchor_a: Vec2::new(-1.0, 1.0),
            ground_anchor_b: Vec2::new(1.0, 1.0),
            local_anchor_a: Vec2::new(-1.0, 0.0),
            local_anchor_b: Vec2::new(1.0, 0.0),
            length_a: 0.0,
            length_b: 0.0,
            ratio: 1.0,
        }
    }
}

/// Shared anchor point the bodies rotate about
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RevoluteJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Body B angle minus body A angle in the reference state
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_angle: f32,
    pub upper_angle: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
}

impl RevoluteJointDef {
    pub fn initialize(body_a: &BodyRef<'_>, body_b: &BodyRef<'_>, anchor: Vec2) -> JointDef {
        let def = Self {
            local_anchor_a: body_a.local_point(anchor),
            local_anchor_b: body_b.local_point(anchor),
            reference_angle: body_b.angle() - body_a.angle(),
            ..Self::default()
        };
        JointDef::new(body_a.id(), body_b.id(), def)
    }
}

/// Upper bound on the distance between two anchor points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RopeJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_length: f32,
}

impl Default for RopeJointDef {
    fn default() -> Self {
        Self {
            local_anchor_a: Vec2::new(-1.0, 0.0),
            local_anchor_b: Vec2::new(1.0, 0.0),
            max_length: 0.0,
        }
    }
}

/// Glues two bodies together
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeldJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
}

impl WeldJointDef {
    pub fn initialize(body_a: &BodyRef<'_>, body_b: &BodyRef<'_>, anchor: Vec2) -> JointDef {
        let def = Self {
            local_anchor_a: body_a.local_point(anchor),
            local_anchor_b: body_b.local_point(anchor),
            reference_angle: body_b.angle() - body_a.angle(),
            ..Self::default()
        };
        JointDef::new(body_a.id(), body_b.id(), def)
    }
}

/// Suspension: a spring along an axis in body A plus free rotation of body B
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    pub enable_motor: bool,
    pub max_motor_torque: f32,
    pub motor_speed: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
}

impl WheelJointDef {
    pub fn initialize(
        body_a: &BodyRef<'_>,
        body_b: &BodyRef<'_>,
        anchor: Vec2,
        axis: Vec2,
    ) -> JointDef {
        let def = Self {
            local_anchor_a: body_a.local_point(anchor),
            local_anchor_b: body_b.local_point(anchor),
            local_axis_a: body_a.local_vector(axis),
            ..Self::default()
        };
        JointDef::new(body_a.id(), body_b.id(), def)
    }
}

impl Default for WheelJointDef {
    fn default() -> Self {
        Self {
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            local_axis_a: Vec2::X,
            enable_motor: false,
            max_motor_torque: 0.0,
            motor_speed: 0.0,
            frequency_hz: 2.0,
            damping_ratio: 0.7,
        }
    }
}

/// Kind-specific joint parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    Distance(DistanceJointDef),
    Friction(FrictionJointDef),
    Gear(GearJointDef),
    Motor(MotorJointDef),
    Mouse(MouseJointDef),
    Prismatic(PrismaticJointDef),
    Pulley(PulleyJointDef),
    Revolute(RevoluteJointDef),
    Rope(RopeJointDef),
    Weld(WeldJointDef),
    Wheel(WheelJointDef),
}

impl JointKind {
    pub fn joint_type(&self) -> JointType {
        match self {
            JointKind::Distance(_) => JointType::Distance,
            JointKind::Friction(_) => JointType::Friction,
            JointKind::Gear(_) => JointType::Gear,
            JointKind::Motor(_) => JointType::Motor,
            JointKind::Mouse(_) => JointType::Mouse,
            JointKind::Prismatic(_) => JointType::Prismatic,
            JointKind::Pulley(_) => JointType::Pulley,
            JointKind::Revolute(_) => JointType::Revolute,
            JointKind::Rope(_) => JointType::Rope,
            JointKind::Weld(_) => JointType::Weld,
            JointKind::Wheel(_) => JointType::Wheel,
        }
    }

    /// Body-local anchors carried by the definition itself
    ///
    /// `None` for mouse joints, whose anchors follow from the target and the
    /// bodies' current placement.
    pub(crate) fn local_anchors(&self) -> Option<(Vec2, Vec2)> {
        match self {
            JointKind::Distance(d) => Some((d.local_anchor_a, d.local_anchor_b)),
            JointKind::Friction(d) => Some((d.local_anchor_a, d.local_anchor_b)),
            JointKind::Prismatic(d) => Some((d.local_anchor_a, d.local_anchor_b)),
            JointKind::Pulley(d) => Some((d.local_anchor_a, d.local_anchor_b)),
            JointKind::Revolute(d) => Some((d.local_anchor_a, d.local_anchor_b)),
            JointKind::Rope(d) => Some((d.local_anchor_a, d.local_anchor_b)),
            JointKind::Weld(d) => Some((d.local_anchor_a, d.local_anchor_b)),
            JointKind::Wheel(d) => Some((d.local_anchor_a, d.local_anchor_b)),
            JointKind::Gear(_) | JointKind::Motor(_) => Some((Vec2::ZERO, Vec2::ZERO)),
            JointKind::Mouse(_) => None,
        }
    }
}

macro_rules! impl_from_def {
    ($($def:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$def> for JointKind {
                fn from(def: $def) -> Self {
                    JointKind::$variant(def)
                }
            }
        )*
    };
}

impl_from_def! {
    DistanceJointDef => Distance,
    FrictionJointDef => Friction,
    GearJointDef => Gear,
    MotorJointDef => Motor,
    MouseJointDef => Mouse,
    PrismaticJointDef => Prismatic,
    PulleyJointDef => Pulley,
    RevoluteJointDef => Revolute,
    RopeJointDef => Rope,
    WeldJointDef => Weld,
    WheelJointDef => Wheel,
}

/// Everything needed to create a joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDef {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Let the two connected bodies collide with each other
    pub collide_connected: bool,
    pub kind: JointKind,
}

impl JointDef {
    pub fn new(body_a: BodyId, body_b: BodyId, kind: impl Into<JointKind>) -> Self {
        Self {
            body_a,
            body_b,
            collide_connected: false,
            kind: kind.into(),
        }
    }

    pub fn collide_connected(mut self, collide: bool) -> Self {
        self.collide_connected = collide;
        self
    }

    pub fn joint_type(&self) -> JointType {
        self.kind.joint_type()
    }
}

/// Managed proxy of a native joint
pub struct Joint {
    id: JointId,
    body_a: BodyId,
    body_b: BodyId,
    collide_connected: bool,
    kind: JointKind,
    local_anchor_a: Vec2,
    local_anchor_b: Vec2,
    user_data: Option<UserData>,
}

impl Joint {
    pub(crate) fn new(handle: Handle, def: &JointDef, anchors: (Vec2, Vec2)) -> Self {
        Self {
            id: JointId::new(handle),
            body_a: def.body_a,
            body_b: def.body_b,
            collide_connected: def.collide_connected,
            kind: def.kind,
            local_anchor_a: anchors.0,
            local_anchor_b: anchors.1,
            user_data: None,
        }
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn joint_type(&self) -> JointType {
        self.kind.joint_type()
    }

    /// Current parameters
    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    pub fn body_a(&self) -> BodyId {
        self.body_a
    }

    pub fn body_b(&self) -> BodyId {
        self.body_b
    }

    pub fn collide_connected(&self) -> bool {
        self.collide_connected
    }

    pub fn local_anchor_a(&self) -> Vec2 {
        self.local_anchor_a
    }

    pub fn local_anchor_b(&self) -> Vec2 {
        self.local_anchor_b
    }

    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.as_ref()?.downcast_ref()
    }

    pub(crate) fn handle(&self) -> Handle {
        self.id.handle()
    }

    /// Whether this is a gear joint coupling `joint`
    pub(crate) fn gears(&self, joint: JointId) -> bool {
        matches!(self.kind, JointKind::Gear(g) if g.joint1 == joint || g.joint2 == joint)
    }
}

/// Read access to a live joint and its native constraint
pub struct JointRef<'w> {
    joint: &'w Joint,
    native: &'w NativeWorld,
}

impl<'w> JointRef<'w> {
    pub(crate) fn new(joint: &'w Joint, native: &'w NativeWorld) -> Self {
        Self { joint, native }
    }

    pub fn proxy(&self) -> &'w Joint {
        self.joint
    }

    pub fn id(&self) -> JointId {
        self.joint.id
    }

    pub fn joint_type(&self) -> JointType {
        self.joint.joint_type()
    }

    pub fn kind(&self) -> &'w JointKind {
        &self.joint.kind
    }

    pub fn body_a(&self) -> BodyId {
        self.joint.body_a
    }

    pub fn body_b(&self) -> BodyId {
        self.joint.body_b
    }

    pub fn collide_connected(&self) -> bool {
        self.joint.collide_connected
    }

    pub fn user_data<T: Any>(&self) -> Option<&'w T> {
        self.joint.user_data.as_ref()?.downcast_ref()
    }

    /// World position of the anchor on body A
    pub fn anchor_a(&self) -> Vec2 {
        self.native
            .body_transform(self.joint.body_a.handle())
            .mul_point(self.joint.local_anchor_a)
    }

    /// World position of the anchor on body B
    pub fn anchor_b(&self) -> Vec2 {
        self.native
            .body_transform(self.joint.body_b.handle())
            .mul_point(self.joint.local_anchor_b)
    }

    /// Constraint force on body B from the last step's impulses
    pub fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.native.joint_impulses(self.joint.handle()).0 * inv_dt
    }

    /// Constraint torque on body B from the last step's impulses
    pub fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.native.joint_impulses(self.joint.handle()).1 * inv_dt
    }

    /// Relative angle of a revolute joint, measured from its reference angle
    pub fn joint_angle(&self) -> Option<f32> {
        let JointKind::Revolute(def) = self.joint.kind else {
            return None;
        };
        let a = self.native.body_transform(self.joint.body_a.handle());
        let b = self.native.body_transform(self.joint.body_b.handle());
        Some(b.angle - a.angle - def.reference_angle)
    }

    /// Relative angular velocity of revolute and wheel joints
    pub fn joint_speed(&self) -> Option<f32> {
        match self.joint.kind {
            JointKind::Revolute(_) | JointKind::Wheel(_) => {
                let a = self.native.body_angular_velocity(self.joint.body_a.handle());
                let b = self.native.body_angular_velocity(self.joint.body_b.handle());
                Some(b - a)
            }
            _ => None,
        }
    }

    /// Offset of the anchors along the axis of a prismatic or wheel joint
    pub fn joint_translation(&self) -> Option<f32> {
        let local_axis = match self.joint.kind {
            JointKind::Prismatic(def) => def.local_axis_a,
            JointKind::Wheel(def) => def.local_axis_a,
            _ => return None,
        };
        let a = self.native.body_transform(self.joint.body_a.handle());
        let axis = a.mul_vector(local_axis.normalize_or_zero());
        Some((self.anchor_b() - self.anchor_a()).dot(axis))
    }

    /// Current separation of the anchors
    pub fn length(&self) -> f32 {
        self.anchor_a().distance(self.anchor_b())
    }
}

/// Write access to a live joint
///
/// Every parameter change rebuilds the native constraint and wakes both
/// bodies.
pub struct JointMut<'w> {
    joint: &'w mut Joint,
    native: &'w mut NativeWorld,
}

impl<'w> JointMut<'w> {
    pub(crate) fn new(joint: &'w mut Joint, native: &'w mut NativeWorld) -> Self {
        Self { joint, native }
    }

    /// Reborrow as a read-only view
    pub fn get(&self) -> JointRef<'_> {
        JointRef::new(self.joint, self.native)
    }

    pub fn id(&self) -> JointId {
        self.joint.id
    }

    pub fn set_user_data<T: Any + Send + Sync>(&mut self, data: T) {
        self.joint.user_data = Some(Box::new(data));
    }

    pub fn take_user_data(&mut self) -> Option<UserData> {
        self.joint.user_data.take()
    }

    /// Edit the parameters in place; the joint kind cannot change
    pub fn modify(&mut self, edit: impl FnOnce(&mut JointKind)) -> Result<(), PhysicsError> {
        let mut kind = self.joint.kind;
        edit(&mut kind);
        if kind.joint_type() != self.joint.joint_type() {
            return Err(PhysicsError::InvalidJoint(format!(
                "cannot change a {:?} joint into a {:?} joint",
                self.joint.joint_type(),
                kind.joint_type()
            )));
        }
        if let JointKind::Gear(old) = self.joint.kind {
            if let JointKind::Gear(new) = kind {
                if (old.joint1, old.joint2) != (new.joint1, new.joint2) {
                    return Err(PhysicsError::InvalidJoint(
                        "gear joints cannot be re-pointed at other joints".to_string(),
                    ));
                }
            }
        }
        self.joint.kind = kind;
        match kind {
            JointKind::Mouse(def) => {
                self.joint.local_anchor_a = self
                    .native
                    .body_transform(self.joint.body_a.handle())
                    .inv_mul_point(def.target);
            }
            _ => {
                if let Some(anchors) = kind.local_anchors() {
                    (self.joint.local_anchor_a, self.joint.local_anchor_b) = anchors;
                }
            }
        }
        self.sync();
        Ok(())
    }

    pub fn set_motor_speed(&mut self, speed: f32) -> Result<(), PhysicsError> {
        self.apply("motor speed", |kind| {
            match kind {
                JointKind::Prismatic(d) => d.motor_speed = speed,
                JointKind::Revolute(d) => d.motor_speed = speed,
                JointKind::Wheel(d) => d.motor_speed = speed,
                _ => return false,
            }
            true
        })
    }

    pub fn enable_motor(&mut self, enabled: bool) -> Result<(), PhysicsError> {
        self.apply("motor", |kind| {
            match kind {
                JointKind::Prismatic(d) => d.enable_motor = enabled,
                JointKind::Revolute(d) => d.enable_motor = enabled,
                JointKind::Wheel(d) => d.enable_motor = enabled,
                _ => return false,
            }
            true
        })
    }

    /// Maximum motor force (prismatic) or torque (revolute, wheel)
    pub fn set_max_motor_force(&mut self, max: f32) -> Result<(), PhysicsError> {
        self.apply("motor force", |kind| {
            match kind {
                JointKind::Prismatic(d) => d.max_motor_force = max,
                JointKind::Revolute(d) => d.max_motor_torque = max,
                JointKind::Wheel(d) => d.max_motor_torque = max,
                _ => return false,
            }
            true
        })
    }

    pub fn enable_limit(&mut self, enabled: bool) -> Result<(), PhysicsError> {
        self.apply("limit", |kind| {
            match kind {
                JointKind::Prismatic(d) => d.enable_limit = enabled,
                JointKind::Revolute(d) => d.enable_limit = enabled,
                _ => return false,
            }
            true
        })
    }

    /// Translation (prismatic) or angle (revolute) limits
    pub fn set_limits(&mut self, lower: f32, upper: f32) -> Result<(), PhysicsError> {
        let (lower, upper) = (lower.min(upper), lower.max(upper));
        self.apply("limits", |kind| {
            match kind {
                JointKind::Prismatic(d) => {
                    d.lower_translation = lower;
                    d.upper_translation = upper;
                }
                JointKind::Revolute(d) => {
                    d.lower_angle = lower;
                    d.upper_angle = upper;
                }
                _ => return false,
            }
            true
        })
    }

    /// Rest length of a distance joint or maximum length of a rope joint
    pub fn set_length(&mut self, length: f32) -> Result<(), PhysicsError> {
        self.apply("length", |kind| {
            match kind {
                JointKind::Distance(d) => d.length = length,
                JointKind::Rope(d) => d.max_length = length,
                _ => return false,
            }
            true
        })
    }

    pub fn set_frequency(&mut self, hz: f32) -> Result<(), PhysicsError> {
        self.apply("frequency", |kind| {
            match kind {
                JointKind::Distance(d) => d.frequency_hz = hz,
                JointKind::Mouse(d) => d.frequency_hz = hz,
                JointKind::Weld(d) => d.frequency_hz = hz,
                JointKind::Wheel(d) => d.frequency_hz = hz,
                _ => return false,
            }
            true
        })
    }

    pub fn set_damping_ratio(&mut self, ratio: f32) -> Result<(), PhysicsError> {
        self.apply("damping ratio", |kind| {
            match kind {
                JointKind::Distance(d) => d.damping_ratio = ratio,
                JointKind::Mouse(d) => d.damping_ratio = ratio,
                JointKind::Weld(d) => d.damping_ratio = ratio,
                JointKind::Wheel(d) => d.damping_ratio = ratio,
                _ => return false,
            }
            true
        })
    }

    pub fn set_ratio(&mut self, ratio: f32) -> Result<(), PhysicsError> {
        self.apply("ratio", |kind| {
            match kind {
                JointKind::Gear(d) => d.ratio = ratio,
                JointKind::Pulley(d) => d.ratio = ratio,
                _ => return false,
            }
            true
        })
    }

    /// Maximum force of friction, motor and mouse joints
    pub fn set_max_force(&mut self, force: f32) -> Result<(), PhysicsError> {
        self.apply("max force", |kind| {
            match kind {
                JointKind::Friction(d) => d.max_force = force,
                JointKind::Motor(d) => d.max_force = force,
                JointKind::Mouse(d) => d.max_force = force,
                _ => return false,
            }
            true
        })
    }

    /// Maximum torque of friction and motor joints
    pub fn set_max_torque(&mut self, torque: f32) -> Result<(), PhysicsError> {
        self.apply("max torque", |kind| {
            match kind {
                JointKind::Friction(d) => d.max_torque = torque,
                JointKind::Motor(d) => d.max_torque = torque,
                _ => return false,
            }
            true
        })
    }

    pub fn set_linear_offset(&mut self, offset: Vec2) -> Result<(), PhysicsError> {
        self.apply("linear offset", |kind| match kind {
            JointKind::Motor(d) => {
                d.linear_offset = offset;
                true
            }
            _ => false,
        })
    }

    pub fn set_angular_offset(&mut self, offset: f32) -> Result<(), PhysicsError> {
        self.apply("angular offset", |kind| match kind {
            JointKind::Motor(d) => {
                d.angular_offset = offset;
                true
            }
            _ => false,
        })
    }

    /// Move the world target of a mouse joint
    pub fn set_target(&mut self, target: Vec2) -> Result<(), PhysicsError> {
        let JointKind::Mouse(def) = &mut self.joint.kind else {
            return Err(self.missing("target"));
        };
        def.target = target;
        self.joint.local_anchor_a = self
            .native
            .body_transform(self.joint.body_a.handle())
            .inv_mul_point(target);
        self.sync();
        Ok(())
    }

    fn apply(
        &mut self,
        what: &str,
        edit: impl FnOnce(&mut JointKind) -> bool,
    ) -> Result<(), PhysicsError> {
        if !edit(&mut self.joint.kind) {
            return Err(self.missing(what));
        }
        self.sync();
        Ok(())
    }

    fn missing(&self, what: &str) -> PhysicsError {
        PhysicsError::InvalidJoint(format!(
            "{:?} joints have no {}",
            self.joint.joint_type(),
            what
        ))
    }

    fn sync(&mut self) {
        self.native.rebuild_joint(
            self.joint.handle(),
            &self.joint.kind,
            (self.joint.local_anchor_a, self.joint.local_anchor_b),
            self.joint.collide_connected,
        );
    }
}
