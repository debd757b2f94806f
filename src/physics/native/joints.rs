// Joint kinds realized as rapier constraints

use super::{to_point, to_vector};
use crate::physics::joint::JointKind;
use glam::Vec2;
use rapier2d::prelude::nalgebra::Unit;
use rapier2d::prelude::*;
use std::f32::consts::TAU;

/// Damping factor of velocity motors
const MOTOR_DAMPING: f32 = 1.0;

/// Damping factor of the zero-velocity motors that realize friction joints
const FRICTION_DAMPING: f32 = 10.0;

/// Spring frequency a motor joint with a correction factor of `1` pulls at
const MOTOR_JOINT_HZ: f32 = 10.0;

/// Spring stiffness and damping for a frequency / damping-ratio pair
fn spring_coefficients(frequency_hz: f32, damping_ratio: f32) -> (f32, f32) {
    let omega = TAU * frequency_hz;
    (omega * omega, 2.0 * damping_ratio * omega)
}

fn axis(local_axis: Vec2) -> Unit<Vector<Real>> {
    let axis = local_axis.try_normalize().unwrap_or(Vec2::X);
    Unit::new_unchecked(to_vector(axis))
}

/// Build the rapier constraint for a joint kind
///
/// Gear and pulley joints have no rapier counterpart and leave every axis
/// free; their parameters only live on the proxy.
pub(super) fn build(kind: &JointKind, anchors: (Vec2, Vec2), collide_connected: bool) -> GenericJoint {
    let (anchor_a, anchor_b) = (to_point(anchors.0), to_point(anchors.1));

    let mut joint: GenericJoint = match kind {
        JointKind::Distance(def) if def.frequency_hz > 0.0 => {
            let (stiffness, damping) = spring_coefficients(def.frequency_hz, def.damping_ratio);
            SpringJointBuilder::new(def.length, stiffness, damping)
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b)
                .build()
                .into()
        }
        JointKind::Distance(def) => RopeJointBuilder::new(def.length)
            .local_anchor1(anchor_a)
            .local_anchor2(anchor_b)
            .build()
            .into(),
        JointKind::Mouse(def) => {
            let (stiffness, damping) = spring_coefficients(def.frequency_hz, def.damping_ratio);
            let mut joint: GenericJoint = SpringJointBuilder::new(0.0, stiffness, damping)
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b)
                .build()
                .into();
            joint.set_motor_max_force(JointAxis::X, def.max_force);
            joint
        }
        JointKind::Prismatic(def) => {
            let mut builder = PrismaticJointBuilder::new(axis(def.local_axis_a))
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b);
            if def.enable_limit {
                builder = builder.limits([def.lower_translation, def.upper_translation]);
            }
            if def.enable_motor {
                builder = builder
                    .motor_velocity(def.motor_speed, MOTOR_DAMPING)
                    .motor_max_force(def.max_motor_force);
            }
            // The axis occupies frame 1's rotation, so the reference angle
            // stays a managed-side value.
            builder.build().into()
        }
        JointKind::Revolute(def) => {
            let mut builder = RevoluteJointBuilder::new()
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b);
            if def.enable_limit {
                builder = builder.limits([def.lower_angle, def.upper_angle]);
            }
            if def.enable_motor {
                builder = builder
                    .motor_velocity(def.motor_speed, MOTOR_DAMPING)
                    .motor_max_force(def.max_motor_torque);
            }
            let mut joint: GenericJoint = builder.build().into();
            joint.local_frame1 = Isometry::new(to_vector(anchors.0), def.reference_angle);
            joint
        }
        JointKind::Rope(def) => RopeJointBuilder::new(def.max_length)
            .local_anchor1(anchor_a)
            .local_anchor2(anchor_b)
            .build()
            .into(),
        JointKind::Weld(def) => FixedJointBuilder::new()
            .local_frame1(Isometry::new(to_vector(anchors.0), def.reference_angle))
            .local_frame2(Isometry::translation(anchors.1.x, anchors.1.y))
            .build()
            .into(),
        JointKind::Motor(def) => {
            let (stiffness, damping) =
                spring_coefficients(MOTOR_JOINT_HZ * def.correction_factor, 1.0);
            GenericJointBuilder::new(JointAxesMask::empty())
                .local_frame1(Isometry::new(
                    to_vector(def.linear_offset),
                    def.angular_offset,
                ))
                .motor_position(JointAxis::X, 0.0, stiffness, damping)
                .motor_position(JointAxis::Y, 0.0, stiffness, damping)
                .motor_position(JointAxis::AngX, 0.0, stiffness, damping)
                .motor_max_force(JointAxis::X, def.max_force)
                .motor_max_force(JointAxis::Y, def.max_force)
                .motor_max_force(JointAxis::AngX, def.max_torque)
                .build()
        }
        JointKind::Friction(def) => GenericJointBuilder::new(JointAxesMask::empty())
            .local_anchor1(anchor_a)
            .local_anchor2(anchor_b)
            .motor_velocity(JointAxis::X, 0.0, FRICTION_DAMPING)
            .motor_velocity(JointAxis::Y, 0.0, FRICTION_DAMPING)
            .motor_velocity(JointAxis::AngX, 0.0, FRICTION_DAMPING)
            .motor_max_force(JointAxis::X, def.max_force)
            .motor_max_force(JointAxis::Y, def.max_force)
            .motor_max_force(JointAxis::AngX, def.max_torque)
            .build(),
        JointKind::Wheel(def) => {
            // Frame 1's x axis is the suspension axis; its y axis is locked.
            let axis_angle = def.local_axis_a.y.atan2(def.local_axis_a.x);
            let mut builder = GenericJointBuilder::new(JointAxesMask::Y)
                .local_frame1(Isometry::new(to_vector(anchors.0), axis_angle))
                .local_frame2(Isometry::translation(anchors.1.x, anchors.1.y));
            if def.frequency_hz > 0.0 {
                let (stiffness, damping) =
                    spring_coefficients(def.frequency_hz, def.damping_ratio);
                builder = builder.motor_position(JointAxis::X, 0.0, stiffness, damping);
            }
            if def.enable_motor {
                builder = builder
                    .motor_velocity(JointAxis::AngX, def.motor_speed, MOTOR_DAMPING)
                    .motor_max_force(JointAxis::AngX, def.max_motor_torque);
            }
            builder.build()
        }
        // No rapier counterpart: the native joint only carries the
        // collide-connected flag.
        JointKind::Gear(_) | JointKind::Pulley(_) => {
            GenericJointBuilder::new(JointAxesMask::empty())
                .local_anchor1(anchor_a)
                .local_anchor2(anchor_b)
                .build()
        }
    };

    joint.set_contacts_enabled(collide_connected);
    joint
}
