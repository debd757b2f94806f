// Creation and destruction of joints together with their two edge halves

use super::body::{Body, JointEdge};
use super::handle::JointId;
use super::joint::{Joint, JointDef, JointKind, JointType};
use super::native::NativeWorld;
use super::registry::HandleRegistry;
use super::PhysicsError;
use log::debug;

/// Borrows the parts of a world that joint bookkeeping touches
pub(crate) struct JointFactory<'w> {
    native: &'w mut NativeWorld,
    bodies: &'w mut HandleRegistry<Body>,
    joints: &'w mut HandleRegistry<Joint>,
}

impl<'w> JointFactory<'w> {
    pub fn new(
        native: &'w mut NativeWorld,
        bodies: &'w mut HandleRegistry<Body>,
        joints: &'w mut HandleRegistry<Joint>,
    ) -> Self {
        Self {
            native,
            bodies,
            joints,
        }
    }

    /// Create the native joint, register its proxy and wire both edges
    pub fn create(&mut self, def: &JointDef) -> Result<JointId, PhysicsError> {
        for body in [def.body_a, def.body_b] {
            if !self.bodies.contains(body.handle()) {
                return Err(PhysicsError::StaleBody(body));
            }
        }
        if def.body_a == def.body_b {
            return Err(PhysicsError::InvalidJoint(format!(
                "{:?} joint connects {:?} to itself",
                def.joint_type(),
                def.body_a
            )));
        }
        if let JointKind::Gear(gear) = def.kind {
            for coupled in [gear.joint1, gear.joint2] {
                let joint = self
                    .joints
                    .lookup(coupled.handle())
                    .ok_or(PhysicsError::StaleJoint(coupled))?;
                if !matches!(joint.joint_type(), JointType::Revolute | JointType::Prismatic) {
                    return Err(PhysicsError::InvalidJoint(format!(
                        "gear joints couple revolute or prismatic joints, not {:?}",
                        joint.joint_type()
                    )));
                }
            }
        }

        let anchors = match def.kind {
            JointKind::Mouse(mouse) => (
                self.native
                    .body_transform(def.body_a.handle())
                    .inv_mul_point(mouse.target),
                self.native
                    .body_transform(def.body_b.handle())
                    .inv_mul_point(mouse.target),
            ),
            kind => kind.local_anchors().unwrap_or_default(),
        };

        let handle = self.native.create_joint(
            def.body_a.handle(),
            def.body_b.handle(),
            &def.kind,
            anchors,
            def.collide_connected,
        );
        let joint = Joint::new(handle, def, anchors);
        let id = joint.id();
        self.joints.register(handle, joint);

        self.bodies.resolve_mut(def.body_a.handle()).push_edge(JointEdge {
            other: def.body_b,
            joint: id,
        });
        self.bodies.resolve_mut(def.body_b.handle()).push_edge(JointEdge {
            other: def.body_a,
            joint: id,
        });

        debug!(
            "created {:?} joint {} between {} and {}",
            def.joint_type(),
            handle,
            def.body_a.handle(),
            def.body_b.handle()
        );
        Ok(id)
    }

    /// Destroy a joint, first destroying any gear joint coupling it
    pub fn destroy(&mut self, id: JointId) -> Result<(), PhysicsError> {
        if !self.joints.contains(id.handle()) {
            return Err(PhysicsError::StaleJoint(id));
        }

        let gears: Vec<JointId> = self
            .joints
            .values()
            .filter(|joint| joint.gears(id))
            .map(Joint::id)
            .collect();
        for gear in gears {
            debug!("destroying gear joint {} coupled to {}", gear.handle(), id.handle());
            self.destroy(gear)?;
        }

        let joint = self
            .joints
            .unregister(id.handle())
            .ok_or(PhysicsError::StaleJoint(id))?;
        self.bodies.resolve_mut(joint.body_a().handle()).remove_edge(id);
        self.bodies.resolve_mut(joint.body_b().handle()).remove_edge(id);
        self.native.destroy_joint(id.handle());

        debug!("destroyed {:?} joint {}", joint.joint_type(), id.handle());
        Ok(())
    }
}
