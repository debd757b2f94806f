// Box2D-style bodies, fixtures and joints over rapier2d
//
// Every native object has one managed proxy, owned by a handle-keyed
// registry in the world. Proxies are recycled through object pools.

mod body;
mod callbacks;
mod contact;
mod fixture;
mod handle;
mod joint;
mod joint_factory;
mod native;
mod pool;
mod registry;
mod world;

pub use body::{Body, BodyDef, BodyMut, BodyRef, BodyType, JointEdge};
pub use contact::{
    Contact, ContactFilter, ContactImpulse, ContactListener, Manifold, WorldManifold,
    MAX_MANIFOLD_POINTS,
};
pub use fixture::{
    Filter, Fixture, FixtureDef, FixtureInit, FixtureMut, FixtureRef, Shape, ShapeType,
    MAX_POLYGON_VERTICES,
};
pub use handle::{BodyId, EntityId, FixtureId, Handle, JointId};
pub use joint::{
    DistanceJointDef, FrictionJointDef, GearJointDef, Joint, JointDef, JointKind, JointMut,
    JointRef, JointType, MotorJointDef, MouseJointDef, PrismaticJointDef, PulleyJointDef,
    RevoluteJointDef, RopeJointDef, WeldJointDef, WheelJointDef,
};
pub use native::RayHit;
pub use pool::{ObjectPool, Poolable};
pub use registry::HandleRegistry;
pub use world::World;

use std::any::Any;

/// Arbitrary data attached to a body, fixture or joint
pub type UserData = Box<dyn Any + Send + Sync>;

/// Physics errors
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("Body no longer exists: {0:?}")]
    StaleBody(BodyId),

    #[error("Fixture no longer exists: {0:?}")]
    StaleFixture(FixtureId),

    #[error("Joint no longer exists: {0:?}")]
    StaleJoint(JointId),

    #[error("{fixture:?} is not attached to {body:?}")]
    FixtureNotOnBody { body: BodyId, fixture: FixtureId },

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Invalid joint: {0}")]
    InvalidJoint(String),

    #[error("World is locked during a step")]
    Locked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physics_error_display() {
        let err = PhysicsError::InvalidShape("circle radius must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid shape: circle radius must be positive");

        let err = PhysicsError::StaleBody(BodyId::new(Handle::from_parts(3, 1)));
        assert_eq!(err.to_string(), "Body no longer exists: Body(3v1)");
    }
}
