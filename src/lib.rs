// Box2D-style physics binding layer over rapier2d
//
// Bodies, fixtures and joints are created through a `World`, addressed by
// typed ids, and read or modified through short-lived views. Contact
// filters and listeners receive reused flyweight contacts during `step`.

pub mod config;
pub mod core;
pub mod physics;

pub use config::{PoolConfig, WorldConfig, DEFAULT_TIMESTEP};
pub use crate::core::math::{Aabb, Transform};
pub use physics::{
    BodyDef, BodyId, BodyType, Contact, ContactFilter, ContactListener, FixtureDef, FixtureId,
    JointDef, JointId, PhysicsError, Shape, World,
};
