use super::handle::{BodyId, FixtureId, Handle};
use super::native::NativeWorld;
use super::pool::Poolable;
use super::UserData;
use crate::core::math::Aabb;
use glam::Vec2;
use std::any::Any;

/// Maximum vertex count of a convex polygon
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Geometry attached to a body by a fixture, in body-local coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { radius: f32, center: Vec2 },

    /// Convex polygon, 3 to 8 vertices
    Polygon { vertices: Vec<Vec2> },

    /// Oriented box given by half extents
    Box {
        half_extents: Vec2,
        center: Vec2,
        angle: f32,
    },

    /// Single line segment
    Edge { v1: Vec2, v2: Vec2 },

    /// Polyline, optionally closed into a loop
    Chain { vertices: Vec<Vec2>, looped: bool },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle {
            radius,
            center: Vec2::ZERO,
        }
    }

    /// Axis-aligned box centred on the body origin
    pub fn boxed(half_width: f32, half_height: f32) -> Self {
        Shape::Box {
            half_extents: Vec2::new(half_width, half_height),
            center: Vec2::ZERO,
            angle: 0.0,
        }
    }

    pub fn polygon(vertices: &[Vec2]) -> Self {
        Shape::Polygon {
            vertices: vertices.to_vec(),
        }
    }

    pub fn edge(v1: Vec2, v2: Vec2) -> Self {
        Shape::Edge { v1, v2 }
    }

    pub fn chain(vertices: &[Vec2]) -> Self {
        Shape::Chain {
            vertices: vertices.to_vec(),
            looped: false,
        }
    }

    pub fn chain_loop(vertices: &[Vec2]) -> Self {
        Shape::Chain {
            vertices: vertices.to_vec(),
            looped: true,
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Circle { .. } => ShapeType::Circle,
            Shape::Polygon { .. } | Shape::Box { .. } => ShapeType::Polygon,
            Shape::Edge { .. } => ShapeType::Edge,
            Shape::Chain { .. } => ShapeType::Chain,
        }
    }

    /// Check the parts of the shape the native engine would reject or
    /// silently mangle
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Shape::Circle { radius, .. } if *radius <= 0.0 => {
                Err(format!("circle radius must be positive, got {}", radius))
            }
            Shape::Box { half_extents, .. } if half_extents.min_element() <= 0.0 => {
                Err(format!("box half extents must be positive, got {}", half_extents))
            }
            Shape::Polygon { vertices }
                if vertices.len() < 3 || vertices.len() > MAX_POLYGON_VERTICES =>
            {
                Err(format!(
                    "polygon needs 3..={} vertices, got {}",
                    MAX_POLYGON_VERTICES,
                    vertices.len()
                ))
            }
            Shape::Edge { v1, v2 } if v1 == v2 => Err("edge has zero length".to_string()),
            Shape::Chain { vertices, looped } => {
                let min = if *looped { 3 } else { 2 };
                if vertices.len() < min {
                    Err(format!(
                        "chain needs at least {} vertices, got {}",
                        min,
                        vertices.len()
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Circle,
    Polygon,
    Edge,
    Chain,
}

/// Contact filtering data
///
/// Fixtures in the same non-zero group always collide (positive index) or
/// never collide (negative index). Otherwise each side's mask must accept
/// the other side's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Filter {
    /// The collision category bits. Normally you would just set one bit.
    pub category_bits: u16,

    /// The categories this fixture accepts collisions with
    pub mask_bits: u16,

    /// Group override; zero means no group
    pub group_index: i16,
}

impl Filter {
    pub fn new(category_bits: u16, mask_bits: u16, group_index: i16) -> Self {
        Self {
            category_bits,
            mask_bits,
            group_index,
        }
    }

    /// The rule applied when no contact filter is installed
    pub fn should_collide(&self, other: &Filter) -> bool {
        if self.group_index == other.group_index && self.group_index != 0 {
            return self.group_index > 0;
        }
        (self.mask_bits & other.category_bits) != 0 && (self.category_bits & other.mask_bits) != 0
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            group_index: 0,
        }
    }
}

/// Everything needed to attach a fixture to a body
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureDef {
    pub shape: Shape,
    pub friction: f32,
    pub restitution: f32,
    /// Mass per unit area; a dynamic body whose fixtures all have zero
    /// density has no mass and ignores gravity
    pub density: f32,
    pub is_sensor: bool,
    pub filter: Filter,
}

impl FixtureDef {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            friction: 0.2,
            restitution: 0.0,
            density: 0.0,
            is_sensor: false,
            filter: Filter::default(),
        }
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    /// Make this a sensor (detects overlaps but doesn't cause physical response)
    pub fn sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

/// Managed proxy of a native collider attached to a body
pub struct Fixture {
    id: FixtureId,
    body: BodyId,
    shape_type: ShapeType,
    filter: Filter,
    user_data: Option<UserData>,
}

/// Identity and cached state a fixture proxy is bound with
pub struct FixtureInit {
    pub handle: Handle,
    pub body: BodyId,
    pub shape_type: ShapeType,
    pub filter: Filter,
}

impl Poolable for Fixture {
    type Init = FixtureInit;

    fn create(init: FixtureInit) -> Self {
        Self {
            id: FixtureId::new(init.handle),
            body: init.body,
            shape_type: init.shape_type,
            filter: init.filter,
            user_data: None,
        }
    }

    fn rebind(&mut self, init: FixtureInit) {
        self.id = FixtureId::new(init.handle);
        self.body = init.body;
        self.shape_type = init.shape_type;
        self.filter = init.filter;
    }

    fn reset(&mut self) {
        self.user_data = None;
        self.filter = Filter::default();
    }
}

impl Fixture {
    pub fn id(&self) -> FixtureId {
        self.id
    }

    /// The body this fixture is attached to
    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// Cached filter data
    pub fn filter(&self) -> Filter {
        self.filter
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
}

/// Read access to a live fixture and its native collider
pub struct FixtureRef<'w> {
    fixture: &'w Fixture,
    native: &'w NativeWorld,
}

impl<'w> FixtureRef<'w> {
    pub(crate) fn new(fixture: &'w Fixture, native: &'w NativeWorld) -> Self {
        Self { fixture, native }
    }

    /// The managed proxy
    pub fn proxy(&self) -> &'w Fixture {
        self.fixture
    }

    pub fn id(&self) -> FixtureId {
        self.fixture.id
    }

    pub fn body(&self) -> BodyId {
        self.fixture.body
    }

    pub fn shape_type(&self) -> ShapeType {
        self.fixture.shape_type
    }

    pub fn filter(&self) -> Filter {
        self.fixture.filter
    }

    pub fn user_data<T: Any>(&self) -> Option<&'w T> {
        self.fixture.user_data.as_ref()?.downcast_ref()
    }

    pub fn is_sensor(&self) -> bool {
        self.native.fixture_is_sensor(self.fixture.handle())
    }

    pub fn friction(&self) -> f32 {
        self.native.fixture_friction(self.fixture.handle())
    }

    pub fn restitution(&self) -> f32 {
        self.native.fixture_restitution(self.fixture.handle())
    }

    pub fn density(&self) -> f32 {
        self.native.fixture_density(self.fixture.handle())
    }

    /// Whether a world point lies inside the shape
    pub fn test_point(&self, point: Vec2) -> bool {
        self.native.fixture_test_point(self.fixture.handle(), point)
    }

    /// World-space bounding box
    pub fn aabb(&self) -> Aabb {
        self.native.fixture_aabb(self.fixture.handle())
    }
}

/// Write access to a live fixture and its native collider
pub struct FixtureMut<'w> {
    fixture: &'w mut Fixture,
    native: &'w mut NativeWorld,
}

impl<'w> FixtureMut<'w> {
    pub(crate) fn new(fixture: &'w mut Fixture, native: &'w mut NativeWorld) -> Self {
        Self { fixture, native }
    }

    /// Reborrow as a read-only view
    pub fn get(&self) -> FixtureRef<'_> {
        FixtureRef::new(self.fixture, self.native)
    }

    pub fn set_sensor(&mut self, is_sensor: bool) {
        self.native
            .set_fixture_sensor(self.fixture.handle(), is_sensor);
    }

    /// Replace the filter; takes effect from the next step
    pub fn set_filter(&mut self, filter: Filter) {
        self.fixture.filter = filter;
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.native
            .set_fixture_friction(self.fixture.handle(), friction);
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.native
            .set_fixture_restitution(self.fixture.handle(), restitution);
    }

    /// Body mass is recomputed by the engine on the next step
    pub fn set_density(&mut self, density: f32) {
        self.native.set_fixture_density(self.fixture.handle(), density);
    }

    pub fn set_user_data<T: Any + Send + Sync>(&mut self, data: T) {
        self.fixture.user_data = Some(Box::new(data));
    }

    pub fn take_user_data(&mut self) -> Option<UserData> {
        self.fixture.user_data.take()
    }
}
