// World configuration

use glam::Vec2;

/// Default timestep for callers that step at a fixed rate (60 Hz)
pub const DEFAULT_TIMESTEP: f32 = 1.0 / 60.0;

/// Sizing of a proxy pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Capacity reserved up front
    pub initial_capacity: usize,

    /// Maximum number of freed proxies kept for reuse
    pub max: usize,
}

impl PoolConfig {
    pub fn new(initial_capacity: usize, max: usize) -> Self {
        Self {
            initial_capacity,
            max,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(100, 200)
    }
}

/// Settings a [`World`](crate::World) is created with
#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// Gravity vector (default: -10 m/s² in y-axis)
    pub gravity: Vec2,

    /// Whether bodies may fall asleep when at rest
    pub allow_sleep: bool,

    /// Reset accumulated user forces after every step
    pub auto_clear_forces: bool,

    /// Velocity iterations used by [`World::step_default`](crate::World::step_default)
    pub velocity_iterations: u32,

    /// Position iterations used by [`World::step_default`](crate::World::step_default)
    pub position_iterations: u32,

    /// Body proxy pool sizing
    pub body_pool: PoolConfig,

    /// Fixture proxy pool sizing
    pub fixture_pool: PoolConfig,
}

impl WorldConfig {
    /// Create a config with custom gravity and default everything else
    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }

    pub fn gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn allow_sleep(mut self, allow: bool) -> Self {
        self.allow_sleep = allow;
        self
    }

    pub fn auto_clear_forces(mut self, enabled: bool) -> Self {
        self.auto_clear_forces = enabled;
        self
    }

    pub fn iterations(mut self, velocity: u32, position: u32) -> Self {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
        self
    }

    pub fn body_pool(mut self, pool: PoolConfig) -> Self {
        self.body_pool = pool;
        self
    }

    pub fn fixture_pool(mut self, pool: PoolConfig) -> Self {
        self.fixture_pool = pool;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -10.0),
            allow_sleep: true,
            auto_clear_forces: true,
            velocity_iterations: 8,
            position_iterations: 3,
            body_pool: PoolConfig::default(),
            fixture_pool: PoolConfig::default(),
        }
    }
}
