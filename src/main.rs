use anyhow::Result;
use glam::Vec2;
use log::info;
use rusted_box2d::physics::{
    BodyDef, Contact, ContactListener, FixtureDef, JointDef, RevoluteJointDef, Shape, World,
};
use rusted_box2d::DEFAULT_TIMESTEP;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Seconds of simulation to run
const DURATION: f32 = 4.0;

/// Counts contacts as they begin and end
struct ContactCounter {
    begun: Arc<AtomicUsize>,
    ended: Arc<AtomicUsize>,
}

impl ContactListener for ContactCounter {
    fn begin_contact(&mut self, _contact: &mut Contact<'_>) {
        self.begun.fetch_add(1, Ordering::Relaxed);
    }

    fn end_contact(&mut self, _contact: &mut Contact<'_>) {
        self.ended.fetch_add(1, Ordering::Relaxed);
    }
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting Rusted Box2D demo...");

    let mut world = World::default();

    let ground = world.create_body(&BodyDef::fixed())?;
    world.create_fixture(
        ground,
        &FixtureDef::new(Shape::boxed(20.0, 0.5)).friction(0.6),
    )?;

    // Stack of boxes
    let mut boxes = Vec::new();
    for i in 0..5 {
        let body = world.create_body(&BodyDef::dynamic().position(0.0, 1.0 + i as f32 * 1.05))?;
        world.create_fixture(
            body,
            &FixtureDef::new(Shape::boxed(0.5, 0.5))
                .density(1.0)
                .friction(0.3),
        )?;
        boxes.push(body);
    }

    // Pendulum hinged on a fixed pivot
    let pivot = world.create_body(&BodyDef::fixed().position(6.0, 8.0))?;
    let bob = world.create_body(&BodyDef::dynamic().position(9.0, 8.0))?;
    world.create_fixture_with_shape(bob, Shape::circle(0.4), 2.0)?;
    let hinge = RevoluteJointDef::initialize(
        &world.body(pivot)?,
        &world.body(bob)?,
        Vec2::new(6.0, 8.0),
    );
    let hinge = world.create_joint(&hinge)?;

    let begun = Arc::new(AtomicUsize::new(0));
    let ended = Arc::new(AtomicUsize::new(0));
    world.set_contact_listener(ContactCounter {
        begun: begun.clone(),
        ended: ended.clone(),
    });

    info!(
        "World ready: {} bodies, {} fixtures, {} joints",
        world.body_count(),
        world.fixture_count(),
        world.joint_count()
    );

    let steps = (DURATION / DEFAULT_TIMESTEP).round() as usize;
    for step in 1..=steps {
        world.step_default(DEFAULT_TIMESTEP);

        if step % 60 == 0 {
            let top = world.body(boxes[boxes.len() - 1])?;
            let angle = world.joint(hinge)?.joint_angle().unwrap_or_default();
            info!(
                "t={:.1}s top box at ({:.2}, {:.2}), pendulum angle {:.2} rad, {} contacts",
                step as f32 * DEFAULT_TIMESTEP,
                top.position().x,
                top.position().y,
                angle,
                world.contact_count()
            );
        }
    }

    // Tearing down the pivot takes the hinge with it.
    world.destroy_body(pivot)?;
    info!(
        "Pivot destroyed: {} joints left, bob has {} joint edges",
        world.joint_count(),
        world.body(bob)?.joint_edges().len()
    );

    info!(
        "Contacts begun: {}, ended: {}",
        begun.load(Ordering::Relaxed),
        ended.load(Ordering::Relaxed)
    );
    info!("Rusted Box2D demo shutting down");
    Ok(())
}
