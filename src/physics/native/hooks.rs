// rapier physics hooks and event handler bridging into managed callbacks

use super::{from_collider, pair_key};
use crate::physics::contact::{ContactImpulse, ContactRecord, MAX_MANIFOLD_POINTS};
use crate::physics::Handle;
use glam::Vec2;
use log::{error, trace};
use rapier2d::prelude::*;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Receiver of everything the engine reports while stepping
///
/// Handles are those of the fixtures involved; resolving them is up to the
/// implementor.
pub(crate) trait StepCallbacks: Send {
    /// Decide whether the pair may generate contacts at all
    fn should_collide(&mut self, fixture_a: Handle, fixture_b: Handle) -> bool;

    fn begin_contact(&mut self, contact: &mut ContactRecord);

    fn end_contact(&mut self, contact: &mut ContactRecord);

    /// Overrides written to the record are applied to the solver contacts
    fn pre_solve(&mut self, contact: &mut ContactRecord);

    fn post_solve(&mut self, contact: &mut ContactRecord, impulse: &ContactImpulse);
}

struct Dispatch<'a> {
    callbacks: &'a mut dyn StepCallbacks,
    contact: &'a mut ContactRecord,
    impulse: &'a mut ContactImpulse,
}

/// Lives for exactly one `PhysicsPipeline::step`
///
/// rapier hands its hooks out by shared reference, so the mutable dispatch
/// state sits behind a mutex. The step is single threaded and the lock is
/// never contended.
pub(super) struct StepHooks<'a> {
    dispatch: Mutex<Dispatch<'a>>,

    /// Pairs whose end was reported before this step
    ended: &'a HashSet<(Handle, Handle)>,
}

impl<'a> StepHooks<'a> {
    pub fn new(
        callbacks: &'a mut dyn StepCallbacks,
        contact: &'a mut ContactRecord,
        impulse: &'a mut ContactImpulse,
        ended: &'a HashSet<(Handle, Handle)>,
    ) -> Self {
        Self {
            dispatch: Mutex::new(Dispatch {
                callbacks,
                contact,
                impulse,
            }),
            ended,
        }
    }

    /// Lock the dispatch state
    ///
    /// A listener that panicked mid-step poisons the lock; the state it
    /// guards is plain scratch data, so dispatch carries on with it.
    fn dispatch(&self) -> MutexGuard<'_, Dispatch<'a>> {
        self.dispatch.lock().unwrap_or_else(|poisoned| {
            error!("contact dispatch lock poisoned by a panicking callback");
            PoisonError::into_inner(poisoned)
        })
    }

    fn should_collide(&self, collider1: ColliderHandle, collider2: ColliderHandle) -> bool {
        self.dispatch()
            .callbacks
            .should_collide(from_collider(collider1), from_collider(collider2))
    }
}

/// Copy a native manifold into the contact record
pub(super) fn fill_manifold(
    record: &mut ContactRecord,
    manifold: &ContactManifold,
    solver_contacts: &[SolverContact],
    normal: &Vector<Real>,
) {
    let local = &mut record.manifold;
    local.local_normal = Vec2::new(manifold.local_n1.x, manifold.local_n1.y);
    local.point_count = manifold.points.len().min(MAX_MANIFOLD_POINTS);
    for (slot, point) in local.local_points.iter_mut().zip(&manifold.points) {
        *slot = Vec2::new(point.local_p1.x, point.local_p1.y);
    }

    let world = &mut record.world_manifold;
    world.normal = Vec2::new(normal.x, normal.y);
    world.point_count = solver_contacts.len().min(MAX_MANIFOLD_POINTS);
    for (i, contact) in solver_contacts.iter().take(MAX_MANIFOLD_POINTS).enumerate() {
        world.points[i] = Vec2::new(contact.point.x, contact.point.y);
        world.separations[i] = contact.dist;
    }
}

impl PhysicsHooks for StepHooks<'_> {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        self.should_collide(context.collider1, context.collider2)
            .then_some(SolverFlags::COMPUTE_IMPULSES)
    }

    fn filter_intersection_pair(&self, context: &PairFilterContext) -> bool {
        self.should_collide(context.collider1, context.collider2)
    }

    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let mut dispatch = self.dispatch();
        let Dispatch {
            callbacks, contact, ..
        } = &mut *dispatch;

        contact.begin(from_collider(context.collider1), from_collider(context.collider2));
        contact.touching = true;
        fill_manifold(
            contact,
            context.manifold,
            context.solver_contacts.as_slice(),
            &*context.normal,
        );
        if let Some(first) = context.solver_contacts.first() {
            contact.friction = first.friction;
            contact.restitution = first.restitution;
        }

        callbacks.pre_solve(contact);

        if !contact.enabled {
            context.solver_contacts.clear();
            return;
        }
        let normal = *context.normal;
        let tangent_velocity = vector![normal.y, -normal.x] * contact.tangent_speed;
        for solver_contact in context.solver_contacts.iter_mut() {
            solver_contact.friction = contact.friction;
            solver_contact.restitution = contact.restitution;
            solver_contact.tangent_velocity = tangent_velocity;
        }
    }
}

impl EventHandler for StepHooks<'_> {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        if event.removed() {
            // One side was destroyed between steps; its proxy is gone.
            trace!(
                "skipping end of contact with removed collider {:?}",
                (event.collider1(), event.collider2())
            );
            return;
        }
        if event.stopped() && self.ended.contains(&pair_key(event.collider1(), event.collider2())) {
            trace!(
                "end of contact {:?} already reported",
                (event.collider1(), event.collider2())
            );
            return;
        }
        let mut dispatch = self.dispatch();
        let Dispatch {
            callbacks, contact, ..
        } = &mut *dispatch;

        contact.begin(
            from_collider(event.collider1()),
            from_collider(event.collider2()),
        );
        contact.touching = event.started();
        if let Some(manifold) = contact_pair.and_then(|pair| pair.manifolds.first()) {
            fill_manifold(
                contact,
                manifold,
                &manifold.data.solver_contacts,
                &manifold.data.normal,
            );
        }

        if event.started() {
            callbacks.begin_contact(contact);
        } else {
            callbacks.end_contact(contact);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
        let mut dispatch = self.dispatch();
        let Dispatch {
            callbacks,
            contact,
            impulse,
        } = &mut *dispatch;

        contact.begin(
            from_collider(contact_pair.collider1),
            from_collider(contact_pair.collider2),
        );
        contact.touching = contact_pair.has_any_active_contact;
        impulse.clear();

        if let Some(manifold) = contact_pair
            .manifolds
            .iter()
            .find(|manifold| !manifold.points.is_empty())
        {
            fill_manifold(
                contact,
                manifold,
                &manifold.data.solver_contacts,
                &manifold.data.normal,
            );
            impulse.count = manifold.points.len().min(MAX_MANIFOLD_POINTS);
            for (i, point) in manifold.points.iter().take(MAX_MANIFOLD_POINTS).enumerate() {
                impulse.normal_impulses[i] = point.data.impulse;
                impulse.tangent_impulses[i] = point.data.tangent_impulse[0];
            }
        }

        callbacks.post_solve(contact, impulse);
    }
}
