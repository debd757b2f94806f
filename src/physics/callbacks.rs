// Resolves native callback handles into managed fixtures and forwards them
// to the installed filter and listener

use super::contact::{Contact, ContactFilter, ContactImpulse, ContactListener, ContactRecord};
use super::fixture::Fixture;
use super::native::StepCallbacks;
use super::registry::HandleRegistry;
use super::Handle;
use log::trace;

/// Per-step bridge from the native hooks to the world's listeners
pub(crate) struct StepDispatch<'a> {
    fixtures: &'a HandleRegistry<Fixture>,
    filter: Option<&'a mut Box<dyn ContactFilter>>,
    listener: Option<&'a mut Box<dyn ContactListener>>,
}

impl<'a> StepDispatch<'a> {
    pub fn new(
        fixtures: &'a HandleRegistry<Fixture>,
        filter: Option<&'a mut Box<dyn ContactFilter>>,
        listener: Option<&'a mut Box<dyn ContactListener>>,
    ) -> Self {
        Self {
            fixtures,
            filter,
            listener,
        }
    }

    /// Resolve the record's pair and hand a flyweight contact to `deliver`
    fn forward(
        &mut self,
        record: &mut ContactRecord,
        deliver: impl FnOnce(&mut dyn ContactListener, &mut Contact<'_>),
    ) {
        let Some(listener) = self.listener.as_deref_mut() else {
            return;
        };
        let (Some(a), Some(b)) = (record.fixture_a, record.fixture_b) else {
            return;
        };
        let fixture_a = self.fixtures.resolve(a);
        let fixture_b = self.fixtures.resolve(b);
        let mut contact = Contact::new(fixture_a, fixture_b, record);
        deliver(&mut **listener, &mut contact);
    }
}

impl StepCallbacks for StepDispatch<'_> {
    fn should_collide(&mut self, fixture_a: Handle, fixture_b: Handle) -> bool {
        let a = self.fixtures.resolve(fixture_a);
        let b = self.fixtures.resolve(fixture_b);
        match self.filter.as_deref_mut() {
            Some(filter) => filter.should_collide(a, b),
            None => a.filter().should_collide(&b.filter()),
        }
    }

    fn begin_contact(&mut self, record: &mut ContactRecord) {
        trace!("begin contact {:?} {:?}", record.fixture_a, record.fixture_b);
        self.forward(record, |listener, contact| listener.begin_contact(contact));
    }

    fn end_contact(&mut self, record: &mut ContactRecord) {
        trace!("end contact {:?} {:?}", record.fixture_a, record.fixture_b);
        self.forward(record, |listener, contact| listener.end_contact(contact));
    }

    fn pre_solve(&mut self, record: &mut ContactRecord) {
        let manifold = record.manifold;
        self.forward(record, |listener, contact| {
            listener.pre_solve(contact, &manifold)
        });
    }

    fn post_solve(&mut self, record: &mut ContactRecord, impulse: &ContactImpulse) {
        self.forward(record, |listener, contact| {
            listener.post_solve(contact, impulse)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::fixture::{Filter, FixtureInit, ShapeType};
    use crate::physics::pool::Poolable;
    use crate::physics::{BodyId, Manifold};

    fn registry_with(filters: &[Filter]) -> (HandleRegistry<Fixture>, Vec<Handle>) {
        let mut registry = HandleRegistry::new("fixture");
        let body = BodyId::new(Handle::from_parts(100, 0));
        let handles: Vec<_> = (0..filters.len() as u32)
            .map(|i| Handle::from_parts(i, 0))
            .collect();
        for (handle, filter) in handles.iter().zip(filters) {
            let fixture = Fixture::create(FixtureInit {
                handle: *handle,
                body,
                shape_type: ShapeType::Circle,
                filter: *filter,
            });
            registry.register(*handle, fixture);
        }
        (registry, handles)
    }

    struct Disabler;

    impl ContactListener for Disabler {
        fn pre_solve(&mut self, contact: &mut Contact<'_>, _manifold: &Manifold) {
            contact.set_enabled(false);
        }
    }

    #[test]
    fn test_default_rule_without_filter() {
        let (registry, h) = registry_with(&[
            Filter::new(0x0001, 0xFFFF, -1),
            Filter::new(0x0001, 0xFFFF, -1),
            Filter::default(),
        ]);
        let mut dispatch = StepDispatch::new(&registry, None, None);

        assert!(!dispatch.should_collide(h[0], h[1]), "Same negative group");
        assert!(dispatch.should_collide(h[0], h[2]));
    }

    #[test]
    fn test_installed_filter_replaces_default_rule() {
        let (registry, h) = registry_with(&[Filter::default(), Filter::default()]);
        let mut filter: Box<dyn ContactFilter> = Box::new(|_: &Fixture, _: &Fixture| false);
        let mut dispatch = StepDispatch::new(&registry, Some(&mut filter), None);

        assert!(!dispatch.should_collide(h[0], h[1]));
    }

    #[test]
    fn test_listener_writes_back_into_record() {
        let (registry, h) = registry_with(&[Filter::default(), Filter::default()]);
        let mut listener: Box<dyn ContactListener> = Box::new(Disabler);
        let mut dispatch = StepDispatch::new(&registry, None, Some(&mut listener));

        let mut record = ContactRecord::default();
        record.begin(h[0], h[1]);
        dispatch.begin_contact(&mut record);
        dispatch.pre_solve(&mut record);

        assert!(!record.enabled, "Listener disabled the contact in pre-solve");
    }

    #[test]
    fn test_no_listener_is_a_normal_path() {
        let (registry, h) = registry_with(&[Filter::default(), Filter::default()]);
        let mut dispatch = StepDispatch::new(&registry, None, None);

        let mut record = ContactRecord::default();
        record.begin(h[0], h[1]);
        dispatch.pre_solve(&mut record);
        assert!(record.enabled);
    }
}
