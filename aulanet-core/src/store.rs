//! The replica store: the in-memory mirror of the three remote
//! collections.
//!
//! The store is the single owner of the cached records. Consumers read
//! cloned snapshots and subscribe to a single "something changed"
//! revision signal; they never hold references into the store. Mutations
//! are synchronous critical sections; callers must not hold the lock
//! across an await.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use uuid::Uuid;

use crate::models::{
    Collection, Enrollment, EnrollmentUpdate, Offering, OfferingUpdate, Person, PersonKey,
    PersonUpdate,
};

/// A record from any of the three collections.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Person(Person),
    Offering(Offering),
    Enrollment(Enrollment),
}

impl Record {
    pub fn collection(&self) -> Collection {
        match self {
            Record::Person(_) => Collection::People,
            Record::Offering(_) => Collection::Offerings,
            Record::Enrollment(_) => Collection::Enrollments,
        }
    }
}

/// A key addressing a record in one of the three collections.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKey {
    Person(PersonKey),
    Offering(String),
    Enrollment(Uuid),
}

/// A full copy of all three collections, as fetched from the remote
/// store or read by a consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub people: Vec<Person>,
    pub offerings: Vec<Offering>,
    pub enrollments: Vec<Enrollment>,
}

/// Extracts the key a record is stored under.
trait Keyed {
    type Key: PartialEq;
    fn key(&self) -> Self::Key;
}

impl Keyed for Person {
    type Key = PersonKey;
    fn key(&self) -> PersonKey {
        self.rut.clone()
    }
}

impl Keyed for Offering {
    type Key = String;
    fn key(&self) -> String {
        self.id.clone()
    }
}

impl Keyed for Enrollment {
    type Key = Uuid;
    fn key(&self) -> Uuid {
        self.id
    }
}

/// One insertion-ordered, key-unique collection.
#[derive(Debug)]
struct Shelf<T> {
    items: Vec<T>,
}

impl<T: Keyed + PartialEq + Clone> Shelf<T> {
    fn new() -> Self {
        Self { items: Vec::new() }
    }

    fn position(&self, key: &T::Key) -> Option<usize> {
        self.items.iter().position(|item| &item.key() == key)
    }

    fn get(&self, key: &T::Key) -> Option<&T> {
        self.position(key).map(|i| &self.items[i])
    }

    fn get_mut(&mut self, key: &T::Key) -> Option<&mut T> {
        self.items.iter_mut().find(|item| &item.key() == key)
    }

    fn has(&self, key: &T::Key) -> bool {
        self.position(key).is_some()
    }

    /// Inserts or overwrites in place. Returns whether anything changed;
    /// storing a record identical to the existing one is a no-op.
    fn upsert(&mut self, record: T) -> bool {
        match self.position(&record.key()) {
            Some(i) => {
                if self.items[i] == record {
                    false
                } else {
                    self.items[i] = record;
                    true
                }
            }
            None => {
                self.items.push(record);
                true
            }
        }
    }

    fn remove(&mut self, key: &T::Key) -> bool {
        match self.position(key) {
            Some(i) => {
                self.items.remove(i);
                true
            }
            None => false,
        }
    }

    fn replace(&mut self, records: Vec<T>) -> bool {
        // Re-inserting one by one keeps key uniqueness even if the
        // incoming list has duplicates.
        let old = std::mem::take(&mut self.items);
        for record in records {
            self.upsert(record);
        }
        self.items != old
    }

    fn snapshot(&self) -> Vec<T> {
        self.items.clone()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// The in-memory mirror of the remote collections.
#[derive(Debug)]
pub struct ReplicaStore {
    people: Shelf<Person>,
    offerings: Shelf<Offering>,
    enrollments: Shelf<Enrollment>,
    revision: u64,
    batch_depth: u32,
    dirty: bool,
    notify: watch::Sender<u64>,
}

impl ReplicaStore {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            people: Shelf::new(),
            offerings: Shelf::new(),
            enrollments: Shelf::new(),
            revision: 0,
            batch_depth: 0,
            dirty: false,
            notify,
        }
    }

    // --- snapshots -------------------------------------------------------

    pub fn people(&self) -> Vec<Person> {
        self.people.snapshot()
    }

    pub fn offerings(&self) -> Vec<Offering> {
        self.offerings.snapshot()
    }

    pub fn enrollments(&self) -> Vec<Enrollment> {
        self.enrollments.snapshot()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            people: self.people(),
            offerings: self.offerings(),
            enrollments: self.enrollments(),
        }
    }

    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::People => self.people.len(),
            Collection::Offerings => self.offerings.len(),
            Collection::Enrollments => self.enrollments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Collection::ALL.iter().all(|c| self.len(*c) == 0)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // --- reads -----------------------------------------------------------

    pub fn get_person(&self, key: &PersonKey) -> Option<Person> {
        self.people.get(key).cloned()
    }

    pub fn get_offering(&self, id: &str) -> Option<Offering> {
        self.offerings.get(&id.to_string()).cloned()
    }

    pub fn get_enrollment(&self, id: &Uuid) -> Option<Enrollment> {
        self.enrollments.get(id).cloned()
    }

    pub fn has(&self, key: &RecordKey) -> bool {
        match key {
            RecordKey::Person(k) => self.people.has(k),
            RecordKey::Offering(id) => self.offerings.has(id),
            RecordKey::Enrollment(id) => self.enrollments.has(id),
        }
    }

    /// True when an enrollment for this (person, offering) pair exists.
    pub fn has_enrollment_pair(&self, person: &PersonKey, offering: &str) -> bool {
        self.enrollments
            .items
            .iter()
            .any(|e| &e.person == person && e.offering == offering)
    }

    // --- mutations (replace semantics) -----------------------------------

    pub fn upsert_person(&mut self, person: Person) -> bool {
        let changed = self.people.upsert(person);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn upsert_offering(&mut self, offering: Offering) -> bool {
        let changed = self.offerings.upsert(offering);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn upsert_enrollment(&mut self, enrollment: Enrollment) -> bool {
        let changed = self.enrollments.upsert(enrollment);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn upsert(&mut self, record: Record) -> bool {
        match record {
            Record::Person(p) => self.upsert_person(p),
            Record::Offering(o) => self.upsert_offering(o),
            Record::Enrollment(e) => self.upsert_enrollment(e),
        }
    }

    // --- mutations (merge semantics) -------------------------------------

    pub fn update_person(&mut self, key: &PersonKey, update: &PersonUpdate) -> bool {
        let changed = match self.people.get_mut(key) {
            Some(person) => update.apply(person),
            None => false,
        };
        if changed {
            self.touch();
        }
        changed
    }

    pub fn update_offering(&mut self, id: &str, update: &OfferingUpdate) -> bool {
        let changed = match self.offerings.get_mut(&id.to_string()) {
            Some(offering) => update.apply(offering),
            None => false,
        };
        if changed {
            self.touch();
        }
        changed
    }

    pub fn update_enrollment(&mut self, id: &Uuid, update: &EnrollmentUpdate) -> bool {
        let changed = match self.enrollments.get_mut(id) {
            Some(enrollment) => update.apply(enrollment),
            None => false,
        };
        if changed {
            self.touch();
        }
        changed
    }

    // --- removals --------------------------------------------------------

    pub fn remove_person(&mut self, key: &PersonKey) -> bool {
        let changed = self.people.remove(key);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn remove_offering(&mut self, id: &str) -> bool {
        let changed = self.offerings.remove(&id.to_string());
        if changed {
            self.touch();
        }
        changed
    }

    pub fn remove_enrollment(&mut self, id: &Uuid) -> bool {
        let changed = self.enrollments.remove(id);
        if changed {
            self.touch();
        }
        changed
    }

    pub fn remove(&mut self, key: &RecordKey) -> bool {
        match key {
            RecordKey::Person(k) => self.remove_person(k),
            RecordKey::Offering(id) => self.remove_offering(id),
            RecordKey::Enrollment(id) => self.remove_enrollment(id),
        }
    }

    // --- bulk ------------------------------------------------------------

    /// Replaces all three collections with the given snapshot, notifying
    /// consumers at most once. A snapshot identical to the current state
    /// is a no-op.
    pub fn replace_all(&mut self, snapshot: Snapshot) {
        self.batch(|store| {
            let mut changed = store.people.replace(snapshot.people);
            changed |= store.offerings.replace(snapshot.offerings);
            changed |= store.enrollments.replace(snapshot.enrollments);
            if changed {
                store.dirty = true;
            }
        });
    }

    /// Runs several mutations as one logical operation: consumers see a
    /// single notification no matter how many sub-updates happen inside.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let out = f(self);
        self.batch_depth -= 1;
        if self.batch_depth == 0 && self.dirty {
            self.dirty = false;
            self.publish();
        }
        out
    }

    // --- notification ----------------------------------------------------

    /// Subscribes to the revision counter. The receiver sees at most one
    /// pending change regardless of how many mutations happened.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    fn touch(&mut self) {
        if self.batch_depth > 0 {
            self.dirty = true;
        } else {
            self.publish();
        }
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.notify.send_replace(self.revision);
    }
}

impl Default for ReplicaStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to the replica store.
///
/// All access goes through short closures so the lock can never be held
/// across an await point.
#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<ReplicaStore>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ReplicaStore::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReplicaStore> {
        // Mutations are infallible sections; a poisoned lock still holds
        // consistent data, so recover rather than propagate the panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn read<R>(&self, f: impl FnOnce(&ReplicaStore) -> R) -> R {
        f(&self.lock())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut ReplicaStore) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.lock().subscribe()
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}
