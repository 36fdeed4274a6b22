//! The optimistic mutation gateway.
//!
//! Every mutation follows the same three steps: validate locally, apply
//! to the replica store (so the UI reflects the change with zero network
//! latency), then issue the remote write. The remote store broadcasts
//! its own change event afterwards; merging that event back is a
//! harmless no-op because the store's upsert is idempotent.
//!
//! On remote failure the optimistic local state is deliberately left in
//! place and a [`SyncError`] is surfaced; `force_reload` is the recovery
//! path.

use uuid::Uuid;

use crate::error::{GatewayError, ValidationError};
use crate::models::{
    Enrollment, EnrollmentStatus, EnrollmentUpdate, Offering, OfferingUpdate, Person, PersonKey,
    PersonUpdate,
};
use crate::remote::{RemoteStore, RemoteWrite};
use crate::store::SharedStore;

/// Result of a batch enrollment: how many were applied and how many
/// were skipped as duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies local mutations optimistically and mirrors them to the
/// remote store.
#[derive(Debug, Clone)]
pub struct Gateway<R> {
    store: SharedStore,
    remote: R,
}

impl<R: RemoteStore> Gateway<R> {
    pub fn new(store: SharedStore, remote: R) -> Self {
        Self { store, remote }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    // --- people ----------------------------------------------------------

    pub async fn add_person(&self, person: Person) -> Result<(), GatewayError> {
        if person.rut.is_empty() {
            return Err(ValidationError::MissingField("identity number").into());
        }
        if person.first_name.trim().is_empty() && person.last_name.trim().is_empty() {
            return Err(ValidationError::MissingField("name").into());
        }
        let duplicate = self.store.read(|s| s.get_person(&person.rut).is_some());
        if duplicate {
            return Err(ValidationError::DuplicatePerson(person.rut.clone()).into());
        }

        self.store.write(|s| s.upsert_person(person.clone()));
        self.remote.apply(RemoteWrite::InsertPerson(person)).await?;
        Ok(())
    }

    pub async fn update_person(
        &self,
        key: &PersonKey,
        update: PersonUpdate,
    ) -> Result<(), GatewayError> {
        let known = self.store.read(|s| s.get_person(key).is_some());
        if !known {
            return Err(ValidationError::UnknownPerson(key.clone()).into());
        }

        self.store.write(|s| s.update_person(key, &update));
        self.remote
            .apply(RemoteWrite::UpdatePerson(key.clone(), update))
            .await?;
        Ok(())
    }

    pub async fn delete_person(&self, key: &PersonKey) -> Result<(), GatewayError> {
        let removed = self.store.write(|s| s.remove_person(key));
        if !removed {
            return Err(ValidationError::UnknownPerson(key.clone()).into());
        }
        self.remote
            .apply(RemoteWrite::DeletePerson(key.clone()))
            .await?;
        Ok(())
    }

    // --- offerings -------------------------------------------------------

    pub async fn create_offering(&self, offering: Offering) -> Result<(), GatewayError> {
        if offering.id.trim().is_empty() {
            return Err(ValidationError::MissingField("offering id").into());
        }
        if offering.name.trim().is_empty() {
            return Err(ValidationError::MissingField("offering name").into());
        }
        let duplicate = self.store.read(|s| s.get_offering(&offering.id).is_some());
        if duplicate {
            return Err(ValidationError::DuplicateOffering(offering.id.clone()).into());
        }

        self.store.write(|s| s.upsert_offering(offering.clone()));
        self.remote
            .apply(RemoteWrite::InsertOffering(offering))
            .await?;
        Ok(())
    }

    pub async fn update_offering(
        &self,
        id: &str,
        update: OfferingUpdate,
    ) -> Result<(), GatewayError> {
        let known = self.store.read(|s| s.get_offering(id).is_some());
        if !known {
            return Err(ValidationError::UnknownOffering(id.to_string()).into());
        }

        self.store.write(|s| s.update_offering(id, &update));
        self.remote
            .apply(RemoteWrite::UpdateOffering(id.to_string(), update))
            .await?;
        Ok(())
    }

    pub async fn delete_offering(&self, id: &str) -> Result<(), GatewayError> {
        let removed = self.store.write(|s| s.remove_offering(id));
        if !removed {
            return Err(ValidationError::UnknownOffering(id.to_string()).into());
        }
        self.remote
            .apply(RemoteWrite::DeleteOffering(id.to_string()))
            .await?;
        Ok(())
    }

    // --- enrollments -----------------------------------------------------

    /// Enrolls a person in an offering. Refuses a second enrollment for
    /// the same (person, offering) pair.
    pub async fn enroll(
        &self,
        person: &PersonKey,
        offering: &str,
        status: EnrollmentStatus,
    ) -> Result<Enrollment, GatewayError> {
        let enrollment = self.store.read(|s| {
            if s.get_person(person).is_none() {
                return Err(ValidationError::UnknownPerson(person.clone()));
            }
            if s.get_offering(offering).is_none() {
                return Err(ValidationError::UnknownOffering(offering.to_string()));
            }
            if s.has_enrollment_pair(person, offering) {
                return Err(ValidationError::DuplicateEnrollment {
                    person: person.clone(),
                    offering: offering.to_string(),
                });
            }
            Ok(Enrollment::new(person.clone(), offering).with_status(status))
        })?;

        self.store.write(|s| s.upsert_enrollment(enrollment.clone()));
        self.remote
            .apply(RemoteWrite::InsertEnrollment(enrollment.clone()))
            .await?;
        Ok(enrollment)
    }

    /// Enrolls a list of people in one offering, skipping duplicates
    /// instead of failing the whole batch. The local echo is one store
    /// notification regardless of list size.
    pub async fn enroll_batch(
        &self,
        people: &[PersonKey],
        offering: &str,
        status: EnrollmentStatus,
    ) -> Result<BatchOutcome, GatewayError> {
        let known = self.store.read(|s| s.get_offering(offering).is_some());
        if !known {
            return Err(ValidationError::UnknownOffering(offering.to_string()).into());
        }

        let mut outcome = BatchOutcome::default();
        let created: Vec<Enrollment> = self.store.write(|s| {
            s.batch(|s| {
                let mut created = Vec::new();
                for person in people {
                    if s.get_person(person).is_none() {
                        tracing::warn!(person = %person, "skipping enrollment for unknown person");
                        outcome.skipped += 1;
                        continue;
                    }
                    if s.has_enrollment_pair(person, offering) {
                        outcome.skipped += 1;
                        continue;
                    }
                    let enrollment =
                        Enrollment::new(person.clone(), offering).with_status(status);
                    s.upsert_enrollment(enrollment.clone());
                    created.push(enrollment);
                    outcome.applied += 1;
                }
                created
            })
        });

        for enrollment in created {
            self.remote
                .apply(RemoteWrite::InsertEnrollment(enrollment))
                .await?;
        }
        Ok(outcome)
    }

    pub async fn update_enrollment(
        &self,
        id: &Uuid,
        update: EnrollmentUpdate,
    ) -> Result<(), GatewayError> {
        let known = self.store.read(|s| s.get_enrollment(id).is_some());
        if !known {
            return Err(ValidationError::UnknownEnrollment(*id).into());
        }

        self.store.write(|s| s.update_enrollment(id, &update));
        self.remote
            .apply(RemoteWrite::UpdateEnrollment(*id, update))
            .await?;
        Ok(())
    }

    pub async fn withdraw(&self, id: &Uuid) -> Result<(), GatewayError> {
        let removed = self.store.write(|s| s.remove_enrollment(id));
        if !removed {
            return Err(ValidationError::UnknownEnrollment(*id).into());
        }
        self.remote
            .apply(RemoteWrite::DeleteEnrollment(*id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OfferingCategory;
    use crate::testing::FakeRemote;

    fn gateway() -> Gateway<FakeRemote> {
        Gateway::new(SharedStore::new(), FakeRemote::new())
    }

    async fn seeded_gateway() -> Gateway<FakeRemote> {
        let gw = gateway();
        gw.add_person(Person::new("12345678-9", "Ana", "Rojas"))
            .await
            .unwrap();
        gw.add_person(Person::new("11111111-1", "Luis", "Paz"))
            .await
            .unwrap();
        gw.create_offering(Offering::new("MAT101", "Calculus I", OfferingCategory::Course))
            .await
            .unwrap();
        gw
    }

    #[tokio::test]
    async fn test_add_person_echoes_locally_and_remotely() {
        let gw = gateway();
        let person = Person::new("12345678-9", "Ana", "Rojas");
        gw.add_person(person.clone()).await.unwrap();

        assert_eq!(gw.store().read(|s| s.people()), vec![person.clone()]);
        assert_eq!(
            gw.remote_writes(),
            vec![RemoteWrite::InsertPerson(person)]
        );
    }

    #[tokio::test]
    async fn test_add_person_rejects_duplicate_before_any_effect() {
        let gw = seeded_gateway().await;
        let writes_before = gw.remote_writes().len();

        let result = gw
            .add_person(Person::new("012.345.678-9", "Impostor", "X"))
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Validation(ValidationError::DuplicatePerson(_)))
        ));
        assert_eq!(gw.store().read(|s| s.people().len()), 2);
        assert_eq!(gw.remote_writes().len(), writes_before);
    }

    #[tokio::test]
    async fn test_add_person_requires_key_and_name() {
        let gw = gateway();
        assert!(matches!(
            gw.add_person(Person::new("--", "Ana", "Rojas")).await,
            Err(GatewayError::Validation(ValidationError::MissingField(_)))
        ));
        assert!(matches!(
            gw.add_person(Person::new("1-9", " ", "")).await,
            Err(GatewayError::Validation(ValidationError::MissingField(_)))
        ));
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_optimistic_state() {
        let gw = gateway();
        gw.remote_fail_writes(true);

        let person = Person::new("12345678-9", "Ana", "Rojas");
        let result = gw.add_person(person.clone()).await;

        assert!(matches!(result, Err(GatewayError::Sync(_))));
        // The local echo is intentionally not rolled back
        assert_eq!(gw.store().read(|s| s.people()), vec![person]);
    }

    #[tokio::test]
    async fn test_update_person_merges() {
        let gw = seeded_gateway().await;
        let key = PersonKey::new("12345678-9");
        gw.update_person(
            &key,
            PersonUpdate {
                email: Some("ana@example.edu".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let person = gw.store().read(|s| s.get_person(&key)).unwrap();
        assert_eq!(person.email, "ana@example.edu");
        assert_eq!(person.first_name, "Ana");
    }

    #[tokio::test]
    async fn test_update_unknown_person_is_rejected() {
        let gw = gateway();
        let result = gw
            .update_person(&PersonKey::new("9-9"), PersonUpdate::default())
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Validation(ValidationError::UnknownPerson(_)))
        ));
        assert!(gw.remote_writes().is_empty());
    }

    #[tokio::test]
    async fn test_update_offering_merges() {
        let gw = seeded_gateway().await;
        let update = OfferingUpdate {
            capacity: Some(40),
            location: Some("Room 12".to_string()),
            ..Default::default()
        };
        gw.update_offering("MAT101", update.clone()).await.unwrap();

        let offering = gw.store().read(|s| s.get_offering("MAT101")).unwrap();
        assert_eq!(offering.capacity, Some(40));
        assert_eq!(offering.location, "Room 12");
        // Untouched fields keep their values
        assert_eq!(offering.name, "Calculus I");
        assert!(gw
            .remote_writes()
            .contains(&RemoteWrite::UpdateOffering("MAT101".to_string(), update)));
    }

    #[tokio::test]
    async fn test_update_unknown_offering_is_rejected() {
        let gw = gateway();
        let result = gw
            .update_offering("FIS100", OfferingUpdate::default())
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Validation(ValidationError::UnknownOffering(_)))
        ));
        assert!(gw.remote_writes().is_empty());
    }

    #[tokio::test]
    async fn test_enroll_and_duplicate_pair_rejection() {
        let gw = seeded_gateway().await;
        let key = PersonKey::new("12345678-9");

        let enrollment = gw
            .enroll(&key, "MAT101", EnrollmentStatus::Registered)
            .await
            .unwrap();
        assert_eq!(enrollment.person, key);

        // Same pair again, with a differently formatted key
        let result = gw
            .enroll(
                &PersonKey::new("12.345.678-9"),
                "MAT101",
                EnrollmentStatus::Pending,
            )
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Validation(
                ValidationError::DuplicateEnrollment { .. }
            ))
        ));
        assert_eq!(gw.store().read(|s| s.enrollments().len()), 1);
    }

    #[tokio::test]
    async fn test_enroll_requires_known_person_and_offering() {
        let gw = seeded_gateway().await;
        assert!(matches!(
            gw.enroll(
                &PersonKey::new("9-9"),
                "MAT101",
                EnrollmentStatus::Registered
            )
            .await,
            Err(GatewayError::Validation(ValidationError::UnknownPerson(_)))
        ));
        assert!(matches!(
            gw.enroll(
                &PersonKey::new("12345678-9"),
                "FIS100",
                EnrollmentStatus::Registered
            )
            .await,
            Err(GatewayError::Validation(ValidationError::UnknownOffering(_)))
        ));
    }

    #[tokio::test]
    async fn test_enroll_batch_dedups() {
        let gw = seeded_gateway().await;
        let p1 = PersonKey::new("12345678-9");
        let p2 = PersonKey::new("11111111-1");

        // P1 is already enrolled
        gw.enroll(&p1, "MAT101", EnrollmentStatus::Registered)
            .await
            .unwrap();

        let outcome = gw
            .enroll_batch(
                &[p1.clone(), p1.clone(), p2.clone()],
                "MAT101",
                EnrollmentStatus::Registered,
            )
            .await
            .unwrap();

        assert_eq!(outcome, BatchOutcome { applied: 1, skipped: 2 });
        let enrollments = gw.store().read(|s| s.enrollments());
        assert_eq!(enrollments.len(), 2);
        assert!(enrollments.iter().any(|e| e.person == p1));
        assert!(enrollments.iter().any(|e| e.person == p2));
    }

    #[tokio::test]
    async fn test_enroll_batch_is_one_notification() {
        let gw = seeded_gateway().await;
        let mut rx = gw.store().subscribe();
        rx.borrow_and_update();
        let revision_before = gw.store().read(|s| s.revision());

        gw.enroll_batch(
            &[PersonKey::new("12345678-9"), PersonKey::new("11111111-1")],
            "MAT101",
            EnrollmentStatus::Registered,
        )
        .await
        .unwrap();

        assert_eq!(gw.store().read(|s| s.revision()), revision_before + 1);
    }

    #[tokio::test]
    async fn test_update_enrollment_keeps_unrelated_fields() {
        let gw = seeded_gateway().await;
        let enrollment = gw
            .enroll(
                &PersonKey::new("12345678-9"),
                "MAT101",
                EnrollmentStatus::Registered,
            )
            .await
            .unwrap();
        gw.update_enrollment(
            &enrollment.id,
            EnrollmentUpdate {
                attendance: Some(95.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        gw.update_enrollment(
            &enrollment.id,
            EnrollmentUpdate {
                scores: Some(vec![5.5]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stored = gw
            .store()
            .read(|s| s.get_enrollment(&enrollment.id))
            .unwrap();
        assert_eq!(stored.scores, vec![5.5]);
        assert_eq!(stored.attendance, Some(95.0));
    }

    #[tokio::test]
    async fn test_withdraw() {
        let gw = seeded_gateway().await;
        let enrollment = gw
            .enroll(
                &PersonKey::new("12345678-9"),
                "MAT101",
                EnrollmentStatus::Registered,
            )
            .await
            .unwrap();

        gw.withdraw(&enrollment.id).await.unwrap();
        assert!(gw.store().read(|s| s.enrollments().is_empty()));

        // Withdrawing again is a validation error
        assert!(matches!(
            gw.withdraw(&enrollment.id).await,
            Err(GatewayError::Validation(
                ValidationError::UnknownEnrollment(_)
            ))
        ));
    }

    #[tokio::test]
    async fn test_delete_offering() {
        let gw = seeded_gateway().await;
        gw.delete_offering("MAT101").await.unwrap();
        assert!(gw.store().read(|s| s.offerings().is_empty()));
        assert!(gw
            .remote_writes()
            .contains(&RemoteWrite::DeleteOffering("MAT101".to_string())));
    }

    impl Gateway<FakeRemote> {
        fn remote_writes(&self) -> Vec<RemoteWrite> {
            self.remote.writes()
        }

        fn remote_fail_writes(&self, fail: bool) {
            self.remote.fail_writes(fail);
        }
    }
}
