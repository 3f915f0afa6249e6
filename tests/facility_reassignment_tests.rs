mod fixtures;

use fireops::{
    ControlCategory, EntityId, FacilityReassignment, OrderStatus, TaskStatus, TaskType,
    ValidationError,
};
use fixtures::{nordbygg, operator, sameiet_lia};

#[tokio::test]
async fn test_moving_last_facility_offers_orphan_removal() {
    let world = nordbygg().await;
    world.customer("c-aas", "Aas Eiendom").await;
    // The pending order would keep Nordbygg alive; close it first
    world
        .order("o-kjeller", "c-nordbygg", "f-kjeller", OrderStatus::Invoiced)
        .await;

    let outcome = FacilityReassignment::new(world.repo.clone())
        .reassign(&operator(), &"f-kjeller".into(), Some("c-aas".into()))
        .await
        .unwrap();

    assert_eq!(outcome.previous_customer, Some(EntityId::new("c-nordbygg")));
    assert_eq!(outcome.orphaned_customer, Some(EntityId::new("c-nordbygg")));
    // Offered, not done
    assert!(!world.repo.customer(&"c-nordbygg".into()).await.unwrap().hidden);
}

#[tokio::test]
async fn test_active_order_keeps_previous_customer() {
    let world = nordbygg().await;
    world.customer("c-aas", "Aas Eiendom").await;

    let outcome = FacilityReassignment::new(world.repo.clone())
        .reassign(&operator(), &"f-kjeller".into(), Some("c-aas".into()))
        .await
        .unwrap();

    assert_eq!(outcome.orphaned_customer, None);
    let facility = world.repo.facility(&"f-kjeller".into()).await.unwrap();
    assert_eq!(facility.customer_id, Some(EntityId::new("c-aas")));
}

#[tokio::test]
async fn test_remaining_facility_keeps_previous_customer() {
    let world = sameiet_lia().await;

    let outcome = FacilityReassignment::new(world.repo.clone())
        .reassign(&operator(), &"f-lia-a".into(), Some("c-lia-2".into()))
        .await
        .unwrap();

    assert_eq!(outcome.orphaned_customer, None);
}

#[tokio::test]
async fn test_reassign_to_hidden_customer_is_rejected() {
    let world = sameiet_lia().await;
    world.hidden_customer("c-gone", "Lia Borettslag").await;

    let err = FacilityReassignment::new(world.repo.clone())
        .reassign(&operator(), &"f-lia-a".into(), Some("c-gone".into()))
        .await
        .unwrap_err();

    assert!(matches!(
        err.validation(),
        Some(ValidationError::DestinationUnavailable { .. })
    ));
    assert_eq!(world.store.write_count(), 0);
}

#[tokio::test]
async fn test_unchanged_owner_writes_nothing() {
    let world = sameiet_lia().await;

    let outcome = FacilityReassignment::new(world.repo.clone())
        .reassign(&operator(), &"f-lia-a".into(), Some("c-lia".into()))
        .await
        .unwrap();

    assert_eq!(outcome.orphaned_customer, None);
    assert_eq!(world.store.write_count(), 0);
}

#[tokio::test]
async fn test_unlinking_a_facility_can_orphan_its_owner() {
    let world = nordbygg().await;
    world
        .facility("f-solo", "Solo lager", Some("c-solo"), &[ControlCategory::Alarm])
        .await;
    world.customer("c-solo", "Solo Drift").await;

    let outcome = FacilityReassignment::new(world.repo.clone())
        .reassign(&operator(), &"f-solo".into(), None)
        .await
        .unwrap();

    assert_eq!(outcome.orphaned_customer, Some(EntityId::new("c-solo")));
    let facility = world.repo.facility(&"f-solo".into()).await.unwrap();
    assert_eq!(facility.customer_id, None);
}

#[tokio::test]
async fn test_remove_orphan_hides_the_customer() {
    let world = nordbygg().await;
    world.customer("c-solo", "Solo Drift").await;
    let reassignment = FacilityReassignment::new(world.repo.clone());

    reassignment
        .remove_orphaned_customer(&operator(), &"c-solo".into())
        .await
        .unwrap();

    assert!(world.repo.customer(&"c-solo".into()).await.unwrap().hidden);
}

#[tokio::test]
async fn test_remove_refused_once_customer_has_work_again() {
    let world = nordbygg().await;
    world.customer("c-solo", "Solo Drift").await;
    world
        .task("t-1", TaskType::Callback, Some("c-solo"), None, TaskStatus::NotStarted)
        .await;

    let err = FacilityReassignment::new(world.repo.clone())
        .remove_orphaned_customer(&operator(), &"c-solo".into())
        .await
        .unwrap_err();

    assert!(matches!(
        err.validation(),
        Some(ValidationError::CustomerHasDependents { tasks: 1, .. })
    ));
    assert!(!world.repo.customer(&"c-solo".into()).await.unwrap().hidden);
}
