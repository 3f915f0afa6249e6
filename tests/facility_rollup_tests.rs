mod fixtures;

use std::collections::BTreeSet;

use fireops::{
    CompletionRollup, CompletionSummary, ControlCategory, EntityRef, FacilityStatus,
    ValidationError, WorkflowError,
};
use fixtures::{nordbygg, operator};

use ControlCategory::*;

#[tokio::test]
async fn test_flags_roll_up_to_complete() {
    let world = nordbygg().await;
    let rollup = CompletionRollup::new(world.repo.clone());
    let facility = "f-kjeller".into();

    let summary = rollup
        .set_category_complete(&operator(), &facility, Alarm, true)
        .await
        .unwrap();
    assert_eq!(summary, CompletionSummary { completed: 1, subscribed: 2 });
    assert!(!summary.is_complete());

    let summary = rollup
        .set_category_complete(&operator(), &facility, EmergencyLighting, true)
        .await
        .unwrap();
    assert!(summary.is_complete());
    assert_eq!(summary.to_string(), "2 of 2 categories complete");
    assert_eq!(rollup.summary(&facility).await.unwrap(), summary);
}

#[tokio::test]
async fn test_unsubscribed_category_is_rejected_without_write() {
    let world = nordbygg().await;

    let err = CompletionRollup::new(world.repo.clone())
        .set_category_complete(&operator(), &"f-kjeller".into(), SmokeVents, true)
        .await
        .unwrap_err();

    assert!(matches!(
        err.validation(),
        Some(ValidationError::InvalidCategory { category: SmokeVents, .. })
    ));
    assert_eq!(world.store.write_count(), 0);
}

#[tokio::test]
async fn test_repeating_a_flag_writes_once() {
    let world = nordbygg().await;
    let rollup = CompletionRollup::new(world.repo.clone());

    for _ in 0..3 {
        rollup
            .set_category_complete(&operator(), &"f-kjeller".into(), Alarm, true)
            .await
            .unwrap();
    }

    assert_eq!(world.store.write_count(), 1);
}

#[tokio::test]
async fn test_clearing_a_flag_reopens_the_facility() {
    let world = nordbygg().await;
    let rollup = CompletionRollup::new(world.repo.clone());
    let facility = "f-kjeller".into();

    for category in [Alarm, EmergencyLighting] {
        rollup
            .set_category_complete(&operator(), &facility, category, true)
            .await
            .unwrap();
    }
    let summary = rollup
        .set_category_complete(&operator(), &facility, Alarm, false)
        .await
        .unwrap();

    assert_eq!(summary.remaining(), 1);
    assert!(!summary.is_complete());
}

#[tokio::test]
async fn test_operator_status_is_stored_even_when_it_contradicts() {
    let world = nordbygg().await;
    let rollup = CompletionRollup::new(world.repo.clone());

    let summary = rollup
        .set_operator_status(&operator(), &"f-kjeller".into(), FacilityStatus::Completed)
        .await
        .unwrap();

    assert!(summary.contradicts(FacilityStatus::Completed));
    let facility = world.repo.facility(&"f-kjeller".into()).await.unwrap();
    assert_eq!(facility.operator_status, FacilityStatus::Completed);
    assert_eq!(facility.completion_flag(Alarm), Some(false));
}

#[tokio::test]
async fn test_subscription_change_keeps_retained_flags() {
    let world = nordbygg().await;
    let rollup = CompletionRollup::new(world.repo.clone());
    let facility = "f-kjeller".into();

    rollup
        .set_category_complete(&operator(), &facility, Alarm, true)
        .await
        .unwrap();
    let summary = rollup
        .set_subscriptions(&operator(), &facility, BTreeSet::from([Alarm, SmokeVents]))
        .await
        .unwrap();

    assert_eq!(summary, CompletionSummary { completed: 1, subscribed: 2 });
    let stored = world.repo.facility(&facility).await.unwrap();
    assert_eq!(stored.completion_flag(EmergencyLighting), None);
    assert_eq!(stored.completion_flag(SmokeVents), Some(false));
    assert_eq!(stored.completion.len(), 2);
}

#[tokio::test]
async fn test_facility_without_subscriptions_is_never_complete() {
    let world = nordbygg().await;
    let rollup = CompletionRollup::new(world.repo.clone());

    let summary = rollup
        .set_subscriptions(&operator(), &"f-kjeller".into(), BTreeSet::new())
        .await
        .unwrap();

    assert_eq!(summary.subscribed, 0);
    assert!(!summary.is_complete());
}

#[tokio::test]
async fn test_failed_flag_write_is_a_store_error() {
    let world = nordbygg().await;
    world
        .store
        .fail_writes_to(EntityRef::facility(&"f-kjeller".into()));

    let err = CompletionRollup::new(world.repo.clone())
        .set_category_complete(&operator(), &"f-kjeller".into(), Alarm, true)
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Store { .. }));
}
