use bytes::Bytes;
use proptest::prelude::*;

use docpoint::application::services::{DocumentRegistry, RecordOutcome, RegistryError};
use docpoint::domain::{DataPoint, DocumentId, DocumentStatus, ExtractionResult};

fn data_points() -> Vec<DataPoint> {
    vec![DataPoint::new("total", "Invoice total")]
}

fn results() -> Vec<ExtractionResult> {
    vec![ExtractionResult::new("total", "42", 0.9)]
}

fn registry_with_document() -> (DocumentRegistry, DocumentId) {
    let registry = DocumentRegistry::new();
    let id = registry
        .create(
            "invoice.pdf".to_string(),
            Bytes::from_static(b"%PDF"),
            Vec::new(),
        )
        .id;
    (registry, id)
}

#[test]
fn given_new_upload_when_created_then_returned_snapshot_matches_stored_document() {
    let registry = DocumentRegistry::new();

    let created = registry.create(
        "invoice.pdf".to_string(),
        Bytes::from_static(b"%PDF"),
        data_points(),
    );

    assert_eq!(registry.get(created.id).unwrap(), created);
    assert_eq!(created.status, DocumentStatus::Uploaded);
}

#[test]
fn given_created_document_when_fetched_then_returns_uploaded_snapshot() {
    let (registry, id) = registry_with_document();

    let document = registry.get(id).unwrap();

    assert_eq!(document.id, id);
    assert_eq!(document.filename, "invoice.pdf");
    assert_eq!(document.status, DocumentStatus::Uploaded);
    assert_eq!(registry.len(), 1);
}

#[test]
fn given_unknown_id_when_fetched_then_returns_not_found() {
    let registry = DocumentRegistry::new();
    let id = DocumentId::new();

    assert_eq!(registry.get(id), Err(RegistryError::NotFound(id)));
}

#[test]
fn given_unknown_id_when_setting_data_points_then_not_found_and_nothing_created() {
    let registry = DocumentRegistry::new();
    let id = DocumentId::new();

    let result = registry.set_data_points(id, data_points());

    assert_eq!(result.unwrap_err(), RegistryError::NotFound(id));
    assert!(registry.is_empty());
}

#[test]
fn given_unknown_id_when_setting_results_then_not_found() {
    let registry = DocumentRegistry::new();
    let id = DocumentId::new();

    let result = registry.set_results(id, results(), DocumentStatus::Completed);

    assert_eq!(result, Err(RegistryError::NotFound(id)));
}

#[test]
fn given_completed_document_when_resubmitted_then_results_cleared_and_processing() {
    let (registry, id) = registry_with_document();
    registry.set_data_points(id, data_points()).unwrap();
    registry
        .record_outcome(id, Some(1), results(), DocumentStatus::Completed)
        .unwrap();

    let document = registry
        .set_data_points(id, vec![DataPoint::new("due_date", "")])
        .unwrap();

    assert_eq!(document.status, DocumentStatus::Processing);
    assert_eq!(document.submission, 2);
    assert!(document.results.is_empty());
    assert_eq!(document.data_points[0].name, "due_date");
}

#[test]
fn given_processing_document_when_recording_matching_submission_then_applied() {
    let (registry, id) = registry_with_document();
    registry.set_data_points(id, data_points()).unwrap();

    let outcome = registry
        .record_outcome(id, Some(1), results(), DocumentStatus::Completed)
        .unwrap();

    assert_eq!(outcome, RecordOutcome::Applied);
    let document = registry.get(id).unwrap();
    assert_eq!(document.status, DocumentStatus::Completed);
    assert_eq!(document.results, results());
}

#[test]
fn given_processing_document_when_recording_without_submission_then_applied() {
    let (registry, id) = registry_with_document();
    registry.set_data_points(id, data_points()).unwrap();

    let outcome = registry
        .record_outcome(id, None, Vec::new(), DocumentStatus::Failed)
        .unwrap();

    assert_eq!(outcome, RecordOutcome::Applied);
    assert_eq!(registry.get(id).unwrap().status, DocumentStatus::Failed);
}

#[test]
fn given_completed_document_when_same_outcome_recorded_again_then_stale() {
    let (registry, id) = registry_with_document();
    registry.set_data_points(id, data_points()).unwrap();
    registry
        .record_outcome(id, Some(1), results(), DocumentStatus::Completed)
        .unwrap();

    let outcome = registry
        .record_outcome(id, Some(1), Vec::new(), DocumentStatus::Failed)
        .unwrap();

    assert_eq!(
        outcome,
        RecordOutcome::Stale {
            status: DocumentStatus::Completed,
            submission: 1
        }
    );
    assert_eq!(registry.get(id).unwrap().results, results());
}

#[test]
fn given_resubmitted_document_when_old_outcome_arrives_then_stale_and_untouched() {
    let (registry, id) = registry_with_document();
    registry.set_data_points(id, data_points()).unwrap();
    registry.set_data_points(id, data_points()).unwrap();

    let outcome = registry
        .record_outcome(id, Some(1), results(), DocumentStatus::Completed)
        .unwrap();

    assert!(matches!(outcome, RecordOutcome::Stale { submission: 2, .. }));
    let document = registry.get(id).unwrap();
    assert_eq!(document.status, DocumentStatus::Processing);
    assert!(document.results.is_empty());
    assert!(registry.awaits_outcome(id, Some(2)).unwrap());
    assert!(!registry.awaits_outcome(id, Some(1)).unwrap());
}

#[test]
fn given_outcome_status_processing_when_recording_then_invalid_transition() {
    let (registry, id) = registry_with_document();
    registry.set_data_points(id, data_points()).unwrap();

    let result = registry.record_outcome(id, Some(1), Vec::new(), DocumentStatus::Processing);

    assert_eq!(
        result,
        Err(RegistryError::InvalidTransition {
            from: DocumentStatus::Processing,
            to: DocumentStatus::Processing
        })
    );
}

#[test]
fn given_uploaded_document_when_setting_completed_results_then_invalid_transition() {
    let (registry, id) = registry_with_document();

    let result = registry.set_results(id, results(), DocumentStatus::Completed);

    assert_eq!(
        result,
        Err(RegistryError::InvalidTransition {
            from: DocumentStatus::Uploaded,
            to: DocumentStatus::Completed
        })
    );
    assert_eq!(registry.get(id).unwrap().status, DocumentStatus::Uploaded);
}

#[test]
fn given_several_documents_when_listed_then_ordered_by_creation() {
    let registry = DocumentRegistry::new();
    let ids: Vec<DocumentId> = (0..5)
        .map(|i| registry.create(format!("doc-{i}.txt"), Bytes::new(), Vec::new()).id)
        .collect();

    let listed = registry.list();

    assert_eq!(listed.len(), 5);
    assert!(
        listed
            .windows(2)
            .all(|pair| pair[0].created_at <= pair[1].created_at)
    );
    for id in ids {
        assert!(listed.iter().any(|summary| summary.id == id));
    }
}

#[test]
fn given_concurrent_creators_when_all_finish_then_every_document_is_stored() {
    let registry = DocumentRegistry::new();

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let registry = &registry;
            scope.spawn(move || {
                for i in 0..25 {
                    registry.create(format!("{worker}-{i}.txt"), Bytes::new(), Vec::new());
                }
            });
        }
    });

    assert_eq!(registry.len(), 200);
    assert_eq!(registry.list().len(), 200);
}

#[derive(Debug, Clone)]
enum Operation {
    Submit,
    Complete { stale: bool },
    Fail { stale: bool },
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        Just(Operation::Submit),
        any::<bool>().prop_map(|stale| Operation::Complete { stale }),
        any::<bool>().prop_map(|stale| Operation::Fail { stale }),
    ]
}

proptest! {
    #[test]
    fn given_random_operation_sequence_when_replayed_then_status_follows_lifecycle_edges(
        operations in proptest::collection::vec(operation(), 1..40)
    ) {
        let (registry, id) = registry_with_document();
        let mut previous = registry.get(id).unwrap();

        for operation in operations {
            let submission = |stale: bool| {
                if stale { previous.submission + 1 } else { previous.submission }
            };
            match operation {
                Operation::Submit => {
                    registry.set_data_points(id, data_points()).unwrap();
                }
                Operation::Complete { stale } => {
                    registry
                        .record_outcome(id, Some(submission(stale)), results(), DocumentStatus::Completed)
                        .unwrap();
                }
                Operation::Fail { stale } => {
                    registry
                        .record_outcome(id, Some(submission(stale)), Vec::new(), DocumentStatus::Failed)
                        .unwrap();
                }
            }

            let current = registry.get(id).unwrap();
            prop_assert!(
                current.status == previous.status
                    || previous.status.can_transition_to(current.status),
                "{} -> {}", previous.status, current.status
            );
            prop_assert!(current.submission >= previous.submission);
            if current.status != DocumentStatus::Completed {
                prop_assert!(current.results.is_empty());
            }
            previous = current;
        }
    }
}
