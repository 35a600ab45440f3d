//! Integration tests for the review session and correction plans.

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use curator::curation::{plan_path, session_path};
use curator::input::Parser;
use curator::schema::SchemaExtractor;
use curator::{
    CorrectionPlan, Curator, CuratorError, DecisionStatus, ReviewAction, ReviewSession,
};

const MODEL: &str = r#"{
    "@context": {},
    "@graph": [
        {"@id": "bts:Diagnosis", "rdfs:label": "diagnosis",
         "schema:rangeIncludes": [{"@id": "bts:Crohns"}, {"@id": "bts:UlcerativeColitis"}, {"@id": "bts:Healthy"}]},
        {"@id": "bts:Crohns", "sms:displayName": "Crohn's disease", "sms:synonyms": ["CD"]},
        {"@id": "bts:UlcerativeColitis", "sms:displayName": "ulcerative colitis", "sms:synonyms": ["UC"]},
        {"@id": "bts:Healthy", "sms:displayName": "healthy"},
        {"@id": "bts:Tissue", "rdfs:label": "tissue",
         "schema:rangeIncludes": {"@id": "bts:TissueType"}},
        {"@id": "bts:TissueType", "owl:oneOf": ["colon", "ileum", "rectum"]}
    ]
}"#;

const TABLE: &str = "sample_id,diagnosis,tissue\n\
                     S001,CD,colon\n\
                     S002,crohn's disease,Colon\n\
                     S003,helthy,ileum\n\
                     S004,IBD,rectum\n\
                     S005,ulcerative colitis,Colon\n";

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn create_session() -> ReviewSession {
    let catalog = SchemaExtractor::new().extract_str(MODEL).unwrap();
    let table = Parser::new().parse_str(TABLE).unwrap();
    Curator::new().start_review(catalog, &table)
}

fn id_for(session: &ReviewSession, value: &str) -> String {
    session
        .list_discrepancies(None)
        .into_iter()
        .find(|d| d.value == value)
        .map(|d| d.id.clone())
        .unwrap_or_else(|| panic!("no discrepancy for '{}'", value))
}

// =============================================================================
// Session creation
// =============================================================================

#[test]
fn test_session_lists_flagged_values() {
    let session = create_session();

    let diagnosis: Vec<&str> = session
        .list_discrepancies(Some("diagnosis"))
        .iter()
        .map(|d| d.value.as_str())
        .collect();
    assert_eq!(diagnosis, vec!["crohn's disease", "helthy", "IBD"]);

    let tissue = session.list_discrepancies(Some("tissue"));
    assert_eq!(tissue.len(), 1);
    assert_eq!(tissue[0].value, "Colon");
    assert_eq!(tissue[0].count, 2);

    assert_eq!(session.summary().pending, 4);
    assert_eq!(session.progress(), 0.0);
    assert!(!session.can_approve());
}

// =============================================================================
// Decisions
// =============================================================================

#[test]
fn test_full_review_produces_plan() {
    let mut session = create_session();

    let crohns = id_for(&session, "crohn's disease");
    let helthy = id_for(&session, "helthy");
    let ibd = id_for(&session, "IBD");
    let colon = id_for(&session, "Colon");

    session.accept(&crohns).unwrap();
    session
        .decide(&helthy, ReviewAction::Accept, Some("healthy"))
        .unwrap();
    session.override_value(&ibd, "inflammatory bowel disease").unwrap();
    session.reject(&colon).unwrap();

    assert!(session.can_approve());
    let plan = session.approve().unwrap();

    let summary = plan.summary();
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.overridden, 1);
    assert_eq!(summary.rejected, 1);

    assert_eq!(plan.touched_entities(), vec!["S002", "S003", "S004"]);

    let terms = plan.new_terms();
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].property, "diagnosis");
    assert_eq!(terms[0].value, "inflammatory bowel disease");
}

#[test]
fn test_accept_requires_candidate() {
    let mut session = create_session();
    let helthy = id_for(&session, "helthy");

    let err = session
        .decide(&helthy, ReviewAction::Accept, Some("made up"))
        .unwrap_err();
    assert!(matches!(err, CuratorError::InvalidDecision(_)));
    assert_eq!(session.status(&helthy), DecisionStatus::Pending);
}

#[test]
fn test_unknown_discrepancy() {
    let mut session = create_session();
    let err = session.accept("disc_999").unwrap_err();
    assert!(matches!(err, CuratorError::DiscrepancyNotFound(_)));
}

#[test]
fn test_approve_with_pending_fails() {
    let mut session = create_session();
    let crohns = id_for(&session, "crohn's disease");
    session.accept(&crohns).unwrap();

    let err = session.approve().unwrap_err();
    assert!(matches!(err, CuratorError::PlanNotFrozen { pending: 3 }));
    assert!(!session.is_approved());
}

#[test]
fn test_reopen_before_approval() {
    let mut session = create_session();
    let crohns = id_for(&session, "crohn's disease");

    session.skip(&crohns).unwrap();
    assert_eq!(session.status(&crohns), DecisionStatus::Skipped);

    session.reopen(&crohns).unwrap();
    assert_eq!(session.status(&crohns), DecisionStatus::Pending);
}

#[test]
fn test_session_closed_after_approval() {
    let mut session = create_session();
    session.reject_pending(None).unwrap();
    session.approve().unwrap();

    let id = id_for(&session, "helthy");
    assert!(matches!(session.accept(&id), Err(CuratorError::SessionClosed)));
    assert!(matches!(session.reopen(&id), Err(CuratorError::SessionClosed)));
    assert!(matches!(session.approve(), Err(CuratorError::SessionClosed)));
    assert!(session.plan().is_ok());
}

#[test]
fn test_batch_accept_by_column() {
    let mut session = create_session();

    let accepted = session.accept_above(0.95, Some("tissue")).unwrap();
    assert_eq!(accepted, 1);
    assert_eq!(session.summary().pending, 3);

    let accepted = session.accept_above(0.95, None).unwrap();
    assert_eq!(accepted, 1);

    let rejected = session.reject_pending(None).unwrap();
    assert_eq!(rejected, 2);
    assert!(session.can_approve());
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_session_save_and_resume() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reviews").join("metadata.session.json");

    let mut session = create_session();
    let crohns = id_for(&session, "crohn's disease");
    session.accept(&crohns).unwrap();
    session.save(&path).unwrap();

    let mut resumed = ReviewSession::load(&path).unwrap();
    assert_eq!(resumed.status(&crohns), DecisionStatus::Accepted);
    assert_eq!(resumed.summary().pending, 3);

    resumed.reject_pending(None).unwrap();
    let plan = resumed.approve().unwrap();
    assert_eq!(plan.touched_entities(), vec!["S002"]);
}

#[test]
fn test_plan_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.plan.json");

    let mut session = create_session();
    session.accept_above(0.95, None).unwrap();
    session.reject_pending(None).unwrap();
    let plan = session.approve().unwrap();
    plan.save(&path).unwrap();

    let loaded = CorrectionPlan::load(&path).unwrap();
    assert_eq!(loaded.entries().len(), plan.entries().len());
    assert_eq!(loaded.entity_updates(), plan.entity_updates());
    assert!(loaded.is_frozen());
}

#[test]
fn test_load_garbage_session_fails() {
    let file = create_test_file("{\"version\": 3}", ".json");
    let err = ReviewSession::load(file.path()).unwrap_err();
    assert!(matches!(err, CuratorError::Persistence(_)));
}

#[test]
fn test_default_paths() {
    assert_eq!(
        session_path("data/metadata.tsv").to_string_lossy(),
        "data/metadata.session.json"
    );
    assert_eq!(
        plan_path("data/metadata.tsv").to_string_lossy(),
        "data/metadata.plan.json"
    );
}

#[test]
fn test_review_from_files() {
    let table = create_test_file(TABLE, ".csv");
    let model = create_test_file(MODEL, ".jsonld");

    let session = Curator::new()
        .review(table.path(), &model.path().to_string_lossy())
        .unwrap();

    assert_eq!(session.list_discrepancies(None).len(), 4);
    assert!(session.source.is_some());
}
