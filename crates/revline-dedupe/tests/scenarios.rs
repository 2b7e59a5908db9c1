use revline_core::{Record, RecordArena, RecordState, ReviewError};
use revline_dedupe::{
    apply, plan, run_session, DecisionResponse, DedupeScope, DedupeSession, DedupeSettings,
    MergeDecision, ScriptedPrompter,
};

fn issue_record(id: &str, status: RecordState, title: &str) -> Record {
    Record::new(id, status)
        .with_field("journal", "X")
        .with_field("volume", "1")
        .with_field("number", "1")
        .with_field("title", title)
        .with_origin(&format!("search.json/{id}"))
}

fn r1_r2() -> RecordArena {
    let mut arena = RecordArena::new();
    arena
        .insert(issue_record("R1", RecordState::MdPrepared, "Digital Work"))
        .unwrap();
    arena
        .insert(issue_record("R2", RecordState::MdProcessed, "Digital Work Study"))
        .unwrap();
    arena
}

#[test]
fn end_to_end_duplicate_is_merged_into_curated_record() {
    let mut arena = r1_r2();
    let r1 = arena.get("R1").unwrap().clone();
    let r2 = arena.get("R2").unwrap().clone();
    assert!(r1.get_similarity(&r2) >= 0.7);

    let plan = plan(&arena, &DedupeSettings::default());
    assert_eq!(plan.items.len(), 1);
    assert_eq!(plan.items[0].candidates[0].id, "R2");

    let session = DedupeSession::new(&arena, &plan).unwrap();
    let mut prompter = ScriptedPrompter::new([DecisionResponse::Duplicate(1)]);
    let outcome = run_session(session, &mut prompter);
    assert_eq!(outcome.decisions, vec![MergeDecision::duplicate("R2", "R1")]);

    let summary = apply(&mut arena, &outcome, &[]).unwrap();
    assert_eq!(summary.merged, vec![("R2".to_string(), "R1".to_string())]);

    let survivor = arena.get("R2").unwrap();
    let expected: std::collections::BTreeSet<String> =
        r1.origin().union(r2.origin()).cloned().collect();
    assert_eq!(survivor.origin(), &expected);
    assert!(arena.iter_active().all(|r| r.id() != "R1"));
    assert!(matches!(
        arena.get("R1"),
        Err(ReviewError::RecordRetired { .. })
    ));
}

#[test]
fn prepared_vs_included_keeps_included() {
    let mut arena = RecordArena::new();
    arena
        .insert(issue_record("A", RecordState::MdPrepared, "Digital Work"))
        .unwrap();
    arena
        .insert(issue_record("B", RecordState::RevIncluded, "Digital Work"))
        .unwrap();
    let outcome = revline_dedupe::DedupeOutcome {
        decisions: vec![MergeDecision::duplicate("A", "B")],
        ..Default::default()
    };
    apply(&mut arena, &outcome, &[]).unwrap();
    assert_eq!(arena.get("B").unwrap().status(), RecordState::RevIncluded);
    let (loser, _) = arena.iter_retired().next().unwrap();
    assert_eq!(loser.id(), "A");
    assert_eq!(loser.status(), RecordState::MdDuplicatesRemoved);
}

#[test]
fn record_without_toc_key_yields_no_proposal() {
    let mut arena = RecordArena::new();
    arena
        .insert(
            Record::new("R1", RecordState::MdPrepared)
                .with_field("title", "Digital Work")
                .with_field("journal", "X"),
        )
        .unwrap();
    arena
        .insert(issue_record("R2", RecordState::MdProcessed, "Digital Work"))
        .unwrap();

    let plan = plan(&arena, &DedupeSettings::default());
    assert!(plan.items.is_empty());
    assert_eq!(plan.not_toc_identifiable.len(), 1);

    let session = DedupeSession::new(&arena, &plan).unwrap();
    assert!(session.is_finished());
}

#[test]
fn forced_scope_includes_records_awaiting_preparation() {
    let mut arena = r1_r2();
    arena
        .insert(issue_record(
            "R3",
            RecordState::MdNeedsManualPreparation,
            "Digital Work",
        ))
        .unwrap();

    let default_plan = plan(&arena, &DedupeSettings::default());
    assert_eq!(default_plan.items.len(), 1);

    let forced = DedupeSettings {
        scope: DedupeScope::NotProcessed,
        ..DedupeSettings::default()
    };
    let forced_plan = plan(&arena, &forced);
    let ids: Vec<_> = forced_plan
        .items
        .iter()
        .map(|i| i.record_id.as_str())
        .collect();
    assert_eq!(ids, vec!["R1", "R3"]);
}

#[test]
fn quit_applies_decisions_made_so_far() {
    let mut arena = r1_r2();
    arena
        .insert(issue_record("R3", RecordState::MdPrepared, "Digital Work"))
        .unwrap();
    let plan = plan(&arena, &DedupeSettings::default());
    assert_eq!(plan.items.len(), 2);

    let mut prompter =
        ScriptedPrompter::new([DecisionResponse::Duplicate(1), DecisionResponse::Quit]);
    let outcome = run_session(DedupeSession::new(&arena, &plan).unwrap(), &mut prompter);
    assert!(outcome.quit);

    apply(&mut arena, &outcome, &[]).unwrap();
    assert_eq!(arena.active_len(), 2);
    assert_eq!(arena.get("R3").unwrap().status(), RecordState::MdPrepared);
}
