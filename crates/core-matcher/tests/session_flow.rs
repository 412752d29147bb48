use core_history::{HistoryState, TextState};
use core_matcher::{MatcherSession, SessionOptions};
use core_pattern::{EngineKind, EngineOptions, Failure, MatchMode, TestCase, ValidationResult};
use std::time::Duration;

fn pattern(raw: &str) -> TextState {
    TextState::with_caret_at_end(raw)
}

async fn settled(session: &MatcherSession) -> core_matcher::MatcherSnapshot {
    tokio::time::timeout(Duration::from_secs(5), session.settled())
        .await
        .expect("validations should settle")
}

fn result_of(snap: &core_matcher::MatcherSnapshot, uuid: uuid::Uuid) -> ValidationResult {
    snap.state(uuid).expect("state present").result.clone()
}

#[tokio::test]
async fn verdicts_follow_match_modes() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let any = session.add_test_case("any", "baaab", MatchMode::Any);
    let all = session.add_test_case("all", "baaab", MatchMode::All);
    let none = session.add_test_case("none", "bbb", MatchMode::None);
    session.set_pattern(pattern("a+"));

    let snap = settled(&session).await;
    assert_eq!(snap.generation, 1);
    assert_eq!(result_of(&snap, any), ValidationResult::Success);
    assert_eq!(result_of(&snap, all), ValidationResult::Error(Failure::Mismatch));
    assert_eq!(result_of(&snap, none), ValidationResult::Success);

    let matches = &snap.state(any).unwrap().matches;
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].text, "aaa");
    assert_eq!(matches[0].range, 1..4);
    assert_eq!(snap.passed(), 2);
    session.shutdown().await;
}

#[tokio::test]
async fn invalid_pattern_short_circuits_without_engine_runs() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let a = session.add_test_case("a", "aaa", MatchMode::Any);
    let b = session.add_test_case("b", "bbb", MatchMode::None);
    session.set_pattern(pattern("a+"));
    settled(&session).await;
    let runs_before = session.metrics().validations_run;

    session.set_pattern(pattern("("));
    let snap = session.snapshot();
    assert!(snap.pattern_error().is_some());
    assert!(snap.is_settled());
    for uuid in [a, b] {
        assert!(matches!(
            result_of(&snap, uuid),
            ValidationResult::Error(Failure::InvalidPattern(_))
        ));
        assert!(snap.state(uuid).unwrap().matches.is_empty());
    }

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(session.metrics().validations_run, runs_before);
    assert_eq!(session.pending(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn newer_generation_wins_over_in_flight_results() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let ids: Vec<_> = (0..20)
        .map(|i| session.add_test_case(format!("case {i}"), "a".repeat(200 + i), MatchMode::Any))
        .collect();

    session.set_pattern(pattern("(a|aa)+$"));
    session.set_pattern(pattern("b"));

    let snap = settled(&session).await;
    assert_eq!(snap.generation, 2);
    assert_eq!(snap.pattern.raw(), "b");
    for uuid in ids {
        // Under "b" every MATCH_ANY case fails with no matches.
        let state = snap.state(uuid).unwrap();
        assert_eq!(state.result, ValidationResult::Error(Failure::Mismatch));
        assert!(state.matches.is_empty());
    }
}

#[tokio::test]
async fn editing_one_case_revalidates_only_that_case() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let a = session.add_test_case("a", "aaa", MatchMode::Any);
    let _b = session.add_test_case("b", "aaa", MatchMode::Any);
    session.set_pattern(pattern("a+"));
    settled(&session).await;
    let runs = session.metrics().validations_run;
    assert_eq!(runs, 2);

    assert!(session.set_test_case_text(a, "bbb"));
    let snap = settled(&session).await;
    assert_eq!(result_of(&snap, a), ValidationResult::Error(Failure::Mismatch));
    assert_eq!(session.metrics().validations_run, runs + 1);

    assert!(session.set_test_case_mode(a, MatchMode::None));
    let snap = settled(&session).await;
    assert_eq!(result_of(&snap, a), ValidationResult::Success);
    assert_eq!(session.metrics().validations_run, runs + 2);
}

#[tokio::test]
async fn title_edit_keeps_verdict() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let a = session.add_test_case("a", "aaa", MatchMode::Any);
    session.set_pattern(pattern("a+"));
    settled(&session).await;
    let runs = session.metrics().validations_run;

    assert!(session.set_test_case_title(a, "renamed"));
    tokio::time::sleep(Duration::from_millis(20)).await;
    let snap = session.snapshot();
    assert_eq!(snap.entry(a).unwrap().case.title, "renamed");
    assert_eq!(result_of(&snap, a), ValidationResult::Success);
    assert_eq!(session.metrics().validations_run, runs);
    assert!(!session.set_test_case_title(uuid::Uuid::new_v4(), "ghost"));
}

#[tokio::test]
async fn undo_and_redo_feed_back_into_validation() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let case = session.add_test_case("digits", "abc123", MatchMode::All);
    session.set_pattern(pattern("[a-z]+"));
    session.set_pattern(pattern("[a-z]+\\d+"));
    assert_eq!(
        session.history_state(),
        HistoryState {
            can_undo: true,
            can_redo: false
        }
    );
    assert_eq!(
        result_of(&settled(&session).await, case),
        ValidationResult::Success
    );

    let restored = session.undo().expect("one step back");
    assert_eq!(restored.value, "[a-z]+");
    assert_eq!(session.pattern_text(), "[a-z]+");
    // The field echoes the restored value; history must not record it.
    session.set_pattern(restored);
    assert!(session.history_state().can_redo);
    assert_eq!(
        result_of(&settled(&session).await, case),
        ValidationResult::Error(Failure::Mismatch)
    );

    let redone = session.redo().expect("redo available");
    assert_eq!(redone.value, "[a-z]+\\d+");
    assert_eq!(
        result_of(&settled(&session).await, case),
        ValidationResult::Success
    );
    assert!(session.redo().is_none());
}

#[tokio::test]
async fn removed_case_never_resurfaces() {
    let mut session = MatcherSession::new(SessionOptions::default());
    session.set_pattern(pattern("x"));
    let keep = session.add_test_case("keep", "x", MatchMode::Any);
    let gone = session.add_test_case("gone", "x", MatchMode::Any);
    assert!(session.remove_test_case(gone));
    assert!(!session.remove_test_case(gone));

    let snap = settled(&session).await;
    assert!(snap.entry(gone).is_none());
    assert_eq!(snap.entries.len(), 1);
    assert_eq!(result_of(&snap, keep), ValidationResult::Success);
}

#[tokio::test]
async fn duplicate_gets_new_identity_after_original() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let first = session.add_test_case("first", "aa", MatchMode::Any);
    let last = session.add_test_case("last", "bb", MatchMode::Any);
    session.set_pattern(pattern("a"));
    let copy = session.duplicate_test_case(first).expect("source exists");
    assert_ne!(copy, first);

    let order: Vec<_> = session.test_cases().iter().map(|c| c.uuid).collect();
    assert_eq!(order, vec![first, copy, last]);
    let snap = settled(&session).await;
    assert_eq!(result_of(&snap, copy), ValidationResult::Success);
    assert!(session.duplicate_test_case(uuid::Uuid::new_v4()).is_none());
}

#[tokio::test]
async fn empty_pattern_leaves_cases_idle() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let a = session.add_test_case("a", "aaa", MatchMode::Any);
    session.set_pattern(pattern("a"));
    settled(&session).await;
    session.set_pattern(pattern(""));
    let snap = session.snapshot();
    assert!(snap.pattern.compiled().is_none());
    assert!(snap.pattern_error().is_none());
    assert_eq!(result_of(&snap, a), ValidationResult::Idle);
    assert!(snap.is_settled());
}

#[tokio::test]
async fn load_replaces_document_and_restarts_history() {
    let mut session = MatcherSession::new(SessionOptions::default());
    session.add_test_case("old", "zzz", MatchMode::Any);
    session.set_pattern(pattern("z"));
    session.set_pattern(pattern("zz"));

    let cases = vec![
        TestCase::new("hex", "0xff", MatchMode::All),
        TestCase::new("word", "hello", MatchMode::None),
    ];
    session.load("0x[0-9a-f]+", cases.clone());
    assert_eq!(session.history_state(), HistoryState::default());
    assert_eq!(session.pattern_text(), "0x[0-9a-f]+");

    let snap = settled(&session).await;
    assert_eq!(snap.entries.len(), 2);
    for case in &cases {
        assert_eq!(result_of(&snap, case.uuid), ValidationResult::Success);
    }
    session.clear_test_cases();
    assert!(session.test_cases().is_empty());
}

#[tokio::test]
async fn linear_engine_rejects_backreferences() {
    let options = SessionOptions {
        engine: EngineOptions {
            kind: EngineKind::Linear,
            ..EngineOptions::default()
        },
        history_max_depth: Some(10),
    };
    let mut session = MatcherSession::new(options);
    let a = session.add_test_case("a", "abab", MatchMode::Any);
    session.set_pattern(pattern(r"(ab)\1"));
    let snap = session.snapshot();
    assert!(snap.pattern_error().is_some());
    assert!(matches!(
        result_of(&snap, a),
        ValidationResult::Error(Failure::InvalidPattern(_))
    ));
}

#[tokio::test]
async fn observers_receive_incremental_updates() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let mut rx = session.subscribe();
    let a = session.add_test_case("a", "xyz", MatchMode::Any);
    session.set_pattern(pattern("y"));
    let seen = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|snap| snap.state(a).is_some_and(|s| s.result.is_finished())),
    )
    .await
    .expect("update within timeout")
    .expect("sender alive")
    .clone();
    assert_eq!(result_of(&seen, a), ValidationResult::Success);
}

#[tokio::test]
async fn load_gives_repeated_identities_their_own_case() {
    let mut session = MatcherSession::new(SessionOptions::default());
    let original = TestCase::new("a", "aaa", MatchMode::Any);
    let mut copy = original.clone();
    copy.title = "copy".into();
    copy.text = "bbb".into();
    session.load("a+", vec![original.clone(), copy]);

    let snap = settled(&session).await;
    assert_eq!(snap.entries.len(), 2);
    assert_eq!(snap.entries[0].case.uuid, original.uuid);
    assert_ne!(snap.entries[1].case.uuid, original.uuid);
    assert_eq!(snap.entries[1].case.title, "copy");
    assert_eq!(result_of(&snap, original.uuid), ValidationResult::Success);
    assert_eq!(
        snap.entries[1].state.result,
        ValidationResult::Error(Failure::Mismatch)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn case_removed_while_running_drops_its_late_result() {
    let options = SessionOptions {
        engine: EngineOptions {
            kind: EngineKind::Backtracking,
            backtrack_limit: 20_000_000,
        },
        history_max_depth: None,
    };
    let mut session = MatcherSession::new(options);
    let slow = session.add_test_case("slow", "ab".repeat(40), MatchMode::Any);
    let mut rx = session.subscribe();
    // Look-ahead keeps the search in the backtracking VM until the budget runs out.
    session.set_pattern(pattern("(?i)(a|b|ab)*(?=c)"));

    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|snap| {
            snap.state(slow)
                .is_some_and(|s| s.result == ValidationResult::Running)
        }),
    )
    .await
    .expect("case should start running")
    .expect("board open");
    assert!(session.remove_test_case(slow));

    tokio::time::timeout(Duration::from_secs(60), async {
        while session.metrics().results_discarded == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("late result should be offered and dropped");

    let snap = session.snapshot();
    assert!(snap.entry(slow).is_none());
    assert!(snap.entries.is_empty());
    let metrics = session.metrics();
    assert_eq!(metrics.validations_run, 1);
    assert_eq!(metrics.results_applied, 0);
    assert_eq!(metrics.results_discarded, 1);
    session.shutdown().await;
}
