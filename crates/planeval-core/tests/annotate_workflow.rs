//! End-to-end annotation workflow over a result batch, with scripted tools.

use std::sync::Arc;

use planeval_core::{DomainProber, MetricDriver};
use planeval_model::batch::{ResultRecord, TaskRecord};
use planeval_model::plan::Plan;
use planeval_model::verdict::{DifDomainKind, SyntaxErrorKind, Verdict};
use planeval_store::{KnowledgeStore, PlanStore};
use planeval_tools::fakes::{FakePlanner, FakeValidator};
use planeval_tools::{Planner, Validator};

const DOMAIN: &str = r#"
    (define (domain blocksworld)
      (:predicates (on ?x ?y) (clear ?x) (holding ?x))
      (:action stack
        :parameters (?x ?y)
        :precondition (and (holding ?x) (clear ?y))
        :effect (and (on ?x ?y) (not (holding ?x)))))
"#;

const REFERENCE_ACTION: &str = r#"
    (:action stack
      :parameters (?x ?y)
      :precondition (and (holding ?x) (clear ?y))
      :effect (and (on ?x ?y) (not (holding ?x))))
"#;

fn plan(actions: &[&str]) -> Plan {
    Plan::new(actions.iter().map(|a| a.to_string()).collect())
}

/// One domain, one problem, two cached reference plans.
async fn fixture() -> (tempfile::TempDir, Arc<KnowledgeStore>, Arc<PlanStore>) {
    let dir = tempfile::tempdir().unwrap();
    let problems = dir.path().join("problems");
    let descriptions = dir.path().join("descriptions");
    std::fs::create_dir_all(&problems).unwrap();
    std::fs::create_dir_all(&descriptions).unwrap();
    std::fs::write(problems.join("blocksworld.pddl"), DOMAIN).unwrap();
    std::fs::write(
        problems.join("p1.pddl"),
        "(define (problem p1) (:domain blocksworld))",
    )
    .unwrap();
    std::fs::write(descriptions.join("blocksworld.txt"), "on: x on y\n").unwrap();

    let knowledge = Arc::new(KnowledgeStore::build(&problems, &descriptions).unwrap());
    let build_planner = FakePlanner::new().with_plans(
        "p1.pddl",
        vec![plan(&["stack a b"]), plan(&["stack b a"])],
    );
    let plans = Arc::new(
        PlanStore::build(100, &knowledge, &build_planner, &FakeValidator::accept_all())
            .await
            .unwrap(),
    );
    (dir, knowledge, plans)
}

fn driver(
    knowledge: Arc<KnowledgeStore>,
    plans: Arc<PlanStore>,
    planner: impl Planner + 'static,
    validator: impl Validator + 'static,
) -> MetricDriver {
    let prober = DomainProber::new(knowledge, plans, Arc::new(planner), Arc::new(validator), 100);
    MetricDriver::new(Arc::new(prober)).with_concurrency(2)
}

fn clean_result(output: &str, new_domain: &str) -> ResultRecord {
    ResultRecord {
        model: "test-model".to_string(),
        parameters: serde_json::json!({"temperature": 0.0}),
        output: output.to_string(),
        new_domain: new_domain.to_string(),
        error: false,
        error_msg: String::new(),
        verdict: None,
        action_dif: None,
        working_plans: 0,
    }
}

fn task(results: Vec<ResultRecord>) -> TaskRecord {
    TaskRecord {
        domain: "blocksworld".to_string(),
        action: "stack".to_string(),
        pddl: REFERENCE_ACTION.to_string(),
        nl_class: "moderate".to_string(),
        results,
    }
}

#[tokio::test]
async fn identical_candidate_is_equivalent_with_all_pairs_working() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new().with_plans(
        "p1.pddl",
        vec![plan(&["stack a b"]), plan(&["stack b a"])],
    );
    let driver = driver(knowledge, plans, probe_planner, FakeValidator::accept_all());

    let batch = vec![task(vec![clean_result(REFERENCE_ACTION, DOMAIN)])];
    let annotated = driver.annotate(&batch).await.unwrap();

    let result = &annotated[0].results[0];
    assert_eq!(result.verdict, Some(Verdict::EqDomain));
    assert_eq!(result.working_plans, 2);
    assert_eq!(result.action_dif, Some(0));
    assert!(!result.error);
}

#[tokio::test]
async fn plan_count_mismatch_annotates_k_diff() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new().with_plans("p1.pddl", vec![plan(&["stack a b"])]);
    let driver = driver(knowledge, plans, probe_planner, FakeValidator::accept_all());

    let batch = vec![task(vec![clean_result(REFERENCE_ACTION, DOMAIN)])];
    let annotated = driver.annotate(&batch).await.unwrap();

    let result = &annotated[0].results[0];
    assert_eq!(result.verdict, Some(Verdict::DifDomain(DifDomainKind::KDiff)));
    assert_eq!(result.working_plans, 0);
    assert!(result.error);
    // The wire projection carries the historical label.
    let json = serde_json::to_value(result).unwrap();
    assert_eq!(json["errorSubclass"], "k diff error");
}

#[tokio::test]
async fn first_pair_rejection_annotates_new_to_original() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new().with_plans(
        "p1.pddl",
        vec![plan(&["zap a"]), plan(&["stack b a"])],
    );
    let validator = FakeValidator::rejecting(|_, plan| plan.contains("zap"), "unknown action zap");
    let driver = driver(knowledge, plans, probe_planner, validator);

    let batch = vec![task(vec![clean_result(REFERENCE_ACTION, DOMAIN)])];
    let annotated = driver.annotate(&batch).await.unwrap();

    let result = &annotated[0].results[0];
    assert_eq!(
        result.verdict,
        Some(Verdict::DifDomain(DifDomainKind::NewToOriginal))
    );
    assert_eq!(result.working_plans, 0);
    assert_eq!(result.error_msg, "unknown action zap");
    assert!(result.error);
}

#[tokio::test]
async fn upstream_errors_skip_both_metrics() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new().with_plans(
        "p1.pddl",
        vec![plan(&["stack a b"]), plan(&["stack b a"])],
    );
    let driver = driver(knowledge, plans, probe_planner, FakeValidator::accept_all());

    let mut broken = clean_result("(:action stack", DOMAIN);
    broken.error = true;
    broken.error_msg = "mismatched parens".to_string();
    broken.verdict = Some(Verdict::SyntaxError(SyntaxErrorKind::ParenMismatch));

    let batch = vec![task(vec![
        broken,
        clean_result(REFERENCE_ACTION, DOMAIN),
    ])];
    let annotated = driver.annotate(&batch).await.unwrap();

    let skipped = &annotated[0].results[0];
    assert!(skipped.error);
    assert_eq!(
        skipped.verdict,
        Some(Verdict::SyntaxError(SyntaxErrorKind::ParenMismatch))
    );
    assert_eq!(skipped.action_dif, None);
    assert_eq!(skipped.working_plans, 0);

    // The clean sibling is still fully annotated.
    let clean = &annotated[0].results[1];
    assert_eq!(clean.verdict, Some(Verdict::EqDomain));
    assert_eq!(clean.working_plans, 2);
}

#[tokio::test]
async fn reconstruction_distance_reflects_action_drift() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new().with_plans(
        "p1.pddl",
        vec![plan(&["stack a b"]), plan(&["stack b a"])],
    );
    let driver = driver(knowledge, plans, probe_planner, FakeValidator::accept_all());

    // Renamed parameters plus one invented effect atom.
    let drifted = r#"
        (:action stack
          :parameters (?a ?b)
          :precondition (and (holding ?a) (clear ?b))
          :effect (and (on ?a ?b) (not (holding ?a)) (sparkling ?a)))
    "#;
    let batch = vec![task(vec![clean_result(drifted, DOMAIN)])];
    let annotated = driver.annotate(&batch).await.unwrap();

    assert_eq!(annotated[0].results[0].action_dif, Some(1));
}

#[tokio::test]
async fn input_batch_is_never_mutated() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new().with_plans(
        "p1.pddl",
        vec![plan(&["stack a b"]), plan(&["stack b a"])],
    );
    let driver = driver(knowledge, plans, probe_planner, FakeValidator::accept_all());

    let batch = vec![task(vec![clean_result(REFERENCE_ACTION, DOMAIN)])];
    let before = batch.clone();
    let annotated = driver.annotate(&batch).await.unwrap();

    assert_eq!(batch, before);
    assert_ne!(annotated[0].results[0].verdict, batch[0].results[0].verdict);
}
