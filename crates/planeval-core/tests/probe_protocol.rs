//! Probe protocol tests: classification order, short-circuiting, and the
//! working-pair counter, all exercised against scripted tools.

use std::sync::Arc;

use planeval_core::{DomainProber, EvalError};
use planeval_model::plan::Plan;
use planeval_model::verdict::{DifDomainKind, Verdict};
use planeval_store::{KnowledgeStore, PlanStore};
use planeval_tools::fakes::{FakePlanner, FakeValidator};
use planeval_tools::{PlanFailure, PlanOutcome, Planner, Validator};

const DOMAIN: &str = r#"
    (define (domain blocksworld)
      (:predicates (on ?x ?y) (clear ?x) (holding ?x))
      (:action stack
        :parameters (?x ?y)
        :precondition (and (holding ?x) (clear ?y))
        :effect (and (on ?x ?y) (not (holding ?x)))))
"#;

/// Candidate text distinct from the reference; the `v2` marker lets the
/// validator fakes tell the two domains apart.
const CANDIDATE: &str = r#"
    (define (domain blocksworld) ; v2
      (:predicates (on ?x ?y) (clear ?x) (holding ?x))
      (:action stack
        :parameters (?x ?y)
        :precondition (and (holding ?x) (clear ?y))
        :effect (and (on ?x ?y) (not (holding ?x)))))
"#;

fn plan(actions: &[&str]) -> Plan {
    Plan::new(actions.iter().map(|a| a.to_string()).collect())
}

/// Reference corpus on disk: one domain, two problems. p1 caches two plans,
/// p2 caches one.
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
    std::fs::write(
        problems.join("p2.pddl"),
        "(define (problem p2) (:domain blocksworld))",
    )
    .unwrap();
    std::fs::write(descriptions.join("blocksworld.txt"), "on: x on y\n").unwrap();

    let knowledge = Arc::new(KnowledgeStore::build(&problems, &descriptions).unwrap());
    let build_planner = FakePlanner::new()
        .with_plans("p1.pddl", vec![plan(&["stack a b"]), plan(&["stack b a"])])
        .with_plans("p2.pddl", vec![plan(&["stack a c"])]);
    let plans = Arc::new(
        PlanStore::build(100, &knowledge, &build_planner, &FakeValidator::accept_all())
            .await
            .unwrap(),
    );
    (dir, knowledge, plans)
}

fn prober(
    knowledge: Arc<KnowledgeStore>,
    plans: Arc<PlanStore>,
    planner: impl Planner + 'static,
    validator: impl Validator + 'static,
) -> DomainProber {
    DomainProber::new(knowledge, plans, Arc::new(planner), Arc::new(validator), 100)
}

#[tokio::test]
async fn probing_the_reference_against_itself_is_equivalent() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new()
        .with_plans("p1.pddl", vec![plan(&["stack a b"]), plan(&["stack b a"])])
        .with_plans("p2.pddl", vec![plan(&["stack a c"])]);
    let prober = prober(
        knowledge,
        plans.clone(),
        probe_planner,
        FakeValidator::accept_all(),
    );

    let outcome = prober.probe("blocksworld", DOMAIN).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::EqDomain);
    assert_eq!(outcome.working as usize, plans.total_plans("blocksworld"));
    assert_eq!(outcome.working, 3);
}

#[tokio::test]
async fn plan_count_mismatch_is_a_k_diff_error() {
    let (_dir, knowledge, plans) = fixture().await;
    // One plan for p1 where the reference cached two.
    let probe_planner = FakePlanner::new()
        .with_plans("p1.pddl", vec![plan(&["stack a b"])])
        .with_plans("p2.pddl", vec![plan(&["stack a c"])]);
    let prober = prober(knowledge, plans, probe_planner, FakeValidator::accept_all());

    let outcome = prober.probe("blocksworld", CANDIDATE).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::DifDomain(DifDomainKind::KDiff));
    assert_eq!(outcome.working, 0);
    assert!(outcome.message.contains("2 plans"));
}

#[tokio::test]
async fn k_diff_on_a_later_problem_keeps_earlier_working_pairs() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new()
        .with_plans("p1.pddl", vec![plan(&["stack a b"]), plan(&["stack b a"])])
        .with_plans("p2.pddl", vec![]);
    let prober = prober(knowledge, plans, probe_planner, FakeValidator::accept_all());

    let outcome = prober.probe("blocksworld", CANDIDATE).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::DifDomain(DifDomainKind::KDiff));
    // Both p1 pairs were fully processed before the mismatch.
    assert_eq!(outcome.working, 2);
}

#[tokio::test]
async fn candidate_plan_rejected_by_reference_is_new_to_original() {
    let (_dir, knowledge, plans) = fixture().await;
    // The candidate invents a plan the reference domain cannot replay.
    let probe_planner = FakePlanner::new()
        .with_plans("p1.pddl", vec![plan(&["zap a"]), plan(&["stack b a"])])
        .with_plans("p2.pddl", vec![plan(&["stack a c"])]);
    let validator = FakeValidator::rejecting(|_, plan| plan.contains("zap"), "no such action");
    let prober = prober(knowledge, plans, probe_planner, validator);

    let outcome = prober.probe("blocksworld", CANDIDATE).await.unwrap();
    assert_eq!(
        outcome.verdict,
        Verdict::DifDomain(DifDomainKind::NewToOriginal)
    );
    assert_eq!(outcome.working, 0);
    assert_eq!(outcome.message, "no such action");
}

#[tokio::test]
async fn reference_plan_rejected_by_candidate_counts_the_failing_pair() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new()
        .with_plans("p1.pddl", vec![plan(&["stack a b"]), plan(&["stack b a"])])
        .with_plans("p2.pddl", vec![plan(&["stack a c"])]);
    // The candidate domain (marked v2) cannot replay the first reference
    // plan; the reference domain accepts everything.
    let validator = FakeValidator::rejecting(
        |domain, plan| domain.contains("v2") && plan.contains("stack a b"),
        "precondition unsatisfied",
    );
    let prober = prober(knowledge, plans, probe_planner, validator);

    let outcome = prober.probe("blocksworld", CANDIDATE).await.unwrap();
    assert_eq!(
        outcome.verdict,
        Verdict::DifDomain(DifDomainKind::OriginalToNew)
    );
    // Direction (a) succeeded for the pair, so it still counts.
    assert_eq!(outcome.working, 1);
}

#[tokio::test]
async fn original_to_new_on_a_later_pair_accumulates() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new()
        .with_plans("p1.pddl", vec![plan(&["stack a b"]), plan(&["stack b a"])])
        .with_plans("p2.pddl", vec![plan(&["stack a c"])]);
    let validator = FakeValidator::rejecting(
        |domain, plan| domain.contains("v2") && plan.contains("stack b a"),
        "precondition unsatisfied",
    );
    let prober = prober(knowledge, plans, probe_planner, validator);

    let outcome = prober.probe("blocksworld", CANDIDATE).await.unwrap();
    assert_eq!(
        outcome.verdict,
        Verdict::DifDomain(DifDomainKind::OriginalToNew)
    );
    // Pair one replayed both ways, pair two failed backward after forward
    // succeeded; both count.
    assert_eq!(outcome.working, 2);
}

#[tokio::test]
async fn planner_refusal_mid_probe_keeps_accumulated_count() {
    let (_dir, knowledge, plans) = fixture().await;
    let probe_planner = FakePlanner::new()
        .with_plans("p1.pddl", vec![plan(&["stack a b"]), plan(&["stack b a"])])
        .with_outcome(
            "p2.pddl",
            PlanOutcome::Failed(PlanFailure {
                verdict: Verdict::DifDomain(DifDomainKind::NoPlan),
                message: "search exhausted".to_string(),
            }),
        );
    let prober = prober(knowledge, plans, probe_planner, FakeValidator::accept_all());

    let outcome = prober.probe("blocksworld", CANDIDATE).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::DifDomain(DifDomainKind::NoPlan));
    assert_eq!(outcome.working, 2);
}

#[tokio::test]
async fn tool_breakage_is_an_inconclusive_plan_error() {
    let (_dir, knowledge, plans) = fixture().await;
    // Nothing scripted: every planner call errors at the invocation layer.
    let prober = prober(
        knowledge,
        plans,
        FakePlanner::new(),
        FakeValidator::accept_all(),
    );

    let outcome = prober.probe("blocksworld", CANDIDATE).await.unwrap();
    assert_eq!(outcome.verdict, Verdict::PlanError);
    assert_eq!(outcome.working, 0);
}

#[tokio::test]
async fn unknown_domain_is_an_error() {
    let (_dir, knowledge, plans) = fixture().await;
    let prober = prober(
        knowledge,
        plans,
        FakePlanner::new(),
        FakeValidator::accept_all(),
    );

    let err = prober.probe("warehouse", CANDIDATE).await.unwrap_err();
    assert!(matches!(err, EvalError::UnknownDomain { .. }));
}
