use std::cell::RefCell;

use crate::{
    dimacs,
    formula::{Assignment, Cnf},
    grader::{decide, GradeError, Generated, Outcome, Submitted},
    llm,
    oracle::{Claim, Oracle, RawClaim},
    solver::{DpllSolver, Solution},
    verify::{DirectVerifier, VerifyError},
};

/// Replies with a fixed message and remembers what it was asked.
struct CannedOracle {
    content: &'static str,
    received: RefCell<Vec<String>>,
}

impl CannedOracle {
    fn new(content: &'static str) -> Self {
        CannedOracle {
            content,
            received: RefCell::new(Vec::new()),
        }
    }
}

impl Oracle for CannedOracle {
    fn submit(&self, dimacs: &str) -> Result<RawClaim, llm::Error> {
        self.received.borrow_mut().push(dimacs.to_owned());
        Ok(RawClaim {
            content: self.content.to_owned(),
            reasoning: Some("checked every clause".to_owned()),
        })
    }
}

struct FailingOracle;

impl Oracle for FailingOracle {
    fn submit(&self, _dimacs: &str) -> Result<RawClaim, llm::Error> {
        Err(llm::Error::EmptyResponse)
    }
}

fn sat_formula() -> Cnf {
    Cnf::from_dimacs_clauses(vec![vec![1, 2], vec![-1, 2]]).unwrap()
}

fn unsat_formula() -> Cnf {
    Cnf::from_dimacs_clauses(vec![vec![1, 2], vec![-1, 2], vec![-2]]).unwrap()
}

fn grade(formula: Cnf, claim: Claim) -> Outcome {
    Submitted::new(formula, claim)
        .grade(&DpllSolver::new(), &DirectVerifier)
        .unwrap()
        .outcome()
}

#[test]
fn decision_table() {
    let sat = Claim::Sat(Assignment::new(vec![true]));
    let pass = |_: &Assignment| Ok(true);
    let fail = |_: &Assignment| Ok(false);

    assert_eq!(decide(false, &Claim::Unsat, pass).unwrap(), Outcome::CorrectUnsat);
    assert_eq!(decide(true, &sat, pass).unwrap(), Outcome::CorrectSat);
    assert_eq!(decide(true, &sat, fail).unwrap(), Outcome::VerificationFailed);
    assert_eq!(decide(true, &Claim::Unsat, pass).unwrap(), Outcome::Mispredicted);
    assert_eq!(decide(false, &sat, pass).unwrap(), Outcome::Mispredicted);
}

#[test]
fn decision_only_checks_assignment_when_both_say_sat() {
    let sat = Claim::Sat(Assignment::new(vec![true]));
    let unexpected = |_: &Assignment| -> Result<bool, VerifyError> { panic!("checked") };

    decide(false, &Claim::Unsat, unexpected).unwrap();
    decide(true, &Claim::Unsat, unexpected).unwrap();
    decide(false, &sat, unexpected).unwrap();
}

#[test]
fn decision_propagates_verification_errors() {
    let sat = Claim::Sat(Assignment::new(vec![]));
    let result = decide(true, &sat, |_| {
        Err(VerifyError::AssignmentLength {
            expected: 1,
            found: 0,
        })
    });
    assert!(matches!(result, Err(VerifyError::AssignmentLength { .. })));
}

#[test]
fn grading_covers_every_row() {
    assert_eq!(grade(unsat_formula(), Claim::Unsat), Outcome::CorrectUnsat);
    assert_eq!(
        grade(sat_formula(), Claim::Sat(Assignment::new(vec![false, true]))),
        Outcome::CorrectSat
    );
    assert_eq!(
        grade(sat_formula(), Claim::Sat(Assignment::new(vec![true, false]))),
        Outcome::VerificationFailed
    );
    assert_eq!(grade(sat_formula(), Claim::Unsat), Outcome::Mispredicted);
    assert_eq!(
        grade(unsat_formula(), Claim::Sat(Assignment::new(vec![false, true]))),
        Outcome::Mispredicted
    );
}

#[test]
fn outcome_correctness() {
    assert!(Outcome::CorrectSat.is_correct());
    assert!(Outcome::CorrectUnsat.is_correct());
    assert!(!Outcome::VerificationFailed.is_correct());
    assert!(!Outcome::Mispredicted.is_correct());
}

#[test]
fn full_pipeline_with_oracle() {
    let oracle = CannedOracle::new(r#"{"satisfiable": true, "assignment": [false, true]}"#);
    let formula = sat_formula();

    let submitted = Generated::new(formula.clone()).submit(&oracle).unwrap();
    assert_eq!(submitted.reasoning(), Some("checked every clause"));
    assert_eq!(*oracle.received.borrow(), vec![dimacs::encode(&formula)]);

    let graded = submitted
        .grade(&DpllSolver::new(), &DirectVerifier)
        .unwrap();
    assert_eq!(graded.outcome(), Outcome::CorrectSat);
    assert!(matches!(graded.ground_truth(), Solution::Sat(_)));
    assert_eq!(graded.formula(), &formula);
}

#[test]
fn malformed_claim_is_not_a_misprediction() {
    let oracle = CannedOracle::new(r#"{"satisfiable": true, "assignment": [true]}"#);
    let result = Generated::new(sat_formula()).submit(&oracle);
    assert!(matches!(result, Err(GradeError::MalformedClaim { .. })));

    let oracle = CannedOracle::new("I think it is satisfiable");
    let result = Generated::new(unsat_formula()).submit(&oracle);
    assert!(matches!(result, Err(GradeError::MalformedClaim { .. })));
}

#[test]
fn oracle_failure_is_reported() {
    let result = Generated::new(sat_formula()).submit(&FailingOracle);
    assert!(matches!(result, Err(GradeError::OracleFailure { .. })));
}

#[test]
fn ground_truth_solver_failure_is_reported() {
    // Needs one branching decision, unlike `unsat_formula`.
    let result = Submitted::new(sat_formula(), Claim::Unsat)
        .grade(&DpllSolver::with_decision_limit(0), &DirectVerifier);
    assert!(matches!(result, Err(GradeError::GroundTruth { .. })));
}
