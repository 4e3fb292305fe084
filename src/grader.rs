/*!
Grading pipeline: `Generated -> Submitted -> Graded`.

Each state owns its formula, so a run cannot be graded twice or graded before
a claim exists.
*/

use std::fmt::Display;

use crate::dimacs;
use crate::formula::{Assignment, Cnf};
use crate::llm;
use crate::oracle::{Claim, ClaimError, Oracle};
use crate::prelude::*;
use crate::solver::{Solution, Solver, SolverError};
use crate::verify::{Verifier, VerifyError};

#[derive(Debug, Snafu)]
pub enum GradeError {
    #[snafu(display("Reasoning service failed"))]
    OracleFailure { source: llm::Error },
    #[snafu(display("Reasoning service returned a malformed claim"))]
    MalformedClaim { source: ClaimError },
    #[snafu(display("Solver failed while computing the ground truth"))]
    GroundTruth { source: SolverError },
    #[snafu(display("Failed to verify the claimed assignment"))]
    Verification { source: VerifyError },
}

/// Terminal result of a graded run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Both sides say UNSAT
    CorrectUnsat,
    /// Both sides say SAT and the claimed assignment checks out
    CorrectSat,
    /// Both sides say SAT but the claimed assignment falsifies a clause
    VerificationFailed,
    /// The verdicts disagree
    Mispredicted,
}

impl Outcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, Outcome::CorrectUnsat | Outcome::CorrectSat)
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Outcome::CorrectUnsat => "predicted correctly (UNSAT)",
            Outcome::CorrectSat => "predicted correctly (SAT, assignment verified)",
            Outcome::VerificationFailed => "predicted SAT but the assignment failed",
            Outcome::Mispredicted => "mispredicted",
        };
        write!(f, "{}", text)
    }
}

/// Applies the grading table.
///
/// `check` is only consulted when both the ground truth and the claim say SAT.
pub fn decide<F>(ground_truth: bool, claim: &Claim, check: F) -> Result<Outcome, VerifyError>
where
    F: FnOnce(&Assignment) -> Result<bool, VerifyError>,
{
    Ok(match (ground_truth, claim) {
        (false, Claim::Unsat) => Outcome::CorrectUnsat,
        (true, Claim::Sat(assignment)) => {
            if check(assignment)? {
                Outcome::CorrectSat
            } else {
                Outcome::VerificationFailed
            }
        }
        (true, Claim::Unsat) | (false, Claim::Sat(_)) => Outcome::Mispredicted,
    })
}

/// A formula waiting to be sent to the reasoning service.
#[derive(Debug, Clone)]
pub struct Generated {
    formula: Cnf,
}

impl Generated {
    pub fn new(formula: Cnf) -> Self {
        Generated { formula }
    }

    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    /// Sends the DIMACS text to `oracle` and validates its claim.
    pub fn submit<O: Oracle>(self, oracle: &O) -> Result<Submitted, GradeError> {
        let text = dimacs::encode(&self.formula);
        let raw = oracle.submit(&text).context(OracleFailure)?;
        let claim = Claim::parse(&raw.content, self.formula.num_variables())
            .context(MalformedClaim)?;

        info!(
            "Service claims the formula is {}",
            if claim.is_sat() { "SAT" } else { "UNSAT" }
        );

        Ok(Submitted {
            formula: self.formula,
            claim,
            reasoning: raw.reasoning,
        })
    }
}

/// A formula together with the service's validated claim.
#[derive(Debug, Clone)]
pub struct Submitted {
    formula: Cnf,
    claim: Claim,
    reasoning: Option<String>,
}

impl Submitted {
    /// Pairs a formula with a claim obtained elsewhere.
    pub fn new(formula: Cnf, claim: Claim) -> Self {
        Submitted {
            formula,
            claim,
            reasoning: None,
        }
    }

    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    pub fn claim(&self) -> &Claim {
        &self.claim
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    /// Computes the ground truth with `solver` and scores the claim.
    pub fn grade<S: Solver, V: Verifier>(
        self,
        solver: &S,
        verifier: &V,
    ) -> Result<Graded, GradeError> {
        let ground_truth = solver.solve(&self.formula).context(GroundTruth)?;

        let formula = &self.formula;
        let outcome = decide(ground_truth.is_sat(), &self.claim, |assignment| {
            verifier.verify(formula, assignment)
        })
        .context(Verification)?;

        info!("Graded: {}", outcome);

        Ok(Graded {
            formula: self.formula,
            claim: self.claim,
            reasoning: self.reasoning,
            ground_truth,
            outcome,
        })
    }
}

/// Final state of a run.
#[derive(Debug, Clone)]
pub struct Graded {
    formula: Cnf,
    claim: Claim,
    reasoning: Option<String>,
    ground_truth: Solution,
    outcome: Outcome,
}

impl Graded {
    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    pub fn claim(&self) -> &Claim {
        &self.claim
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    pub fn ground_truth(&self) -> &Solution {
        &self.ground_truth
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}
