/*!
Checks whether an assignment satisfies a formula.

Two interchangeable strategies are provided. [`DirectVerifier`] evaluates every
clause. [`AugmentingVerifier`] pins each variable with a unit clause on a
private copy of the formula and asks a solver whether the copy is still
satisfiable.
*/

use crate::formula::{Assignment, Clause, Cnf};
use crate::prelude::*;
use crate::solver::{Solver, SolverError};

#[derive(Debug, Snafu)]
pub enum VerifyError {
    #[snafu(display(
        "Assignment covers {} variables but the formula has {}",
        found,
        expected
    ))]
    AssignmentLength { expected: usize, found: usize },
    #[snafu(display("Solver failed while checking an assignment"))]
    SolverFailure { source: SolverError },
}

pub trait Verifier {
    /// Returns `true` iff every clause has a literal made true by `assignment`.
    ///
    /// An assignment shorter than the formula's variable count is an error.
    fn verify(&self, formula: &Cnf, assignment: &Assignment) -> Result<bool, VerifyError>;
}

fn check_length(formula: &Cnf, assignment: &Assignment) -> Result<(), VerifyError> {
    ensure!(
        assignment.len() >= formula.num_variables(),
        AssignmentLength {
            expected: formula.num_variables(),
            found: assignment.len(),
        }
    );
    Ok(())
}

/// Evaluates the clauses in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectVerifier;

impl Verifier for DirectVerifier {
    fn verify(&self, formula: &Cnf, assignment: &Assignment) -> Result<bool, VerifyError> {
        check_length(formula, assignment)?;

        let unsatisfied = formula.clauses().iter().position(|clause| {
            !clause
                .iter()
                .any(|literal| assignment.satisfies(literal) == Some(true))
        });

        if let Some(index) = unsatisfied {
            debug!(
                "Clause #{} {} is falsified by the assignment",
                index + 1,
                formula.clauses()[index]
            );
        }

        Ok(unsatisfied.is_none())
    }
}

/// Re-solves the formula with the assignment added as unit clauses.
#[derive(Debug, Clone, Default)]
pub struct AugmentingVerifier<S> {
    solver: S,
}

impl<S: Solver> AugmentingVerifier<S> {
    pub fn new(solver: S) -> Self {
        AugmentingVerifier { solver }
    }
}

impl<S: Solver> Verifier for AugmentingVerifier<S> {
    fn verify(&self, formula: &Cnf, assignment: &Assignment) -> Result<bool, VerifyError> {
        check_length(formula, assignment)?;

        let mut augmented = formula.clone();
        for literal in assignment.unit_literals() {
            // A single literal always forms a valid clause.
            if let Ok(unit) = Clause::new(vec![literal]) {
                augmented.add_clause(unit);
            }
        }

        self.solver.is_satisfiable(&augmented).context(SolverFailure)
    }
}

/// Verifies with [`DirectVerifier`].
pub fn verify(formula: &Cnf, assignment: &Assignment) -> Result<bool, VerifyError> {
    DirectVerifier.verify(formula, assignment)
}
