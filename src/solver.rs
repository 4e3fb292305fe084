use crate::formula::{Assignment, Cnf};
use crate::prelude::*;

mod dpll;

pub use dpll::DpllSolver;

#[derive(Debug, Snafu)]
pub enum SolverError {
    #[snafu(display("Solver gave up after {} decisions", limit))]
    DecisionLimitExceeded { limit: u64 },
    #[snafu(display(
        "Formula mentions {} variables, more than the solver accepts ({})",
        found,
        limit
    ))]
    TooManyVariables { found: usize, limit: usize },
}

/// Ground-truth verdict for a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Solution {
    Sat(Assignment),
    Unsat,
}

impl Solution {
    pub fn is_sat(&self) -> bool {
        matches!(self, Solution::Sat(_))
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Solution::Sat(assignment) => Some(assignment),
            Solution::Unsat => None,
        }
    }
}

pub trait Solver {
    /// Decides a CNF SAT problem.
    /// Returns `Solution::Sat` with one satisfying assignment when one exists.
    ///
    /// Must not depend on state left over from earlier calls, so the same
    /// formula always gets the same verdict.
    fn solve(&self, formula: &Cnf) -> Result<Solution, SolverError>;

    fn is_satisfiable(&self, formula: &Cnf) -> Result<bool, SolverError> {
        Ok(self.solve(formula)?.is_sat())
    }
}

impl<S: Solver + ?Sized> Solver for &S {
    fn solve(&self, formula: &Cnf) -> Result<Solution, SolverError> {
        (**self).solve(formula)
    }
}
