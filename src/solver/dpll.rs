use crate::formula::{Assignment, Cnf, Literal, Variable};
use crate::prelude::*;

use self::inner::Watch;

use super::{DecisionLimitExceeded, Solution, Solver, SolverError, TooManyVariables};

/// Internal modules whose implementation details are hidden from the solver.
mod inner {
    use std::ops::{Index, IndexMut};

    use crate::formula::{Cnf, Literal};

    /// Literal -> indices of the clauses containing it
    #[derive(Debug)]
    pub struct Watch {
        positive: Vec<Vec<usize>>,
        negative: Vec<Vec<usize>>,
    }

    impl Watch {
        pub fn new(formula: &Cnf) -> Self {
            let num_variables = formula.num_variables();
            let mut watch = Self {
                positive: vec![Vec::new(); num_variables],
                negative: vec![Vec::new(); num_variables],
            };

            for (idx, clause) in formula.clauses().iter().enumerate() {
                for literal in clause.iter() {
                    watch[literal].push(idx);
                }
            }

            watch
        }
    }

    impl Index<Literal> for Watch {
        type Output = Vec<usize>;

        fn index(&self, literal: Literal) -> &Self::Output {
            if literal.positive() {
                &self.positive[literal.variable().as_index()]
            } else {
                &self.negative[literal.variable().as_index()]
            }
        }
    }

    impl IndexMut<Literal> for Watch {
        fn index_mut(&mut self, literal: Literal) -> &mut Self::Output {
            if literal.positive() {
                &mut self.positive[literal.variable().as_index()]
            } else {
                &mut self.negative[literal.variable().as_index()]
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ClauseStat {
    /// Satisfied literal count in the clause.
    satisfied: usize,
    /// Unsatisfied literal count in the clause.
    unsatisfied: usize,
}

/// Plain recursive DPLL with unit propagation.
///
/// Branches on the first unassigned variable, trying `true` first, so the
/// result for a given formula is always the same.
///
/// Search state is indexed by variable ID, so formulas whose highest ID is
/// above `max_variables` are refused with `SolverError::TooManyVariables`.
#[derive(Debug, Clone)]
pub struct DpllSolver {
    decision_limit: Option<u64>,
    max_variables: usize,
}

impl Default for DpllSolver {
    fn default() -> Self {
        DpllSolver {
            decision_limit: None,
            max_variables: DpllSolver::MAX_VARIABLES,
        }
    }
}

impl DpllSolver {
    /// Default cap on the highest variable ID.
    pub const MAX_VARIABLES: usize = 1 << 20;

    pub fn new() -> Self {
        DpllSolver::default()
    }

    /// Gives up with `SolverError::DecisionLimitExceeded` after `limit`
    /// branching decisions.
    pub fn with_decision_limit(limit: u64) -> Self {
        DpllSolver {
            decision_limit: Some(limit),
            ..DpllSolver::default()
        }
    }

    pub fn max_variables(mut self, limit: usize) -> Self {
        self.max_variables = limit;
        self
    }
}

/// Search state for a single `solve` call.
#[derive(Debug)]
struct Search<'a> {
    formula: &'a Cnf,
    watch: Watch,
    /// Variable index -> assigned status
    assignment: Vec<Option<bool>>,
    /// Clause index -> clause stat
    clause_stats: Vec<ClauseStat>,
    /// Cache for `clauses.count(satisfied_literals > 0)`
    satisfied_clauses: usize,
    /// Cache for `clauses.count(unsatisfied_literals == clause.num_literals)`
    unsatisfied_clauses: usize,
    assigned_stack: Vec<Literal>,
    decisions: u64,
    decision_limit: Option<u64>,
}

impl<'a> Search<'a> {
    fn new(formula: &'a Cnf, decision_limit: Option<u64>) -> Self {
        let num_variables = formula.num_variables();
        let num_clauses = formula.num_clauses();

        Search {
            formula,
            watch: Watch::new(formula),
            assignment: vec![None; num_variables],
            clause_stats: vec![Default::default(); num_clauses],
            satisfied_clauses: 0,
            unsatisfied_clauses: 0,
            assigned_stack: Vec::with_capacity(num_variables),
            decisions: 0,
            decision_limit,
        }
    }

    fn assigned_value(&self, literal: Literal) -> Option<bool> {
        let raw_assignment = self.assignment[literal.variable().as_index()];
        raw_assignment.map(|val| val ^ !literal.positive())
    }

    /// Returns a forced literal in a unit clause.
    fn forced_assignment(&self, clause_index: usize) -> Option<Literal> {
        let clause = &self.formula.clauses()[clause_index];
        let stat = &self.clause_stats[clause_index];
        if stat.satisfied == 0 && stat.unsatisfied + 1 == clause.num_literals() {
            clause
                .iter()
                .find(|&literal| self.assigned_value(literal).is_none())
        } else {
            None
        }
    }

    /// Finds the next unit clause if exists and returns the forced literal.
    fn search_unit_clause(&self) -> Option<Literal> {
        (0..self.formula.num_clauses()).find_map(|clause_index| self.forced_assignment(clause_index))
    }

    fn first_unassigned(&self) -> Option<Variable> {
        let index = self
            .assignment
            .iter()
            .position(|assigned| assigned.is_none())?;

        Variable::from_index(index)
    }

    fn assign_literal(&mut self, literal: Literal) {
        self.assigned_stack.push(literal);
        self.assignment[literal.variable().as_index()] = Some(literal.positive());

        for &clause_index in &self.watch[literal] {
            let stat = &mut self.clause_stats[clause_index];

            if stat.satisfied == 0 {
                self.satisfied_clauses += 1;
            }
            stat.satisfied += 1;
        }

        for &clause_index in &self.watch[!literal] {
            let clause = &self.formula.clauses()[clause_index];
            let stat = &mut self.clause_stats[clause_index];

            stat.unsatisfied += 1;
            if stat.unsatisfied == clause.num_literals() {
                self.unsatisfied_clauses += 1;
            }
        }
    }

    fn pop_assignment(&mut self) {
        let literal = match self.assigned_stack.pop() {
            Some(literal) => literal,
            None => return,
        };
        self.assignment[literal.variable().as_index()] = None;

        for &clause_index in &self.watch[literal] {
            let stat = &mut self.clause_stats[clause_index];

            if stat.satisfied == 1 {
                self.satisfied_clauses -= 1;
            }
            stat.satisfied -= 1;
        }

        for &clause_index in &self.watch[!literal] {
            let clause = &self.formula.clauses()[clause_index];
            let stat = &mut self.clause_stats[clause_index];

            if stat.unsatisfied == clause.num_literals() {
                self.unsatisfied_clauses -= 1;
            }
            stat.unsatisfied -= 1;
        }
    }

    fn decide(&mut self) -> Result<(), SolverError> {
        self.decisions += 1;
        match self.decision_limit {
            Some(limit) if self.decisions > limit => DecisionLimitExceeded { limit }.fail(),
            _ => Ok(()),
        }
    }

    /// Assigns `literal`, explores, and undoes the assignment on failure.
    fn try_literal(&mut self, literal: Literal) -> Result<Option<Vec<bool>>, SolverError> {
        self.assign_literal(literal);
        let result = self.solve_inner()?;
        if result.is_none() {
            self.pop_assignment();
        }
        Ok(result)
    }

    fn solve_inner(&mut self) -> Result<Option<Vec<bool>>, SolverError> {
        if self.satisfied_clauses == self.formula.num_clauses() {
            // All clauses are satisfied, fill remaining variables and return.
            let assignment = self
                .assignment
                .iter()
                .map(|assign| assign.unwrap_or(true))
                .collect::<Vec<_>>();

            return Ok(Some(assignment));
        } else if self.unsatisfied_clauses > 0 {
            // There is a clause that can be never satisfied.
            return Ok(None);
        }

        // We need to explore more.

        // See if there is a unit assignment.
        if let Some(literal) = self.search_unit_clause() {
            return self.try_literal(literal);
        }

        // Try the first unassigned variable.
        // Note: This is an inefficient heuristics.
        let variable = match self.first_unassigned() {
            Some(variable) => variable,
            // Everything is assigned yet some clause is undecided; cannot happen
            // with consistent stats, treat as a dead end.
            None => return Ok(None),
        };
        let literal = Literal::new(variable, true);

        self.decide()?;
        if let Some(assignment) = self.try_literal(literal)? {
            return Ok(Some(assignment));
        }
        self.try_literal(!literal)
    }
}

impl Solver for DpllSolver {
    fn solve(&self, formula: &Cnf) -> Result<Solution, SolverError> {
        let num_variables = formula.num_variables();
        ensure!(
            num_variables <= self.max_variables,
            TooManyVariables {
                found: num_variables,
                limit: self.max_variables,
            }
        );

        let mut search = Search::new(formula, self.decision_limit);
        let result = search.solve_inner()?;

        debug!(
            "DPLL finished with {} decisions on {} variables, {} clauses",
            search.decisions,
            num_variables,
            formula.num_clauses()
        );

        Ok(match result {
            Some(assignment) => Solution::Sat(Assignment::new(assignment)),
            None => Solution::Unsat,
        })
    }
}
