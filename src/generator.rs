/*!
Random k-CNF generation with a requested satisfiability status.

Instances are drawn uniformly and filtered through a [`Solver`] until one with
the wanted status shows up. There is no bound on how long that takes unless
[`GeneratorConfig::max_attempts`] is set; parameters where one status is very
rare can stall the loop.
*/

use std::collections::HashSet;

use rand::{seq::index, Rng};

use crate::formula::{Clause, Cnf, Literal, Variable};
use crate::prelude::*;
use crate::solver::{Solver, SolverError};

#[derive(Debug, Snafu)]
pub enum GenerateError {
    #[snafu(display("Invalid generator parameters: {}", reason))]
    InvalidParameters { reason: String },
    #[snafu(display("Solver failed while labelling a random formula"))]
    SolverFailure { source: SolverError },
    #[snafu(display(
        "No formula with satisfiability {} found after {} attempts",
        satisfiable,
        attempts
    ))]
    Timeout { satisfiable: bool, attempts: u64 },
}

/// Shape of the generated formulas.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Literals per clause (k)
    pub clause_width: usize,
    pub num_variables: usize,
    pub num_clauses: usize,
    /// Never emit the same clause twice
    pub distinct_clauses: bool,
    /// `None` retries forever
    pub max_attempts: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            clause_width: 5,
            num_variables: 10,
            num_clauses: 200,
            distinct_clauses: true,
            max_attempts: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new(clause_width: usize, num_variables: usize, num_clauses: usize) -> Self {
        GeneratorConfig {
            clause_width,
            num_variables,
            num_clauses,
            ..GeneratorConfig::default()
        }
    }

    fn validate(&self) -> Result<(), GenerateError> {
        ensure!(
            self.clause_width > 0,
            InvalidParameters {
                reason: "clause width must be positive",
            }
        );
        ensure!(
            self.clause_width <= self.num_variables,
            InvalidParameters {
                reason: format!(
                    "clause width {} exceeds the number of variables {}",
                    self.clause_width, self.num_variables
                ),
            }
        );
        ensure!(
            Variable::from_index(self.num_variables - 1).is_some(),
            InvalidParameters {
                reason: format!("{} variables is too many", self.num_variables),
            }
        );

        if self.distinct_clauses {
            let available = distinct_clause_count(self.num_variables, self.clause_width);
            ensure!(
                available.map_or(true, |available| self.num_clauses as u128 <= available),
                InvalidParameters {
                    reason: format!(
                        "{} distinct {}-clauses over {} variables do not exist",
                        self.num_clauses, self.clause_width, self.num_variables
                    ),
                }
            );
        }

        Ok(())
    }
}

/// `C(n, k) * 2^k`, or `None` when it does not fit in a `u128`.
fn distinct_clause_count(n: usize, k: usize) -> Option<u128> {
    let mut count: u128 = 1;
    for i in 0..k {
        count = count.checked_mul((n - i) as u128)? / (i as u128 + 1);
    }
    count.checked_mul(1u128.checked_shl(k as u32)?)
}

fn random_clause<R: Rng + ?Sized>(rng: &mut R, config: &GeneratorConfig) -> Option<Clause> {
    let mut indices = index::sample(rng, config.num_variables, config.clause_width).into_vec();
    indices.sort_unstable();

    let literals = indices
        .into_iter()
        .filter_map(Variable::from_index)
        .map(|variable| Literal::new(variable, rng.gen()))
        .collect::<Vec<_>>();

    Clause::new(literals).ok()
}

/// Draws a uniformly random k-CNF with exactly the configured shape.
///
/// Within a clause the variables are distinct and sorted by index.
pub fn random_formula<R: Rng + ?Sized>(
    rng: &mut R,
    config: &GeneratorConfig,
) -> Result<Cnf, GenerateError> {
    config.validate()?;

    let mut cnf = Cnf::new();
    let mut seen = HashSet::new();

    while cnf.num_clauses() < config.num_clauses {
        let clause = random_clause(rng, config).context(InvalidParameters {
            reason: "clause width must be positive",
        })?;
        if config.distinct_clauses && !seen.insert(clause.clone()) {
            continue;
        }
        cnf.add_clause(clause);
    }

    Ok(cnf)
}

/// Rejection sampler on top of an oracle solver.
#[derive(Debug, Clone)]
pub struct Generator<S> {
    config: GeneratorConfig,
    solver: S,
}

impl<S: Solver> Generator<S> {
    pub fn new(config: GeneratorConfig, solver: S) -> Self {
        Generator { config, solver }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Returns the first random formula whose satisfiability is `satisfiable`.
    ///
    /// Solver failures abort immediately instead of drawing another formula.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        satisfiable: bool,
    ) -> Result<Cnf, GenerateError> {
        self.config.validate()?;

        let mut attempts = 0u64;
        loop {
            if let Some(max_attempts) = self.config.max_attempts {
                ensure!(
                    attempts < max_attempts,
                    Timeout {
                        satisfiable,
                        attempts,
                    }
                );
            }
            attempts += 1;

            let cnf = random_formula(rng, &self.config)?;
            let is_sat = self
                .solver
                .is_satisfiable(&cnf)
                .context(SolverFailure)?;
            trace!("Attempt {}: drew a formula with SAT = {}", attempts, is_sat);

            if is_sat == satisfiable {
                debug!(
                    "Generated a {} formula after {} attempts",
                    if satisfiable { "SAT" } else { "UNSAT" },
                    attempts
                );
                return Ok(cnf);
            }
        }
    }
}
