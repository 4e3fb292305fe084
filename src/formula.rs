/*!
A module to represent conjunctive normal form formula.
*/

use std::{convert::TryFrom, fmt::Display, num::NonZeroU32, str::FromStr};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum FormulaError {
    #[snafu(display("Failed to parse literal '{}'", token))]
    ParseLiteral {
        token: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display("Literal 0 is reserved as the clause terminator"))]
    ZeroLiteral,
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    VariableOutOfRange { num: u64 },
    #[snafu(display("A clause must contain at least one literal"))]
    EmptyClause,
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU32);

impl Variable {
    pub const MAX_VARIABLE_ID: usize = std::u32::MAX as usize;
}

impl Variable {
    pub fn as_index(&self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// The 1-based ID used by DIMACS.
    pub fn id(&self) -> usize {
        self.0.get() as usize
    }

    /// Creates a variable from a raw index.
    /// Returns `None` if the index is invalid.
    pub fn from_index(index: usize) -> Option<Self> {
        let id = index.checked_add(1)?;
        if id > Variable::MAX_VARIABLE_ID {
            return None;
        }
        Some(Variable(NonZeroU32::new(u32::try_from(id).ok()?)?))
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    /// Converts a signed DIMACS integer into a literal.
    pub fn from_dimacs(value: i64) -> Result<Self, FormulaError> {
        ensure!(value != 0, ZeroLiteral);

        let num = value.unsigned_abs();
        let id = usize::try_from(num)
            .ok()
            .and_then(|id| Variable::from_index(id - 1))
            .context(VariableOutOfRange { num })?;

        Ok(Literal {
            id,
            positive: value > 0,
        })
    }

    pub fn to_dimacs(&self) -> i64 {
        let id = self.id.id() as i64;
        if self.positive {
            id
        } else {
            -id
        }
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    pub fn positive(&self) -> bool {
        self.positive
    }
}

impl FromStr for Literal {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.parse::<i64>().context(ParseLiteral { token: s })?;
        Literal::from_dimacs(value)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "¬" }, self.id)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Disjunction of literals.
/// Invariant: never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(literals: Vec<Literal>) -> Result<Self, FormulaError> {
        ensure!(!literals.is_empty(), EmptyClause);
        Ok(Self { literals })
    }

    pub fn from_dimacs(values: &[i64]) -> Result<Self, FormulaError> {
        let literals = values
            .iter()
            .map(|&value| Literal::from_dimacs(value))
            .collect::<Result<Vec<_>, _>>()?;
        Clause::new(literals)
    }

    pub fn num_literals(&self) -> usize {
        self.literals.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Largest variable ID mentioned by the clause.
    fn max_variable_id(&self) -> usize {
        self.iter()
            .map(|literal| literal.variable().id())
            .max()
            .unwrap_or(0)
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for literal in iter {
            write!(f, " ∨ {}", literal)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Formula representation in Conjunctive Normal Form.
///
/// Clauses are append-only. The variable count is the largest variable ID
/// seen so far, so unused IDs below it are tolerated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cnf {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new() -> Self {
        Cnf::default()
    }

    /// Builds a formula from DIMACS-style integer clauses.
    pub fn from_dimacs_clauses<I, C>(clauses: I) -> Result<Self, FormulaError>
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[i64]>,
    {
        let mut cnf = Cnf::new();
        for clause in clauses {
            cnf.add_literals(clause.as_ref())?;
        }
        Ok(cnf)
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn add_clause(&mut self, clause: Clause) {
        self.num_variables = self.num_variables.max(clause.max_variable_id());
        self.clauses.push(clause);
    }

    /// Appends a clause given as signed DIMACS literals.
    pub fn add_literals(&mut self, values: &[i64]) -> Result<(), FormulaError> {
        self.add_clause(Clause::from_dimacs(values)?);
        Ok(())
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for clause in iter {
            write!(f, " ∧ {}", clause)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Truth values for variables 1..=N, where entry `i - 1` binds variable `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<bool>,
}

impl Assignment {
    pub fn new(values: Vec<bool>) -> Self {
        Assignment { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[bool] {
        &self.values
    }

    /// Returns `None` for variables beyond the end of the assignment.
    pub fn value(&self, variable: Variable) -> Option<bool> {
        self.values.get(variable.as_index()).copied()
    }

    /// Whether `literal` is true under this assignment.
    pub fn satisfies(&self, literal: Literal) -> Option<bool> {
        self.value(literal.variable())
            .map(|value| value == literal.positive())
    }

    /// One literal per entry, `xi` when true and `¬xi` when false.
    pub fn unit_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.values.iter().enumerate().filter_map(|(idx, &value)| {
            Variable::from_index(idx).map(|variable| Literal::new(variable, value))
        })
    }
}

impl From<Vec<bool>> for Assignment {
    fn from(values: Vec<bool>) -> Self {
        Assignment::new(values)
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Assignment:")?;
        for literal in self.unit_literals() {
            write!(f, "\n  {}: {}", literal.variable(), literal.positive())?;
        }

        Ok(())
    }
}
