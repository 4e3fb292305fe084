/*!
The reasoning service under evaluation and the claims it returns.
*/

use serde_json::Value;

use crate::formula::Assignment;
use crate::llm;
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum ClaimError {
    #[snafu(display("Claim is not valid JSON"))]
    InvalidJson { source: serde_json::Error },
    #[snafu(display("Claim must be a JSON object, found {}", found))]
    NotAnObject { found: String },
    #[snafu(display("Claim has no '{}' field", field))]
    MissingField { field: &'static str },
    #[snafu(display("Field 'satisfiable' must be a boolean, found {}", found))]
    NonBooleanVerdict { found: String },
    #[snafu(display("Field 'assignment' must be an array, found {}", found))]
    NotAnArray { found: String },
    #[snafu(display(
        "Assignment has {} entries but the formula has {} variables",
        found,
        expected
    ))]
    WrongLength { expected: usize, found: usize },
    #[snafu(display("Assignment entry {} must be a boolean, found {}", index, found))]
    NonBooleanEntry { index: usize, found: String },
}

/// Unvalidated answer from the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawClaim {
    /// Final message content, expected to hold the JSON verdict
    pub content: String,
    /// Free-form reasoning trace, when the service exposes one
    pub reasoning: Option<String>,
}

/// Validated verdict of the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    Sat(Assignment),
    Unsat,
}

impl Claim {
    pub fn is_sat(&self) -> bool {
        matches!(self, Claim::Sat(_))
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Claim::Sat(assignment) => Some(assignment),
            Claim::Unsat => None,
        }
    }

    /// Parses `{"satisfiable": bool, "assignment": [bool; num_variables]}`.
    ///
    /// The JSON may be wrapped in a markdown code fence. `assignment` is only
    /// read when `satisfiable` is true.
    pub fn parse(content: &str, num_variables: usize) -> Result<Claim, ClaimError> {
        let value: Value = serde_json::from_str(strip_code_fence(content)).context(InvalidJson)?;
        let object = value.as_object().context(NotAnObject {
            found: value.to_string(),
        })?;

        let verdict = object
            .get("satisfiable")
            .context(MissingField {
                field: "satisfiable",
            })?;
        let satisfiable = verdict.as_bool().context(NonBooleanVerdict {
            found: verdict.to_string(),
        })?;
        if !satisfiable {
            return Ok(Claim::Unsat);
        }

        let entries = match object.get("assignment") {
            None | Some(Value::Null) => {
                return MissingField {
                    field: "assignment",
                }
                .fail()
            }
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                return NotAnArray {
                    found: other.to_string(),
                }
                .fail()
            }
        };

        ensure!(
            entries.len() == num_variables,
            WrongLength {
                expected: num_variables,
                found: entries.len(),
            }
        );

        let values = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry.as_bool().context(NonBooleanEntry {
                    index,
                    found: entry.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Claim::Sat(Assignment::new(values)))
    }
}

/// Drops a surrounding markdown code fence such as ```` ```json ... ``` ````.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let inner = match trimmed.strip_prefix("```") {
        Some(inner) => inner,
        None => return trimmed,
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Skip the language tag on the opening fence.
    match inner.find('\n') {
        Some(newline) if !inner[..newline].trim_start().starts_with('{') => &inner[newline + 1..],
        _ => inner,
    }
}

/// Something that can be asked whether a DIMACS formula is satisfiable.
pub trait Oracle {
    fn submit(&self, dimacs: &str) -> Result<RawClaim, llm::Error>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn submit(&self, dimacs: &str) -> Result<RawClaim, llm::Error> {
        (**self).submit(dimacs)
    }
}
