/*!
Reading and writing formulas in the DIMACS CNF text format.
*/

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, FormulaError, Literal};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("I/O error occurred while reading CNF file '{}'", path.display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("I/O error occurred while writing CNF file '{}'", path.display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Invalid literal '{}' on line {}", token, line))]
    ParseLiteral {
        line: usize,
        token: String,
        source: FormulaError,
    },
    #[snafu(display(
        "Problem line on line {} must be 'p cnf <num_variables> <num_clauses>', found '{}'",
        line,
        content
    ))]
    MalformedProblemLine { line: usize, content: String },
}

/// Serializes a formula as DIMACS text.
///
/// The output has no comment lines and ends with a newline.
pub fn encode(cnf: &Cnf) -> String {
    let mut text = String::new();

    // Writing into a `String` never fails.
    let _ = writeln!(text, "p cnf {} {}", cnf.num_variables(), cnf.num_clauses());
    for clause in cnf.clauses() {
        for literal in clause.iter() {
            let _ = write!(text, "{} ", literal.to_dimacs());
        }
        text.push_str("0\n");
    }

    text
}

/// Checks the `p cnf <num_variables> <num_clauses>` header.
fn parse_problem_line(line_no: usize, line: &str) -> Result<(usize, usize), Error> {
    let splitted = line.split_whitespace().collect::<Vec<_>>();

    let malformed = || MalformedProblemLine {
        line: line_no,
        content: line,
    };

    // We only support CNF DIMACS format
    ensure!(
        splitted.len() == 4 && splitted[0] == "p" && splitted[1] == "cnf",
        malformed()
    );

    match (splitted[2].parse::<usize>(), splitted[3].parse::<usize>()) {
        (Ok(num_variables), Ok(num_clauses)) => Ok((num_variables, num_clauses)),
        _ => malformed().fail(),
    }
}

/// Parses a clause line. A trailing `0` terminator is dropped.
fn parse_line(line_no: usize, line: &str) -> Result<Vec<Literal>, Error> {
    let mut tokens = line.split_whitespace().collect::<Vec<_>>();
    if tokens.last() == Some(&"0") {
        tokens.pop();
    }

    tokens
        .into_iter()
        .map(|token| {
            token.parse::<Literal>().context(ParseLiteral {
                line: line_no,
                token,
            })
        })
        .collect()
}

/// Parses DIMACS text into a formula.
///
/// Comment lines and the problem line are skipped, as are lines that yield no
/// literals. Header counts that disagree with the clauses are only logged.
pub fn decode(text: &str) -> Result<Cnf, Error> {
    let mut cnf = Cnf::new();
    let mut header = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.starts_with('c') {
            continue;
        }
        if trimmed.starts_with('p') {
            header = Some(parse_problem_line(line_no, trimmed)?);
            continue;
        }

        if trimmed.starts_with('%') {
            // SATLIB end-of-data marker
            break;
        }

        // Lines without literals are not clauses.
        if let Ok(clause) = Clause::new(parse_line(line_no, trimmed)?) {
            cnf.add_clause(clause);
        }
    }

    if let Some((num_variables, num_clauses)) = header {
        if num_variables != cnf.num_variables() || num_clauses != cnf.num_clauses() {
            warn!(
                "Problem line declares {} variables and {} clauses, found {} and {}",
                num_variables,
                num_clauses,
                cnf.num_variables(),
                cnf.num_clauses()
            );
        }
    }

    trace!("Decoded {}", cnf);

    Ok(cnf)
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).context(ReadError { path })?;
    decode(&text)
}

/// Writes a formula to a file in DIMACS format
pub fn write_file(path: impl AsRef<Path>, cnf: &Cnf) -> Result<(), Error> {
    let path = path.as_ref();
    fs::write(path, encode(cnf)).context(WriteError { path })
}
