use std::{env::args, path::Path};

use pretty_env_logger::formatted_builder;
use satbench::{
    dimacs::{self, parse_file},
    formula::Cnf,
    generator::{self, Generator, GeneratorConfig},
    grader::{self, Generated},
    llm::{self, ChatClient, LlmConfig},
    prelude::*,
    report::Report,
    solver::{DpllSolver, Solution, Solver, SolverError},
    verify::DirectVerifier,
};

fn usage_string() -> String {
    format!(
        "Usage: {} <command>

command:
    solve <file_name> - decide the formula with the built-in DPLL solver
    generate <sat|unsat> [k n m] - print a random k-CNF with n variables and m clauses
    bench [options] - ask a reasoning model to solve a formula and grade it

bench options:
    --formula <file_name>     formula in DIMACS format
    --generate <sat|unsat>    use a fresh random formula instead
    --api-base-url <url>      OpenAI compatible API base URL (default: $API_BASE_URL)
    --api-key <key>           API key (default: $API_KEY)
    --model <name>            model name (default: $MODEL or {})",
        args().next().unwrap_or_else(|| "satbench".to_owned()),
        llm::DEFAULT_MODEL
    )
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Unknown command '{}'\n\n{}", name, usage_string()))]
    UnknownCommand { name: String },
    #[snafu(display("Unknown option '{}'\n\n{}", name, usage_string()))]
    UnknownOption { name: String },
    #[snafu(display("Invalid value '{}' for {}\n\n{}", value, what, usage_string()))]
    InvalidArgument { what: &'static str, value: String },
    #[snafu(display("Required argument does not exist\n\n{}", usage_string()))]
    MissingArgument,
    #[snafu(display("Failed to read CNF"))]
    ParserError { source: dimacs::Error },
    #[snafu(display("Failed to solve CNF"))]
    SolverFailure { source: SolverError },
    #[snafu(display("Failed to generate CNF"))]
    GeneratorError { source: generator::GenerateError },
    #[snafu(display("Invalid reasoning service configuration"))]
    ServiceConfig { source: llm::Error },
    #[snafu(display("Failed to grade the reasoning model"))]
    GradeFailure { source: grader::GradeError },
}

fn parse_status(value: &str) -> Result<bool, Error> {
    match value {
        "sat" => Ok(true),
        "unsat" => Ok(false),
        _ => InvalidArgument {
            what: "satisfiability (expected 'sat' or 'unsat')",
            value,
        }
        .fail(),
    }
}

fn parse_count(what: &'static str, value: &str) -> Result<usize, Error> {
    value
        .parse::<usize>()
        .ok()
        .context(InvalidArgument { what, value })
}

fn generate_formula(satisfiable: bool, config: GeneratorConfig) -> Result<Cnf, Error> {
    let generator = Generator::new(config, DpllSolver::new());
    generator
        .generate(&mut rand::thread_rng(), satisfiable)
        .context(GeneratorError)
}

fn solve_path(path: &Path) -> Result<(), Error> {
    let formula = parse_file(path).context(ParserError)?;
    match DpllSolver::new().solve(&formula).context(SolverFailure)? {
        Solution::Sat(assignment) => println!("SAT\n{}", assignment),
        Solution::Unsat => println!("UNSAT"),
    }
    Ok(())
}

/// Either no shape at all or exactly `k n m`.
fn generator_config(shape: &[String]) -> Result<GeneratorConfig, Error> {
    match shape {
        [] => Ok(GeneratorConfig::default()),
        [k, n, m] => Ok(GeneratorConfig::new(
            parse_count("k", k)?,
            parse_count("n", n)?,
            parse_count("m", m)?,
        )),
        [_] | [_, _] => MissingArgument.fail(),
        [_, _, _, extra, ..] => InvalidArgument {
            what: "generate (unexpected extra argument)",
            value: extra.as_str(),
        }
        .fail(),
    }
}

fn generate_command(args: &[String]) -> Result<(), Error> {
    let (status, shape) = args.split_first().context(MissingArgument)?;
    let satisfiable = parse_status(status)?;
    let config = generator_config(shape)?;

    let formula = generate_formula(satisfiable, config)?;
    print!("{}", dimacs::encode(&formula));
    Ok(())
}

fn format_assignment(values: &[bool]) -> String {
    let entries = values.iter().map(bool::to_string).collect::<Vec<_>>();
    format!("[{}]", entries.join(", "))
}

fn bench_command(args: &[String]) -> Result<(), Error> {
    let mut formula_path = None;
    let mut generate = None;
    let mut base_url = None;
    let mut api_key = None;
    let mut model = None;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let slot = match flag.as_str() {
            "--formula" => &mut formula_path,
            "--generate" => &mut generate,
            "--api-base-url" => &mut base_url,
            "--api-key" => &mut api_key,
            "--model" => &mut model,
            name => {
                return UnknownOption {
                    name: name.to_owned(),
                }
                .fail()
            }
        };
        *slot = Some(iter.next().context(MissingArgument)?.clone());
    }

    let formula = match (formula_path, generate) {
        (Some(path), None) => parse_file(path).context(ParserError)?,
        (None, Some(status)) => {
            generate_formula(parse_status(&status)?, GeneratorConfig::default())?
        }
        _ => return MissingArgument.fail(),
    };

    let config = LlmConfig::resolve(base_url, api_key, model).context(ServiceConfig)?;
    let client = ChatClient::new(config).context(ServiceConfig)?;

    println!("Formula:");
    print!("{}", dimacs::encode(&formula));

    let submitted = Generated::new(formula)
        .submit(&client)
        .context(GradeFailure)?;

    println!("LLM reasoning:");
    println!("{}", submitted.reasoning().unwrap_or("<none>"));

    println!("LLM result:");
    println!("{}", submitted.claim().is_sat());

    println!("LLM assignment:");
    match submitted.claim().assignment() {
        Some(assignment) => println!("{}", format_assignment(assignment.values())),
        None => println!("null"),
    }

    let graded = submitted
        .grade(&DpllSolver::new(), &DirectVerifier)
        .context(GradeFailure)?;

    println!("LLM {}", graded.outcome());

    Ok(())
}

fn dispatch_command(args: Vec<String>) -> Result<(), Error> {
    let (command, rest) = match args.split_first() {
        Some((command, rest)) => (command.as_str(), rest),
        None => {
            println!("{}", usage_string());
            return Ok(());
        }
    };

    match command {
        "solve" => {
            let path = rest.get(0).context(MissingArgument)?;
            solve_path(path.as_ref())?;
        }
        "generate" => generate_command(rest)?,
        "bench" => bench_command(rest)?,
        name => UnknownCommand {
            name: name.to_owned(),
        }
        .fail()?,
    }

    Ok(())
}

fn init_logger() {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else {
        if cfg!(debug_assertions) {
            builder.parse_filters("satbench=debug");
        } else {
            builder.parse_filters("satbench=warn");
        }
    }

    builder.try_init().expect("Failed to initialize the logger");
}

fn main() -> Result<(), Report> {
    init_logger();

    // drop arg[0]
    let remaining: Vec<_> = args().skip(1).collect();
    dispatch_command(remaining)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|&arg| arg.to_owned()).collect()
    }

    #[test]
    fn generator_shape_is_all_or_nothing() {
        let config = generator_config(&[]).unwrap();
        assert_eq!(config.clause_width, 5);
        assert_eq!(config.num_variables, 10);
        assert_eq!(config.num_clauses, 200);

        let config = generator_config(&strings(&["3", "8", "20"])).unwrap();
        assert_eq!(config.clause_width, 3);
        assert_eq!(config.num_variables, 8);
        assert_eq!(config.num_clauses, 20);
    }

    #[test]
    fn partial_generator_shape_is_rejected() {
        for shape in &[vec!["3"], vec!["3", "10"]] {
            assert!(matches!(
                generator_config(&strings(shape)),
                Err(Error::MissingArgument)
            ));
        }
    }

    #[test]
    fn extra_generator_arguments_are_rejected() {
        match generator_config(&strings(&["3", "10", "20", "7"])) {
            Err(Error::InvalidArgument { value, .. }) => assert_eq!(value, "7"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_numeric_generator_shape_is_rejected() {
        assert!(matches!(
            generator_config(&strings(&["3", "ten", "20"])),
            Err(Error::InvalidArgument { what: "n", .. })
        ));
    }

    #[test]
    fn generate_requires_a_status() {
        assert!(matches!(
            generate_command(&[]),
            Err(Error::MissingArgument)
        ));
        assert!(matches!(
            generate_command(&strings(&["maybe"])),
            Err(Error::InvalidArgument { .. })
        ));
    }
}
