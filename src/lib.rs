#[macro_use]
extern crate log;

pub mod dimacs;
pub mod formula;
pub mod generator;
pub mod grader;
pub mod llm;
pub mod oracle;
pub mod prelude;
pub mod report;
pub mod solver;
pub mod verify;
