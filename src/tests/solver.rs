use crate::{
    formula::Cnf,
    solver::{DpllSolver, Solution, Solver, SolverError},
};

use super::{brute_force, evaluate, random_cnf, seeded};

#[test]
fn dpll_agrees_with_brute_force() {
    let mut rng = seeded(2024);
    let solver = DpllSolver::new();

    for _ in 0..200 {
        let cnf = random_cnf(&mut rng, 8, 30, 3);
        match solver.solve(&cnf).unwrap() {
            Solution::Sat(assignment) => {
                assert_eq!(assignment.len(), cnf.num_variables());
                assert!(evaluate(&cnf, assignment.values()), "{}", cnf);
            }
            Solution::Unsat => assert!(brute_force(&cnf).is_none(), "{}", cnf),
        }
    }
}

#[test]
fn dpll_is_deterministic() {
    let cnf = random_cnf(&mut seeded(5), 10, 35, 3);
    let solver = DpllSolver::new();
    assert_eq!(solver.solve(&cnf).unwrap(), solver.solve(&cnf).unwrap());
}

#[test]
fn dpll_handles_duplicate_and_tautological_literals() {
    let cnf = Cnf::from_dimacs_clauses(vec![vec![1, 1], vec![-1, 1], vec![-1, -1, 2]]).unwrap();
    match DpllSolver::new().solve(&cnf).unwrap() {
        Solution::Sat(assignment) => assert_eq!(assignment.values(), &[true, true]),
        Solution::Unsat => panic!("expected SAT"),
    }
}

#[test]
fn decision_limit_is_reported() {
    // No unit clauses until two variables are fixed.
    let cnf = crate::dimacs::parse_file("testcases/basic/full3.cnf").unwrap();
    let result = DpllSolver::with_decision_limit(1).solve(&cnf);
    assert!(matches!(
        result,
        Err(SolverError::DecisionLimitExceeded { limit: 1 })
    ));

    assert_eq!(
        DpllSolver::with_decision_limit(1_000).solve(&cnf).unwrap(),
        Solution::Unsat
    );
}

#[test]
fn shared_solver_reference_is_a_solver() {
    fn label<S: Solver>(solver: S, cnf: &Cnf) -> bool {
        solver.is_satisfiable(cnf).unwrap()
    }

    let solver = DpllSolver::new();
    let cnf = Cnf::from_dimacs_clauses(vec![vec![1], vec![-1]]).unwrap();
    assert!(!label(&solver, &cnf));
}

#[test]
fn sparse_variable_ids_are_capped() {
    let cnf = Cnf::from_dimacs_clauses(vec![vec![1, 4_000_000_000]]).unwrap();
    assert!(matches!(
        DpllSolver::new().solve(&cnf),
        Err(SolverError::TooManyVariables {
            found: 4_000_000_000,
            limit: DpllSolver::MAX_VARIABLES,
        })
    ));

    let cnf = Cnf::from_dimacs_clauses(vec![vec![1, -9], vec![9]]).unwrap();
    assert!(matches!(
        DpllSolver::new().max_variables(8).solve(&cnf),
        Err(SolverError::TooManyVariables { found: 9, limit: 8 })
    ));
    assert!(DpllSolver::new().max_variables(9).is_satisfiable(&cnf).unwrap());
}
