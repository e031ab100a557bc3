use clap::{Parser, Subcommand};
use pivot_solver::{Constraint, Problem, Relation, SolutionStatus, Solver};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pivot")]
#[command(about = "Dense-tableau simplex solver for linear programs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file and print the result
    Solve {
        /// JSON file describing the problem
        file: PathBuf,
        /// Emit the solution as JSON instead of a report
        #[arg(short, long)]
        json: bool,
        /// Re-check every constraint against the returned point
        #[arg(short, long)]
        verify: bool,
    },
    /// Validate a problem file without solving it
    Check {
        /// The file to check
        file: PathBuf,
    },
}

/// On-disk problem description
#[derive(Deserialize)]
struct ProblemFile {
    /// Display names, one per structural variable
    #[serde(default)]
    variables: Vec<String>,
    maximize: bool,
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
}

fn load(file: &Path) -> ProblemFile {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::from_str(&source) {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("Error parsing {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn variable_names(spec: &ProblemFile) -> Vec<String> {
    if spec.variables.len() == spec.objective.len() {
        spec.variables.clone()
    } else {
        (1..=spec.objective.len()).map(|i| format!("x{}", i)).collect()
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { file, json, verify } => {
            let spec = load(&file);
            let names = variable_names(&spec);

            let mut problem = Problem::new(spec.objective, spec.maximize);
            problem.constraints = spec.constraints;

            let solution = match Solver::new().solve(&problem) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Invalid problem: {}", e);
                    std::process::exit(1);
                }
            };

            if json {
                match serde_json::to_string_pretty(&solution) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("Error encoding solution: {}", e);
                        std::process::exit(1);
                    }
                }
                if solution.status != SolutionStatus::Optimal {
                    std::process::exit(1);
                }
                return;
            }

            match solution.status {
                SolutionStatus::Optimal => {
                    println!("Status: OPTIMAL");
                    println!(
                        "{}: {:.4}",
                        if problem.maximize { "Maximum" } else { "Minimum" },
                        solution.objective_value
                    );
                    println!("Iterations: {}", solution.iterations);
                    println!();
                    println!("Variables:");
                    for (name, value) in names.iter().zip(&solution.values) {
                        println!("  {:12} {:12.4}", name, value);
                    }

                    if verify {
                        println!();
                        let violations = problem.violations(&solution.values, 1e-6);
                        if violations.is_empty() {
                            println!("All constraints satisfied.");
                        } else {
                            println!("Violated constraints:");
                            for v in &violations {
                                println!("  {}", v.description);
                            }
                            std::process::exit(1);
                        }
                    }
                }
                SolutionStatus::Infeasible => {
                    println!("Status: INFEASIBLE");
                    println!("No point satisfies all constraints.");
                    std::process::exit(1);
                }
                SolutionStatus::Unbounded => {
                    println!("Status: UNBOUNDED");
                    println!("The objective can be improved without limit.");
                    std::process::exit(1);
                }
                SolutionStatus::IterationLimit => {
                    println!("Status: ITERATION LIMIT");
                    println!(
                        "No optimum within {} pivots; retry with a higher cap.",
                        solution.iterations
                    );
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let spec = load(&file);

            let mut problem = Problem::new(spec.objective, spec.maximize);
            problem.constraints = spec.constraints;

            match problem.validate() {
                Ok(()) => {
                    let mut le = 0;
                    let mut ge = 0;
                    let mut eq = 0;
                    for c in &problem.constraints {
                        match c.relation {
                            Relation::Le => le += 1,
                            Relation::Ge => ge += 1,
                            Relation::Eq => eq += 1,
                        }
                    }

                    println!("✓ {} is valid", file.display());
                    println!("  {} variables", problem.num_variables());
                    println!("  {} <= constraints", le);
                    println!("  {} >= constraints", ge);
                    println!("  {} = constraints", eq);
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
