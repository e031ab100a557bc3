use crate::problem::{Constraint, Problem, ProblemError, Relation};
use crate::solution::{Solution, SolutionStatus};

/// Simplex solver for linear programming problems.
///
/// Works on a dense tableau with the Big-M treatment of equality and >=
/// rows: every such row starts with an artificial basic variable whose
/// objective-row price is a large penalty M, so optimization itself drives
/// the artificials out of the basis. An artificial still basic above
/// tolerance at the end means the problem is infeasible.
pub struct Solver {
    /// Maximum pivots before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Artificial-variable penalty; derived from the objective when unset
    big_m: Option<f64>,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-9,
            big_m: None,
        }
    }
}

/// Solve a linear program in one call with the default solver configuration.
pub fn solve(
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
    maximize: bool,
) -> Result<Solution, ProblemError> {
    let mut problem = Problem::new(objective, maximize);
    problem.constraints = constraints;
    Solver::new().solve(&problem)
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_big_m(mut self, m: f64) -> Self {
        self.big_m = Some(m);
        self
    }

    /// Solve the problem. Input-shape defects come back as `Err`; everything
    /// the algorithm itself decides (optimal, infeasible, unbounded,
    /// iteration limit) is a `SolutionStatus` on the returned value.
    pub fn solve(&self, problem: &Problem) -> Result<Solution, ProblemError> {
        problem.validate()?;
        let mut tableau = self.build_tableau(problem);

        let mut iterations = 0;
        loop {
            let Some(col) = self.find_pivot_column(&tableau) else {
                return Ok(self.extract_solution(&tableau, problem, iterations));
            };
            let Some(row) = self.find_pivot_row(&tableau, col) else {
                // A ray found while an artificial is still basic exists only
                // in the penalized extension, not in the original problem.
                return Ok(if self.artificial_in_basis(&tableau) {
                    Solution::infeasible(iterations)
                } else {
                    Solution::unbounded(problem.maximize, iterations)
                });
            };
            if iterations >= self.max_iterations {
                return Ok(Solution::iteration_limit(iterations));
            }
            self.pivot(&mut tableau, row, col);
            iterations += 1;
        }
    }

    fn build_tableau(&self, problem: &Problem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Normalize rows to non-negative rhs up front; negating a row swaps
        // Le and Ge, so slack assignment below sees the true relation.
        let rows: Vec<(Vec<f64>, Relation, f64)> = problem
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let coefficients = c.coefficients.iter().map(|a| -a).collect();
                    let relation = match c.relation {
                        Relation::Le => Relation::Ge,
                        Relation::Ge => Relation::Le,
                        Relation::Eq => Relation::Eq,
                    };
                    (coefficients, relation, -c.rhs)
                } else {
                    (c.coefficients.clone(), c.relation, c.rhs)
                }
            })
            .collect();

        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, relation, _) in &rows {
            match relation {
                Relation::Le => n_slack += 1,
                Relation::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                Relation::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basis: vec![0; n_constraints],
            n_structural: n_vars,
            artificial_start: n_vars + n_slack,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (coefficients, relation, rhs)) in rows.iter().enumerate() {
            for (j, &coef) in coefficients.iter().enumerate() {
                tableau.data[i][j] = coef;
            }
            tableau.data[i][total_cols - 1] = *rhs;

            match relation {
                Relation::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basis[i] = slack_idx;
                    slack_idx += 1;
                }
                Relation::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basis[i] = artificial_idx;
                    artificial_idx += 1;
                }
                Relation::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basis[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row). Maximization stores -c so the most
        // negative entry always names an improving column; the rhs entry then
        // reads back as +objective for max and -objective for min.
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.iter().enumerate() {
            tableau.data[obj_row][j] = if problem.maximize { -coef } else { coef };
        }

        // Big-M penalty row adjustment: price every artificial column at +M,
        // then subtract M times each artificial-basic row so basic columns
        // stay at zero in the objective row.
        if n_artificial > 0 {
            let m = self.big_m_for(problem);
            for j in tableau.artificial_start..total_cols - 1 {
                tableau.data[obj_row][j] = m;
            }
            for i in 0..n_constraints {
                if tableau.basis[i] >= tableau.artificial_start {
                    for j in 0..total_cols {
                        tableau.data[obj_row][j] -= m * tableau.data[i][j];
                    }
                }
            }
        }

        tableau
    }

    /// Dantzig rule: the most negative objective-row entry enters, ties to
    /// the lowest column index. Artificial columns and the RHS are never
    /// candidates.
    fn find_pivot_column(&self, tableau: &Tableau) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;

        let mut min_val = -self.tolerance;
        let mut min_col = None;

        for j in 0..tableau.artificial_start {
            if tableau.data[obj_row][j] < min_val {
                min_val = tableau.data[obj_row][j];
                min_col = Some(j);
            }
        }

        min_col
    }

    /// Minimum ratio test over rows with a positive entry in the entering
    /// column, ties to the lowest row index. No eligible row means the
    /// entering column describes an unbounded ray.
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for i in 0..n_constraints {
            let entry = tableau.data[i][col];
            if entry > self.tolerance {
                let ratio = tableau.data[i][rhs_col] / entry;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        tableau.basis[row] = col;

        // Scale the pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate the entering column everywhere else, objective row
        // included
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }
    }

    fn artificial_in_basis(&self, tableau: &Tableau) -> bool {
        let rhs_col = tableau.data[0].len() - 1;
        tableau
            .basis
            .iter()
            .enumerate()
            .any(|(i, &basic)| {
                basic >= tableau.artificial_start && tableau.data[i][rhs_col] > self.tolerance
            })
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &Problem, iterations: usize) -> Solution {
        // The penalty failed to expel an artificial variable: the original
        // constraints admit no feasible point.
        if self.artificial_in_basis(tableau) {
            return Solution::infeasible(iterations);
        }

        let rhs_col = tableau.data[0].len() - 1;

        let mut values = vec![0.0; tableau.n_structural];
        for (i, &basic) in tableau.basis.iter().enumerate() {
            if basic < tableau.n_structural {
                values[basic] = tableau.data[i][rhs_col];
            }
        }

        let obj_row = tableau.data.len() - 1;
        let z = tableau.data[obj_row][rhs_col];
        let objective_value = if problem.maximize { z } else { -z };

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            iterations,
        }
    }

    fn big_m_for(&self, problem: &Problem) -> f64 {
        match self.big_m {
            Some(m) => m,
            // The penalty has to dominate any objective gain, so scale it by
            // the largest objective coefficient.
            None => {
                let scale = problem
                    .objective
                    .iter()
                    .fold(1.0_f64, |acc, c| acc.max(c.abs()));
                scale * 1e6
            }
        }
    }
}

/// Dense simplex tableau: constraint rows first, objective row last, columns
/// laid out structural | slack/surplus | artificial | rhs.
struct Tableau {
    data: Vec<Vec<f64>>,
    /// Basic column of each constraint row
    basis: Vec<usize>,
    n_structural: usize,
    /// First artificial column; also one past the last entering candidate
    artificial_start: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The investment split problem: 100 units across three instruments,
    /// the first capped at a third of the second, the third at least a
    /// quarter of the first two combined.
    ///
    /// Maximize: 0.10x + 0.07y + 0.03z
    /// Subject to:
    ///   x + y + z = 100
    ///   x - y/3 <= 0
    ///   -0.25x - 0.25y + z >= 0
    /// Optimal: x=20, y=60, z=20, obj=6.8
    fn portfolio() -> Problem {
        let mut problem = Problem::new(vec![0.10, 0.07, 0.03], true);
        problem.add_constraint("total", vec![1.0, 1.0, 1.0], Relation::Eq, 100.0);
        problem.add_constraint("x_cap", vec![1.0, -1.0 / 3.0, 0.0], Relation::Le, 0.0);
        problem.add_constraint("z_floor", vec![-0.25, -0.25, 1.0], Relation::Ge, 0.0);
        problem
    }

    #[test]
    fn maximization_with_slack_rows() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = Problem::new(vec![3.0, 2.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], Relation::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], Relation::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], Relation::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {}", solution.values[1]);
        assert!(
            (solution.objective_value - 11.0).abs() < 1e-6,
            "obj = {}",
            solution.objective_value
        );
    }

    #[test]
    fn minimization_with_ge_rows() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = Problem::new(vec![2.0, 3.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], Relation::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], Relation::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], Relation::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {}", solution.values[1]);
        assert!(
            (solution.objective_value - 9.0).abs() < 1e-6,
            "obj = {}",
            solution.objective_value
        );
    }

    #[test]
    fn portfolio_mixes_all_three_relations() {
        let solution = Solver::new().solve(&portfolio()).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 20.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.values[1] - 60.0).abs() < 1e-6, "y = {}", solution.values[1]);
        assert!((solution.values[2] - 20.0).abs() < 1e-6, "z = {}", solution.values[2]);
        assert!(
            (solution.objective_value - 6.8).abs() < 1e-6,
            "obj = {}",
            solution.objective_value
        );
    }

    #[test]
    fn optimal_point_satisfies_every_constraint() {
        let problem = portfolio();
        let solution = Solver::new().solve(&problem).unwrap();

        assert!(problem.violations(&solution.values, 1e-6).is_empty());
        for &v in &solution.values {
            assert!(v >= -1e-9, "negative structural value {}", v);
        }
    }

    #[test]
    fn box_constraints() {
        // Maximize: x + y
        // Subject to: x <= 4, y <= 4
        // Optimal: x=4, y=4, obj=8
        let mut problem = Problem::new(vec![1.0, 1.0], true);
        problem.add_constraint("x_max", vec![1.0, 0.0], Relation::Le, 4.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], Relation::Le, 4.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 4.0).abs() < 1e-6);
        assert!((solution.values[1] - 4.0).abs() < 1e-6);
        assert!((solution.objective_value - 8.0).abs() < 1e-6);
    }

    #[test]
    fn contradictory_equalities_are_infeasible() {
        // x = 5 and x = 10 cannot both hold
        let mut problem = Problem::new(vec![1.0], true);
        problem.add_constraint("five", vec![1.0], Relation::Eq, 5.0);
        problem.add_constraint("ten", vec![1.0], Relation::Eq, 10.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn missing_upper_bound_is_unbounded() {
        // Maximize x with only a floor on x
        let mut problem = Problem::new(vec![1.0], true);
        problem.add_constraint("floor", vec![1.0], Relation::Ge, 0.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert!(solution.objective_value.is_infinite() && solution.objective_value > 0.0);
    }

    #[test]
    fn negative_rhs_rows_are_renormalized() {
        // -x <= -2 is x >= 2; minimizing x must land on the bound
        let mut problem = Problem::new(vec![1.0], false);
        problem.add_constraint("floor", vec![-1.0], Relation::Le, -2.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 2.0).abs() < 1e-6, "x = {}", solution.values[0]);
        assert!((solution.objective_value - 2.0).abs() < 1e-6);
    }

    #[test]
    fn resolving_is_deterministic() {
        let problem = portfolio();
        let first = Solver::new().solve(&problem).unwrap();
        let second = Solver::new().solve(&problem).unwrap();

        assert_eq!(first.values, second.values);
        assert_eq!(first.objective_value, second.objective_value);
        assert_eq!(first.iterations, second.iterations);
    }

    #[test]
    fn constraint_order_does_not_change_the_optimum() {
        let mut reordered = Problem::new(vec![0.10, 0.07, 0.03], true);
        reordered.add_constraint("z_floor", vec![-0.25, -0.25, 1.0], Relation::Ge, 0.0);
        reordered.add_constraint("x_cap", vec![1.0, -1.0 / 3.0, 0.0], Relation::Le, 0.0);
        reordered.add_constraint("total", vec![1.0, 1.0, 1.0], Relation::Eq, 100.0);

        let base = Solver::new().solve(&portfolio()).unwrap();
        let solution = Solver::new().solve(&reordered).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value - base.objective_value).abs() < 1e-6);
    }

    #[test]
    fn iteration_cap_is_a_distinct_status() {
        let solution = Solver::new()
            .with_max_iterations(1)
            .solve(&portfolio())
            .unwrap();

        assert_eq!(solution.status, SolutionStatus::IterationLimit);
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn shape_defects_fail_before_solving() {
        let mut problem = Problem::new(vec![1.0, 2.0], true);
        problem.add_constraint("short", vec![1.0], Relation::Le, 3.0);

        let err = Solver::new().solve(&problem).unwrap_err();
        assert!(matches!(err, ProblemError::DimensionMismatch { .. }));

        let empty = Problem::new(Vec::new(), false);
        assert_eq!(
            Solver::new().solve(&empty).unwrap_err(),
            ProblemError::EmptyObjective
        );
    }

    #[test]
    fn one_shot_solve() {
        let constraints = vec![
            Constraint::new("x_max", vec![1.0, 0.0], Relation::Le, 4.0),
            Constraint::new("y_max", vec![0.0, 1.0], Relation::Le, 4.0),
        ];

        let solution = solve(vec![1.0, 1.0], constraints, true).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value - 8.0).abs() < 1e-6);
    }
}
