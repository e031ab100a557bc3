use thiserror::Error;

/// A linear program: objective, constraints, and optimization direction.
/// Structural variables are implicitly non-negative.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective coefficients, one per structural variable
    pub objective: Vec<f64>,
    /// Whether to maximize (true) or minimize (false) the objective
    pub maximize: bool,
    /// Constraints, in the order they were added
    pub constraints: Vec<Constraint>,
}

/// A single linear constraint over the structural variables
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// Coefficients for each structural variable
    pub coefficients: Vec<f64>,
    /// Comparison relation against the right-hand side
    pub relation: Relation,
    /// Right-hand side value
    pub rhs: f64,
}

/// Comparison relation of a constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

/// Structural defects in a problem, caught before any tableau is built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProblemError {
    #[error("objective has no coefficients")]
    EmptyObjective,
    #[error("constraint '{name}' has {found} coefficients, expected {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// A constraint left unsatisfied by a candidate point
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from the constraint RHS)
    pub required: f64,
    /// Value achieved by the candidate point
    pub actual: f64,
    /// How far the constraint is violated by
    pub amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

impl Constraint {
    pub fn new(
        name: impl Into<String>,
        coefficients: Vec<f64>,
        relation: Relation,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            coefficients,
            relation,
            rhs,
        }
    }
}

impl Problem {
    pub fn new(objective: Vec<f64>, maximize: bool) -> Self {
        Self {
            objective,
            maximize,
            constraints: Vec::new(),
        }
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints
            .push(Constraint::new(name, coefficients, relation, rhs));
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check the problem's shape. Every constraint must carry one coefficient
    /// per objective coefficient.
    pub fn validate(&self) -> Result<(), ProblemError> {
        if self.objective.is_empty() {
            return Err(ProblemError::EmptyObjective);
        }
        for c in &self.constraints {
            if c.coefficients.len() != self.objective.len() {
                return Err(ProblemError::DimensionMismatch {
                    name: c.name.clone(),
                    expected: self.objective.len(),
                    found: c.coefficients.len(),
                });
            }
        }
        Ok(())
    }

    /// Re-check every constraint against a candidate point and report the
    /// ones that fail, worst violation first.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for c in &self.constraints {
            let mut lhs = 0.0;
            for (j, &coef) in c.coefficients.iter().enumerate() {
                if j < values.len() {
                    lhs += coef * values[j];
                }
            }

            let (is_violated, amount, description) = match c.relation {
                Relation::Le => {
                    if lhs > c.rhs + tolerance {
                        let amt = lhs - c.rhs;
                        (
                            true,
                            amt,
                            format!("{} exceeds maximum of {:.4} by {:.4}", c.name, c.rhs, amt),
                        )
                    } else {
                        (false, 0.0, String::new())
                    }
                }
                Relation::Ge => {
                    if lhs < c.rhs - tolerance {
                        let amt = c.rhs - lhs;
                        (
                            true,
                            amt,
                            format!("{} is below minimum of {:.4} by {:.4}", c.name, c.rhs, amt),
                        )
                    } else {
                        (false, 0.0, String::new())
                    }
                }
                Relation::Eq => {
                    let diff = (lhs - c.rhs).abs();
                    if diff > tolerance {
                        (
                            true,
                            diff,
                            format!("{} requires exactly {:.4} but got {:.4}", c.name, c.rhs, lhs),
                        )
                    } else {
                        (false, 0.0, String::new())
                    }
                }
            };

            if is_violated {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual: lhs,
                    amount,
                    description,
                });
            }
        }

        violations.sort_by(|a, b| {
            b.amount
                .partial_cmp(&a.amount)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        violations
    }
}
