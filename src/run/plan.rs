//! Evaluation plans and per-employee evaluation.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, warn};

use crate::calculation::{evaluate, resolve_order};
use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeCalculation, EvaluationContext, EvaluationResult, PayrollComponent};

/// The inputs for one employee in a payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeInput {
    /// The employee.
    pub employee_id: String,
    /// The employee's context (salary, attendance, attributes, period).
    #[serde(default)]
    pub context: EvaluationContext,
}

impl EmployeeInput {
    /// Creates an input for an employee.
    pub fn new(employee_id: impl Into<String>, context: EvaluationContext) -> Self {
        Self {
            employee_id: employee_id.into(),
            context,
        }
    }
}

/// A component set in dependency order, ready to evaluate.
///
/// The order is resolved once, when the plan is built; a cycle or an
/// unknown dependency blocks the whole plan. Plans are immutable and are
/// shared between concurrent employee evaluations through an [`Arc`].
///
/// # Example
///
/// ```
/// use payroll_engine::models::{CalculationRule, ComponentType, EvaluationContext, PayrollComponent};
/// use payroll_engine::run::{EmployeeInput, EvaluationPlan};
/// use rust_decimal::Decimal;
///
/// let basic = PayrollComponent::new(
///     "basic",
///     "Basic Salary",
///     ComponentType::Earning,
///     CalculationRule::Fixed { value: Decimal::from(5000) },
/// );
/// let housing = PayrollComponent::new(
///     "housing",
///     "Housing Allowance",
///     ComponentType::Allowance,
///     CalculationRule::Percentage {
///         rate: Decimal::from(20),
///         applies_to: "components.basic.amount".to_string(),
///     },
/// );
///
/// let plan = EvaluationPlan::new(vec![housing, basic]).unwrap();
/// let calculation = plan.evaluate_employee(&EmployeeInput::new("emp_001", EvaluationContext::new()));
///
/// assert_eq!(calculation.totals.gross_pay, Decimal::from(6000));
/// ```
#[derive(Debug, Clone)]
pub struct EvaluationPlan {
    components: Vec<PayrollComponent>,
}

impl EvaluationPlan {
    /// Orders the components by their dependencies.
    pub fn new(components: Vec<PayrollComponent>) -> EngineResult<Self> {
        let order = resolve_order(&components)?;

        let mut by_id: HashMap<String, PayrollComponent> = components
            .into_iter()
            .map(|component| (component.id.clone(), component))
            .collect();
        let components = order.iter().filter_map(|id| by_id.remove(id)).collect();

        debug!(order = ?order, "Resolved evaluation order");
        Ok(Self { components })
    }

    /// Returns the components in evaluation order.
    pub fn components(&self) -> &[PayrollComponent] {
        &self.components
    }

    /// Returns the component ids in evaluation order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.id.as_str())
    }

    /// Returns the number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns whether the plan has no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns a component by id.
    pub fn component(&self, component_id: &str) -> Option<&PayrollComponent> {
        self.components.iter().find(|c| c.id == component_id)
    }

    /// Evaluates every component for one employee, in dependency order.
    ///
    /// Each successful component publishes its effective amount to the
    /// context of later components as `components.<id>.amount`. A component
    /// whose dependency failed is not evaluated and fails with
    /// `DependencyFailed`; other components are unaffected.
    pub fn evaluate_employee(&self, input: &EmployeeInput) -> EmployeeCalculation {
        let mut context = input.context.clone();
        context.employee_id = Some(input.employee_id.clone());

        let results = evaluate_in_order(self.components.iter(), context);
        EmployeeCalculation::from_results(input.employee_id.clone(), results)
    }

    /// Evaluates one component and, before it, everything it depends on.
    ///
    /// Returns the results in evaluation order; the requested component's
    /// result is last.
    pub fn evaluate_with_dependencies(
        &self,
        component_id: &str,
        context: &EvaluationContext,
    ) -> EngineResult<Vec<EvaluationResult>> {
        let target = self
            .component(component_id)
            .ok_or_else(|| EngineError::ComponentNotFound {
                component_id: component_id.to_string(),
            })?;

        let mut needed: BTreeSet<String> = BTreeSet::new();
        let mut pending = vec![target.id.clone()];
        while let Some(id) = pending.pop() {
            if !needed.insert(id.clone()) {
                continue;
            }
            if let Some(component) = self.component(&id) {
                pending.extend(component.dependencies());
            }
        }

        let subset = self.components.iter().filter(|c| needed.contains(&c.id));
        Ok(evaluate_in_order(subset, context.clone()))
    }
}

fn evaluate_in_order<'a>(
    components: impl Iterator<Item = &'a PayrollComponent>,
    mut context: EvaluationContext,
) -> Vec<EvaluationResult> {
    let mut failed: HashSet<&str> = HashSet::new();
    let mut results = Vec::new();

    for component in components {
        let failed_dependency = component
            .dependencies()
            .into_iter()
            .find(|dependency| failed.contains(dependency.as_str()));

        let result = match failed_dependency {
            Some(dependency) => EvaluationResult::failed(
                component,
                context.employee_id(),
                EngineError::DependencyFailed {
                    component_id: component.id.clone(),
                    employee_id: None,
                    dependency,
                },
            ),
            None => evaluate(component, &context),
        };

        if result.success {
            context.insert_component_amount(&component.id, result.effective_amount());
        } else {
            failed.insert(component.id.as_str());
        }
        results.push(result);
    }

    results
}

/// Evaluates many employees concurrently against one plan.
///
/// Each employee is evaluated on its own tokio task; results are returned
/// in input order. Component-level failures are recorded in each
/// [`EmployeeCalculation`]. A task that panics or is cancelled yields a
/// failed calculation for its employee; the other employees are unaffected.
pub async fn process_employees(
    plan: Arc<EvaluationPlan>,
    inputs: Vec<EmployeeInput>,
) -> Vec<EmployeeCalculation> {
    let employee_ids: Vec<String> = inputs.iter().map(|i| i.employee_id.clone()).collect();
    let mut tasks = JoinSet::new();
    let mut task_slots: HashMap<Id, usize> = HashMap::with_capacity(inputs.len());

    for (index, input) in inputs.into_iter().enumerate() {
        let plan = Arc::clone(&plan);
        let handle = tasks.spawn(async move { (index, plan.evaluate_employee(&input)) });
        task_slots.insert(handle.id(), index);
    }

    let mut slots: Vec<Option<EmployeeCalculation>> = vec![None; employee_ids.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, calculation)) => {
                debug!(
                    employee_id = %calculation.employee_id,
                    failures = calculation.failures.len(),
                    "Evaluated employee"
                );
                slots[index] = Some(calculation);
            }
            Err(err) => {
                let Some(&index) = task_slots.get(&err.id()) else {
                    continue;
                };
                warn!(
                    employee_id = %employee_ids[index],
                    error = %err,
                    "Employee evaluation task failed"
                );
                slots[index] = Some(task_failure(&employee_ids[index], &err));
            }
        }
    }

    slots
        .into_iter()
        .zip(&employee_ids)
        .map(|(slot, employee_id)| {
            slot.unwrap_or_else(|| {
                EmployeeCalculation::failed(
                    employee_id.clone(),
                    EngineError::CalculationError {
                        message: format!("no evaluation recorded for employee '{employee_id}'"),
                    },
                )
            })
        })
        .collect()
}

fn task_failure(employee_id: &str, err: &JoinError) -> EmployeeCalculation {
    EmployeeCalculation::failed(
        employee_id,
        EngineError::CalculationError {
            message: format!("evaluation task for employee '{employee_id}' failed: {err}"),
        },
    )
}
