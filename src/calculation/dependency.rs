//! Dependency resolution.
//!
//! Components may depend on the resolved amounts of other components. This
//! module orders a component set so that every component comes after its
//! dependencies, and rejects sets that cannot be ordered.

use std::collections::{BTreeMap, HashMap};

use crate::error::{EngineError, EngineResult};
use crate::models::PayrollComponent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Returns the component ids in an order where every component follows all
/// of its dependencies.
///
/// Dependencies are the declared `depends_on` edges plus any
/// `components.<id>.amount` field the rule reads. The order among
/// components with no path between them is unspecified.
///
/// # Errors
///
/// - `DuplicateComponent` if two components share an id.
/// - `UnknownDependency` if a component depends on an id outside the set.
/// - `CyclicDependency` naming the members of the first cycle found, in
///   traversal order.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::resolve_order;
/// use payroll_engine::models::{CalculationRule, ComponentType, PayrollComponent};
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
///         rate: Decimal::from(15),
///         applies_to: "components.basic.amount".to_string(),
///     },
/// );
///
/// let order = resolve_order(&[housing, basic]).unwrap();
/// assert_eq!(order, vec!["basic".to_string(), "housing".to_string()]);
/// ```
pub fn resolve_order(components: &[PayrollComponent]) -> EngineResult<Vec<String>> {
    let mut graph: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for component in components {
        let dependencies = component.dependencies().into_iter().collect();
        if graph.insert(component.id.as_str(), dependencies).is_some() {
            return Err(EngineError::DuplicateComponent {
                component_id: component.id.clone(),
            });
        }
    }

    for (id, dependencies) in &graph {
        if let Some(unknown) = dependencies.iter().find(|d| !graph.contains_key(d.as_str())) {
            return Err(EngineError::UnknownDependency {
                component_id: id.to_string(),
                dependency: unknown.clone(),
            });
        }
    }

    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.len());
    let mut order = Vec::with_capacity(graph.len());
    let mut stack: Vec<&str> = Vec::new();

    for component in components {
        visit(component.id.as_str(), &graph, &mut marks, &mut stack, &mut order)?;
    }

    Ok(order)
}

fn visit<'a>(
    id: &'a str,
    graph: &'a BTreeMap<&'a str, Vec<String>>,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
    order: &mut Vec<String>,
) -> EngineResult<()> {
    match marks.get(id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|member| *member == id).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..].iter().map(|m| m.to_string()).collect();
            cycle.push(id.to_string());
            return Err(EngineError::CyclicDependency { cycle });
        }
        None => {}
    }

    marks.insert(id, Mark::Visiting);
    stack.push(id);

    if let Some(dependencies) = graph.get(id) {
        for dependency in dependencies {
            visit(dependency.as_str(), graph, marks, stack, order)?;
        }
    }

    stack.pop();
    marks.insert(id, Mark::Done);
    order.push(id.to_string());
    Ok(())
}
