//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while building a component
//! catalog, evaluating components, or driving a payroll run.
//!
//! Errors are `Clone` and serializable because evaluation failures are not
//! thrown away: they are stored on the [`EvaluationResult`](crate::models::EvaluationResult)
//! of the component that failed and surfaced to the operator-facing report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for the payroll engine.
///
/// Every variant carries enough structured context (component id, employee
/// id when known, offending field) to render an actionable audit message.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::MissingInput {
///     component_id: "housing_allowance".to_string(),
///     employee_id: None,
///     field: "basic_salary".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Missing input 'basic_salary' for component 'housing_allowance'"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A component id was not found in the catalog.
    #[error("Component not found: {component_id}")]
    ComponentNotFound {
        /// The component id that was not found.
        component_id: String,
    },

    /// Two components in one catalog share the same id.
    #[error("Duplicate component id: {component_id}")]
    DuplicateComponent {
        /// The duplicated id.
        component_id: String,
    },

    /// A component group or template was not found in the catalog.
    #[error("Component {kind} not found: {set_id}")]
    ComponentSetNotFound {
        /// "group" or "template".
        kind: String,
        /// The id that was not found.
        set_id: String,
    },

    /// A component group or template id is already taken.
    #[error("Duplicate component {kind} id: {set_id}")]
    DuplicateComponentSet {
        /// "group" or "template".
        kind: String,
        /// The duplicated id.
        set_id: String,
    },

    /// A component depends on a component that is not part of the same set.
    #[error("Component '{component_id}' depends on unknown component '{dependency}'")]
    UnknownDependency {
        /// The dependent component.
        component_id: String,
        /// The missing dependency.
        dependency: String,
    },

    /// A component definition is internally inconsistent.
    #[error("Invalid component '{component_id}' field '{field}': {message}")]
    InvalidComponent {
        /// The component id.
        component_id: String,
        /// The offending field.
        field: String,
        /// A description of the problem.
        message: String,
    },

    /// A required context field or component parameter is absent.
    #[error("Missing input '{field}' for component '{component_id}'")]
    MissingInput {
        /// The component being evaluated or constructed.
        component_id: String,
        /// The employee being evaluated, if known.
        employee_id: Option<String>,
        /// The missing field or parameter.
        field: String,
    },

    /// A formula is malformed or could not be evaluated.
    #[serde(rename = "FORMULA_ERROR")]
    #[error("Formula error in component '{component_id}' ({formula}): {message}")]
    Formula {
        /// The component whose formula failed.
        component_id: String,
        /// The employee being evaluated, if known.
        employee_id: Option<String>,
        /// The formula source text.
        formula: String,
        /// What went wrong.
        message: String,
    },

    /// The dependency graph contains a cycle.
    #[error("Cyclic dependency between components: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// The members of the cycle, in traversal order.
        cycle: Vec<String>,
    },

    /// A dependency of the component failed, so the component was not evaluated.
    #[error("Component '{component_id}' skipped: dependency '{dependency}' failed")]
    DependencyFailed {
        /// The component that was skipped.
        component_id: String,
        /// The employee being evaluated, if known.
        employee_id: Option<String>,
        /// The dependency whose evaluation failed.
        dependency: String,
    },

    /// A payroll run cannot move forward while evaluation errors are unresolved.
    #[error("Payroll run {run_id} has {unresolved} unresolved evaluation error(s)")]
    RunBlocked {
        /// The run id.
        run_id: String,
        /// Number of failed employee/component evaluations.
        unresolved: usize,
    },

    /// A payroll run lifecycle action is not allowed from the current status.
    #[error("Payroll run {run_id} cannot {action} from status '{from}'")]
    InvalidRunTransition {
        /// The run id.
        run_id: String,
        /// The current status.
        from: String,
        /// The attempted action.
        action: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Returns the stable machine-readable code of this error.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            EngineError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            EngineError::ComponentNotFound { .. } => "COMPONENT_NOT_FOUND",
            EngineError::DuplicateComponent { .. } => "DUPLICATE_COMPONENT",
            EngineError::ComponentSetNotFound { .. } => "COMPONENT_SET_NOT_FOUND",
            EngineError::DuplicateComponentSet { .. } => "DUPLICATE_COMPONENT_SET",
            EngineError::UnknownDependency { .. } => "UNKNOWN_DEPENDENCY",
            EngineError::InvalidComponent { .. } => "INVALID_COMPONENT",
            EngineError::MissingInput { .. } => "MISSING_INPUT",
            EngineError::Formula { .. } => "FORMULA_ERROR",
            EngineError::CyclicDependency { .. } => "CYCLIC_DEPENDENCY",
            EngineError::DependencyFailed { .. } => "DEPENDENCY_FAILED",
            EngineError::RunBlocked { .. } => "RUN_BLOCKED",
            EngineError::InvalidRunTransition { .. } => "INVALID_RUN_TRANSITION",
            EngineError::CalculationError { .. } => "CALCULATION_ERROR",
        }
    }

    /// Returns the component this error is about, if any.
    pub fn component_id(&self) -> Option<&str> {
        match self {
            EngineError::ComponentNotFound { component_id }
            | EngineError::DuplicateComponent { component_id }
            | EngineError::UnknownDependency { component_id, .. }
            | EngineError::InvalidComponent { component_id, .. }
            | EngineError::MissingInput { component_id, .. }
            | EngineError::Formula { component_id, .. }
            | EngineError::DependencyFailed { component_id, .. } => Some(component_id),
            _ => None,
        }
    }

    /// Returns the employee this error is about, if known.
    pub fn employee_id(&self) -> Option<&str> {
        match self {
            EngineError::MissingInput { employee_id, .. }
            | EngineError::Formula { employee_id, .. }
            | EngineError::DependencyFailed { employee_id, .. } => employee_id.as_deref(),
            _ => None,
        }
    }

    /// Attaches an employee id to evaluation errors that do not have one yet.
    pub fn for_employee(mut self, employee: Option<&str>) -> Self {
        if let EngineError::MissingInput { employee_id, .. }
        | EngineError::Formula { employee_id, .. }
        | EngineError::DependencyFailed { employee_id, .. } = &mut self
        {
            if employee_id.is_none() {
                *employee_id = employee.map(str::to_string);
            }
        }
        self
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/components.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/components.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_cyclic_dependency_lists_cycle_members() {
        let error = EngineError::CyclicDependency {
            cycle: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Cyclic dependency between components: a -> b -> c"
        );
    }

    #[test]
    fn test_formula_error_displays_component_and_formula() {
        let error = EngineError::Formula {
            component_id: "bonus".to_string(),
            employee_id: Some("emp_001".to_string()),
            formula: "base_salary *".to_string(),
            message: "unexpected end of formula".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Formula error in component 'bonus' (base_salary *): unexpected end of formula"
        );
    }

    #[test]
    fn test_serializes_with_code_tag() {
        let error = EngineError::MissingInput {
            component_id: "housing".to_string(),
            employee_id: Some("emp_001".to_string()),
            field: "basic_salary".to_string(),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "MISSING_INPUT");
        assert_eq!(json["component_id"], "housing");
        assert_eq!(json["employee_id"], "emp_001");
        assert_eq!(json["field"], "basic_salary");
    }

    #[test]
    fn test_code_matches_serialized_tag() {
        let errors = vec![
            EngineError::Formula {
                component_id: "x".to_string(),
                employee_id: None,
                formula: "1 +".to_string(),
                message: "bad".to_string(),
            },
            EngineError::CyclicDependency { cycle: vec![] },
            EngineError::ComponentSetNotFound {
                kind: "group".to_string(),
                set_id: "benefits".to_string(),
            },
            EngineError::RunBlocked {
                run_id: "r".to_string(),
                unresolved: 2,
            },
        ];
        for error in errors {
            let json = serde_json::to_value(&error).unwrap();
            assert_eq!(json["code"], error.code());
        }
    }

    #[test]
    fn test_for_employee_fills_missing_employee_only() {
        let error = EngineError::MissingInput {
            component_id: "housing".to_string(),
            employee_id: None,
            field: "basic_salary".to_string(),
        }
        .for_employee(Some("emp_002"));
        assert_eq!(error.employee_id(), Some("emp_002"));

        let error = error.for_employee(Some("emp_003"));
        assert_eq!(error.employee_id(), Some("emp_002"));
        assert_eq!(error.component_id(), Some("housing"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_found() -> EngineResult<()> {
            Err(EngineError::ComponentNotFound {
                component_id: "missing".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
