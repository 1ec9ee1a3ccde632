use crate::attribute_type::AttributeType;
use crate::types::{Diagnostic, Dynamic};

#[derive(Debug, Clone)]
pub struct PlanModifyRequest {
    pub state: Dynamic,
    pub plan: Dynamic,
    pub config: Dynamic,
    pub attribute_path: String,
    pub attribute_type: AttributeType,
}

#[derive(Debug, Clone)]
pub struct PlanModifyResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Trait for modifying terraform plan behavior
///
/// Plan modifiers run after Terraform has generated a plan and can:
/// - Modify the planned value
/// - Mark an attribute as requiring replacement
/// - Add warnings or errors to the plan
pub trait PlanModifier: Send + Sync {
    /// Modify the plan for an attribute
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse;

    /// True when a change to the attribute can only be applied by
    /// destroying and recreating the resource
    fn forces_replacement(&self) -> bool {
        false
    }
}

/// Marks an attribute as requiring replacement when it changes
pub struct RequiresReplaceIfChanged;

impl PlanModifier for RequiresReplaceIfChanged {
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let requires_replace = !matches!(
            (&request.state, &request.plan),
            (Dynamic::Null, _) | (Dynamic::Unknown, _) | (_, Dynamic::Unknown)
        ) && !request
            .attribute_type
            .values_equal(&request.state, &request.plan);

        PlanModifyResponse {
            plan_value: request.plan,
            requires_replace,
            diagnostics: Vec::new(),
        }
    }

    fn forces_replacement(&self) -> bool {
        true
    }
}

/// A plan modifier that uses the current state value when the planned value is unknown
///
/// Used for computed attributes such as `id` that keep their value across
/// updates.
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let plan_value = match &request.plan {
            Dynamic::Unknown | Dynamic::Null => match &request.state {
                Dynamic::Null => request.plan,
                _ => request.state.clone(),
            },
            _ => request.plan,
        };

        PlanModifyResponse {
            plan_value,
            requires_replace: false,
            diagnostics: Vec::new(),
        }
    }
}
