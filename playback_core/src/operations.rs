//! Operations Executor - applies node operations and reverses them.
//!
//! Every applied operation is recorded in `GameState::executed_operations`
//! together with the variable's previous value, so going back through history
//! restores variables exactly.

use chrono::Utc;
use tracing::{debug, warn};

use story_graph::{
    Node, NodeId, OperationKind, OperationTarget, StoryData, VariableKind, VariableOperation,
    VariableValue,
};

use crate::conditions::strategies::{as_bool, as_number};
use crate::error::OperationError;
use crate::events::{EventBus, StoryEventKind};
use crate::state::{GameState, OperationRecord};

/// Applies and rolls back variable operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationsExecutor;

impl OperationsExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute the enabled operations of a narrative node, in order.
    ///
    /// Choice nodes and a missing story are warned about and skipped.
    /// Returns the records appended to the state.
    pub fn execute(
        &self,
        node: &Node,
        state: &mut GameState,
        story: Option<&StoryData>,
        events: &EventBus,
    ) -> Vec<OperationRecord> {
        if story.is_none() {
            warn!(node_id = %node.id(), "No story loaded, skipping operations");
            return Vec::new();
        }
        let Node::Narrative(narrative) = node else {
            warn!(node_id = %node.id(), "Operations are not executed on choice nodes");
            return Vec::new();
        };

        let mut operations: Vec<&VariableOperation> =
            narrative.operations.iter().filter(|op| op.enabled).collect();
        // Stable: equal order indices keep their stored order.
        operations.sort_by_key(|op| op.order);

        let mut records = Vec::with_capacity(operations.len());
        for operation in operations {
            match self.apply(operation, &narrative.id, state) {
                Ok(record) => {
                    debug!(
                        node_id = %narrative.id,
                        variable = %operation.variable_id,
                        kind = operation.kind.as_str(),
                        result = %record.result_value,
                        "Operation executed"
                    );
                    state.executed_operations.push(record.clone());
                    events.emit(StoryEventKind::OperationExecuted {
                        node_id: narrative.id.clone(),
                        record: record.clone(),
                    });
                    records.push(record);
                }
                Err(err) => {
                    warn!(
                        node_id = %narrative.id,
                        operation_id = %operation.id,
                        error = %err,
                        "Operation skipped"
                    );
                }
            }
        }
        records
    }

    /// Undo every recorded operation owned by a node, newest first, and drop
    /// the records. Returns how many records were rolled back.
    pub fn rollback_node_operations(
        &self,
        node_id: &NodeId,
        state: &mut GameState,
        events: &EventBus,
    ) -> usize {
        self.rollback_where(node_id, state, events, |_| true)
    }

    /// Undo only the operations of one visit: the one recorded at position
    /// `visit_index` of `history`. Earlier visits of the same node stay
    /// applied. Legacy records without a visit index are treated as part of
    /// the visit.
    pub fn rollback_visit(
        &self,
        node_id: &NodeId,
        visit_index: usize,
        state: &mut GameState,
        events: &EventBus,
    ) -> usize {
        self.rollback_where(node_id, state, events, |r| {
            r.visit_index.map_or(true, |i| i == visit_index)
        })
    }

    fn rollback_where(
        &self,
        node_id: &NodeId,
        state: &mut GameState,
        events: &EventBus,
        in_scope: impl Fn(&OperationRecord) -> bool,
    ) -> usize {
        let (to_undo, kept): (Vec<OperationRecord>, Vec<OperationRecord>) =
            std::mem::take(&mut state.executed_operations)
                .into_iter()
                .partition(|r| &r.executed_in_node_id == node_id && in_scope(r));
        state.executed_operations = kept;

        for record in to_undo.iter().rev() {
            if let Err(err) = self.undo(record, state) {
                warn!(node_id = %node_id, error = %err, "Rollback was not exact");
            }
        }

        let count = to_undo.len();
        debug!(node_id = %node_id, count, "Operations rolled back");
        events.emit(StoryEventKind::OperationsRolledBack {
            node_id: node_id.clone(),
            count,
        });
        count
    }

    fn apply(
        &self,
        operation: &VariableOperation,
        node_id: &NodeId,
        state: &mut GameState,
    ) -> Result<OperationRecord, OperationError> {
        let operand = resolve_operand(operation, state)?;
        // The visiting node is pushed to history right after its operations.
        let visit_index = state.history.len();
        let variable = state
            .variables
            .get_mut(&operation.variable_id)
            .ok_or_else(|| OperationError::UnknownVariable(operation.variable_id.clone()))?;

        let previous = variable.value.clone();
        let result = compute(operation, variable.kind, &previous, operand.as_ref())?;
        variable.value = result.clone();

        Ok(OperationRecord {
            operation: operation.clone(),
            executed_in_node_id: node_id.clone(),
            visit_index: Some(visit_index),
            previous_value: Some(previous),
            result_value: result,
            operand,
            executed_at: Utc::now(),
        })
    }

    fn undo(&self, record: &OperationRecord, state: &mut GameState) -> Result<(), OperationError> {
        let operation = &record.operation;
        let variable = state
            .variables
            .get_mut(&operation.variable_id)
            .ok_or_else(|| OperationError::UnknownVariable(operation.variable_id.clone()))?;

        if let Some(previous) = &record.previous_value {
            variable.value = previous.clone();
            return Ok(());
        }

        // Legacy records without a previous value: approximate inverse.
        // Override and join have none and leave the value as is.
        variable.value = inverse(
            operation,
            variable.kind,
            &variable.value,
            record.operand.as_ref(),
        )?;
        Ok(())
    }
}

/// Operand of an operation. `Variable` targets read the current value, so
/// later operations of the same node see earlier ones' effects.
fn resolve_operand(
    operation: &VariableOperation,
    state: &GameState,
) -> Result<Option<VariableValue>, OperationError> {
    match &operation.target {
        Some(OperationTarget::Custom(value)) => Ok(Some(value.clone())),
        Some(OperationTarget::Variable(id)) => state
            .value_of(id)
            .cloned()
            .map(Some)
            .ok_or_else(|| OperationError::UnknownVariable(id.clone())),
        None => Ok(None),
    }
}

fn compute(
    operation: &VariableOperation,
    kind: VariableKind,
    current: &VariableValue,
    operand: Option<&VariableValue>,
) -> Result<VariableValue, OperationError> {
    let mismatch = || OperationError::TypeMismatch {
        operation: operation.kind,
        kind,
        variable: operation.variable_id.clone(),
    };
    let missing = || OperationError::MissingOperand(operation.kind);

    match operation.kind {
        OperationKind::Override => operand.cloned().ok_or_else(missing),
        OperationKind::Addition
        | OperationKind::Subtract
        | OperationKind::Multiply
        | OperationKind::Divide => {
            let value = as_number(current).ok_or_else(mismatch)?;
            let rhs = operand.and_then(as_number).ok_or_else(missing)?;
            let result = match operation.kind {
                OperationKind::Addition => value + rhs,
                OperationKind::Subtract => value - rhs,
                OperationKind::Multiply => value * rhs,
                _ if rhs == 0.0 => {
                    debug!(
                        variable = %operation.variable_id,
                        "Division by zero leaves value unchanged"
                    );
                    value
                }
                _ => value / rhs,
            };
            Ok(VariableValue::Number(round_for_kind(result, kind)))
        }
        OperationKind::Invert => {
            if kind != VariableKind::Boolean {
                return Err(mismatch());
            }
            let value = as_bool(current).ok_or_else(mismatch)?;
            Ok(VariableValue::Bool(!value))
        }
        OperationKind::Join => {
            if kind != VariableKind::String {
                return Err(mismatch());
            }
            let suffix = operand.ok_or_else(missing)?;
            Ok(VariableValue::Text(format!(
                "{}{}",
                current.to_display_string(),
                suffix.to_display_string()
            )))
        }
    }
}

/// Best-effort inverse used only when no previous value was recorded.
fn inverse(
    operation: &VariableOperation,
    kind: VariableKind,
    current: &VariableValue,
    operand: Option<&VariableValue>,
) -> Result<VariableValue, OperationError> {
    let irreversible = || OperationError::Irreversible {
        operation: operation.kind,
        variable: operation.variable_id.clone(),
    };

    match operation.kind {
        OperationKind::Override | OperationKind::Join => Err(irreversible()),
        OperationKind::Invert => as_bool(current)
            .map(|b| VariableValue::Bool(!b))
            .ok_or_else(irreversible),
        OperationKind::Addition
        | OperationKind::Subtract
        | OperationKind::Multiply
        | OperationKind::Divide => {
            let value = as_number(current).ok_or_else(irreversible)?;
            let rhs = operand.and_then(as_number).ok_or_else(irreversible)?;
            let restored = match operation.kind {
                OperationKind::Addition => value - rhs,
                OperationKind::Subtract => value + rhs,
                OperationKind::Multiply if rhs == 0.0 => return Err(irreversible()),
                OperationKind::Multiply => value / rhs,
                _ if rhs == 0.0 => value,
                _ => value * rhs,
            };
            Ok(VariableValue::Number(round_for_kind(restored, kind)))
        }
    }
}

/// Integer variables round half away from zero: 2.5 becomes 3 and -2.5
/// becomes -3.
fn round_for_kind(value: f64, kind: VariableKind) -> f64 {
    if kind == VariableKind::Integer {
        value.round()
    } else {
        value
    }
}
