// eval.rs
//! Evaluation of a live configuration.
//!
//! The evaluator walks a tree post-order with an explicit frame stack and
//! an operand stack. Logical operators decide after their left operand: if
//! it already fixes the outcome, the right operand's frames are dropped
//! unvisited, so nothing nested in it runs.
//!
//! Writes made by assignments and pre-increments are applied to the
//! environment as they happen, so later reads in the same tree observe
//! them, and are also returned as [`Writeback`]s.

use holesmith_ops::{OpError, Type, Value};

use crate::arena::{ChoiceArena, NodeId};
use crate::config::Configuration;
use crate::env::{Environment, Place};
use crate::fault::{Fault, InternalFault, RuntimeFault};
use crate::node::{ChoiceNode, IndexChoice, OperatorSet};

/// A store performed during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Writeback {
    pub place: Place,
    pub value: Value,
}

/// The result of evaluating one tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: Value,
    pub writebacks: Vec<Writeback>,
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    Enter(NodeId),
    Exit(NodeId),
    /// Decide a logical node from its left operand.
    Decide(NodeId),
}

#[derive(Debug)]
struct Operand {
    value: Value,
    place: Option<Place>,
}

impl Operand {
    fn value(value: Value) -> Self {
        Self { value, place: None }
    }
}

/// Evaluates trees of an arena under one configuration.
pub struct Evaluator<'a> {
    arena: &'a ChoiceArena,
    config: &'a Configuration,
}

impl<'a> Evaluator<'a> {
    pub fn new(arena: &'a ChoiceArena, config: &'a Configuration) -> Self {
        Self { arena, config }
    }

    /// Evaluate `root` against `env`.
    pub fn evaluate(&self, root: NodeId, env: &mut Environment) -> Result<Evaluation, Fault> {
        let mut frames = vec![Frame::Enter(root)];
        let mut operands: Vec<Operand> = Vec::new();
        let mut writebacks = Vec::new();

        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Enter(id) => self.enter(id, env, &mut frames, &mut operands)?,
                Frame::Decide(id) => self.decide(id, &mut frames, &mut operands)?,
                Frame::Exit(id) => {
                    let operand = self.exit(id, env, &mut operands, &mut writebacks)?;
                    operands.push(operand);
                }
            }
        }

        let value = operands
            .pop()
            .ok_or(InternalFault::StackUnderflow { node: root })?;
        if !operands.is_empty() {
            return Err(InternalFault::UnbalancedStack {
                depth: operands.len() + 1,
            }
            .into());
        }
        Ok(Evaluation {
            value: value.value,
            writebacks,
        })
    }

    fn enter(
        &self,
        id: NodeId,
        env: &Environment,
        frames: &mut Vec<Frame>,
        operands: &mut Vec<Operand>,
    ) -> Result<(), Fault> {
        match self.arena.get(id) {
            ChoiceNode::Immutable(_) | ChoiceNode::Literal { .. } => {
                operands.push(Operand::value(self.config.literal(self.arena, id)?));
            }
            ChoiceNode::Ident { .. } => {
                let name = self.config.name(id)?;
                let value = env
                    .read(name)
                    .cloned()
                    .ok_or_else(|| InternalFault::UnknownSymbol {
                        name: name.to_string(),
                    })?;
                operands.push(Operand {
                    value,
                    place: Some(Place::Var(name.to_string())),
                });
            }
            ChoiceNode::Element { array, index } => {
                frames.push(Frame::Exit(id));
                if let IndexChoice::Explicit(index) = index {
                    frames.push(Frame::Enter(*index));
                }
                frames.push(Frame::Enter(*array));
            }
            ChoiceNode::Binary { op, left, right } => {
                frames.push(Frame::Exit(id));
                frames.push(Frame::Enter(*right));
                if matches!(self.arena.get(*op), ChoiceNode::Operator(OperatorSet::Logic(_))) {
                    frames.push(Frame::Decide(id));
                }
                frames.push(Frame::Enter(*left));
            }
            ChoiceNode::Assign { target, value } => {
                frames.push(Frame::Exit(id));
                frames.push(Frame::Enter(*target));
                frames.push(Frame::Enter(*value));
            }
            ChoiceNode::PreInc { target } => {
                frames.push(Frame::Exit(id));
                frames.push(Frame::Enter(*target));
            }
            ChoiceNode::Cast { operand, .. } => {
                frames.push(Frame::Exit(id));
                frames.push(Frame::Enter(*operand));
            }
            ChoiceNode::Alt { .. } => frames.push(Frame::Enter(self.config.option(id)?)),
            ChoiceNode::Operator(_) => {
                return Err(InternalFault::TypeMismatch {
                    node: id,
                    detail: "operator evaluated as a value".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn decide(&self, id: NodeId, frames: &mut Vec<Frame>, operands: &mut [Operand]) -> Result<(), Fault> {
        let ChoiceNode::Binary { op, right, .. } = self.arena.get(id) else {
            return Err(self.mismatch(id, "decision on a non-binary node"));
        };
        let left = operands
            .last_mut()
            .ok_or(InternalFault::StackUnderflow { node: id })?;
        let left_value = left
            .value
            .as_bool()
            .ok_or_else(|| self.mismatch(id, "non-boolean logical operand"))?;
        let logic = self.config.logic_op(self.arena, *op)?;
        if let Some(outcome) = logic.short_circuit(left_value) {
            let skipped_right = frames.pop();
            let skipped_exit = frames.pop();
            let expected = matches!(skipped_right, Some(Frame::Enter(r)) if r == *right)
                && matches!(skipped_exit, Some(Frame::Exit(e)) if e == id);
            if !expected {
                return Err(self.mismatch(id, "short-circuit frames out of order"));
            }
            *left = Operand::value(Value::Bool(outcome));
        }
        Ok(())
    }

    fn exit(
        &self,
        id: NodeId,
        env: &mut Environment,
        operands: &mut Vec<Operand>,
        writebacks: &mut Vec<Writeback>,
    ) -> Result<Operand, Fault> {
        let mut pop = || operands.pop().ok_or(InternalFault::StackUnderflow { node: id });
        match self.arena.get(id) {
            ChoiceNode::Element { index, .. } => {
                let index = match index {
                    IndexChoice::Explicit(_) => {
                        let operand = pop()?;
                        operand
                            .value
                            .as_i64()
                            .ok_or_else(|| self.mismatch(id, "non-integral index"))?
                    }
                    IndexChoice::Inferred => self.config.inferred_index(id)? as i64,
                };
                let container = pop()?;
                let items = container
                    .value
                    .elements()
                    .ok_or_else(|| self.mismatch(id, "indexing a non-array"))?;
                let slot = usize::try_from(index)
                    .ok()
                    .filter(|i| *i < items.len())
                    .ok_or(RuntimeFault::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    })?;
                Ok(Operand {
                    value: items[slot].clone(),
                    place: container.place.map(|base| Place::Element {
                        base: Box::new(base),
                        index: slot,
                    }),
                })
            }
            ChoiceNode::Binary { op, .. } => {
                let right = pop()?;
                let left = pop()?;
                let value = self.apply(*op, &left.value, &right.value)?;
                Ok(Operand::value(value))
            }
            ChoiceNode::Assign { target, .. } => {
                let target_operand = pop()?;
                let value = pop()?;
                let place = target_operand
                    .place
                    .ok_or(InternalFault::NotAddressable { node: *target })?;
                let stored = self.convert(id, value.value, self.arena.ty(*target))?;
                env.store(&place, stored.clone())?;
                writebacks.push(Writeback {
                    place,
                    value: stored.clone(),
                });
                Ok(Operand::value(stored))
            }
            ChoiceNode::PreInc { target } => {
                let target_operand = pop()?;
                let place = target_operand
                    .place
                    .ok_or(InternalFault::NotAddressable { node: *target })?;
                let bumped = target_operand
                    .value
                    .increment()
                    .map_err(|e| self.mismatch(id, &e.to_string()))?;
                env.store(&place, bumped.clone())?;
                writebacks.push(Writeback {
                    place,
                    value: bumped.clone(),
                });
                Ok(Operand::value(bumped))
            }
            ChoiceNode::Cast { to, .. } => {
                let operand = pop()?;
                let value = self.convert(id, operand.value, Type::Primitive(*to))?;
                Ok(Operand::value(value))
            }
            other => Err(self.mismatch(id, &format!("{} node has no exit step", other.kind_name()))),
        }
    }

    fn apply(&self, op: NodeId, left: &Value, right: &Value) -> Result<Value, Fault> {
        let pick = self.config.operator(op)?;
        let ChoiceNode::Operator(set) = self.arena.get(op) else {
            return Err(self.mismatch(op, "expected an operator node"));
        };
        let result = match set {
            OperatorSet::Arith(ops) => ops.get(pick).map(|o| o.apply(left, right)),
            OperatorSet::Shift(ops) => ops.get(pick).map(|o| o.apply(left, right)),
            OperatorSet::Rel(ops) => ops.get(pick).map(|o| o.apply(left, right)),
            OperatorSet::Logic(ops) => ops.get(pick).map(|o| o.apply(left, right)),
        }
        .ok_or(InternalFault::Unresolved { node: op })?;
        result.map_err(|e| self.op_fault(op, e))
    }

    fn convert(&self, id: NodeId, value: Value, to: Type) -> Result<Value, Fault> {
        match to {
            Type::Primitive(prim) if value.ty() != to => {
                value.cast(prim).map_err(|e| self.op_fault(id, e))
            }
            _ if value.ty() == to => Ok(value),
            _ => Err(self.mismatch(id, &format!("cannot store {} into {}", value.ty(), to))),
        }
    }

    fn op_fault(&self, id: NodeId, error: OpError) -> Fault {
        if error.is_arithmetic() {
            RuntimeFault::Arithmetic(error.to_string()).into()
        } else {
            self.mismatch(id, &error.to_string())
        }
    }

    fn mismatch(&self, node: NodeId, detail: &str) -> Fault {
        InternalFault::TypeMismatch {
            node,
            detail: detail.to_string(),
        }
        .into()
    }
}

/// Evaluate a boolean condition tree.
pub fn evaluate_condition(
    arena: &ChoiceArena,
    config: &Configuration,
    root: NodeId,
    env: &mut Environment,
) -> Result<bool, Fault> {
    let eval = Evaluator::new(arena, config).evaluate(root, env)?;
    eval.value.as_bool().ok_or_else(|| {
        InternalFault::TypeMismatch {
            node: root,
            detail: format!("condition produced {}", eval.value.ty()),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChoiceBuilder, Explorer};
    use holesmith_ops::{ArithOp, CandidateDomains, LogicOp, PrimitiveType, RelOp};

    fn first(arena: &ChoiceArena, root: NodeId, env: &Environment) -> Configuration {
        let mut config = Configuration::new(arena);
        let domains = CandidateDomains::default();
        Explorer::new(arena, &mut config, &domains, env)
            .next(root)
            .unwrap();
        config
    }

    fn counter_env() -> Environment {
        let mut env = Environment::new();
        env.declare("i", Type::INT, Value::Int(0));
        env
    }

    #[test]
    fn and_false_skips_right_side_effects() {
        let mut b = ChoiceBuilder::new();
        let f = b.bools(&[false]).unwrap();
        let i = b.ident(Type::INT, &["i"]).unwrap();
        let inc = b.pre_inc(i).unwrap();
        let zero = b.ints(&[0]).unwrap();
        let check = b.rel(inc, zero, &[RelOp::Gt]).unwrap();
        let and = b.logic(f, check, &[LogicOp::And]).unwrap();
        let arena = b.finish();

        let mut env = counter_env();
        let config = first(&arena, and, &env);
        let eval = Evaluator::new(&arena, &config).evaluate(and, &mut env).unwrap();
        assert_eq!(eval.value, Value::Bool(false));
        assert!(eval.writebacks.is_empty());
        assert_eq!(env.read("i"), Some(&Value::Int(0)));
    }

    #[test]
    fn or_true_skips_right_side_effects() {
        let mut b = ChoiceBuilder::new();
        let t = b.bools(&[true]).unwrap();
        let i = b.ident(Type::INT, &["i"]).unwrap();
        let inc = b.pre_inc(i).unwrap();
        let zero = b.ints(&[0]).unwrap();
        let check = b.rel(inc, zero, &[RelOp::Gt]).unwrap();
        let or = b.logic(t, check, &[LogicOp::Or]).unwrap();
        let arena = b.finish();

        let mut env = counter_env();
        let config = first(&arena, or, &env);
        let eval = Evaluator::new(&arena, &config).evaluate(or, &mut env).unwrap();
        assert_eq!(eval.value, Value::Bool(true));
        assert_eq!(env.read("i"), Some(&Value::Int(0)));
    }

    #[test]
    fn undecided_logic_runs_right_side() {
        let mut b = ChoiceBuilder::new();
        let t = b.bools(&[true]).unwrap();
        let i = b.ident(Type::INT, &["i"]).unwrap();
        let inc = b.pre_inc(i).unwrap();
        let zero = b.ints(&[0]).unwrap();
        let check = b.rel(inc, zero, &[RelOp::Gt]).unwrap();
        let and = b.logic(t, check, &[LogicOp::And]).unwrap();
        let arena = b.finish();

        let mut env = counter_env();
        let config = first(&arena, and, &env);
        let eval = Evaluator::new(&arena, &config).evaluate(and, &mut env).unwrap();
        assert_eq!(eval.value, Value::Bool(true));
        assert_eq!(env.read("i"), Some(&Value::Int(1)));
        assert_eq!(eval.writebacks.len(), 1);
    }

    #[test]
    fn assignment_widens_and_reports_writeback() {
        let mut b = ChoiceBuilder::new();
        let l = b.ident(Type::LONG, &["l"]).unwrap();
        let seven = b.ints(&[7]).unwrap();
        let assign = b.assign(l, seven).unwrap();
        let arena = b.finish();

        let mut env = Environment::new();
        env.declare("l", Type::LONG, Value::Long(0));
        let config = first(&arena, assign, &env);
        let eval = Evaluator::new(&arena, &config).evaluate(assign, &mut env).unwrap();
        assert_eq!(eval.value, Value::Long(7));
        assert_eq!(
            eval.writebacks,
            vec![Writeback {
                place: Place::Var("l".into()),
                value: Value::Long(7)
            }]
        );
        assert_eq!(env.read("l"), Some(&Value::Long(7)));
    }

    #[test]
    fn element_assignment_writes_through() {
        let mut b = ChoiceBuilder::new();
        let arr = b.ident(Type::Array(PrimitiveType::Int), &["a"]).unwrap();
        let one = b.ints(&[1]).unwrap();
        let elem = b.element(arr, Some(one)).unwrap();
        let nine = b.ints(&[9]).unwrap();
        let assign = b.assign(elem, nine).unwrap();
        let arena = b.finish();

        let mut env = Environment::new();
        env.declare(
            "a",
            Type::Array(PrimitiveType::Int),
            Value::Array(PrimitiveType::Int, vec![Value::Int(0), Value::Int(0)]),
        );
        let config = first(&arena, assign, &env);
        Evaluator::new(&arena, &config).evaluate(assign, &mut env).unwrap();
        assert_eq!(
            env.read("a"),
            Some(&Value::Array(PrimitiveType::Int, vec![Value::Int(0), Value::Int(9)]))
        );
    }

    #[test]
    fn division_by_zero_is_ignorable() {
        let mut b = ChoiceBuilder::new();
        let one = b.ints(&[1]).unwrap();
        let zero = b.ints(&[0]).unwrap();
        let div = b.arith(one, zero, &[ArithOp::Div]).unwrap();
        let arena = b.finish();

        let mut env = Environment::new();
        let config = first(&arena, div, &env);
        let err = Evaluator::new(&arena, &config).evaluate(div, &mut env).unwrap_err();
        assert!(err.is_ignorable());
    }

    #[test]
    fn out_of_bounds_index_is_ignorable() {
        let mut b = ChoiceBuilder::new();
        let arr = b.ident(Type::Array(PrimitiveType::Int), &["a"]).unwrap();
        let elem = b.element(arr, None).unwrap();
        let arena = b.finish();

        let mut env = Environment::new();
        env.declare("a", Type::Array(PrimitiveType::Int), Value::Array(PrimitiveType::Int, vec![]));
        let config = first(&arena, elem, &env);
        let err = Evaluator::new(&arena, &config).evaluate(elem, &mut env).unwrap_err();
        assert_eq!(
            err,
            Fault::Runtime(RuntimeFault::IndexOutOfBounds { index: 0, len: 0 })
        );
    }

    #[test]
    fn unresolved_node_is_internal_fault() {
        let mut b = ChoiceBuilder::new();
        let lit = b.ints(&[1, 2]).unwrap();
        let arena = b.finish();
        let config = Configuration::new(&arena);
        let mut env = Environment::new();
        let err = Evaluator::new(&arena, &config).evaluate(lit, &mut env).unwrap_err();
        assert!(matches!(err, Fault::Internal(InternalFault::Unresolved { .. })));
    }
}
