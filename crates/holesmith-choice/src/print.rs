// print.rs
//! Rendering of live configurations as Java source text.

use crate::arena::{ChoiceArena, NodeId};
use crate::config::Configuration;
use crate::fault::InternalFault;
use crate::node::{ChoiceNode, IndexChoice, OperatorSet};

/// Renders the currently configured expression of a tree.
///
/// Composite expressions are fully parenthesized so the printed text never
/// depends on operator precedence.
pub struct Printer<'a> {
    arena: &'a ChoiceArena,
    config: &'a Configuration,
}

impl<'a> Printer<'a> {
    pub fn new(arena: &'a ChoiceArena, config: &'a Configuration) -> Self {
        Self { arena, config }
    }

    pub fn render(&self, id: NodeId) -> Result<String, InternalFault> {
        let mut out = String::new();
        self.write(id, &mut out)?;
        Ok(out)
    }

    /// Like [`render`](Self::render), without the outermost parentheses.
    ///
    /// This is the form used where the expression stands alone: as a
    /// statement, an assigned value or a branch condition.
    pub fn render_bare(&self, id: NodeId) -> Result<String, InternalFault> {
        match self.arena.get(id) {
            ChoiceNode::Alt { .. } => self.render_bare(self.config.option(id)?),
            ChoiceNode::Binary { .. } | ChoiceNode::Assign { .. } | ChoiceNode::PreInc { .. } => {
                let text = self.render(id)?;
                Ok(text
                    .strip_prefix('(')
                    .and_then(|t| t.strip_suffix(')'))
                    .map(str::to_string)
                    .unwrap_or(text))
            }
            _ => self.render(id),
        }
    }

    fn write(&self, id: NodeId, out: &mut String) -> Result<(), InternalFault> {
        match self.arena.get(id) {
            ChoiceNode::Immutable(_) | ChoiceNode::Literal { .. } => {
                out.push_str(&self.config.literal(self.arena, id)?.to_literal());
            }
            ChoiceNode::Ident { .. } => out.push_str(self.config.name(id)?),
            ChoiceNode::Operator(set) => out.push_str(self.symbol(id, set)?),
            ChoiceNode::Element { array, index } => {
                self.write(*array, out)?;
                out.push('[');
                match index {
                    IndexChoice::Explicit(index) => self.write(*index, out)?,
                    IndexChoice::Inferred => out.push_str(&self.config.inferred_index(id)?.to_string()),
                }
                out.push(']');
            }
            ChoiceNode::Binary { op, left, right } => {
                out.push('(');
                self.write(*left, out)?;
                out.push(' ');
                self.write(*op, out)?;
                out.push(' ');
                self.write(*right, out)?;
                out.push(')');
            }
            ChoiceNode::Assign { target, value } => {
                out.push('(');
                self.write(*target, out)?;
                out.push_str(" = ");
                self.write(*value, out)?;
                out.push(')');
            }
            ChoiceNode::PreInc { target } => {
                out.push_str("(++");
                self.write(*target, out)?;
                out.push(')');
            }
            ChoiceNode::Cast { to, operand } => {
                out.push_str("((");
                out.push_str(to.as_str());
                out.push_str(") ");
                self.write(*operand, out)?;
                out.push(')');
            }
            ChoiceNode::Alt { .. } => self.write(self.config.option(id)?, out)?,
        }
        Ok(())
    }

    fn symbol(&self, id: NodeId, set: &OperatorSet) -> Result<&'static str, InternalFault> {
        set.symbol(self.config.operator(id)?)
            .ok_or(InternalFault::Unresolved { node: id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChoiceBuilder, Environment, Explorer};
    use holesmith_ops::{ArithOp, CandidateDomains, PrimitiveType, RelOp, Type, Value};

    #[test]
    fn renders_nested_expression() {
        let mut b = ChoiceBuilder::new();
        let x = b.ident(Type::INT, &["x"]).unwrap();
        let arr = b.ident(Type::Array(PrimitiveType::Long), &["values"]).unwrap();
        let elem = b.element(arr, None).unwrap();
        let cast = b.cast(PrimitiveType::Int, elem).unwrap();
        let sum = b.arith(x, cast, &[ArithOp::Sub, ArithOp::Add]).unwrap();
        let limit = b.ints(&[3]).unwrap();
        let cmp = b.rel(sum, limit, &[RelOp::Le]).unwrap();
        let arena = b.finish();

        let mut env = Environment::new();
        env.declare("x", Type::INT, Value::Int(0));
        env.declare(
            "values",
            Type::Array(PrimitiveType::Long),
            Value::Array(PrimitiveType::Long, vec![Value::Long(1)]),
        );
        let mut config = Configuration::new(&arena);
        let domains = CandidateDomains::default();
        Explorer::new(&arena, &mut config, &domains, &env)
            .next(cmp)
            .unwrap();

        let text = Printer::new(&arena, &config).render(cmp).unwrap();
        assert_eq!(text, "((x - ((int) values[0])) <= 3)");
    }

    #[test]
    fn renders_side_effects() {
        let mut b = ChoiceBuilder::new();
        let y = b.ident(Type::LONG, &["y"]).unwrap();
        let big = b.values(PrimitiveType::Long, vec![Value::Long(9)]).unwrap();
        let assign = b.assign(y, big).unwrap();
        let i = b.ident(Type::INT, &["i"]).unwrap();
        let inc = b.pre_inc(i).unwrap();
        let arena = b.finish();

        let env = Environment::new();
        let mut config = Configuration::new(&arena);
        let domains = CandidateDomains::default();
        let mut explorer = Explorer::new(&arena, &mut config, &domains, &env);
        explorer.next(assign).unwrap();
        explorer.next(inc).unwrap();

        let printer = Printer::new(&arena, &config);
        assert_eq!(printer.render(assign).unwrap(), "(y = 9L)");
        assert_eq!(printer.render(inc).unwrap(), "(++i)");
        assert_eq!(printer.render_bare(assign).unwrap(), "y = 9L");
        assert_eq!(printer.render_bare(inc).unwrap(), "++i");
    }
}
