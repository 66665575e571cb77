// translate.rs
//! Translation of configured boolean trees into solver queries.
//!
//! Translation carries a *buildable* flag. A node the solver theory cannot
//! express (floating-point values, characters, side effects, casts, integer
//! remainder) clears it, and every step after that is a no-op.

use std::collections::BTreeMap;

use holesmith_choice::{
    ChoiceArena, ChoiceNode, Configuration, InternalFault, NodeId, OperatorSet, Printer,
};
use holesmith_ops::{ArithOp, LogicOp, PrimitiveType, RelOp, ShiftOp, Type, Value};

use crate::formula::{Query, Sort, Term, Width};

/// Why a tree could not be translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    Floating,
    Character,
    SideEffect,
    Cast,
    Remainder,
    NotBoolean,
}

impl Blocker {
    pub fn as_str(self) -> &'static str {
        match self {
            Blocker::Floating => "floating-point value",
            Blocker::Character => "character value",
            Blocker::SideEffect => "side effect",
            Blocker::Cast => "cast",
            Blocker::Remainder => "integer remainder",
            Blocker::NotBoolean => "non-boolean root",
        }
    }
}

/// Outcome of translating one tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Buildable(Query),
    Unbuildable(Blocker),
}

/// Translates the live configuration of a tree.
pub struct Translator<'a> {
    arena: &'a ChoiceArena,
    config: &'a Configuration,
    constants: BTreeMap<String, Sort>,
    blocker: Option<Blocker>,
}

impl<'a> Translator<'a> {
    pub fn new(arena: &'a ChoiceArena, config: &'a Configuration) -> Self {
        Self {
            arena,
            config,
            constants: BTreeMap::new(),
            blocker: None,
        }
    }

    pub fn is_buildable(&self) -> bool {
        self.blocker.is_none()
    }

    /// Translate the boolean tree rooted at `root`.
    pub fn translate(mut self, root: NodeId) -> Result<Translation, InternalFault> {
        if !self.arena.ty(root).is_bool() {
            return Ok(Translation::Unbuildable(Blocker::NotBoolean));
        }
        let formula = self.term(root)?;
        Ok(match (self.blocker, formula) {
            (None, Some(formula)) => Translation::Buildable(Query {
                constants: self.constants,
                formula,
            }),
            (Some(blocker), _) => Translation::Unbuildable(blocker),
            (None, None) => Translation::Unbuildable(Blocker::NotBoolean),
        })
    }

    fn block(&mut self, blocker: Blocker) -> Option<Term> {
        self.blocker.get_or_insert(blocker);
        None
    }

    fn term(&mut self, id: NodeId) -> Result<Option<Term>, InternalFault> {
        if !self.is_buildable() {
            return Ok(None);
        }
        let ty = self.arena.ty(id);
        if ty.is_floating() {
            return Ok(self.block(Blocker::Floating));
        }
        let term = match self.arena.get(id) {
            ChoiceNode::Immutable(_) | ChoiceNode::Literal { .. } => {
                match self.config.literal(self.arena, id)? {
                    Value::Bool(b) => Some(Term::Bool(b)),
                    Value::Char(_) => self.block(Blocker::Character),
                    value => match value.as_i64() {
                        Some(v) => Some(Term::Int(v)),
                        None => self.block(Blocker::Floating),
                    },
                }
            }
            ChoiceNode::Ident { .. } | ChoiceNode::Element { .. } => self.constant(id, ty)?,
            ChoiceNode::Binary { op, left, right } => self.binary(*op, *left, *right)?,
            ChoiceNode::Assign { .. } | ChoiceNode::PreInc { .. } => self.block(Blocker::SideEffect),
            ChoiceNode::Cast { .. } => self.block(Blocker::Cast),
            ChoiceNode::Alt { .. } => self.term(self.config.option(id)?)?,
            ChoiceNode::Operator(_) => {
                return Err(InternalFault::TypeMismatch {
                    node: id,
                    detail: "operator translated as a term".to_string(),
                });
            }
        };
        Ok(term)
    }

    /// A free constant named by the printed text of `id`.
    fn constant(&mut self, id: NodeId, ty: Type) -> Result<Option<Term>, InternalFault> {
        let sort = match ty {
            Type::Primitive(PrimitiveType::Bool) => Sort::Bool,
            Type::Primitive(p) if p.is_integral() => Sort::Int,
            _ => return Ok(self.block(Blocker::Floating)),
        };
        let name = Printer::new(self.arena, self.config).render(id)?;
        self.constants.insert(name.clone(), sort);
        Ok(Some(Term::Const(name)))
    }

    fn binary(&mut self, op: NodeId, left: NodeId, right: NodeId) -> Result<Option<Term>, InternalFault> {
        let pick = self.config.operator(op)?;
        let ChoiceNode::Operator(set) = self.arena.get(op) else {
            return Err(InternalFault::TypeMismatch {
                node: op,
                detail: "expected an operator node".to_string(),
            });
        };
        let unresolved = InternalFault::Unresolved { node: op };
        let symbol = match set {
            OperatorSet::Arith(ops) => match ops.get(pick).ok_or(unresolved)? {
                ArithOp::Rem => return Ok(self.block(Blocker::Remainder)),
                ArithOp::Add => "+",
                ArithOp::Sub => "-",
                ArithOp::Mul => "*",
                ArithOp::Div => "div",
            },
            OperatorSet::Shift(ops) => {
                let shift = *ops.get(pick).ok_or(unresolved)?;
                return self.shift(shift, left, right);
            }
            OperatorSet::Rel(ops) => match ops.get(pick).ok_or(unresolved)? {
                RelOp::Eq => "=",
                RelOp::Ne => "distinct",
                RelOp::Lt => "<",
                RelOp::Le => "<=",
                RelOp::Gt => ">",
                RelOp::Ge => ">=",
            },
            OperatorSet::Logic(ops) => match ops.get(pick).ok_or(unresolved)? {
                LogicOp::And => "and",
                LogicOp::Or => "or",
            },
        };
        let Some(l) = self.term(left)? else {
            return Ok(None);
        };
        let Some(r) = self.term(right)? else {
            return Ok(None);
        };
        Ok(Some(Term::app(symbol, [l, r])))
    }

    fn shift(&mut self, op: ShiftOp, left: NodeId, right: NodeId) -> Result<Option<Term>, InternalFault> {
        let width = if self.arena.ty(left) == Type::LONG {
            Width::W64
        } else {
            Width::W32
        };
        let Some(value) = self.term(left)? else {
            return Ok(None);
        };
        let Some(distance) = self.term(right)? else {
            return Ok(None);
        };
        let op = match op {
            ShiftOp::Shl => "bvshl",
            ShiftOp::Shr => "bvashr",
            ShiftOp::Ushr => "bvlshr",
        };
        Ok(Some(Term::Shift {
            op,
            width,
            value: Box::new(value),
            distance: Box::new(distance),
        }))
    }
}

/// Translate the boolean tree at `root` under `config`.
pub fn translate(
    arena: &ChoiceArena,
    config: &Configuration,
    root: NodeId,
) -> Result<Translation, InternalFault> {
    Translator::new(arena, config).translate(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use holesmith_choice::{ChoiceBuilder, Environment, Explorer};
    use holesmith_ops::CandidateDomains;

    fn first(arena: &ChoiceArena, root: NodeId) -> Configuration {
        let mut env = Environment::new();
        env.declare("x", Type::INT, Value::Int(0));
        env.declare("l", Type::LONG, Value::Long(0));
        env.declare("flag", Type::BOOL, Value::Bool(false));
        env.declare("d", Type::DOUBLE, Value::Double(0.0));
        env.declare(
            "arr",
            Type::Array(PrimitiveType::Int),
            Value::Array(PrimitiveType::Int, vec![Value::Int(3)]),
        );
        let mut config = Configuration::new(arena);
        let domains = CandidateDomains::default();
        Explorer::new(arena, &mut config, &domains, &env)
            .next(root)
            .unwrap();
        config
    }

    fn query(arena: &ChoiceArena, root: NodeId) -> Query {
        let config = first(arena, root);
        match translate(arena, &config, root).unwrap() {
            Translation::Buildable(q) => q,
            other => panic!("expected a buildable query, got {other:?}"),
        }
    }

    #[test]
    fn relation_over_identifier_and_element() {
        let mut b = ChoiceBuilder::new();
        let x = b.ident(Type::INT, &["x"]).unwrap();
        let arr = b.ident(Type::Array(PrimitiveType::Int), &["arr"]).unwrap();
        let elem = b.element(arr, None).unwrap();
        let sum = b.arith(x, elem, &[ArithOp::Add]).unwrap();
        let five = b.ints(&[5]).unwrap();
        let cmp = b.rel(sum, five, &[RelOp::Ne]).unwrap();
        let flag = b.ident(Type::BOOL, &["flag"]).unwrap();
        let root = b.logic(cmp, flag, &[LogicOp::Or]).unwrap();
        let arena = b.finish();

        let q = query(&arena, root);
        assert_eq!(q.formula.to_string(), "(or (distinct (+ |x| |arr[0]|) 5) |flag|)");
        assert_eq!(q.constants.get("arr[0]"), Some(&Sort::Int));
        assert_eq!(q.constants.get("flag"), Some(&Sort::Bool));
    }

    #[test]
    fn long_shift_uses_64_bits() {
        let mut b = ChoiceBuilder::new();
        let l = b.ident(Type::LONG, &["l"]).unwrap();
        let two = b.ints(&[2]).unwrap();
        let shifted = b.shift(l, two, &[ShiftOp::Ushr]).unwrap();
        let zero = b.values(PrimitiveType::Long, vec![Value::Long(0)]).unwrap();
        let root = b.rel(shifted, zero, &[RelOp::Ge]).unwrap();
        let arena = b.finish();

        let text = query(&arena, root).formula.to_string();
        assert!(text.contains("(bvlshr ((_ int2bv 64) |l|)"));
    }

    #[test]
    fn unencodable_nodes_clear_buildable() {
        let cases: Vec<(Blocker, Box<dyn Fn(&mut ChoiceBuilder) -> NodeId>)> = vec![
            (
                Blocker::Remainder,
                Box::new(|b| {
                    let x = b.ident(Type::INT, &["x"]).unwrap();
                    let two = b.ints(&[2]).unwrap();
                    let rem = b.arith(x, two, &[ArithOp::Rem]).unwrap();
                    let zero = b.ints(&[0]).unwrap();
                    b.rel(rem, zero, &[RelOp::Eq]).unwrap()
                }),
            ),
            (
                Blocker::Floating,
                Box::new(|b| {
                    let d = b.ident(Type::DOUBLE, &["d"]).unwrap();
                    let x = b.ident(Type::INT, &["x"]).unwrap();
                    b.rel(d, x, &[RelOp::Lt]).unwrap()
                }),
            ),
            (
                Blocker::SideEffect,
                Box::new(|b| {
                    let x = b.ident(Type::INT, &["x"]).unwrap();
                    let inc = b.pre_inc(x).unwrap();
                    let one = b.ints(&[1]).unwrap();
                    b.rel(inc, one, &[RelOp::Gt]).unwrap()
                }),
            ),
            (
                Blocker::Cast,
                Box::new(|b| {
                    let l = b.ident(Type::LONG, &["l"]).unwrap();
                    let narrowed = b.cast(PrimitiveType::Int, l).unwrap();
                    let one = b.ints(&[1]).unwrap();
                    b.rel(narrowed, one, &[RelOp::Gt]).unwrap()
                }),
            ),
            (
                Blocker::Character,
                Box::new(|b| {
                    let c = b.values(PrimitiveType::Char, vec![Value::Char(97)]).unwrap();
                    let x = b.ident(Type::INT, &["x"]).unwrap();
                    b.rel(c, x, &[RelOp::Eq]).unwrap()
                }),
            ),
        ];
        for (expected, build) in cases {
            let mut b = ChoiceBuilder::new();
            let root = build(&mut b);
            let arena = b.finish();
            let config = first(&arena, root);
            assert_eq!(
                translate(&arena, &config, root).unwrap(),
                Translation::Unbuildable(expected)
            );
        }
    }

    #[test]
    fn non_boolean_root_is_unbuildable() {
        let mut b = ChoiceBuilder::new();
        let x = b.ident(Type::INT, &["x"]).unwrap();
        let arena = b.finish();
        let config = first(&arena, x);
        assert_eq!(
            translate(&arena, &config, x).unwrap(),
            Translation::Unbuildable(Blocker::NotBoolean)
        );
    }
}
