// src/template/lower.rs
//! Lowering of parsed templates into choice trees, with validation.

use std::collections::BTreeMap;

use holesmith_choice::{
    BuildError, ChoiceArena, ChoiceBuilder, ChoiceNode, Configuration, Environment, Explorer,
    IndexChoice, NameSet, NodeId,
};
use holesmith_ops::{CandidateDomains, PrimitiveType, Type, Value};

use super::schema::{ExprSpec, NodeSpec, StmtSpec, SymbolSpec, TemplateSpec};
use super::{Expr, Guard, Hole, HoleId, Stmt, SymbolDecl, Template};
use crate::errors::TemplateError;

pub(super) fn lower(spec: TemplateSpec) -> Result<Template, TemplateError> {
    check_identifier("name", &spec.name)?;

    let mut symbols = Vec::with_capacity(spec.symbols.len());
    let mut types = BTreeMap::new();
    for symbol in &spec.symbols {
        let decl = lower_symbol(symbol)?;
        if types.insert(decl.name.clone(), decl.ty).is_some() {
            return Err(TemplateError::DuplicateSymbol {
                name: decl.name.clone(),
            });
        }
        symbols.push(decl);
    }

    let mut lowering = Lowering {
        builder: ChoiceBuilder::new(),
        types,
        holes: BTreeMap::new(),
        fixed: Vec::new(),
    };
    let body = lowering.block(&spec.body)?;
    let Lowering {
        builder,
        holes,
        fixed,
        ..
    } = lowering;
    let arena = builder.finish();
    let fixed = settle_fixed(&arena, &fixed)?;

    Ok(Template {
        name: spec.name,
        arena,
        symbols,
        body,
        holes,
        fixed,
    })
}

struct Lowering {
    builder: ChoiceBuilder,
    types: BTreeMap<String, Type>,
    holes: BTreeMap<HoleId, Hole>,
    /// Roots of fixed trees, with the context they appear in.
    fixed: Vec<(NodeId, String)>,
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

impl Lowering {
    fn block(&mut self, stmts: &[StmtSpec]) -> Result<Vec<Stmt>, TemplateError> {
        stmts.iter().map(|s| self.stmt(s)).collect()
    }

    fn stmt(&mut self, spec: &StmtSpec) -> Result<Stmt, TemplateError> {
        Ok(match spec {
            StmtSpec::Eval(expr) => {
                let (expr, root) = self.expr(expr, "expression statement")?;
                if !is_statement(self.builder.arena(), root) {
                    return Err(TemplateError::NotAStatement {
                        context: describe(expr),
                    });
                }
                Stmt::Eval(expr)
            }
            StmtSpec::Assign { target, value } => {
                let target_ty = self.symbol_type(target)?;
                let context = format!("assignment to '{target}'");
                let (value, root) = self.expr(value, &context)?;
                let found = self.builder.arena().ty(root);
                if !found.assignable_to(target_ty) {
                    return Err(TemplateError::build(
                        context,
                        BuildError::NotAssignable {
                            target: target_ty,
                            found,
                        },
                    ));
                }
                Stmt::Assign {
                    target: target.clone(),
                    value,
                }
            }
            StmtSpec::If {
                cond,
                then,
                otherwise,
            } => {
                let cond = self.condition(cond, "if condition")?;
                let then = self.block(then)?;
                let otherwise = self.block(otherwise)?;
                self.guard(cond, &then, &otherwise);
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                }
            }
            StmtSpec::While { cond, body } => {
                let cond = self.condition(cond, "while condition")?;
                let body = self.block(body)?;
                self.guard(cond, &body, &[]);
                Stmt::While { cond, body }
            }
            StmtSpec::Try { body } => Stmt::Try(self.block(body)?),
            StmtSpec::Block(body) => Stmt::Block(self.block(body)?),
        })
    }

    fn condition(&mut self, spec: &ExprSpec, context: &'static str) -> Result<Expr, TemplateError> {
        let (expr, root) = self.expr(spec, context)?;
        let found = self.builder.arena().ty(root);
        if !found.is_bool() {
            return Err(TemplateError::NonBooleanCondition {
                context,
                found: found.to_string(),
            });
        }
        Ok(expr)
    }

    /// Record which holes a condition hole guards.
    fn guard(&mut self, cond: Expr, then: &[Stmt], otherwise: &[Stmt]) {
        let Expr::Hole(id) = cond else {
            return;
        };
        let mut guard = Guard::default();
        collect_holes(then, &mut guard.then);
        collect_holes(otherwise, &mut guard.otherwise);
        if let Some(hole) = self.holes.get_mut(&id) {
            hole.guard = Some(guard);
        }
    }

    fn expr(&mut self, spec: &ExprSpec, context: &str) -> Result<(Expr, NodeId), TemplateError> {
        match spec {
            ExprSpec::Hole { hole, node } => {
                if *hole == 0 {
                    return Err(TemplateError::InvalidHoleId);
                }
                let id = HoleId(*hole);
                if self.holes.contains_key(&id) {
                    return Err(TemplateError::DuplicateHole { id: *hole });
                }
                let root = self.node(node, &format!("hole {id}"))?;
                self.holes.insert(
                    id,
                    Hole {
                        id,
                        root,
                        guard: None,
                    },
                );
                Ok((Expr::Hole(id), root))
            }
            ExprSpec::Fixed(node) => {
                let root = self.node(node, context)?;
                self.fixed.push((root, context.to_string()));
                Ok((Expr::Fixed(root), root))
            }
        }
    }

    fn symbol_type(&self, name: &str) -> Result<Type, TemplateError> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| TemplateError::UnknownSymbol {
                name: name.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Node trees
// ---------------------------------------------------------------------------

impl Lowering {
    fn node(&mut self, spec: &NodeSpec, context: &str) -> Result<NodeId, TemplateError> {
        let built = |r: Result<NodeId, BuildError>| r.map_err(|e| TemplateError::build(context, e));
        match spec {
            NodeSpec::Const { ty, value } => {
                let prim = primitive(*ty, "constant")?;
                let value = scalar(prim, value).map_err(|detail| TemplateError::InvalidValue {
                    name: "constant".to_string(),
                    detail,
                })?;
                Ok(self.builder.constant(value))
            }
            NodeSpec::Literal {
                ty,
                values,
                low,
                high,
            } => {
                let prim = primitive(*ty, "literal")?;
                match (values, low, high) {
                    (Some(values), None, None) => {
                        let values = values
                            .iter()
                            .map(|v| scalar(prim, v))
                            .collect::<Result<Vec<_>, _>>()
                            .map_err(|detail| TemplateError::InvalidValue {
                                name: "literal".to_string(),
                                detail,
                            })?;
                        built(self.builder.values(prim, values))
                    }
                    (None, Some(low), Some(high)) => built(self.builder.range(prim, *low, *high)),
                    (None, None, None) => Ok(self.builder.free(prim)),
                    _ => Err(TemplateError::InvalidValue {
                        name: "literal".to_string(),
                        detail: "give either `values` or both `low` and `high`".to_string(),
                    }),
                }
            }
            NodeSpec::Ident { ty, names, exclude } => {
                if names.is_empty() {
                    let exclude: Vec<&str> = exclude.iter().map(String::as_str).collect();
                    return Ok(self.builder.infer_ident(*ty, &exclude));
                }
                for name in names {
                    let declared = self.symbol_type(name)?;
                    if declared != *ty {
                        return Err(TemplateError::InvalidValue {
                            name: name.clone(),
                            detail: format!("declared as {declared}, used as {ty}"),
                        });
                    }
                }
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                built(self.builder.ident(*ty, &names))
            }
            NodeSpec::Element { array, index } => {
                let array = self.node(array, context)?;
                let index = match index {
                    Some(index) => Some(self.node(index, context)?),
                    None => None,
                };
                built(self.builder.element(array, index))
            }
            NodeSpec::Arith { left, right, ops } => {
                let (l, r) = self.pair(left, right, context)?;
                built(self.builder.arith(l, r, ops))
            }
            NodeSpec::Shift { left, right, ops } => {
                let (l, r) = self.pair(left, right, context)?;
                built(self.builder.shift(l, r, ops))
            }
            NodeSpec::Rel { left, right, ops } => {
                let (l, r) = self.pair(left, right, context)?;
                built(self.builder.rel(l, r, ops))
            }
            NodeSpec::Logic { left, right, ops } => {
                let (l, r) = self.pair(left, right, context)?;
                built(self.builder.logic(l, r, ops))
            }
            NodeSpec::Assign { target, value } => {
                let (t, v) = self.pair(target, value, context)?;
                built(self.builder.assign(t, v))
            }
            NodeSpec::PreInc { target } => {
                let target = self.node(target, context)?;
                built(self.builder.pre_inc(target))
            }
            NodeSpec::Alt { options } => {
                let options = options
                    .iter()
                    .map(|o| self.node(o, context))
                    .collect::<Result<Vec<_>, _>>()?;
                built(self.builder.alt(&options))
            }
            NodeSpec::Cast { to, operand } => {
                let prim = primitive(*to, "cast")?;
                let operand = self.node(operand, context)?;
                built(self.builder.cast(prim, operand))
            }
        }
    }

    fn pair(
        &mut self,
        left: &NodeSpec,
        right: &NodeSpec,
        context: &str,
    ) -> Result<(NodeId, NodeId), TemplateError> {
        Ok((self.node(left, context)?, self.node(right, context)?))
    }
}

// ---------------------------------------------------------------------------
// Fixed code
// ---------------------------------------------------------------------------

/// Settle every fixed tree on its single configuration.
fn settle_fixed(
    arena: &ChoiceArena,
    roots: &[(NodeId, String)],
) -> Result<Configuration, TemplateError> {
    let mut config = Configuration::new(arena);
    let domains = CandidateDomains::default();
    let env = Environment::new();
    for (root, context) in roots {
        let ambiguous = || TemplateError::AmbiguousFixedCode {
            context: context.clone(),
        };
        let runtime_dependent = arena.subtree(*root).into_iter().any(|id| {
            matches!(
                arena.get(id),
                ChoiceNode::Ident {
                    names: NameSet::Inferred { .. }
                } | ChoiceNode::Element {
                    index: IndexChoice::Inferred,
                    ..
                }
            )
        });
        if runtime_dependent {
            return Err(ambiguous());
        }
        let mut explorer = Explorer::new(arena, &mut config, &domains, &env);
        if explorer.domain_size(*root).map_err(|_| ambiguous())? != Some(1) {
            return Err(ambiguous());
        }
        explorer.next(*root).map_err(|_| ambiguous())?;
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn lower_symbol(spec: &SymbolSpec) -> Result<SymbolDecl, TemplateError> {
    check_identifier(&spec.name, &spec.name)?;
    let invalid = |detail: String| TemplateError::InvalidValue {
        name: spec.name.clone(),
        detail,
    };
    let value = match (spec.ty, &spec.value) {
        (Type::Primitive(prim), None) => Value::zero(prim),
        (Type::Primitive(prim), Some(v)) => scalar(prim, v).map_err(invalid)?,
        (Type::Array(elem), None) => Value::Array(elem, Vec::new()),
        (Type::Array(elem), Some(toml::Value::Array(items))) => {
            let items = items
                .iter()
                .map(|v| scalar(elem, v))
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid)?;
            Value::Array(elem, items)
        }
        (Type::Array(_), Some(other)) => {
            return Err(invalid(format!("expected an array, found {}", other.type_str())));
        }
    };
    Ok(SymbolDecl {
        name: spec.name.clone(),
        ty: spec.ty,
        value,
    })
}

/// Convert a TOML scalar into a value of type `prim`.
fn scalar(prim: PrimitiveType, value: &toml::Value) -> Result<Value, String> {
    let mismatch = || format!("expected {prim}, found {}", value.type_str());
    match (prim, value) {
        (PrimitiveType::Bool, toml::Value::Boolean(b)) => Ok(Value::Bool(*b)),
        (PrimitiveType::Char, toml::Value::String(s)) => {
            let mut units = s.encode_utf16();
            match (units.next(), units.next()) {
                (Some(unit), None) => Ok(Value::Char(unit)),
                _ => Err(format!("'{s}' is not a single UTF-16 code unit")),
            }
        }
        (PrimitiveType::Float | PrimitiveType::Double, toml::Value::Float(f)) => {
            Value::from_f64(prim, *f).ok_or_else(mismatch)
        }
        (PrimitiveType::Bool, _) => Err(mismatch()),
        (_, toml::Value::Integer(i)) => {
            let converted = Value::from_i64(prim, *i).ok_or_else(mismatch)?;
            let round_trips = match converted {
                Value::Float(f) => f64::from(f) == *i as f64,
                Value::Double(d) => d == *i as f64,
                ref other => other.as_i64() == Some(*i),
            };
            if round_trips {
                Ok(converted)
            } else {
                Err(format!("{i} is out of range for {prim}"))
            }
        }
        _ => Err(mismatch()),
    }
}

fn primitive(ty: Type, what: &str) -> Result<PrimitiveType, TemplateError> {
    ty.primitive().ok_or_else(|| TemplateError::InvalidValue {
        name: what.to_string(),
        detail: format!("{ty} is not a primitive type"),
    })
}

fn check_identifier(name: &str, ident: &str) -> Result<(), TemplateError> {
    let mut chars = ident.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid {
        Ok(())
    } else {
        Err(TemplateError::InvalidValue {
            name: name.to_string(),
            detail: format!("'{ident}' is not a valid identifier"),
        })
    }
}

/// Whether `id` is a legal expression statement in every configuration.
fn is_statement(arena: &ChoiceArena, id: NodeId) -> bool {
    match arena.get(id) {
        ChoiceNode::Assign { .. } | ChoiceNode::PreInc { .. } => true,
        ChoiceNode::Alt { options } => options.iter().all(|o| is_statement(arena, *o)),
        _ => false,
    }
}

fn describe(expr: Expr) -> String {
    match expr {
        Expr::Hole(id) => format!("hole {id}"),
        Expr::Fixed(_) => "fixed expression".to_string(),
    }
}

/// Every hole syntactically inside `stmts`, in order.
fn collect_holes(stmts: &[Stmt], out: &mut Vec<HoleId>) {
    let push = |expr: &Expr, out: &mut Vec<HoleId>| {
        if let Expr::Hole(id) = expr {
            out.push(*id);
        }
    };
    for stmt in stmts {
        match stmt {
            Stmt::Eval(expr) | Stmt::Assign { value: expr, .. } => push(expr, out),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                push(cond, out);
                collect_holes(then, out);
                collect_holes(otherwise, out);
            }
            Stmt::While { cond, body } => {
                push(cond, out);
                collect_holes(body, out);
            }
            Stmt::Try(body) | Stmt::Block(body) => collect_holes(body, out),
        }
    }
}
