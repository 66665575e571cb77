// src/target.rs
//! The program being searched.
//!
//! A [`Target`] runs the template's entry point and calls back into a
//! [`HoleSite`] whenever execution reaches a hole. The search driver is the
//! site: it decides what each hole denotes and hands back its value.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use holesmith_choice::{
    Configuration, Environment, Evaluator, Fault, InternalFault, Place, RuntimeFault,
};
use holesmith_ops::{Type, Value};
use rustc_hash::FxHasher;

use crate::template::{Expr, HoleId, Stmt, Template};

/// Receives control at every reached hole.
pub trait HoleSite {
    /// Produce the value of `hole`, applying its side effects to `env`.
    fn resolve(&mut self, hole: HoleId, env: &mut Environment) -> Result<Value, Fault>;

    /// A specialized hole was evaluated without calling [`resolve`](Self::resolve).
    fn observe(&mut self, _hole: HoleId, _value: &Value) {}
}

/// Holes compiled into the running program.
#[derive(Debug, Clone, Default)]
pub struct Specialization {
    /// Configuration the frozen holes are evaluated under.
    pub config: Configuration,
    pub frozen: BTreeSet<HoleId>,
    /// Conditions replaced by a constant.
    pub conditions: BTreeMap<HoleId, bool>,
}

pub trait Target {
    fn template(&self) -> Rc<Template>;

    /// Return all mutable state to the initial snapshot and drop any
    /// installed specialization.
    fn restore(&mut self);

    /// Run the entry point once.
    fn invoke(&mut self, site: &mut dyn HoleSite) -> Result<(), Fault>;

    /// Digest of the observable mutable state.
    fn fingerprint(&self) -> u64;

    fn relink(&mut self, specialization: Specialization);
}

// ---------------------------------------------------------------------------
// ScriptTarget
// ---------------------------------------------------------------------------

pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Interprets a template body against an [`Environment`].
pub struct ScriptTarget {
    template: Rc<Template>,
    env: Environment,
    specialization: Specialization,
    max_steps: usize,
}

impl ScriptTarget {
    pub fn new(template: Rc<Template>) -> Self {
        let env = template.environment();
        Self {
            template,
            env,
            specialization: Specialization::default(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Bound the statements one invocation may execute.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }
}

impl Target for ScriptTarget {
    fn template(&self) -> Rc<Template> {
        Rc::clone(&self.template)
    }

    fn restore(&mut self) {
        self.env = self.template.environment();
        self.specialization = Specialization::default();
    }

    fn invoke(&mut self, site: &mut dyn HoleSite) -> Result<(), Fault> {
        let template = Rc::clone(&self.template);
        let mut run = Interpreter {
            template: &template,
            env: &mut self.env,
            specialization: &self.specialization,
            site,
            steps: 0,
            max_steps: self.max_steps,
        };
        run.block(template.body())
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for (name, symbol) in self.env.iter() {
            name.hash(&mut hasher);
            symbol.value.hash(&mut hasher);
        }
        hasher.finish()
    }

    fn relink(&mut self, specialization: Specialization) {
        tracing::trace!(
            frozen = specialization.frozen.len(),
            conditions = specialization.conditions.len(),
            "relinked"
        );
        self.specialization = specialization;
    }
}

struct Interpreter<'a, 's> {
    template: &'a Template,
    env: &'a mut Environment,
    specialization: &'a Specialization,
    site: &'a mut (dyn HoleSite + 's),
    steps: usize,
    max_steps: usize,
}

impl Interpreter<'_, '_> {
    fn tick(&mut self) -> Result<(), Fault> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(RuntimeFault::StepLimit {
                limit: self.max_steps,
            }
            .into());
        }
        Ok(())
    }

    fn block(&mut self, stmts: &[Stmt]) -> Result<(), Fault> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), Fault> {
        self.tick()?;
        match stmt {
            Stmt::Eval(expr) => {
                self.expr(*expr)?;
            }
            Stmt::Assign { target, value } => {
                let stored = self.expr(*value)?;
                let ty = self
                    .env
                    .get(target)
                    .map(|s| s.ty)
                    .ok_or_else(|| InternalFault::UnknownSymbol {
                        name: target.clone(),
                    })?;
                let stored = self.convert(stored, ty, *value)?;
                self.env.store(&Place::Var(target.clone()), stored)?;
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.condition(*cond)? {
                    self.block(then)?;
                } else {
                    self.block(otherwise)?;
                }
            }
            Stmt::While { cond, body } => {
                while self.condition(*cond)? {
                    self.block(body)?;
                    self.tick()?;
                }
            }
            Stmt::Try(body) => match self.block(body) {
                Err(Fault::Runtime(fault)) if !matches!(fault, RuntimeFault::StepLimit { .. }) => {
                    tracing::trace!(kind = fault.kind(), "caught");
                }
                other => other?,
            },
            Stmt::Block(body) => self.block(body)?,
        }
        Ok(())
    }

    fn expr(&mut self, expr: Expr) -> Result<Value, Fault> {
        let arena = self.template.arena();
        match expr {
            Expr::Fixed(root) => Ok(Evaluator::new(arena, self.template.fixed_config())
                .evaluate(root, self.env)?
                .value),
            Expr::Hole(id) => {
                if let Some(fixed) = self.specialization.conditions.get(&id) {
                    let value = Value::Bool(*fixed);
                    self.site.observe(id, &value);
                    return Ok(value);
                }
                if self.specialization.frozen.contains(&id) {
                    let hole = self
                        .template
                        .hole(id)
                        .ok_or(InternalFault::UnknownHole { hole: id.0 })?;
                    let value = Evaluator::new(arena, &self.specialization.config)
                        .evaluate(hole.root, self.env)?
                        .value;
                    self.site.observe(id, &value);
                    return Ok(value);
                }
                self.site.resolve(id, self.env)
            }
        }
    }

    fn condition(&mut self, expr: Expr) -> Result<bool, Fault> {
        let value = self.expr(expr)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(expr, format!("condition produced {}", value.ty())))
    }

    /// Convert an assigned value to the declared type of its target.
    fn convert(&self, value: Value, ty: Type, expr: Expr) -> Result<Value, Fault> {
        match ty.primitive() {
            Some(prim) if value.ty() != ty => {
                value.cast(prim).map_err(|e| self.mismatch(expr, e.to_string()))
            }
            _ => Ok(value),
        }
    }

    fn mismatch(&self, expr: Expr, detail: String) -> Fault {
        let node = match expr {
            Expr::Fixed(root) => root,
            Expr::Hole(id) => match self.template.hole(id) {
                Some(hole) => hole.root,
                None => return InternalFault::UnknownHole { hole: id.0 }.into(),
            },
        };
        InternalFault::TypeMismatch { node, detail }.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Resolves every hole to a fixed value and counts calls.
    struct Canned {
        values: BTreeMap<HoleId, Value>,
        resolved: Vec<HoleId>,
        observed: Vec<HoleId>,
    }

    impl Canned {
        fn new(values: &[(u32, Value)]) -> Self {
            Self {
                values: values
                    .iter()
                    .map(|(id, v)| (HoleId(*id), v.clone()))
                    .collect(),
                resolved: Vec::new(),
                observed: Vec::new(),
            }
        }
    }

    impl HoleSite for Canned {
        fn resolve(&mut self, hole: HoleId, _env: &mut Environment) -> Result<Value, Fault> {
            self.resolved.push(hole);
            self.values
                .get(&hole)
                .cloned()
                .ok_or_else(|| InternalFault::UnknownHole { hole: hole.0 }.into())
        }

        fn observe(&mut self, hole: HoleId, _value: &Value) {
            self.observed.push(hole);
        }
    }

    fn target(name: &str) -> ScriptTarget {
        ScriptTarget::new(Rc::new(Template::load(name).unwrap()))
    }

    #[test]
    fn assigns_resolved_values() {
        let mut target = target("scenario-b");
        let mut site = Canned::new(&[(1, Value::Int(1)), (2, Value::Bool(true))]);
        target.invoke(&mut site).unwrap();
        assert_eq!(target.environment().read("x"), Some(&Value::Int(1)));
        assert_eq!(target.environment().read("flag"), Some(&Value::Bool(true)));
        assert_eq!(site.resolved, vec![HoleId(1), HoleId(2)]);
    }

    #[test]
    fn restore_resets_state_and_fingerprint() {
        let mut target = target("scenario-a");
        let initial = target.fingerprint();
        target
            .invoke(&mut Canned::new(&[(1, Value::Int(2))]))
            .unwrap();
        assert_ne!(target.fingerprint(), initial);
        target.restore();
        assert_eq!(target.fingerprint(), initial);
        assert_eq!(target.environment().read("x"), Some(&Value::Int(0)));
    }

    #[test]
    fn holes_resolve_in_execution_order() {
        let mut target = target("arrays");
        let mut site = Canned::new(&[(1, Value::Bool(false)), (3, Value::Bool(false))]);
        site.values.insert(HoleId(5), Value::Int(1));
        target.invoke(&mut site).unwrap();
        assert_eq!(site.resolved, vec![HoleId(1), HoleId(3), HoleId(5)]);
    }

    #[test]
    fn runaway_loop_hits_step_limit() {
        let mut target = target("arrays").with_max_steps(50);
        let mut site = Canned::new(&[
            (1, Value::Bool(true)),
            (2, Value::Long(1)),
        ]);
        let err = target.invoke(&mut site).unwrap_err();
        assert_eq!(err, Fault::Runtime(RuntimeFault::StepLimit { limit: 50 }));
    }

    #[test]
    fn relinked_conditions_skip_the_site() {
        let mut target = target("arrays");
        let mut spec = Specialization::default();
        spec.conditions.insert(HoleId(1), false);
        spec.conditions.insert(HoleId(3), true);
        target.relink(spec);

        let mut site = Canned::new(&[(4, Value::Int(7))]);
        target.invoke(&mut site).unwrap();
        assert_eq!(site.resolved, vec![HoleId(4)]);
        assert_eq!(site.observed, vec![HoleId(1), HoleId(3)]);
        assert_eq!(target.environment().read("n"), Some(&Value::Int(7)));

        target.restore();
        let mut site = Canned::new(&[(1, Value::Bool(false)), (3, Value::Bool(false))]);
        site.values.insert(HoleId(5), Value::Int(0));
        target.invoke(&mut site).unwrap();
        assert!(site.observed.is_empty(), "restore drops the specialization");
    }

    #[test]
    fn assignment_widens_to_declared_type() {
        let mut target = target("arrays");
        let mut site = Canned::new(&[
            (1, Value::Bool(false)),
            (3, Value::Bool(true)),
            (4, Value::Byte(5)),
        ]);
        target.invoke(&mut site).unwrap();
        assert_eq!(target.environment().read("n"), Some(&Value::Int(5)));
    }
}
