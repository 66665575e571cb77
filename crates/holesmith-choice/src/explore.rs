// explore.rs
//! Iterator algebra and random stepping.
//!
//! Every node behaves as an iterator over its domain:
//!
//! - literals, identifiers, operators and immutables are *leaves* that walk
//!   a finite list (an immutable is a one-element list);
//! - binary nodes, assignments and explicit array accesses are *products*
//!   over their children, advanced like an odometer whose last position
//!   changes fastest;
//! - alternatives are *unions* that walk each surviving child's domain in
//!   turn;
//! - casts and pre-increments *delegate* to their single child;
//! - array accesses with an inferred index walk the container's domain, and
//!   for each container the index range `[0, len)` of its runtime length.
//!
//! Advancing is lazy: domain material (inferred names, candidate lists,
//! pruned alternatives) is resolved from the environment the first time a
//! node is touched, and stays fixed afterwards.

use holesmith_ops::{CandidateDomains, random};
use rand::Rng;
use smallvec::{SmallVec, smallvec};

use crate::arena::{ChoiceArena, NodeId};
use crate::config::{Configuration, Live, Resolved};
use crate::env::Environment;
use crate::eval::Evaluator;
use crate::fault::{DomainError, Fault, InternalFault};
use crate::node::{ChoiceNode, IndexChoice, LiteralDomain, NameSet};


/// How a node iterates.
enum Shape {
    Leaf,
    Product(SmallVec<[NodeId; 4]>),
    Union,
    Delegate(NodeId),
    InferredElement { array: NodeId },
}

/// Drives one configuration through the domains of an arena.
pub struct Explorer<'a> {
    arena: &'a ChoiceArena,
    config: &'a mut Configuration,
    domains: &'a CandidateDomains,
    env: &'a Environment,
}

impl<'a> Explorer<'a> {
    pub fn new(
        arena: &'a ChoiceArena,
        config: &'a mut Configuration,
        domains: &'a CandidateDomains,
        env: &'a Environment,
    ) -> Self {
        Self {
            arena,
            config,
            domains,
            env,
        }
    }

    fn shape(&self, id: NodeId) -> Shape {
        match self.arena.get(id) {
            ChoiceNode::Binary { op, left, right } => Shape::Product(smallvec![*op, *left, *right]),
            ChoiceNode::Assign { target, value } => Shape::Product(smallvec![*target, *value]),
            ChoiceNode::Element {
                array,
                index: IndexChoice::Explicit(index),
            } => Shape::Product(smallvec![*array, *index]),
            ChoiceNode::Element {
                array,
                index: IndexChoice::Inferred,
            } => Shape::InferredElement { array: *array },
            ChoiceNode::PreInc { target } => Shape::Delegate(*target),
            ChoiceNode::Cast { operand, .. } => Shape::Delegate(*operand),
            ChoiceNode::Alt { .. } => Shape::Union,
            ChoiceNode::Immutable(_)
            | ChoiceNode::Literal { .. }
            | ChoiceNode::Ident { .. }
            | ChoiceNode::Operator(_) => Shape::Leaf,
        }
    }

    // -----------------------------------------------------------------------
    // Lazy resolution
    // -----------------------------------------------------------------------

    /// Resolve a node's domain material once.
    fn build(&mut self, id: NodeId) -> Result<(), Fault> {
        if self.config.is_built(id) {
            return Ok(());
        }
        let arena = self.arena;
        let resolved = match arena.get(id) {
            ChoiceNode::Literal {
                prim,
                domain: LiteralDomain::Free,
            } => Resolved::Values(self.domains.candidates(*prim)),
            ChoiceNode::Ident { names } => Resolved::Names(match names {
                NameSet::Declared(names) => names.clone(),
                NameSet::Inferred { exclude } => self
                    .env
                    .names_of_type(arena.ty(id))
                    .into_iter()
                    .filter(|name| !exclude.contains(name))
                    .collect(),
            }),
            ChoiceNode::Alt { options } => {
                let mut kept = Vec::with_capacity(options.len());
                for option in options.clone() {
                    if self.has_random_choice(option)? {
                        kept.push(option);
                    }
                }
                if kept.is_empty() {
                    return Err(DomainError::NoAlternative { node: id }.into());
                }
                Resolved::Options(kept)
            }
            _ => Resolved::Ready,
        };
        self.config.slot_mut(id).resolved = resolved;
        Ok(())
    }

    /// The alternatives of `id` that have a non-empty domain.
    ///
    /// Pruning happens on the first call; later calls return the same list.
    pub fn alternatives(&mut self, id: NodeId) -> Result<Vec<NodeId>, Fault> {
        self.build(id)?;
        match &self.config.slot(id).resolved {
            Resolved::Options(options) => Ok(options.clone()),
            _ => Err(InternalFault::TypeMismatch {
                node: id,
                detail: "not an alternative".to_string(),
            }
            .into()),
        }
    }

    fn leaf_len(&mut self, id: NodeId) -> Result<usize, Fault> {
        self.build(id)?;
        let len = match self.arena.get(id) {
            ChoiceNode::Immutable(_) => 1,
            ChoiceNode::Literal { domain, .. } => match domain {
                LiteralDomain::Values(values) => values.len(),
                LiteralDomain::Range { low, high } => range_len(*low, *high),
                LiteralDomain::Free => match &self.config.slot(id).resolved {
                    Resolved::Values(values) => values.len(),
                    _ => 0,
                },
            },
            ChoiceNode::Ident { .. } => match &self.config.slot(id).resolved {
                Resolved::Names(names) => names.len(),
                _ => 0,
            },
            ChoiceNode::Operator(set) => set.len(),
            other => {
                return Err(InternalFault::TypeMismatch {
                    node: id,
                    detail: format!("{} node is not a leaf", other.kind_name()),
                }
                .into());
            }
        };
        Ok(len)
    }

    /// Runtime length of the container an inferred element reads from.
    ///
    /// Runtime faults while evaluating the container are suppressed and
    /// reported as length 0; they recur when the generated program runs.
    fn container_len(&mut self, element: NodeId, array: NodeId) -> Result<usize, Fault> {
        let mut scratch = self.env.clone();
        let evaluation = Evaluator::new(self.arena, self.config).evaluate(array, &mut scratch);
        match evaluation {
            Ok(eval) => Ok(eval.value.len().unwrap_or(0)),
            Err(Fault::Runtime(fault)) => {
                tracing::trace!(node = %element, %fault, "container fault suppressed while inferring index");
                Ok(0)
            }
            Err(other) => Err(other),
        }
    }

    // -----------------------------------------------------------------------
    // Systematic protocol
    // -----------------------------------------------------------------------

    /// Whether `id` can advance without wrapping.
    pub fn has_next(&mut self, id: NodeId) -> Result<bool, Fault> {
        match self.shape(id) {
            Shape::Leaf => {
                let len = self.leaf_len(id)?;
                Ok(match self.config.slot(id).pos {
                    None => len > 0,
                    Some(p) => p + 1 < len,
                })
            }
            Shape::Product(parts) => {
                for part in parts {
                    if self.has_next(part)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Shape::Union => {
                let options = self.alternatives(id)?;
                let current = self.config.slot(id).pos;
                match current {
                    None => Ok(!options.is_empty()),
                    Some(i) => Ok(i + 1 < options.len() || self.has_next(options[i])?),
                }
            }
            Shape::Delegate(child) => self.has_next(child),
            Shape::InferredElement { array } => {
                let slot = self.config.slot(id);
                if !slot.started {
                    return self.has_next(array);
                }
                let index_left = slot.pos.is_none_or(|p| p + 1 < slot.index_len);
                Ok(index_left || self.has_next(array)?)
            }
        }
    }

    /// Advance `id` exactly one step and update its live selection.
    pub fn next(&mut self, id: NodeId) -> Result<(), Fault> {
        match self.shape(id) {
            Shape::Leaf => {
                let len = self.leaf_len(id)?;
                let slot = self.config.slot_mut(id);
                let pos = slot.pos.map_or(0, |p| p + 1);
                if pos >= len {
                    return Err(if len == 0 {
                        DomainError::Empty {
                            node: id,
                            kind: self.arena.get(id).kind_name(),
                        }
                        .into()
                    } else {
                        InternalFault::Exhausted { node: id }.into()
                    });
                }
                slot.pos = Some(pos);
                slot.live = Live::Pick(pos);
            }
            Shape::Product(parts) => {
                if !self.config.slot(id).started {
                    for part in parts.iter().copied() {
                        self.reset(part)?;
                        self.next(part)?;
                    }
                    self.config.slot_mut(id).started = true;
                    return Ok(());
                }
                let mut carry = None;
                for (i, part) in parts.iter().copied().enumerate().rev() {
                    if self.has_next(part)? {
                        carry = Some(i);
                        break;
                    }
                }
                let carry = carry.ok_or(InternalFault::Exhausted { node: id })?;
                self.next(parts[carry])?;
                for part in parts[carry + 1..].iter().copied() {
                    self.reset(part)?;
                    self.next(part)?;
                }
            }
            Shape::Union => {
                let options = self.alternatives(id)?;
                let current = self.config.slot(id).pos;
                let advance_current = match current {
                    Some(i) => self.has_next(options[i])?,
                    None => false,
                };
                let pos = match current {
                    Some(i) if advance_current => {
                        self.next(options[i])?;
                        i
                    }
                    current => {
                        let i = current.map_or(0, |i| i + 1);
                        let option = *options.get(i).ok_or(InternalFault::Exhausted { node: id })?;
                        self.reset(option)?;
                        self.next(option)?;
                        i
                    }
                };
                let slot = self.config.slot_mut(id);
                slot.pos = Some(pos);
                slot.live = Live::Pick(pos);
            }
            Shape::Delegate(child) => self.next(child)?,
            Shape::InferredElement { array } => {
                let slot = self.config.slot(id);
                let started = slot.started;
                let index_done = slot.pos.is_some_and(|p| p + 1 >= slot.index_len);
                if !started || index_done {
                    if !started {
                        self.reset(array)?;
                    }
                    self.next(array)?;
                    let len = self.container_len(id, array)?;
                    let slot = self.config.slot_mut(id);
                    slot.index_len = len.max(1);
                    slot.pos = None;
                }
                let slot = self.config.slot_mut(id);
                let pos = slot.pos.map_or(0, |p| p + 1);
                slot.pos = Some(pos);
                slot.live = Live::Pick(pos);
                slot.started = true;
            }
        }
        Ok(())
    }

    /// Return `id` to its virgin cursor state. Live selections are kept
    /// until the next call to [`next`](Self::next).
    pub fn reset(&mut self, id: NodeId) -> Result<(), Fault> {
        match self.shape(id) {
            Shape::Leaf => self.config.slot_mut(id).pos = None,
            Shape::Product(parts) => {
                self.config.slot_mut(id).started = false;
                for part in parts {
                    self.reset(part)?;
                }
            }
            Shape::Union => {
                self.config.slot_mut(id).pos = None;
                let arena = self.arena;
                for option in arena.get(id).children() {
                    self.reset(option)?;
                }
            }
            Shape::Delegate(child) => self.reset(child)?,
            Shape::InferredElement { array } => {
                let slot = self.config.slot_mut(id);
                slot.started = false;
                slot.pos = None;
                self.reset(array)?;
            }
        }
        Ok(())
    }

    /// Advance one step, wrapping to the first value when exhausted.
    ///
    /// Returns `true` if the node has no further value after this step.
    pub fn step_systematic(&mut self, id: NodeId) -> Result<bool, Fault> {
        if !self.has_next(id)? {
            self.reset(id)?;
        }
        self.next(id)?;
        Ok(!self.has_next(id)?)
    }

    /// Number of configurations `id` enumerates, or `None` when it depends
    /// on runtime state.
    pub fn domain_size(&mut self, id: NodeId) -> Result<Option<u128>, Fault> {
        match self.shape(id) {
            Shape::Leaf => Ok(Some(self.leaf_len(id)? as u128)),
            Shape::Product(parts) => {
                let mut total: u128 = 1;
                for part in parts {
                    match self.domain_size(part)? {
                        Some(n) => total = total.saturating_mul(n),
                        None => return Ok(None),
                    }
                }
                Ok(Some(total))
            }
            Shape::Union => {
                let mut total: u128 = 0;
                for option in self.alternatives(id)? {
                    match self.domain_size(option)? {
                        Some(n) => total = total.saturating_add(n),
                        None => return Ok(None),
                    }
                }
                Ok(Some(total))
            }
            Shape::Delegate(child) => self.domain_size(child),
            Shape::InferredElement { .. } => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Random protocol
    // -----------------------------------------------------------------------

    /// Whether `id` has at least one realization.
    pub fn has_random_choice(&mut self, id: NodeId) -> Result<bool, Fault> {
        let arena = self.arena;
        Ok(match arena.get(id) {
            ChoiceNode::Immutable(_) => true,
            ChoiceNode::Literal { domain, .. } => match domain {
                LiteralDomain::Values(values) => !values.is_empty(),
                LiteralDomain::Range { low, high } => low < high,
                LiteralDomain::Free => true,
            },
            ChoiceNode::Ident { .. } => self.leaf_len(id)? > 0,
            ChoiceNode::Operator(set) => !set.is_empty(),
            ChoiceNode::Binary { op, left, right } => {
                let (op, left, right) = (*op, *left, *right);
                self.has_random_choice(left)?
                    && self.has_random_choice(right)?
                    && self.has_random_choice(op)?
            }
            ChoiceNode::Assign { target, value } => {
                let (target, value) = (*target, *value);
                self.has_random_choice(target)? && self.has_random_choice(value)?
            }
            ChoiceNode::PreInc { target } => self.has_random_choice(*target)?,
            ChoiceNode::Cast { operand, .. } => self.has_random_choice(*operand)?,
            ChoiceNode::Alt { options } => {
                for option in options.clone() {
                    if self.has_random_choice(option)? {
                        return Ok(true);
                    }
                }
                false
            }
            ChoiceNode::Element { array, index } => {
                let (array, index) = (*array, *index);
                self.has_random_choice(array)?
                    && match index {
                        IndexChoice::Explicit(index) => self.has_random_choice(index)?,
                        IndexChoice::Inferred => true,
                    }
            }
        })
    }

    /// Move `id` to a fresh random realization.
    pub fn step_random<R: Rng + ?Sized>(&mut self, id: NodeId, rng: &mut R) -> Result<(), Fault> {
        self.build(id)?;
        let empty = |node: NodeId, arena: &ChoiceArena| -> Fault {
            DomainError::Empty {
                node,
                kind: arena.get(node).kind_name(),
            }
            .into()
        };
        let arena = self.arena;
        let live = match arena.get(id) {
            ChoiceNode::Immutable(_) => Live::Pick(0),
            ChoiceNode::Literal { prim, domain } => match domain {
                LiteralDomain::Values(values) if values.is_empty() => {
                    return Err(empty(id, arena));
                }
                LiteralDomain::Values(values) => Live::Pick(rng.gen_range(0..values.len())),
                LiteralDomain::Range { low, high } if prim.is_floating() => {
                    let value = random::draw_between(*prim, *low, *high, rng)
                        .ok_or_else(|| empty(id, arena))?;
                    Live::Scalar(value)
                }
                LiteralDomain::Range { low, high } => {
                    let len = range_len(*low, *high);
                    if len == 0 {
                        return Err(empty(id, arena));
                    }
                    Live::Pick(rng.gen_range(0..len))
                }
                LiteralDomain::Free => Live::Scalar(random::draw(*prim, rng)),
            },
            ChoiceNode::Ident { .. } | ChoiceNode::Operator(_) => {
                let len = self.leaf_len(id)?;
                if len == 0 {
                    return Err(empty(id, arena));
                }
                Live::Pick(rng.gen_range(0..len))
            }
            ChoiceNode::Binary { op, left, right } => {
                let (op, left, right) = (*op, *left, *right);
                self.step_random(left, rng)?;
                self.step_random(right, rng)?;
                self.step_random(op, rng)?;
                return Ok(());
            }
            ChoiceNode::Assign { target, value } => {
                let (target, value) = (*target, *value);
                self.step_random(target, rng)?;
                self.step_random(value, rng)?;
                return Ok(());
            }
            ChoiceNode::PreInc { target } => return self.step_random(*target, rng),
            ChoiceNode::Cast { operand, .. } => return self.step_random(*operand, rng),
            ChoiceNode::Alt { .. } => {
                let options = self.alternatives(id)?;
                let pick = rng.gen_range(0..options.len());
                self.step_random(options[pick], rng)?;
                Live::Pick(pick)
            }
            ChoiceNode::Element { array, index } => {
                let (array, index) = (*array, *index);
                self.step_random(array, rng)?;
                match index {
                    IndexChoice::Explicit(index) => return self.step_random(index, rng),
                    IndexChoice::Inferred => {
                        let len = self.container_len(id, array)?;
                        self.config.slot_mut(id).index_len = len.max(1);
                        Live::Pick(if len == 0 { 0 } else { rng.gen_range(0..len) })
                    }
                }
            }
        };
        self.config.slot_mut(id).live = live;
        Ok(())
    }
}

fn range_len(low: i64, high: i64) -> usize {
    (i128::from(high) - i128::from(low)).clamp(0, usize::MAX as i128) as usize
}
