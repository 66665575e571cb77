// arena.rs
//! Node storage.
//!
//! Choice trees are stored in a flat arena and referenced by [`NodeId`].
//! The arena is immutable once a template is loaded; all search state lives
//! in a separate [`Configuration`](crate::Configuration), so one arena can
//! back any number of independent searches.

use holesmith_ops::Type;

use crate::node::ChoiceNode;

macro_rules! define_node_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(u32);

        impl $name {
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            pub fn index(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

define_node_id! {
    /// Identity of a node within a [`ChoiceArena`].
    pub struct NodeId;
}

#[derive(Debug, Clone)]
struct Entry {
    node: ChoiceNode,
    ty: Type,
}

/// Flat storage for choice nodes.
#[derive(Debug, Clone, Default)]
pub struct ChoiceArena {
    entries: Vec<Entry>,
}

impl ChoiceArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id. Callers are responsible for type
    /// checking; see [`ChoiceBuilder`](crate::ChoiceBuilder).
    pub(crate) fn push(&mut self, node: ChoiceNode, ty: Type) -> NodeId {
        let id = NodeId::new(self.entries.len() as u32);
        self.entries.push(Entry { node, ty });
        id
    }

    pub fn get(&self, id: NodeId) -> &ChoiceNode {
        &self.entries[id.index() as usize].node
    }

    /// Static type of the value a node produces.
    pub fn ty(&self, id: NodeId) -> Type {
        self.entries[id.index() as usize].ty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        (id.index() as usize) < self.entries.len()
    }

    /// All nodes reachable from `root`, in pre-order.
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            let children = self.get(id).children();
            stack.extend(children.iter().rev().copied());
        }
        out
    }
}
