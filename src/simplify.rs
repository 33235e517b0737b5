//! Criteria simplification applied between tree construction and expansion.

use crate::ast::{CriteriaAst, Function, Node, Operation};

/// Error raised when a tree reaching the simplifier is malformed
#[derive(Debug, Clone, PartialEq)]
pub struct SimplifyError {
    pub message: String,
}

impl SimplifyError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl std::fmt::Display for SimplifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SimplifyError {}

/// Reduces a criteria tree to a canonical, smaller form
pub trait Simplifier {
    fn simplify(&self, tree: CriteriaAst) -> Result<CriteriaAst, SimplifyError>;
}

/// Structural simplifier used by the rule compiler unless another is supplied.
///
/// Always flattens nested nodes of the same operation, collapses single-child
/// AND/OR nodes and removes double negations. With `group_leaves` enabled it also
/// merges sibling leaves of the same function into one multi-argument leaf.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSimplifier {
    pub group_leaves: bool,
}

impl DefaultSimplifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grouping() -> Self {
        Self { group_leaves: true }
    }

    fn simplify_rec(&self, tree: CriteriaAst) -> Result<CriteriaAst, SimplifyError> {
        let node = match tree {
            CriteriaAst::Leaf(leaf) => return Ok(CriteriaAst::Leaf(leaf)),
            CriteriaAst::Node(node) => node,
        };
        validate(&node)?;

        let Node { operation, children } = node;
        let children = children
            .into_iter()
            .map(|child| self.simplify_rec(child))
            .collect::<Result<Vec<_>, _>>()?;

        if operation == Operation::Not {
            return Ok(simplify_not(children));
        }

        let mut children = flatten(operation, children);
        if self.group_leaves {
            children = group_leaves(operation, children);
        }

        if children.len() == 1 {
            if let Some(only) = children.pop() {
                return Ok(only);
            }
        }
        Ok(CriteriaAst::Node(Node::new(operation, children)))
    }
}

impl Simplifier for DefaultSimplifier {
    fn simplify(&self, tree: CriteriaAst) -> Result<CriteriaAst, SimplifyError> {
        self.simplify_rec(tree)
    }
}

fn validate(node: &Node) -> Result<(), SimplifyError> {
    match node.operation {
        Operation::None => Err(SimplifyError::new(
            "node without operation".to_string(),
        )),
        Operation::Not if node.children.len() != 1 => Err(SimplifyError::new(format!(
            "'not' node must have exactly one child, found {}",
            node.children.len()
        ))),
        Operation::And | Operation::Or if node.children.is_empty() => Err(SimplifyError::new(
            format!("empty '{:?}' node", node.operation).to_lowercase(),
        )),
        _ => Ok(()),
    }
}

/// NOT(NOT(x)) → x
fn simplify_not(mut children: Vec<CriteriaAst>) -> CriteriaAst {
    // validate() guarantees a single child
    let child = children.remove(0);
    match child {
        CriteriaAst::Node(Node {
            operation: Operation::Not,
            mut children,
        }) => children.remove(0),
        other => CriteriaAst::not(other),
    }
}

/// AND(a, AND(b, c)) → AND(a, b, c), preserving order
fn flatten(operation: Operation, children: Vec<CriteriaAst>) -> Vec<CriteriaAst> {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        match child {
            CriteriaAst::Node(inner) if inner.operation == operation => {
                flat.extend(inner.children)
            }
            other => flat.push(other),
        }
    }
    flat
}

/// OR(from:a, to:x, from:b) → OR(from:{a b}, to:x)
///
/// Only ungrouped leaves are merged. The merged leaf takes the position of the
/// first leaf of its group.
fn group_leaves(operation: Operation, children: Vec<CriteriaAst>) -> Vec<CriteriaAst> {
    let mut result: Vec<CriteriaAst> = Vec::with_capacity(children.len());
    // (function, is_raw) → index into `result`
    let mut slots: Vec<((Function, bool), usize)> = Vec::new();

    for child in children {
        let leaf = match child {
            CriteriaAst::Leaf(leaf) if leaf.grouping == Operation::None => leaf,
            other => {
                result.push(other);
                continue;
            }
        };

        let key = (leaf.function, leaf.is_raw);
        match slots.iter().find(|(k, _)| *k == key) {
            Some(&(_, idx)) => {
                if let CriteriaAst::Leaf(existing) = &mut result[idx] {
                    existing.grouping = operation;
                    existing.args.extend(leaf.args);
                }
            }
            None => {
                slots.push((key, result.len()));
                result.push(CriteriaAst::Leaf(leaf));
            }
        }
    }
    result
}
