//! Rule compiler that turns configured rules into criteria rules the downstream
//! filter system can express.
//!
//! Each rule goes through parse → simplify → expand. The downstream system only
//! understands conjunctions of predicates (optionally negated), so two shapes
//! left over by simplification are rewritten into several equivalent rules.

use crate::ast::{CriteriaAst, Function, Leaf, Node, Operation};
use crate::config::{Actions, Config, RuleSpec};
use crate::parser::{parse_criteria, CriteriaError};
use crate::pretty::prettify;
use crate::simplify::{DefaultSimplifier, SimplifyError, Simplifier};
use serde::Serialize;
use tracing::{debug, info};

/// Configuration for rule expansion
#[derive(Debug, Clone, Default)]
pub struct ExpansionConfig {
    /// Keep the original function on leaves produced by a multi-argument
    /// expansion instead of emitting `list` leaves.
    pub keep_leaf_function: bool,
}

/// Full compiler configuration
#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    pub expansion: ExpansionConfig,
    pub simplifier: DefaultSimplifier,
}

/// A compiled rule: criteria plus the actions to apply
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub criteria: CriteriaAst,
    pub actions: Actions,
}

/// Represents an expansion applied during compilation
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// `(a OR b OR c) AND NOT x` split into one rule per disjunct
    OrOfLeavesAndNot { rule_index: usize, rule_count: usize },
    /// a multi-argument OR leaf split into one rule per argument
    MultiArgLeaf { rule_index: usize, rule_count: usize },
}

/// Result of rule compilation with expansion information
#[derive(Debug)]
pub struct CompileResult {
    pub rules: Vec<Rule>,
    pub expansions: Vec<Expansion>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleErrorKind {
    Criteria(CriteriaError),
    Simplification(SimplifyError),
    EmptyActions,
}

impl std::fmt::Display for RuleErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleErrorKind::Criteria(e) => write!(f, "parsing criteria: {}", e),
            RuleErrorKind::Simplification(e) => write!(f, "simplifying criteria: {}", e),
            RuleErrorKind::EmptyActions => write!(f, "empty action"),
        }
    }
}

/// Error tied to one input rule
#[derive(Debug, Clone, PartialEq)]
pub struct RuleError {
    /// 0-based position of the rule in the input
    pub index: usize,
    /// One-line dump of the offending rule
    pub rule: String,
    pub kind: RuleErrorKind,
}

impl RuleError {
    fn new(index: usize, rule: &RuleSpec, kind: RuleErrorKind) -> Self {
        Self {
            index,
            rule: prettify(rule, false),
            kind,
        }
    }

    /// Detail line meant to be shown below the error message
    pub fn details(&self) -> String {
        format!("Rule: {}", self.rule)
    }
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule #{}: {}", self.index, self.kind)
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            RuleErrorKind::Criteria(e) => Some(e),
            RuleErrorKind::Simplification(e) => Some(e),
            RuleErrorKind::EmptyActions => None,
        }
    }
}

/// Rule compiler, generic over the simplification step
pub struct RuleCompiler<S: Simplifier = DefaultSimplifier> {
    simplifier: S,
    expansion: ExpansionConfig,
}

impl RuleCompiler<DefaultSimplifier> {
    pub fn new() -> Self {
        Self::from_config(CompilerConfig::default())
    }

    pub fn from_config(config: CompilerConfig) -> Self {
        Self {
            simplifier: config.simplifier,
            expansion: config.expansion,
        }
    }
}

impl Default for RuleCompiler<DefaultSimplifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Simplifier> RuleCompiler<S> {
    pub fn with_simplifier(simplifier: S, expansion: ExpansionConfig) -> Self {
        Self {
            simplifier,
            expansion,
        }
    }

    /// Compile every rule of a configuration
    pub fn compile(&self, config: &Config) -> Result<CompileResult, RuleError> {
        self.compile_rules(&config.rules)
    }

    /// Compile rules in order. The first failing rule aborts the whole batch.
    ///
    /// Output rules keep the input order; rules produced by expanding one
    /// input rule are contiguous.
    pub fn compile_rules(&self, rules: &[RuleSpec]) -> Result<CompileResult, RuleError> {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut expansions = Vec::new();

        for (index, spec) in rules.iter().enumerate() {
            let rule = self.compile_rule(spec).map_err(|kind| RuleError::new(index, spec, kind))?;

            match expand_rule(&rule.criteria, &rule.actions, &self.expansion) {
                Some((expanded, shape)) => {
                    let rule_count = expanded.len();
                    debug!(rule_index = index, rule_count, ?shape, "expanded rule");
                    expansions.push(shape.with_origin(index, rule_count));
                    compiled.extend(expanded);
                }
                None => {
                    debug!(rule_index = index, criteria = %rule.criteria, "rule passed through");
                    compiled.push(rule);
                }
            }
        }

        info!(
            input_rules = rules.len(),
            output_rules = compiled.len(),
            expansions = expansions.len(),
            "compiled rules"
        );

        Ok(CompileResult {
            rules: compiled,
            expansions,
        })
    }

    /// Parse and simplify a single rule, checking its actions
    fn compile_rule(&self, spec: &RuleSpec) -> Result<Rule, RuleErrorKind> {
        let criteria = parse_criteria(&spec.filter).map_err(RuleErrorKind::Criteria)?;
        let criteria = self
            .simplifier
            .simplify(criteria)
            .map_err(RuleErrorKind::Simplification)?;
        if spec.actions.is_empty() {
            return Err(RuleErrorKind::EmptyActions);
        }

        Ok(Rule {
            criteria,
            actions: spec.actions.clone(),
        })
    }
}

/// Which rewrite fired; the origin is filled in by the compiler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpansionShape {
    OrOfLeavesAndNot,
    MultiArgLeaf,
}

impl ExpansionShape {
    fn with_origin(self, rule_index: usize, rule_count: usize) -> Expansion {
        match self {
            ExpansionShape::OrOfLeavesAndNot => Expansion::OrOfLeavesAndNot {
                rule_index,
                rule_count,
            },
            ExpansionShape::MultiArgLeaf => Expansion::MultiArgLeaf {
                rule_index,
                rule_count,
            },
        }
    }
}

/// Try to rewrite a simplified criteria tree into several equivalent rules.
///
/// Returns `None` when the tree is already representable downstream and the
/// rule should be kept as is.
pub fn expand_rule(
    criteria: &CriteriaAst,
    actions: &Actions,
    config: &ExpansionConfig,
) -> Option<(Vec<Rule>, ExpansionShape)> {
    let root = criteria.as_node()?;
    if root.operation != Operation::And {
        return None;
    }

    if let Some(criterias) = expand_or_of_leaves_and_not(root) {
        return Some((with_actions(criterias, actions), ExpansionShape::OrOfLeavesAndNot));
    }
    if let Some(criterias) = expand_multi_arg_leaf(root, config) {
        return Some((with_actions(criterias, actions), ExpansionShape::MultiArgLeaf));
    }
    None
}

fn with_actions(criterias: Vec<CriteriaAst>, actions: &Actions) -> Vec<Rule> {
    criterias
        .into_iter()
        .map(|criteria| Rule {
            criteria,
            actions: actions.clone(),
        })
        .collect()
}

/// (a OR b OR c) AND NOT x →
///    a AND NOT x
///    b AND NOT x
///    c AND NOT x
fn expand_or_of_leaves_and_not(root: &Node) -> Option<Vec<CriteriaAst>> {
    let [left, right] = root.children.as_slice() else {
        return None;
    };
    let disjunction = left.as_node()?;
    if disjunction.operation != Operation::Or
        || disjunction.children.len() <= 1
        || !left.all_children_are_leaves()
        || right.root_operation() != Operation::Not
    {
        return None;
    }

    Some(
        disjunction
            .children
            .iter()
            .map(|child| CriteriaAst::and(vec![child.clone(), right.clone()]))
            .collect(),
    )
}

/// list:{a OR b} AND (x) AND (y) →
///    list:a AND (x) AND (y)
///    list:b AND (x) AND (y)
///
/// Every remaining child must be a node; otherwise the rule is left untouched.
fn expand_multi_arg_leaf(root: &Node, config: &ExpansionConfig) -> Option<Vec<CriteriaAst>> {
    let (first, rest) = root.children.split_first()?;
    let leaf = first.as_leaf()?;
    if leaf.args.len() <= 1 || first.root_operation() != Operation::Or {
        return None;
    }
    if rest.iter().any(CriteriaAst::is_leaf) {
        debug!(criteria = %first, "multi-argument leaf next to other leaves, not expanding");
        return None;
    }

    let function = if config.keep_leaf_function {
        leaf.function
    } else {
        Function::List
    };

    Some(
        leaf.args
            .iter()
            .map(|arg| {
                let mut children = Vec::with_capacity(root.children.len());
                children.push(CriteriaAst::Leaf(Leaf {
                    function,
                    grouping: Operation::Or,
                    args: vec![arg.clone()],
                    is_raw: leaf.is_raw,
                }));
                children.extend(rest.iter().cloned());
                CriteriaAst::and(children)
            })
            .collect(),
    )
}
