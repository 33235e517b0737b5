//! 条件树 (criteria tree) 的数据模型
//!
//! 规则的过滤条件在编译过程中表示为一棵布尔表达式树：
//! 内部节点为 AND / OR / NOT 组合，叶子节点为单个字段匹配谓词。

use serde::Serialize;
use std::fmt;

/// 组合运算类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    And,
    Or,
    Not,
    /// 哨兵值：表示 "不是内部节点"，也是叶子节点的默认分组
    None,
}

/// 叶子谓词的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Function {
    From,
    To,
    Cc,
    Bcc,
    ReplyTo,
    Subject,
    List,
    Has,
    Query,
}

impl Function {
    /// 对应配置文件中的字段名
    pub fn field_name(&self) -> &'static str {
        match self {
            Function::From => "from",
            Function::To => "to",
            Function::Cc => "cc",
            Function::Bcc => "bcc",
            Function::ReplyTo => "replyTo",
            Function::Subject => "subject",
            Function::List => "list",
            Function::Has => "has",
            Function::Query => "query",
        }
    }
}

/// 条件树：内部节点或叶子节点
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CriteriaAst {
    Node(Node),
    Leaf(Leaf),
}

/// 组合节点，例如 `AND(from:a, NOT subject:x)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub operation: Operation,
    /// 子节点顺序有意义；NOT 节点恰好有一个子节点
    pub children: Vec<CriteriaAst>,
}

/// 字段匹配谓词，例如 `from:alice@example.com`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaf {
    pub function: Function,
    /// 多个参数时的组合方式，通常为 `Operation::None`
    pub grouping: Operation,
    pub args: Vec<String>,
    #[serde(rename = "isRaw")]
    pub is_raw: bool,
}

impl Node {
    pub fn new(operation: Operation, children: Vec<CriteriaAst>) -> Self {
        Self { operation, children }
    }
}

impl Leaf {
    /// 单参数、无分组的叶子
    pub fn new(function: Function, arg: impl Into<String>, is_raw: bool) -> Self {
        Self {
            function,
            grouping: Operation::None,
            args: vec![arg.into()],
            is_raw,
        }
    }
}

impl CriteriaAst {
    /// 构造一个组合节点
    pub fn node(operation: Operation, children: Vec<CriteriaAst>) -> Self {
        CriteriaAst::Node(Node::new(operation, children))
    }

    pub fn and(children: Vec<CriteriaAst>) -> Self {
        Self::node(Operation::And, children)
    }

    pub fn or(children: Vec<CriteriaAst>) -> Self {
        Self::node(Operation::Or, children)
    }

    pub fn not(child: CriteriaAst) -> Self {
        Self::node(Operation::Not, vec![child])
    }

    /// 构造一个单参数叶子
    pub fn leaf(function: Function, arg: impl Into<String>) -> Self {
        CriteriaAst::Leaf(Leaf::new(function, arg, false))
    }

    /// 根运算：节点返回其运算，叶子返回其分组 (通常为 `None`)
    pub fn root_operation(&self) -> Operation {
        match self {
            CriteriaAst::Node(node) => node.operation,
            CriteriaAst::Leaf(leaf) => leaf.grouping,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, CriteriaAst::Leaf(_))
    }

    /// 当且仅当自身为节点且所有直接子节点都是叶子时为真
    pub fn all_children_are_leaves(&self) -> bool {
        match self {
            CriteriaAst::Node(node) => node.children.iter().all(CriteriaAst::is_leaf),
            CriteriaAst::Leaf(_) => false,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            CriteriaAst::Node(node) => Some(node),
            CriteriaAst::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            CriteriaAst::Leaf(leaf) => Some(leaf),
            CriteriaAst::Node(_) => None,
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            CriteriaAst::Leaf(leaf) => write!(f, "{}", leaf),
            CriteriaAst::Node(node) => match node.operation {
                Operation::Not => {
                    write!(f, "NOT ")?;
                    match node.children.first() {
                        Some(child) => child.fmt_nested(f, true),
                        None => Ok(()),
                    }
                }
                op => {
                    let sep = if op == Operation::Or { " OR " } else { " AND " };
                    if nested {
                        write!(f, "(")?;
                    }
                    for (i, child) in node.children.iter().enumerate() {
                        if i > 0 {
                            write!(f, "{}", sep)?;
                        }
                        child.fmt_nested(f, true)?;
                    }
                    if nested {
                        write!(f, ")")?;
                    }
                    Ok(())
                }
            },
        }
    }
}

impl fmt::Display for CriteriaAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, false)
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = |arg: &str| {
            if self.is_raw {
                format!("\"{}\"", arg)
            } else {
                arg.to_string()
            }
        };
        write!(f, "{}:", self.function.field_name())?;
        match self.args.as_slice() {
            [single] => write!(f, "{}", quote(single.as_str())),
            args => {
                let sep = if self.grouping == Operation::And { " AND " } else { " OR " };
                let joined: Vec<String> = args.iter().map(|a| quote(a.as_str())).collect();
                write!(f, "{{{}}}", joined.join(sep))
            }
        }
    }
}
