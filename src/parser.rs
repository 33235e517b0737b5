//! 过滤条件的解析器：将配置中的 `FilterNode` 树转换为条件树
//!
//! ## 解析流程图
//!
//! ```text
//! parse_criteria()
//!   ├─ check_syntax()
//!   │    ├─ 没有字段     → EmptyNode
//!   │    ├─ 多个字段     → MultipleFields
//!   │    └─ isEscaped    → 只允许 from / to / subject
//!   │
//!   ├─ parse_operation()  "and" / "or" / "not"
//!   │    └─ 按顺序递归解析每个子节点 → Node
//!   │
//!   └─ parse_function()   "from" / "to" / ... / "query"
//!        └─ 单参数 Leaf
//! ```
//!
//! ## 示例
//!
//! ```text
//! { "and": [ { "from": "a" }, { "not": { "subject": "x" } } ] }
//!   → AND(from:a, NOT(subject:x))
//! ```

use crate::ast::{CriteriaAst, Function, Leaf, Node, Operation};
use crate::config::FilterNode;

/// 允许使用 `isEscaped` 的字段
const RAW_ALLOWED: [&str; 3] = ["from", "to", "subject"];

/// 构建条件树时的语法错误
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaError {
    /// 节点没有设置任何字段
    EmptyNode,
    /// 同一节点设置了多个字段
    MultipleFields(Vec<&'static str>),
    /// 在不支持的字段上使用了 `isEscaped`
    EscapeNotAllowed(&'static str),
}

impl std::fmt::Display for CriteriaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriteriaError::EmptyNode => write!(f, "empty filter node"),
            CriteriaError::MultipleFields(fields) => write!(
                f,
                "multiple fields specified in the same filter node: {}",
                fields.join(",")
            ),
            CriteriaError::EscapeNotAllowed(_) => write!(
                f,
                "'isRaw' can only be used with {}",
                RAW_ALLOWED.join("/")
            ),
        }
    }
}

impl std::error::Error for CriteriaError {}

/// 将过滤节点递归转换为条件树
///
/// 任意子节点出错时立即返回该错误，不产生部分结果。
pub fn parse_criteria(filter: &FilterNode) -> Result<CriteriaAst, CriteriaError> {
    check_syntax(filter)?;

    // 语法检查通过后只会有一个字段，找到第一个即可
    if let Some((operation, children)) = parse_operation(filter) {
        let children = children
            .into_iter()
            .map(parse_criteria)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(CriteriaAst::Node(Node::new(operation, children)));
    }

    if let Some((function, arg)) = parse_function(filter) {
        return Ok(CriteriaAst::Leaf(Leaf::new(function, arg, filter.is_escaped)));
    }

    Err(CriteriaError::EmptyNode)
}

/// 检查节点恰好设置了一个字段，并且 `isEscaped` 用法正确
fn check_syntax(filter: &FilterNode) -> Result<(), CriteriaError> {
    let fields = filter.non_empty_fields();
    let field = match fields.as_slice() {
        [] => return Err(CriteriaError::EmptyNode),
        [single] => *single,
        _ => return Err(CriteriaError::MultipleFields(fields)),
    };

    if filter.is_escaped && !RAW_ALLOWED.contains(&field) {
        return Err(CriteriaError::EscapeNotAllowed(field));
    }
    Ok(())
}

fn parse_operation(filter: &FilterNode) -> Option<(Operation, Vec<&FilterNode>)> {
    if !filter.and.is_empty() {
        return Some((Operation::And, filter.and.iter().collect()));
    }
    if !filter.or.is_empty() {
        return Some((Operation::Or, filter.or.iter().collect()));
    }
    filter
        .not
        .as_deref()
        .map(|child| (Operation::Not, vec![child]))
}

fn parse_function(filter: &FilterNode) -> Option<(Function, &str)> {
    let candidates = [
        (Function::From, &filter.from),
        (Function::To, &filter.to),
        (Function::Cc, &filter.cc),
        (Function::Bcc, &filter.bcc),
        (Function::ReplyTo, &filter.reply_to),
        (Function::Subject, &filter.subject),
        (Function::List, &filter.list),
        (Function::Has, &filter.has),
        (Function::Query, &filter.query),
    ];
    candidates
        .into_iter()
        .find(|(_, value)| !value.is_empty())
        .map(|(function, value)| (function, value.as_str()))
}
