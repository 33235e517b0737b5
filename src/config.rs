//! 配置模块，负责加载JSON格式的规则配置文件

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 配置文件错误
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "配置错误: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 规则配置文件的根结构
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// 用户编写的单条规则：过滤条件 + 动作
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub filter: FilterNode,
    #[serde(default)]
    pub actions: Actions,
}

/// 过滤条件树的一个节点
///
/// 合法的节点恰好设置一个字段：一个谓词字段 (`from`, `to`, ...)
/// 或一个组合字段 (`and`, `or`, `not`)。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterNode {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub and: Vec<FilterNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub or: Vec<FilterNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<FilterNode>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bcc: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reply_to: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub list: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub has: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,

    /// 原样匹配，不做分词
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_escaped: bool,
}

impl FilterNode {
    /// 按固定顺序返回所有非空字段的名称
    ///
    /// 顺序：and, or, not, from, to, cc, bcc, replyTo, subject, list, has, query
    pub fn non_empty_fields(&self) -> Vec<&'static str> {
        let checks: [(&'static str, bool); 12] = [
            ("and", !self.and.is_empty()),
            ("or", !self.or.is_empty()),
            ("not", self.not.is_some()),
            ("from", !self.from.is_empty()),
            ("to", !self.to.is_empty()),
            ("cc", !self.cc.is_empty()),
            ("bcc", !self.bcc.is_empty()),
            ("replyTo", !self.reply_to.is_empty()),
            ("subject", !self.subject.is_empty()),
            ("list", !self.list.is_empty()),
            ("has", !self.has.is_empty()),
            ("query", !self.query.is_empty()),
        ];
        checks
            .iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| *name)
            .collect()
    }
}

/// 规则命中后执行的动作
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actions {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub archive: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub delete: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub mark_read: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub star: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_spam: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_important: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,
}

impl Actions {
    /// 没有设置任何动作
    pub fn is_empty(&self) -> bool {
        !self.archive
            && !self.delete
            && !self.mark_read
            && !self.star
            && self.mark_spam.is_none()
            && self.mark_important.is_none()
            && self.category.as_deref().map_or(true, str::is_empty)
            && self.labels.is_empty()
            && self.forward.as_deref().map_or(true, str::is_empty)
    }
}

impl Config {
    /// 从JSON文件加载规则配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "配置文件不存在: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!("无法读取配置文件 {}: {}", path_ref.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            ConfigError::new(format!(
                "无法解析JSON配置文件 {}: {}",
                path_ref.display(),
                e
            ))
        })
    }

    /// 从JSON字符串加载规则配置
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::new(format!("无法解析JSON配置: {}", e)))
    }
}
