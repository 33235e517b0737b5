//! Human-readable dumps used in error details.

use serde::Serialize;

/// Render a value as JSON, on one line or indented.
///
/// Falls back to a placeholder if the value cannot be serialized, since the
/// result is only ever used to decorate an error.
pub fn prettify<T: Serialize>(value: &T, multiline: bool) -> String {
    let rendered = if multiline {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.unwrap_or_else(|e| format!("<unprintable: {}>", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Actions, FilterNode, RuleSpec};

    #[test]
    fn test_single_line_rule() {
        let rule = RuleSpec {
            filter: FilterNode {
                from: "a".to_string(),
                ..Default::default()
            },
            actions: Actions {
                archive: true,
                ..Default::default()
            },
        };
        assert_eq!(
            prettify(&rule, false),
            r#"{"filter":{"from":"a"},"actions":{"archive":true}}"#
        );
    }

    #[test]
    fn test_multiline_rule() {
        let rule = RuleSpec::default();
        let rendered = prettify(&rule, true);
        assert!(rendered.contains('\n'));
        assert!(rendered.contains("\"filter\""));
    }
}
