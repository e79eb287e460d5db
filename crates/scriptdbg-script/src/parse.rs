//! Line-oriented script parser.
//!
//! Each non-blank line that does not start with `#` is one assignment,
//! either `name = <json>` (global) or `let name = <json>` (local).

use crate::error::ScriptError;

/// Where an assignment stores its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Global,
    Local,
}

/// One parsed assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// 1-based source line.
    pub line: u32,
    pub binding: Binding,
    pub name: String,
    pub value: serde_json::Value,
}

/// Parse a whole script.
pub fn parse_script(source: &str) -> Result<Vec<Statement>, ScriptError> {
    let mut statements = Vec::new();
    for (index, text) in source.lines().enumerate() {
        let line = u32::try_from(index + 1).map_err(|_| ScriptError::Parse {
            line: u32::MAX,
            message: "script too long".into(),
        })?;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        statements.push(parse_statement(line, text)?);
    }
    Ok(statements)
}

fn parse_statement(line: u32, text: &str) -> Result<Statement, ScriptError> {
    let fail = |message: String| ScriptError::Parse { line, message };

    let (binding, rest) = match text.strip_prefix("let ") {
        Some(rest) => (Binding::Local, rest),
        None => (Binding::Global, text),
    };
    let (name, value) = rest
        .split_once('=')
        .ok_or_else(|| fail("expected `name = value`".into()))?;
    let name = name.trim();
    if !is_identifier(name) {
        return Err(fail(format!("invalid variable name {name:?}")));
    }
    let value = serde_json::from_str(value.trim()).map_err(|e| fail(format!("invalid value: {e}")))?;

    Ok(Statement {
        line,
        binding,
        name: name.to_string(),
        value,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_globals_and_locals_with_line_numbers() {
        let source = "# setup\nx = 1\n\n  let name = \"bob\"\ncfg = {\"a\": [1, 2]}\n";
        let statements = parse_script(source).unwrap();
        assert_eq!(
            statements,
            vec![
                Statement {
                    line: 2,
                    binding: Binding::Global,
                    name: "x".into(),
                    value: json!(1),
                },
                Statement {
                    line: 4,
                    binding: Binding::Local,
                    name: "name".into(),
                    value: json!("bob"),
                },
                Statement {
                    line: 5,
                    binding: Binding::Global,
                    name: "cfg".into(),
                    value: json!({"a": [1, 2]}),
                },
            ]
        );
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let statements = parse_script("s = \"a=b\"").unwrap();
        assert_eq!(statements[0].value, json!("a=b"));
    }

    #[test]
    fn missing_assignment_is_rejected() {
        let err = parse_script("x = 1\nprint x\n").unwrap_err();
        assert!(matches!(err, ScriptError::Parse { line: 2, .. }));
    }

    #[test]
    fn bad_name_is_rejected() {
        for source in ["1x = 2", " = 2", "a b = 3", "let = 4"] {
            assert!(parse_script(source).is_err(), "{source}");
        }
    }

    #[test]
    fn bad_json_is_rejected() {
        let err = parse_script("x = {nope}").unwrap_err();
        assert!(err.to_string().starts_with("line 1: invalid value"));
    }

    #[test]
    fn empty_script_has_no_statements() {
        assert!(parse_script("\n# only comments\n\n").unwrap().is_empty());
    }
}
