//! Call-expression parsing for `callMethod` actions.
//!
//! The client encodes a method call as a string such as `set_name('Bob')`.
//! Parsing is deliberately naive: arguments are split on every comma, and only
//! quoted string literals survive normalization. Anything else (numbers,
//! booleans, barewords, tokens with surrounding whitespace) becomes `null`.
//! Keyword arguments are not supported.

use serde_json::Value;

/// A parsed method name with its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub name: String,
    pub args: Vec<Value>,
}

/// What a `callMethod` name asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum CallKind {
    /// `reset` or `reset()`: rebuild the component from scratch.
    Reset,
    /// `prop=value`: direct assignment of a top-level field.
    Assign { target: String, value: Value },
    /// Anything else: a method invocation.
    Invoke(MethodCall),
}

/// Classify a `callMethod` name.
///
/// An `=` makes the expression an assignment unless it appears inside the
/// parentheses of a call (`set_label('a=b')` is still a call).
pub fn classify(expr: &str) -> CallKind {
    if expr == "reset" || expr == "reset()" {
        return CallKind::Reset;
    }

    if let Some((target, rest)) = expr.split_once('=') {
        if !target.contains('(') {
            // Only the text up to a second `=` counts as the value.
            let raw = rest.split('=').next().unwrap_or_default();
            return CallKind::Assign {
                target: target.to_string(),
                value: normalize_arg(raw),
            };
        }
    }

    CallKind::Invoke(parse_call(expr))
}

/// Split a call expression into a method name and normalized arguments.
///
/// Without a `(...)` suffix the whole expression is the method name.
pub fn parse_call(expr: &str) -> MethodCall {
    let Some(open) = expr.find('(') else {
        return bare(expr);
    };
    if !expr.ends_with(')') {
        return bare(expr);
    }

    let name = &expr[..open];
    let inner = &expr[open + 1..expr.len() - 1];
    let args = if inner.is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(normalize_arg).collect()
    };

    MethodCall {
        name: name.to_string(),
        args,
    }
}

fn bare(expr: &str) -> MethodCall {
    MethodCall {
        name: expr.to_string(),
        args: Vec::new(),
    }
}

/// Strip matching single or double quotes from a raw argument token.
///
/// Unquoted tokens normalize to `null`.
pub fn normalize_arg(token: &str) -> Value {
    match unquote(token) {
        Some(inner) => Value::String(inner.to_string()),
        None => Value::Null,
    }
}

fn unquote(token: &str) -> Option<&str> {
    for quote in ['\'', '"'] {
        if token.starts_with(quote) && token.ends_with(quote) {
            // A lone quote character is both prefix and suffix: empty literal.
            return Some(token.get(1..token.len() - 1).unwrap_or_default());
        }
    }
    None
}
