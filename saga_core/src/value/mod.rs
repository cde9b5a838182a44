//! Value resolution - Combine contribution tokens into a single number
//!
//! Tokens are summed first. Multiplicative directives (`*n`, `/n`) are then
//! applied in the order they were encountered, and finally the clamps
//! (`min n`, `max n`). An override (`=n`) replaces the additive total.
//!
//! ```text
//! ["2", "3", "*2", "min 12"]  =>  (2 + 3) * 2 = 10, clamped up to 12
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error raised when a token cannot be turned into a number
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Non-numeric value: '{0}'")]
    NotNumeric(String),
    #[error("Unknown variable: '{0}'")]
    UnknownVariable(String),
    #[error("Malformed directive: '{0}'")]
    MalformedDirective(String),
}

/// Raw value carried by an attribute contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl Default for AttributeValue {
    fn default() -> Self {
        AttributeValue::Null
    }
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Truthiness used by OR reductions
    pub fn is_truthy(&self) -> bool {
        match self {
            AttributeValue::Bool(b) => *b,
            AttributeValue::Number(n) => *n != 0.0,
            AttributeValue::Text(s) => {
                let s = s.trim();
                !s.is_empty() && !s.eq_ignore_ascii_case("false") && s != "0"
            }
            AttributeValue::Null => false,
        }
    }

    /// Literal numeric reading, without directives or variables
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Number(n) => write!(f, "{}", format_number(*n)),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Null => Ok(()),
        }
    }
}

impl From<i32> for AttributeValue {
    fn from(n: i32) -> Self {
        AttributeValue::Number(n as f64)
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

/// Lookup for symbolic references such as `@charLevel`
pub trait ValueContext {
    /// Resolve a variable name (without the leading `@`)
    fn variable(&self, name: &str) -> Option<f64>;
}

/// Context with no variables
impl ValueContext for () {
    fn variable(&self, _name: &str) -> Option<f64> {
        None
    }
}

impl ValueContext for std::collections::BTreeMap<String, i32> {
    fn variable(&self, name: &str) -> Option<f64> {
        self.get(name)
            .or_else(|| self.get(&format!("@{}", name)))
            .map(|v| *v as f64)
    }
}

/// A single parsed token
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Add(f64),
    Multiply(f64),
    Divide(f64),
    Min(f64),
    Max(f64),
    Override(f64),
}

/// Resolve an ordered list of tokens into a number
///
/// Null tokens are skipped; an empty list resolves to 0.
pub fn resolve<'a, I>(tokens: I, ctx: &dyn ValueContext) -> Result<f64, ResolveError>
where
    I: IntoIterator<Item = &'a AttributeValue>,
{
    let mut total = 0.0;
    let mut override_value = None;
    let mut scaling = Vec::new();
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;

    for value in tokens {
        let Some(token) = parse_token(value, ctx)? else {
            continue;
        };
        match token {
            Token::Add(n) => total += n,
            Token::Override(n) => override_value = Some(n),
            Token::Multiply(_) | Token::Divide(_) => scaling.push(token),
            Token::Min(n) => min = Some(min.map_or(n, |m: f64| m.max(n))),
            Token::Max(n) => max = Some(max.map_or(n, |m: f64| m.min(n))),
        }
    }

    let mut result = override_value.unwrap_or(total);
    for token in scaling {
        match token {
            Token::Multiply(n) => result *= n,
            Token::Divide(n) => result /= n,
            _ => {}
        }
    }
    if let Some(min) = min {
        result = result.max(min);
    }
    if let Some(max) = max {
        result = result.min(max);
    }
    Ok(result)
}

/// Resolve and floor to a whole number, the form every sheet value takes
pub fn resolve_int<'a, I>(tokens: I, ctx: &dyn ValueContext) -> Result<i32, ResolveError>
where
    I: IntoIterator<Item = &'a AttributeValue>,
{
    resolve(tokens, ctx).map(|n| n.floor() as i32)
}

/// Resolve a single value on its own
pub fn resolve_one(value: &AttributeValue, ctx: &dyn ValueContext) -> Result<Option<f64>, ResolveError> {
    if value.is_null() {
        return Ok(None);
    }
    resolve(std::iter::once(value), ctx).map(Some)
}

fn parse_token(value: &AttributeValue, ctx: &dyn ValueContext) -> Result<Option<Token>, ResolveError> {
    match value {
        AttributeValue::Null => Ok(None),
        AttributeValue::Number(n) => Ok(Some(Token::Add(*n))),
        AttributeValue::Bool(b) => Err(ResolveError::NotNumeric(b.to_string())),
        AttributeValue::Text(text) => parse_text_token(text, ctx),
    }
}

fn parse_text_token(text: &str, ctx: &dyn ValueContext) -> Result<Option<Token>, ResolveError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Some(rest) = text.strip_prefix('*') {
        return operand(rest, text, ctx).map(|n| Some(Token::Multiply(n)));
    }
    if let Some(rest) = text.strip_prefix('/') {
        let n = operand(rest, text, ctx)?;
        if n == 0.0 {
            return Err(ResolveError::MalformedDirective(text.to_string()));
        }
        return Ok(Some(Token::Divide(n)));
    }
    if let Some(rest) = text.strip_prefix('=') {
        return operand(rest, text, ctx).map(|n| Some(Token::Override(n)));
    }
    let lower = text.to_lowercase();
    if let Some(rest) = lower.strip_prefix("min ") {
        return operand(rest, text, ctx).map(|n| Some(Token::Min(n)));
    }
    if let Some(rest) = lower.strip_prefix("max ") {
        return operand(rest, text, ctx).map(|n| Some(Token::Max(n)));
    }

    scalar(text, ctx).map(|n| Some(Token::Add(n)))
}

fn operand(rest: &str, whole: &str, ctx: &dyn ValueContext) -> Result<f64, ResolveError> {
    scalar(rest.trim(), ctx).map_err(|e| match e {
        ResolveError::NotNumeric(_) => ResolveError::MalformedDirective(whole.to_string()),
        other => other,
    })
}

/// A number, or a (possibly negated) `@variable`
fn scalar(text: &str, ctx: &dyn ValueContext) -> Result<f64, ResolveError> {
    if let Some(n) = parse_number(text) {
        return Ok(n);
    }
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest.trim()),
        None => (1.0, text),
    };
    if let Some(name) = body.strip_prefix('@') {
        return ctx
            .variable(name)
            .map(|n| sign * n)
            .ok_or_else(|| ResolveError::UnknownVariable(name.to_string()));
    }
    Err(ResolveError::NotNumeric(text.to_string()))
}

/// Parse "3", "+3", "-1", "1.5"
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
