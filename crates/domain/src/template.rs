//! Template resolver — `{{path}}` substitution against a trigger context.
//!
//! Placeholders hold a dotted path into the execution context
//! (`{{trigger.new_record.contact_email}}`). A path that cannot be fully
//! walked leaves the placeholder text untouched — resolution never fails.
//! A placeholder body containing any of `+ - * /` is first handed to a
//! minimal sandboxed arithmetic evaluator exposing the single zero-argument
//! function `now()`; on evaluation failure it falls back to a plain path
//! lookup.

use serde_json::Value;

use crate::field_op::{FieldDirective, FieldWrite};

/// Resolve every `{{...}}` placeholder in `template` against `ctx`.
#[must_use]
pub fn resolve(template: &str, ctx: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            // Unterminated placeholder: keep the text as written.
            out.push_str("{{");
            rest = after;
            break;
        };
        let body = &after[..end];
        match resolve_placeholder(body, ctx) {
            Some(text) => out.push_str(&text),
            None => {
                out.push_str("{{");
                out.push_str(body);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Resolve one action field value into an atomic [`FieldWrite`].
///
/// - a mapping carrying an `"op"` key is a field-operation directive
/// - strings are template-resolved; a `*_ts` field name additionally
///   coerces the resolved string to a float (kept as text on failure,
///   with a warning)
/// - array entries are resolved element-wise
/// - everything else passes through unchanged
#[must_use]
pub fn resolve_field_value(value: &Value, ctx: &Value, field: &str) -> FieldWrite {
    if let Value::Object(map) = value {
        if let Some(directive) = FieldDirective::parse(map) {
            return resolve_directive(directive, ctx, field);
        }
        if map.contains_key("op") {
            tracing::warn!(%field, "unrecognized field operation, applying as plain value");
        }
        return FieldWrite::Set {
            value: value.clone(),
        };
    }
    FieldWrite::Set {
        value: resolve_scalar(value, ctx, field),
    }
}

fn resolve_directive(directive: FieldDirective, ctx: &Value, field: &str) -> FieldWrite {
    match directive {
        FieldDirective::Append { values } => FieldWrite::Append {
            values: resolve_values(values, ctx),
        },
        FieldDirective::Remove { values } => FieldWrite::Remove {
            values: resolve_values(values, ctx),
        },
        FieldDirective::Increment { value } => resolve_delta(&value, ctx, 1.0),
        FieldDirective::Decrement { value } => resolve_delta(&value, ctx, -1.0),
        FieldDirective::Set { value } => FieldWrite::Set {
            value: resolve_scalar(&value, ctx, field),
        },
    }
}

fn resolve_values(values: Vec<Value>, ctx: &Value) -> Vec<Value> {
    values
        .into_iter()
        .map(|value| resolve_scalar(&value, ctx, ""))
        .collect()
}

/// Resolve an increment/decrement operand to a signed delta.
///
/// An operand that does not resolve to a number degrades to a plain `set`
/// of the raw value, with a warning — the engine never raises for a bad
/// directive at execution time.
fn resolve_delta(value: &Value, ctx: &Value, sign: f64) -> FieldWrite {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(template) => resolve(template, ctx).parse().ok(),
        _ => None,
    };
    match parsed {
        Some(delta) => FieldWrite::Increment {
            delta: sign * delta,
        },
        None => {
            tracing::warn!(operand = %value, "non-numeric increment operand, applying as plain value");
            FieldWrite::Set {
                value: value.clone(),
            }
        }
    }
}

fn resolve_scalar(value: &Value, ctx: &Value, field: &str) -> Value {
    match value {
        Value::String(template) => {
            let resolved = resolve(template, ctx);
            if field.ends_with("_ts") {
                return coerce_timestamp(field, resolved);
            }
            Value::String(resolved)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_scalar(item, ctx, ""))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// `*_ts` fields carry Unix-seconds floats; keep the string when it will not parse.
fn coerce_timestamp(field: &str, resolved: String) -> Value {
    match resolved.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Some(number) => Value::Number(number),
        None => {
            tracing::warn!(%field, value = %resolved, "timestamp field did not resolve to a number");
            Value::String(resolved)
        }
    }
}

/// Recursively resolve template strings inside a JSON value.
///
/// Used for free-form payloads such as task details, where every string at
/// any depth may carry placeholders.
#[must_use]
pub fn resolve_value(value: &Value, ctx: &Value) -> Value {
    match value {
        Value::String(template) => Value::String(resolve(template, ctx)),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| resolve_value(item, ctx)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), resolve_value(item, ctx)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn resolve_placeholder(body: &str, ctx: &Value) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.contains(['+', '-', '*', '/'])
        && let Ok(number) = arith::eval(trimmed)
    {
        return Some(format_number(number));
    }
    lookup_path(ctx, trimmed).map(value_text)
}

/// Walk a dotted path through nested objects.
fn lookup_path<'a>(ctx: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(ctx, |current, segment| current.as_object()?.get(segment))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Render a float without a trailing `.0` when it is integral.
#[allow(clippy::cast_possible_truncation)]
fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 9e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

/// Sandboxed arithmetic over `+ - * /`, numeric literals, parentheses,
/// unary minus, and the single symbol `now()`.
///
/// Hand-written recursive descent on purpose: the grammar is the whole
/// attack surface, so it admits nothing else.
mod arith {
    use crate::time::unix_now;

    #[derive(Debug, Clone, PartialEq)]
    enum Token {
        Number(f64),
        Now,
        Plus,
        Minus,
        Star,
        Slash,
        Open,
        Close,
    }

    pub(super) fn eval(input: &str) -> Result<f64, ()> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let value = parser.expr()?;
        if parser.pos == parser.tokens.len() {
            Ok(value)
        } else {
            Err(())
        }
    }

    fn tokenize(input: &str) -> Result<Vec<Token>, ()> {
        let mut tokens = Vec::new();
        let mut chars = input.char_indices().peekable();
        while let Some(&(start, ch)) = chars.peek() {
            match ch {
                ' ' | '\t' => {
                    chars.next();
                }
                '+' => {
                    chars.next();
                    tokens.push(Token::Plus);
                }
                '-' => {
                    chars.next();
                    tokens.push(Token::Minus);
                }
                '*' => {
                    chars.next();
                    tokens.push(Token::Star);
                }
                '/' => {
                    chars.next();
                    tokens.push(Token::Slash);
                }
                '(' => {
                    chars.next();
                    tokens.push(Token::Open);
                }
                ')' => {
                    chars.next();
                    tokens.push(Token::Close);
                }
                '0'..='9' | '.' => {
                    let mut end = start;
                    while let Some(&(idx, digit)) = chars.peek() {
                        if digit.is_ascii_digit() || digit == '.' {
                            end = idx + digit.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let number: f64 = input[start..end].parse().map_err(|_| ())?;
                    tokens.push(Token::Number(number));
                }
                'a'..='z' | 'A'..='Z' | '_' => {
                    let mut end = start;
                    while let Some(&(idx, letter)) = chars.peek() {
                        if letter.is_ascii_alphanumeric() || letter == '_' {
                            end = idx + letter.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    // The only symbol in the grammar is the function now().
                    if &input[start..end] != "now" {
                        return Err(());
                    }
                    if chars.next_if(|&(_, c)| c == '(').is_none() {
                        return Err(());
                    }
                    if chars.next_if(|&(_, c)| c == ')').is_none() {
                        return Err(());
                    }
                    tokens.push(Token::Now);
                }
                _ => return Err(()),
            }
        }
        Ok(tokens)
    }

    struct Parser {
        tokens: Vec<Token>,
        pos: usize,
    }

    impl Parser {
        fn peek(&self) -> Option<&Token> {
            self.tokens.get(self.pos)
        }

        fn next(&mut self) -> Option<Token> {
            let token = self.tokens.get(self.pos).cloned();
            if token.is_some() {
                self.pos += 1;
            }
            token
        }

        fn expr(&mut self) -> Result<f64, ()> {
            let mut value = self.term()?;
            while let Some(op) = self.peek().cloned() {
                match op {
                    Token::Plus => {
                        self.pos += 1;
                        value += self.term()?;
                    }
                    Token::Minus => {
                        self.pos += 1;
                        value -= self.term()?;
                    }
                    _ => break,
                }
            }
            Ok(value)
        }

        fn term(&mut self) -> Result<f64, ()> {
            let mut value = self.factor()?;
            while let Some(op) = self.peek().cloned() {
                match op {
                    Token::Star => {
                        self.pos += 1;
                        value *= self.factor()?;
                    }
                    Token::Slash => {
                        self.pos += 1;
                        value /= self.factor()?;
                    }
                    _ => break,
                }
            }
            Ok(value)
        }

        fn factor(&mut self) -> Result<f64, ()> {
            match self.next().ok_or(())? {
                Token::Number(number) => Ok(number),
                Token::Now => Ok(unix_now()),
                Token::Minus => Ok(-self.factor()?),
                Token::Open => {
                    let value = self.expr()?;
                    match self.next() {
                        Some(Token::Close) => Ok(value),
                        _ => Err(()),
                    }
                }
                _ => Err(()),
            }
        }
    }

}
