//! Filter expressions — the matching language evaluated against one record.
//!
//! A filter is either a leaf string of the form `col[->subkey]:op[:literal]`
//! or a composite `{"OR": [...]}` / `{"AND": [...]}` / `{"NOT": expr}`.
//! A bare list of filters is an implicit AND (see [`matches_all`]).
//!
//! Evaluation is always a single in-process pass over one already-fetched
//! record; there is no planner and no IO.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Record;

/// One node of a filter expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterExpr {
    /// `"col[->subkey]:op[:literal]"`.
    Leaf(String),
    /// `{"OR": [...]}`, `{"AND": [...]}`, or `{"NOT": expr}`.
    Composite(Composite),
}

/// Boolean combinators over sub-expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Composite {
    #[serde(rename = "OR")]
    Or(Vec<FilterExpr>),
    #[serde(rename = "AND")]
    And(Vec<FilterExpr>),
    #[serde(rename = "NOT")]
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Evaluate this expression against a record.
    ///
    /// Malformed leaves (missing operator, unknown operator) never match;
    /// they are logged once per evaluation rather than raised, since filter
    /// syntax is not re-checked at config-save time.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Leaf(leaf) => match Leaf::parse(leaf) {
                Some(parsed) => parsed.matches(record),
                None => {
                    tracing::warn!(filter = %leaf, "malformed filter leaf, treating as non-match");
                    false
                }
            },
            Self::Composite(Composite::Or(subs)) => subs.iter().any(|e| e.matches(record)),
            Self::Composite(Composite::And(subs)) => subs.iter().all(|e| e.matches(record)),
            Self::Composite(Composite::Not(sub)) => !sub.matches(record),
        }
    }
}

/// Evaluate a bare list of filters as an implicit AND.
///
/// An empty list matches everything.
#[must_use]
pub fn matches_all(filters: &[FilterExpr], record: &Record) -> bool {
    filters.iter().all(|f| f.matches(record))
}

/// A parsed leaf: column selector, operator, optional literal.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Leaf<'a> {
    column: &'a str,
    subkey: Option<&'a str>,
    op: String,
    literal: Option<&'a str>,
}

impl<'a> Leaf<'a> {
    /// Split `col[->subkey]:op[:literal]` on `:` into at most three parts.
    fn parse(leaf: &'a str) -> Option<Self> {
        let mut parts = leaf.splitn(3, ':');
        let column_spec = parts.next()?;
        let op = parts.next()?;
        if column_spec.is_empty() || op.is_empty() {
            return None;
        }
        let literal = parts.next();

        let (column, subkey) = match column_spec.split_once("->") {
            Some((col, sub)) => (col, Some(sub)),
            None => (column_spec, None),
        };

        Some(Self {
            column,
            subkey,
            op: op.to_ascii_uppercase(),
            literal,
        })
    }

    fn matches(&self, record: &Record) -> bool {
        // Asymmetric lookup semantics, preserved deliberately: an absent
        // top-level column evaluates operators against null, but an
        // unreachable `->subkey` is an immediate non-match.
        let value = if let Some(subkey) = self.subkey {
            match record.get(self.column) {
                Some(Value::Object(nested)) => match nested.get(subkey) {
                    Some(value) => value,
                    None => return false,
                },
                _ => return false,
            }
        } else {
            record.get(self.column).unwrap_or(&Value::Null)
        };

        let literal = self.literal.unwrap_or_default();
        match self.op.as_str() {
            "IS_NULL" => value.is_null(),
            "IS_NOT_NULL" => !value.is_null(),
            "CONTAINS" => array_contains(value, literal),
            "NOT_CONTAINS" => !array_contains(value, literal),
            "=" => compare(value, literal) == Some(std::cmp::Ordering::Equal),
            "!=" => compare(value, literal) != Some(std::cmp::Ordering::Equal),
            ">" => compare(value, literal) == Some(std::cmp::Ordering::Greater),
            ">=" => matches!(
                compare(value, literal),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            ),
            "<" => compare(value, literal) == Some(std::cmp::Ordering::Less),
            "<=" => matches!(
                compare(value, literal),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            ),
            "IN" => literal.split(',').any(|choice| choice == value_text(value)),
            "NOT_IN" => !literal.split(',').any(|choice| choice == value_text(value)),
            "LIKE" => like(&value_text(value), literal),
            "ILIKE" => like(
                &value_text(value).to_lowercase(),
                &literal.to_lowercase(),
            ),
            other => {
                tracing::warn!(op = %other, "unknown filter operator, treating as non-match");
                false
            }
        }
    }
}

/// Membership test for array-valued fields.
///
/// A missing, null, or non-array value does not contain anything.
fn array_contains(value: &Value, literal: &str) -> bool {
    value
        .as_array()
        .is_some_and(|items| items.iter().any(|item| value_text(item) == literal))
}

/// Compare a record value with a literal.
///
/// When the record value is numeric the literal is coerced to the same type;
/// otherwise both sides compare as text. Returns `None` when a numeric value
/// meets a non-numeric literal.
fn compare(value: &Value, literal: &str) -> Option<std::cmp::Ordering> {
    if let Some(number) = value.as_f64() {
        let parsed: f64 = literal.parse().ok()?;
        number.partial_cmp(&parsed)
    } else {
        Some(value_text(value).as_str().cmp(literal))
    }
}

/// Text form of a value for string-level operators.
///
/// Null renders as the empty string so it never equals a real literal.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// SQL-ish pattern match: exact, `%suffix`, `prefix%`, `%substring%`.
fn like(text: &str, pattern: &str) -> bool {
    if let Some(inner) = pattern
        .strip_prefix('%')
        .and_then(|rest| rest.strip_suffix('%'))
    {
        text.contains(inner)
    } else if let Some(suffix) = pattern.strip_prefix('%') {
        text.ends_with(suffix)
    } else if let Some(prefix) = pattern.strip_suffix('%') {
        text.starts_with(prefix)
    } else {
        text == pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: Value) -> Record {
        match json {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    fn leaf(text: &str) -> FilterExpr {
        FilterExpr::Leaf(text.to_string())
    }

    #[test]
    fn should_match_is_null_when_field_absent_or_null() {
        let rec = record(serde_json::json!({"present": null, "filled": "x"}));
        assert!(leaf("present:IS_NULL").matches(&rec));
        assert!(leaf("missing:IS_NULL").matches(&rec));
        assert!(!leaf("filled:IS_NULL").matches(&rec));
    }

    #[test]
    fn should_match_is_not_null_only_for_non_null_values() {
        let rec = record(serde_json::json!({"filled": 0, "empty": null}));
        assert!(leaf("filled:IS_NOT_NULL").matches(&rec));
        assert!(!leaf("empty:IS_NOT_NULL").matches(&rec));
        assert!(!leaf("missing:IS_NOT_NULL").matches(&rec));
    }

    #[test]
    fn should_treat_missing_subkey_as_non_match_even_for_is_null() {
        // The asymmetry: a missing top-level column is null, a missing
        // nested key is a non-match.
        let rec = record(serde_json::json!({"meta": {"a": 1}, "flat": "x"}));
        assert!(!leaf("meta->b:IS_NULL").matches(&rec));
        assert!(!leaf("flat->b:IS_NULL").matches(&rec));
        assert!(!leaf("missing->b:IS_NULL").matches(&rec));
        assert!(leaf("meta->a:IS_NOT_NULL").matches(&rec));
    }

    #[test]
    fn should_compare_numerically_when_record_value_is_numeric() {
        let rec = record(serde_json::json!({"score": 10}));
        assert!(leaf("score:=:10").matches(&rec));
        assert!(leaf("score:>:9.5").matches(&rec));
        assert!(leaf("score:<=:10").matches(&rec));
        assert!(!leaf("score:=:9").matches(&rec));
        // "10" as a string would sort before "9" lexicographically; the
        // numeric coercion is what makes this hold.
        assert!(leaf("score:>:9").matches(&rec));
    }

    #[test]
    fn should_compare_as_strings_when_record_value_is_text() {
        let rec = record(serde_json::json!({"stage": "qualified"}));
        assert!(leaf("stage:=:qualified").matches(&rec));
        assert!(leaf("stage:!=:won").matches(&rec));
        assert!(leaf("stage:>:lead").matches(&rec));
    }

    #[test]
    fn should_not_match_when_numeric_value_meets_non_numeric_literal() {
        let rec = record(serde_json::json!({"score": 10}));
        assert!(!leaf("score:=:high").matches(&rec));
        assert!(!leaf("score:>:high").matches(&rec));
    }

    #[test]
    fn should_match_contains_against_array_elements() {
        let rec = record(serde_json::json!({"tags": ["vip", "welcome_email_sent"]}));
        assert!(leaf("tags:CONTAINS:vip").matches(&rec));
        assert!(!leaf("tags:CONTAINS:churned").matches(&rec));
    }

    #[test]
    fn should_treat_missing_or_null_field_as_not_containing() {
        let rec = record(serde_json::json!({"tags": null, "name": "x"}));
        assert!(!leaf("tags:CONTAINS:vip").matches(&rec));
        assert!(!leaf("missing:CONTAINS:vip").matches(&rec));
        assert!(leaf("tags:NOT_CONTAINS:vip").matches(&rec));
        assert!(leaf("missing:NOT_CONTAINS:vip").matches(&rec));
        // Non-array values do not contain anything either.
        assert!(leaf("name:NOT_CONTAINS:x").matches(&rec));
    }

    #[test]
    fn should_match_in_against_comma_split_literal() {
        let rec = record(serde_json::json!({"stage": "lead"}));
        assert!(leaf("stage:IN:lead,qualified").matches(&rec));
        assert!(!leaf("stage:IN:won,lost").matches(&rec));
        assert!(leaf("stage:NOT_IN:won,lost").matches(&rec));
    }

    #[test]
    fn should_support_all_like_pattern_forms() {
        let rec = record(serde_json::json!({"email": "ada@example.com"}));
        assert!(leaf("email:LIKE:ada@example.com").matches(&rec));
        assert!(leaf("email:LIKE:%example.com").matches(&rec));
        assert!(leaf("email:LIKE:ada%").matches(&rec));
        assert!(leaf("email:LIKE:%@example%").matches(&rec));
        assert!(!leaf("email:LIKE:%@other.com").matches(&rec));
    }

    #[test]
    fn should_match_ilike_case_insensitively() {
        let rec = record(serde_json::json!({"email": "Ada@Example.COM"}));
        assert!(leaf("email:ILIKE:%example.com").matches(&rec));
        assert!(!leaf("email:LIKE:%example.com").matches(&rec));
    }

    #[test]
    fn should_treat_operator_names_case_insensitively() {
        let rec = record(serde_json::json!({"tags": ["vip"]}));
        assert!(leaf("tags:contains:vip").matches(&rec));
        assert!(leaf("tags:Contains:vip").matches(&rec));
    }

    #[test]
    fn should_never_match_malformed_or_unknown_leaves() {
        let rec = record(serde_json::json!({"x": 1}));
        assert!(!leaf("x").matches(&rec));
        assert!(!leaf("").matches(&rec));
        assert!(!leaf("x:BETWEEN:1").matches(&rec));
    }

    #[test]
    fn should_negate_any_expression_with_not() {
        let rec = record(serde_json::json!({"stage": "lead", "score": 3}));
        let exprs = [
            leaf("stage:=:lead"),
            leaf("score:>:5"),
            leaf("missing:IS_NULL"),
            FilterExpr::Composite(Composite::Or(vec![
                leaf("stage:=:won"),
                leaf("score:<:10"),
            ])),
        ];
        for expr in exprs {
            let negated = FilterExpr::Composite(Composite::Not(Box::new(expr.clone())));
            assert_eq!(negated.matches(&rec), !expr.matches(&rec));
        }
    }

    #[test]
    fn should_treat_bare_list_as_implicit_and() {
        let rec = record(serde_json::json!({"stage": "lead", "score": 3}));
        let list = [leaf("stage:=:lead"), leaf("score:<:10")];
        let and = FilterExpr::Composite(Composite::And(list.to_vec()));
        assert_eq!(matches_all(&list, &rec), and.matches(&rec));
        assert!(matches_all(&list, &rec));

        let failing = [leaf("stage:=:lead"), leaf("score:>:10")];
        assert!(!matches_all(&failing, &rec));
    }

    #[test]
    fn should_match_or_when_any_branch_matches() {
        let rec = record(serde_json::json!({"stage": "lead"}));
        let expr = FilterExpr::Composite(Composite::Or(vec![
            leaf("stage:=:won"),
            leaf("stage:=:lead"),
        ]));
        assert!(expr.matches(&rec));

        let expr = FilterExpr::Composite(Composite::Or(vec![
            leaf("stage:=:won"),
            leaf("stage:=:lost"),
        ]));
        assert!(!expr.matches(&rec));
    }

    #[test]
    fn should_match_everything_with_empty_filter_list() {
        let rec = record(serde_json::json!({}));
        assert!(matches_all(&[], &rec));
    }

    #[test]
    fn should_deserialize_leaf_and_composite_shapes() {
        let expr: FilterExpr = serde_json::from_value(serde_json::json!(
            {"OR": ["a:IS_NULL", {"NOT": "b:=:1"}, {"AND": ["c:>:2", "d:IS_NOT_NULL"]}]}
        ))
        .unwrap();
        match expr {
            FilterExpr::Composite(Composite::Or(subs)) => assert_eq!(subs.len(), 3),
            other => panic!("expected OR composite, got {other:?}"),
        }

        let expr: FilterExpr = serde_json::from_value(serde_json::json!("a:=:1")).unwrap();
        assert_eq!(expr, FilterExpr::Leaf("a:=:1".to_string()));
    }

    #[test]
    fn should_roundtrip_filters_through_serde_json() {
        let expr = FilterExpr::Composite(Composite::Not(Box::new(FilterExpr::Composite(
            Composite::And(vec![leaf("a:=:1"), leaf("b:IS_NULL")]),
        ))));
        let json = serde_json::to_string(&expr).unwrap();
        let parsed: FilterExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, expr);
    }
}
