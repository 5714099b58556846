//! Query evaluation against a single document
//!
//! Evaluation follows three-valued logic: a field that is absent evaluates to
//! *undefined* (`None`), and any comparison involving undefined, or ordering
//! between values of different JSON types, is undefined as well. A document
//! matches a filter only when the filter evaluates to `true`.

use super::{CompareOp, Expr, FieldPath, Function, Projection, SelectQuery};
use crate::document::Document;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Evaluate `expr` against `doc`. `None` means undefined.
pub fn evaluate(expr: &Expr, doc: &Document) -> Option<Value> {
    match expr {
        Expr::Literal(value) => Some(value.clone()),
        Expr::Field(path) => lookup(doc, path).cloned(),
        Expr::Compare { op, left, right } => {
            let left = evaluate(left, doc)?;
            let right = evaluate(right, doc)?;
            compare(*op, &left, &right).map(Value::Bool)
        }
        Expr::And(left, right) => {
            match (truth(evaluate(left, doc)), truth(evaluate(right, doc))) {
                (Some(false), _) | (_, Some(false)) => Some(Value::Bool(false)),
                (Some(true), Some(true)) => Some(Value::Bool(true)),
                _ => None,
            }
        }
        Expr::Or(left, right) => {
            match (truth(evaluate(left, doc)), truth(evaluate(right, doc))) {
                (Some(true), _) | (_, Some(true)) => Some(Value::Bool(true)),
                (Some(false), Some(false)) => Some(Value::Bool(false)),
                _ => None,
            }
        }
        Expr::Not(inner) => truth(evaluate(inner, doc)).map(|b| Value::Bool(!b)),
        Expr::Call { func, args } => call(*func, args, doc),
    }
}

/// Whether `doc` passes `filter` (no filter matches everything).
pub fn matches(filter: Option<&Expr>, doc: &Document) -> bool {
    match filter {
        Some(expr) => evaluate(expr, doc) == Some(Value::Bool(true)),
        None => true,
    }
}

/// Shape one matching document according to the query projection.
///
/// Returns `None` when the projection yields nothing for this document (a
/// `SELECT VALUE` of an undefined field). Count projections are aggregated by
/// the caller and are not handled here.
pub fn project(query: &SelectQuery, doc: &Document) -> Option<Value> {
    match &query.projection {
        Projection::All | Projection::Count => Some(Value::Object(doc.clone())),
        Projection::Fields(fields) => {
            if query.value {
                return fields.first().and_then(|f| lookup(doc, f).cloned());
            }
            let mut out = Map::new();
            for field in fields {
                if let Some(value) = lookup(doc, field) {
                    out.insert(field.output_name().to_string(), value.clone());
                }
            }
            Some(Value::Object(out))
        }
    }
}

fn lookup<'a>(doc: &'a Document, path: &FieldPath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let mut current = doc.get(first)?;
    for segment in rest {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn truth(value: Option<Value>) -> Option<bool> {
    match value {
        Some(Value::Bool(b)) => Some(b),
        _ => None,
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Option<bool> {
    match op {
        CompareOp::Eq => equal(left, right),
        CompareOp::Ne => equal(left, right).map(|eq| !eq),
        CompareOp::Lt => order(left, right).map(|o| o == Ordering::Less),
        CompareOp::Le => order(left, right).map(|o| o != Ordering::Greater),
        CompareOp::Gt => order(left, right).map(|o| o == Ordering::Greater),
        CompareOp::Ge => order(left, right).map(|o| o != Ordering::Less),
    }
}

fn equal(left: &Value, right: &Value) -> Option<bool> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Some(a.as_f64() == b.as_f64()),
        (Value::String(a), Value::String(b)) => Some(a == b),
        (Value::Bool(a), Value::Bool(b)) => Some(a == b),
        (Value::Null, Value::Null) => Some(true),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            Some(left == right)
        }
        _ => Some(false),
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn call(func: Function, args: &[Expr], doc: &Document) -> Option<Value> {
    let values: Vec<Option<Value>> = args.iter().map(|a| evaluate(a, doc)).collect();
    match func {
        Function::IsDefined => Some(Value::Bool(values.first()?.is_some())),
        Function::IsNull => Some(Value::Bool(matches!(values.first()?, Some(Value::Null)))),
        Function::Contains | Function::StartsWith | Function::EndsWith => {
            match (values.first()?, values.get(1)?) {
                (Some(Value::String(s)), Some(Value::String(needle))) => {
                    let hit = match func {
                        Function::Contains => s.contains(needle.as_str()),
                        Function::StartsWith => s.starts_with(needle.as_str()),
                        _ => s.ends_with(needle.as_str()),
                    };
                    Some(Value::Bool(hit))
                }
                _ => None,
            }
        }
    }
}
