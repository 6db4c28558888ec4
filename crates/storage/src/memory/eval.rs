//! Expression evaluation over stored JSON documents
//!
//! Values of different JSON types are ordered by type class first:
//!
//! `null < number < string < object < array < bool`
//!
//! A missing field reads as `null`. Range operators (`Gt`, `Lte`, ...) only
//! match values of the same type class as the operand. Equality against an
//! array field also matches when any element equals the operand.

use std::cmp::Ordering;

use docrepo_core::query::{Filter, Projection, SortDefinition, SortDirection, UpdateOp};
use docrepo_core::{DriverError, DriverResult, JsonValue, ID_FIELD};
use serde_json::{Map, Number};
use tracing::trace;

// ============================================================================
// Paths
// ============================================================================

/// Value at a dotted path
pub fn get_path<'a>(doc: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    docrepo_core::field_value(doc, path)
}

/// Set the value at a dotted path, creating intermediate objects
pub fn set_path(doc: &mut JsonValue, path: &str, value: JsonValue) -> DriverResult<()> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(DriverError::InvalidUpdate("empty field path".to_string())),
    };

    let mut current = doc;
    for segment in parents {
        current = match current {
            JsonValue::Object(obj) => obj
                .entry(segment.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new())),
            other => {
                return Err(DriverError::InvalidUpdate(format!(
                    "cannot create field '{}' inside {}",
                    segment,
                    type_name(other)
                )))
            }
        };
    }

    match current {
        JsonValue::Object(obj) => {
            obj.insert(last.to_string(), value);
            Ok(())
        }
        other => Err(DriverError::InvalidUpdate(format!(
            "cannot set field '{}' on {}",
            last,
            type_name(other)
        ))),
    }
}

/// Remove the value at a dotted path, returning it
pub fn unset_path(doc: &mut JsonValue, path: &str) -> Option<JsonValue> {
    let (parent, last) = match path.rsplit_once('.') {
        Some((parent, last)) => (get_path_mut(doc, parent)?, last),
        None => (doc, path),
    };
    match parent {
        JsonValue::Object(obj) => obj.remove(last),
        _ => None,
    }
}

fn get_path_mut<'a>(doc: &'a mut JsonValue, path: &str) -> Option<&'a mut JsonValue> {
    let mut current = doc;
    for segment in path.split('.') {
        current = match current {
            JsonValue::Object(obj) => obj.get_mut(segment)?,
            JsonValue::Array(arr) => arr.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

// ============================================================================
// Ordering
// ============================================================================

fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Number(_) => 1,
        JsonValue::String(_) => 2,
        JsonValue::Object(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Bool(_) => 5,
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x.cmp(&y);
    }
    let x = a.as_f64().unwrap_or(f64::NAN);
    let y = b.as_f64().unwrap_or(f64::NAN);
    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
}

/// Total order over JSON values
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => compare_numbers(x, y),
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y.iter()) {
                let ord = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => Ordering::Equal,
    }
}

fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    compare_values(a, b) == Ordering::Equal
}

// ============================================================================
// Filter matching
// ============================================================================

static NULL: JsonValue = JsonValue::Null;

fn field_equals(doc: &JsonValue, field: &str, operand: &JsonValue) -> bool {
    let value = get_path(doc, field).unwrap_or(&NULL);
    if values_equal(value, operand) {
        return true;
    }
    match value {
        JsonValue::Array(items) => items.iter().any(|item| values_equal(item, operand)),
        _ => false,
    }
}

fn field_in_range(
    doc: &JsonValue,
    field: &str,
    operand: &JsonValue,
    accept: fn(Ordering) -> bool,
) -> bool {
    let Some(value) = get_path(doc, field) else {
        return false;
    };
    let check = |v: &JsonValue| type_rank(v) == type_rank(operand) && accept(compare_values(v, operand));
    match value {
        JsonValue::Array(items) if type_rank(operand) != type_rank(value) => items.iter().any(check),
        v => check(v),
    }
}

/// True if `doc` satisfies `filter`
pub fn matches(filter: &Filter, doc: &JsonValue) -> bool {
    match filter {
        Filter::All => true,
        Filter::Eq(field, operand) => field_equals(doc, field, operand),
        Filter::Ne(field, operand) => !field_equals(doc, field, operand),
        Filter::Gt(field, operand) => field_in_range(doc, field, operand, |o| o == Ordering::Greater),
        Filter::Gte(field, operand) => field_in_range(doc, field, operand, |o| o != Ordering::Less),
        Filter::Lt(field, operand) => field_in_range(doc, field, operand, |o| o == Ordering::Less),
        Filter::Lte(field, operand) => field_in_range(doc, field, operand, |o| o != Ordering::Greater),
        Filter::In(field, operands) => operands.iter().any(|op| field_equals(doc, field, op)),
        Filter::Nin(field, operands) => !operands.iter().any(|op| field_equals(doc, field, op)),
        Filter::Exists(field, expected) => get_path(doc, field).is_some() == *expected,
        Filter::And(parts) => parts.iter().all(|f| matches(f, doc)),
        Filter::Or(parts) => parts.iter().any(|f| matches(f, doc)),
        Filter::Not(inner) => !matches(inner, doc),
    }
}

/// Reject filters that cannot be evaluated
pub fn validate_filter(filter: &Filter) -> DriverResult<()> {
    match filter {
        Filter::All => Ok(()),
        Filter::Eq(field, _)
        | Filter::Ne(field, _)
        | Filter::Gt(field, _)
        | Filter::Gte(field, _)
        | Filter::Lt(field, _)
        | Filter::Lte(field, _)
        | Filter::In(field, _)
        | Filter::Nin(field, _)
        | Filter::Exists(field, _) => validate_field(field).map_err(DriverError::InvalidFilter),
        Filter::And(parts) | Filter::Or(parts) => {
            if parts.is_empty() {
                return Err(DriverError::InvalidFilter(
                    "logical operator needs at least one clause".to_string(),
                ));
            }
            parts.iter().try_for_each(validate_filter)
        }
        Filter::Not(inner) => validate_filter(inner),
    }
}

fn validate_field(field: &str) -> Result<(), String> {
    if field.is_empty() || field.split('.').any(str::is_empty) {
        return Err(format!("invalid field path '{}'", field));
    }
    if field.starts_with('$') {
        return Err(format!("field path '{}' must not start with '$'", field));
    }
    Ok(())
}

// ============================================================================
// Sort and projection
// ============================================================================

/// Stable sort; ties keep their natural order
pub fn sort_documents(docs: &mut [JsonValue], sort: &SortDefinition) {
    docs.sort_by(|a, b| {
        for (field, direction) in sort.keys() {
            let l = get_path(a, field).unwrap_or(&NULL);
            let r = get_path(b, field).unwrap_or(&NULL);
            let ord = match direction {
                SortDirection::Ascending => compare_values(l, r),
                SortDirection::Descending => compare_values(r, l),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// True if resolving `path` in `doc` steps into an array element
fn crosses_array(doc: &JsonValue, path: &str) -> bool {
    let mut current = doc;
    for segment in path.split('.') {
        current = match current {
            JsonValue::Array(_) => return true,
            JsonValue::Object(obj) => match obj.get(segment) {
                Some(next) => next,
                None => return false,
            },
            _ => return false,
        };
    }
    false
}

/// Copy of `doc` with only the projected fields
///
/// Paths through array elements (`items.0.x`) are left out: the output is
/// rebuilt from nested objects only.
pub fn project(doc: &JsonValue, projection: &Projection) -> JsonValue {
    let mut out = Map::new();
    if projection.includes_id() {
        if let Some(id) = doc.get(ID_FIELD) {
            out.insert(ID_FIELD.to_string(), id.clone());
        }
    }
    let mut out = JsonValue::Object(out);
    for field in projection.fields() {
        if crosses_array(doc, field) {
            continue;
        }
        let Some(value) = get_path(doc, field) else {
            continue;
        };
        if let Err(err) = set_path(&mut out, field, value.clone()) {
            trace!(field = %field, %err, "field left out of projection");
        }
    }
    out
}

// ============================================================================
// Updates
// ============================================================================

fn add_numbers(current: &Number, amount: &Number) -> Option<Number> {
    if let (Some(x), Some(y)) = (current.as_i64(), amount.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Some(sum.into());
        }
    }
    Number::from_f64(current.as_f64()? + amount.as_f64()?)
}

/// Apply every op of an update definition to `doc`
pub fn apply_update(doc: &mut JsonValue, ops: &[UpdateOp]) -> DriverResult<()> {
    for op in ops {
        match op {
            UpdateOp::Set(field, value) => {
                if field == ID_FIELD {
                    return Err(DriverError::InvalidUpdate(
                        "the _id field is immutable".to_string(),
                    ));
                }
                set_path(doc, field, value.clone())?;
            }
            UpdateOp::Unset(field) => {
                unset_path(doc, field);
            }
            UpdateOp::Inc(field, amount) => {
                let JsonValue::Number(amount) = amount else {
                    return Err(DriverError::InvalidUpdate(format!(
                        "cannot increment '{}' by a non-numeric amount",
                        field
                    )));
                };
                let next = match get_path(doc, field) {
                    None | Some(JsonValue::Null) => amount.clone(),
                    Some(JsonValue::Number(current)) => add_numbers(current, amount)
                        .ok_or_else(|| DriverError::InvalidUpdate(format!("overflow on '{}'", field)))?,
                    Some(other) => {
                        return Err(DriverError::InvalidUpdate(format!(
                            "cannot increment non-numeric field '{}' ({})",
                            field,
                            type_name(other)
                        )))
                    }
                };
                set_path(doc, field, JsonValue::Number(next))?;
            }
            UpdateOp::Push(field, value) => match get_path_mut(doc, field) {
                Some(JsonValue::Array(items)) => items.push(value.clone()),
                None | Some(JsonValue::Null) => {
                    set_path(doc, field, JsonValue::Array(vec![value.clone()]))?
                }
                Some(other) => {
                    return Err(DriverError::InvalidUpdate(format!(
                        "cannot push to non-array field '{}' ({})",
                        field,
                        type_name(other)
                    )))
                }
            },
        }
    }
    Ok(())
}
