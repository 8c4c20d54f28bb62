//! Dotted-path reads and writes over component state.
//!
//! A path such as `author.name` is walked one segment at a time. Each segment
//! must name a field (or key) of the current container; anything else stops
//! the walk without touching state. Successful writes are mirrored into the
//! outgoing state snapshot at the same path, as the value the field now holds.

use serde_json::{Map, Value};

use crate::core::state::StateNode;

/// Outcome of [`set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Written to state and mirrored into the snapshot.
    Applied,
    /// Some segment names no field or key.
    Unresolved,
    /// The target exists but refused the value's type.
    Rejected,
}

/// Read the value at `path`.
pub fn get(root: StateNode<'_>, path: &str) -> Option<Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments.split_last()?;

    let mut node = root;
    for segment in parents {
        if !node.has(segment) {
            return None;
        }
        node = node.descend(segment)?;
    }
    node.get(last)
}

/// Write `value` at `path` and mirror it into `snapshot`.
///
/// Anything but [`SetOutcome::Applied`] leaves both the state and the
/// snapshot untouched.
pub fn set(
    root: StateNode<'_>,
    snapshot: &mut Map<String, Value>,
    path: &str,
    value: Value,
) -> SetOutcome {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return SetOutcome::Unresolved;
    };

    let mut node = root;
    for segment in parents {
        if !node.has(segment) {
            return SetOutcome::Unresolved;
        }
        node = match node.descend(segment) {
            Some(child) => child,
            None => return SetOutcome::Unresolved,
        };
    }

    if !node.has(last) {
        return SetOutcome::Unresolved;
    }
    if !node.set(last, value.clone()) {
        return SetOutcome::Rejected;
    }
    // Typed fields may have coerced the input; echo what was stored.
    let value = node.get(last).unwrap_or(value);

    let mut mirror = snapshot;
    for segment in parents {
        mirror = child_map(mirror, segment);
    }
    mirror.insert((*last).to_string(), value);
    SetOutcome::Applied
}

/// The mapping stored under `key`, created (or replacing a scalar) if needed.
fn child_map<'m>(map: &'m mut Map<String, Value>, key: &str) -> &'m mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just made an object"),
    }
}
