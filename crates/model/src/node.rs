use serde_json::{Map, Value};

/// A node of the configuration model.
///
/// Composite nodes are JSON objects whose children keep insertion order. An
/// undefined node is `null`.
pub type ModelNode = Value;

/// Creates an empty composite node.
pub fn empty_composite() -> ModelNode {
	Value::Object(Map::new())
}

/// Returns true if `node` can hold named children.
pub fn is_composite(node: &ModelNode) -> bool {
	node.is_object()
}

/// Stores `value` at `location` below `node`, creating composite nodes on the way.
///
/// Intermediate nodes that are not composite are replaced. An empty location
/// replaces `node` itself.
pub fn set_at(node: &mut ModelNode, location: &[String], value: ModelNode) {
	let mut current = node;
	for segment in location {
		if !(current.is_object() || current.is_null()) {
			*current = empty_composite();
		}
		current = &mut current[segment.as_str()];
	}
	*current = value;
}
