use serde_json::{Map, Value};

use crate::address::PathAddress;
use crate::error::{ModelError, Result};
use crate::node::ModelNode;

/// Field naming the operation to run.
pub const OPERATION: &str = "operation";
/// Field holding the target address.
pub const ADDRESS: &str = "address";
/// Name of the operation that may create missing model nodes.
pub const ADD: &str = "add";

/// A request to read or mutate the model at an address.
///
/// On the wire an operation is a composite node carrying [`OPERATION`] and
/// [`ADDRESS`]; every other field is a named parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
	name: String,
	address: PathAddress,
	params: Map<String, ModelNode>,
}

impl Operation {
	pub fn new(name: impl Into<String>, address: PathAddress) -> Self {
		Self {
			name: name.into(),
			address,
			params: Map::new(),
		}
	}

	/// Adds a named parameter.
	#[must_use]
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ModelNode>) -> Self {
		self.params.insert(name.into(), value.into());
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn address(&self) -> &PathAddress {
		&self.address
	}

	pub fn params(&self) -> &Map<String, ModelNode> {
		&self.params
	}

	pub fn param(&self, name: &str) -> Option<&ModelNode> {
		self.params.get(name)
	}

	/// Parses an operation from its model form.
	pub fn from_model(node: &ModelNode) -> Result<Self> {
		let Value::Object(fields) = node else {
			return Err(ModelError::MalformedOperation(format!("expected a composite node, got {node}")));
		};
		let name = match fields.get(OPERATION) {
			None | Some(Value::Null) => return Err(ModelError::MissingOperationName),
			Some(Value::String(name)) if !name.is_empty() => name.clone(),
			Some(other) => return Err(ModelError::MalformedOperation(format!("operation name must be a non-empty string, got {other}"))),
		};
		let address = PathAddress::from_model(fields.get(ADDRESS).unwrap_or(&Value::Null))?;
		let params = fields
			.iter()
			.filter(|(key, _)| key.as_str() != OPERATION && key.as_str() != ADDRESS)
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect();
		Ok(Self { name, address, params })
	}

	/// Encodes the operation in its model form.
	pub fn to_model(&self) -> ModelNode {
		let mut fields = Map::new();
		fields.insert(OPERATION.to_string(), Value::String(self.name.clone()));
		fields.insert(ADDRESS.to_string(), self.address.to_model());
		for (key, value) in &self.params {
			fields.insert(key.clone(), value.clone());
		}
		Value::Object(fields)
	}

	/// Short description for tracing/logging.
	pub fn describe(&self) -> String {
		format!("{}:{}", self.address, self.name)
	}
}
