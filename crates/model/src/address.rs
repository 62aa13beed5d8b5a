//! Path addresses into the configuration model.
//!
//! # Wire forms
//!
//! [`PathAddress::from_model`] accepts:
//!
//! * `null` or a missing field: the root address,
//! * a list of single-entry objects: `[{"subsystem": "web"}, {"connector": "http"}]`,
//! * a list of two-string lists: `[["subsystem", "web"]]`,
//! * a string in display form: `"/subsystem=web/connector=http"`.
//!
//! [`PathAddress::to_model`] always produces the object list form.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{ModelError, Result};
use crate::node::{ModelNode, empty_composite};

/// Element value matching any concrete value in a registration pattern.
pub const WILDCARD: &str = "*";

/// One `key=value` segment of a [`PathAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathElement {
	key: String,
	value: String,
}

impl PathElement {
	/// Creates an element. Neither part may be empty.
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
		let key = key.into();
		let value = value.into();
		if key.is_empty() || value.is_empty() {
			return Err(ModelError::MalformedAddress(format!("empty path element '{key}={value}'")));
		}
		Ok(Self { key, value })
	}

	/// Creates an element matching every value of `key`.
	pub fn wildcard(key: impl Into<String>) -> Result<Self> {
		Self::new(key, WILDCARD)
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn value(&self) -> &str {
		&self.value
	}

	/// Returns true if the value is [`WILDCARD`].
	pub fn is_wildcard(&self) -> bool {
		self.value == WILDCARD
	}

	/// Returns true if this element, read as a pattern, matches `concrete`.
	pub fn matches(&self, concrete: &PathElement) -> bool {
		self.key == concrete.key && (self.is_wildcard() || self.value == concrete.value)
	}

	fn from_model(node: &ModelNode) -> Result<Self> {
		match node {
			Value::Object(map) => match map.iter().next() {
				Some((key, Value::String(value))) if map.len() == 1 => Self::new(key.as_str(), value.as_str()),
				_ => Err(malformed_element(node)),
			},
			Value::Array(pair) => match pair.as_slice() {
				[Value::String(key), Value::String(value)] => Self::new(key.as_str(), value.as_str()),
				_ => Err(malformed_element(node)),
			},
			_ => Err(malformed_element(node)),
		}
	}
}

fn malformed_element(node: &ModelNode) -> ModelError {
	ModelError::MalformedAddress(format!("expected a single key/value element, got {node}"))
}

impl fmt::Display for PathElement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}={}", self.key, self.value)
	}
}

/// An ordered sequence of [`PathElement`]s naming a node of the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathAddress {
	elements: Vec<PathElement>,
}

impl PathAddress {
	/// The address of the model root.
	pub const fn root() -> Self {
		Self { elements: Vec::new() }
	}

	pub fn from_elements(elements: Vec<PathElement>) -> Self {
		Self { elements }
	}

	/// Returns a new address with `element` appended.
	#[must_use]
	pub fn append(&self, element: PathElement) -> Self {
		let mut elements = self.elements.clone();
		elements.push(element);
		Self { elements }
	}

	/// Returns the address of the parent node, or `None` for the root.
	pub fn parent(&self) -> Option<Self> {
		let (_, head) = self.elements.split_last()?;
		Some(Self { elements: head.to_vec() })
	}

	pub fn last(&self) -> Option<&PathElement> {
		self.elements.last()
	}

	pub fn len(&self) -> usize {
		self.elements.len()
	}

	/// Returns true for the root address.
	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	pub fn elements(&self) -> &[PathElement] {
		&self.elements
	}

	pub fn iter(&self) -> std::slice::Iter<'_, PathElement> {
		self.elements.iter()
	}

	/// Returns true if any element is a wildcard.
	pub fn is_pattern(&self) -> bool {
		self.elements.iter().any(PathElement::is_wildcard)
	}

	/// Parses the `address` field of an operation.
	pub fn from_model(node: &ModelNode) -> Result<Self> {
		match node {
			Value::Null => Ok(Self::root()),
			Value::String(text) => text.parse(),
			Value::Array(items) => items.iter().map(PathElement::from_model).collect::<Result<Vec<_>>>().map(Self::from_elements),
			other => Err(ModelError::MalformedAddress(format!("expected a list of elements, got {other}"))),
		}
	}

	/// Encodes the address as a list of single-entry objects.
	pub fn to_model(&self) -> ModelNode {
		Value::Array(
			self.elements
				.iter()
				.map(|element| {
					let mut entry = Map::new();
					entry.insert(element.key.clone(), Value::String(element.value.clone()));
					Value::Object(entry)
				})
				.collect(),
		)
	}

	/// Returns the node at this address without modifying the tree.
	pub fn navigate<'a>(&self, root: &'a ModelNode) -> Result<&'a ModelNode> {
		let mut current = root;
		for element in &self.elements {
			for segment in [element.key(), element.value()] {
				let Value::Object(children) = current else {
					return Err(self.not_composite(segment));
				};
				current = children.get(segment).ok_or_else(|| self.not_found(segment))?;
			}
		}
		Ok(current)
	}

	/// Returns the node at this address for modification.
	///
	/// With `create` set, absent and undefined nodes along the path (including the
	/// target) become empty composites. Without it, the first absent segment is
	/// [`ModelError::NotFound`]. The root always resolves.
	pub fn navigate_mut<'a>(&self, root: &'a mut ModelNode, create: bool) -> Result<&'a mut ModelNode> {
		let mut current = root;
		for element in &self.elements {
			for segment in [element.key(), element.value()] {
				current = self.step_mut(current, segment, create)?;
			}
		}
		if create && current.is_null() {
			*current = empty_composite();
		}
		Ok(current)
	}

	fn step_mut<'a>(&self, node: &'a mut ModelNode, segment: &str, create: bool) -> Result<&'a mut ModelNode> {
		if create && node.is_null() {
			*node = empty_composite();
		}
		let Value::Object(children) = node else {
			return Err(self.not_composite(segment));
		};
		if create {
			Ok(children.entry(segment).or_insert_with(empty_composite))
		} else {
			children.get_mut(segment).ok_or_else(|| self.not_found(segment))
		}
	}

	fn not_found(&self, segment: &str) -> ModelError {
		ModelError::NotFound {
			address: self.to_string(),
			segment: segment.to_string(),
		}
	}

	fn not_composite(&self, segment: &str) -> ModelError {
		ModelError::NotComposite {
			address: self.to_string(),
			segment: segment.to_string(),
		}
	}
}

impl fmt::Display for PathAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.elements.is_empty() {
			return f.write_str("/");
		}
		for element in &self.elements {
			write!(f, "/{element}")?;
		}
		Ok(())
	}
}

impl FromStr for PathAddress {
	type Err = ModelError;

	fn from_str(text: &str) -> Result<Self> {
		let trimmed = text.trim();
		let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
		if body.is_empty() {
			return Ok(Self::root());
		}
		body.split('/')
			.map(|segment| {
				let (key, value) = segment
					.split_once('=')
					.ok_or_else(|| ModelError::MalformedAddress(format!("segment '{segment}' in '{text}' is not key=value")))?;
				PathElement::new(key, value)
			})
			.collect::<Result<Vec<_>>>()
			.map(Self::from_elements)
	}
}

impl<'a> IntoIterator for &'a PathAddress {
	type Item = &'a PathElement;
	type IntoIter = std::slice::Iter<'a, PathElement>;

	fn into_iter(self) -> Self::IntoIter {
		self.elements.iter()
	}
}
