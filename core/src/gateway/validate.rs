//! Structural validation of decoded entities
//!
//! Constraints are declared by the entity type ([`Storable::constraints`])
//! and, for bounded string columns, derived from the table definition.
//! Every violated constraint is reported, not just the first.
//!
//! [`Storable::constraints`]: super::entity::Storable::constraints

use super::{entity::Storable, error::ErrorDescriptor};
use sea_orm::{
	sea_query::StringLen, ColumnTrait, ColumnType, EntityTrait, IdenStatic, Iterable,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// A single field rule
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
	/// Present and not the zero value
	Required,
	Min(f64),
	Max(f64),
	/// Minimum string length, in characters
	MinLen(usize),
	/// Maximum string length, in characters
	MaxLen(usize),
}

/// A rule bound to a field of the serialized entity
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
	pub field: String,
	pub rule: Rule,
}

impl Constraint {
	pub fn new(field: impl Into<String>, rule: Rule) -> Self {
		Self {
			field: field.into(),
			rule,
		}
	}

	pub fn required(field: impl Into<String>) -> Self {
		Self::new(field, Rule::Required)
	}

	pub fn min(field: impl Into<String>, min: impl Into<f64>) -> Self {
		Self::new(field, Rule::Min(min.into()))
	}

	pub fn max(field: impl Into<String>, max: impl Into<f64>) -> Self {
		Self::new(field, Rule::Max(max.into()))
	}

	pub fn min_len(field: impl Into<String>, len: usize) -> Self {
		Self::new(field, Rule::MinLen(len))
	}

	pub fn max_len(field: impl Into<String>, len: usize) -> Self {
		Self::new(field, Rule::MaxLen(len))
	}

	/// Returns a violation message when `value` breaks this constraint.
	fn check(&self, value: Option<&Value>) -> Option<Violation<'_>> {
		let broken = match (&self.rule, value) {
			(Rule::Required, value) => value.map_or(true, is_zero),
			(Rule::Min(min), Some(Value::Number(n))) => n.as_f64().is_some_and(|n| n < *min),
			(Rule::Max(max), Some(Value::Number(n))) => n.as_f64().is_some_and(|n| n > *max),
			(Rule::MinLen(len), Some(Value::String(s))) => s.chars().count() < *len,
			(Rule::MaxLen(len), Some(Value::String(s))) => s.chars().count() > *len,
			// absent or differently typed values are left to `Required`
			_ => false,
		};

		broken.then_some(Violation(self))
	}
}

struct Violation<'a>(&'a Constraint);

impl fmt::Display for Violation<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let field = &self.0.field;
		match &self.0.rule {
			Rule::Required => write!(f, "{field} is required"),
			Rule::Min(min) => write!(f, "{field} must be at least {min}"),
			Rule::Max(max) => write!(f, "{field} must be at most {max}"),
			Rule::MinLen(len) => write!(f, "{field} must be at least {len} characters"),
			Rule::MaxLen(len) => write!(f, "{field} must be at most {len} characters"),
		}
	}
}

fn is_zero(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Bool(b) => !b,
		Value::Number(n) => n.as_f64() == Some(0.0),
		Value::String(s) => s.is_empty(),
		Value::Array(items) => items.is_empty(),
		Value::Object(fields) => fields.is_empty(),
	}
}

/// Reusable validator bound to one entity type
#[derive(Debug, Clone, Default)]
pub struct Validator {
	constraints: Vec<Constraint>,
}

impl Validator {
	pub fn new(constraints: Vec<Constraint>) -> Self {
		Self { constraints }
	}

	/// Declared constraints plus length limits of bounded string columns
	pub fn for_entity<S: Storable>(entity: &S) -> Self {
		let mut constraints = entity.constraints();

		for limit in column_limits::<S::Table>() {
			if !constraints.contains(&limit) {
				constraints.push(limit);
			}
		}

		Self { constraints }
	}

	pub fn constraints(&self) -> &[Constraint] {
		&self.constraints
	}

	pub fn validate<T: Serialize>(&self, entity: &T) -> Result<(), ErrorDescriptor> {
		if self.constraints.is_empty() {
			return Ok(());
		}

		let value = serde_json::to_value(entity)?;

		let violations = self
			.constraints
			.iter()
			.filter_map(|constraint| constraint.check(value.get(&constraint.field)))
			.map(|violation| violation.to_string())
			.collect::<Vec<_>>();

		if violations.is_empty() {
			Ok(())
		} else {
			Err(ErrorDescriptor::validation(violations.join("; ")))
		}
	}
}

fn column_limits<E: EntityTrait>() -> Vec<Constraint> {
	E::Column::iter()
		.filter_map(|column| match column.def().get_column_type() {
			ColumnType::String(StringLen::N(len)) => {
				Some(Constraint::max_len(column.as_str(), *len as usize))
			}
			_ => None,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gateway::error::ErrorCode;
	use serde_json::json;

	fn validator() -> Validator {
		Validator::new(vec![
			Constraint::required("full_name"),
			Constraint::max_len("full_name", 32),
			Constraint::min("age", 0),
			Constraint::required("age"),
		])
	}

	#[test]
	fn valid_entity_passes() {
		let entity = json!({ "id": 0, "full_name": "Test Testsson", "age": 42 });

		assert!(validator().validate(&entity).is_ok());
	}

	#[test]
	fn every_violation_is_reported() {
		let entity = json!({ "id": 0, "full_name": "", "age": -1 });
		let err = validator().validate(&entity).unwrap_err();

		assert_eq!(err.code, ErrorCode::Validation);
		assert_eq!(err.message, "full_name is required; age must be at least 0");
	}

	#[test]
	fn missing_and_zero_values_fail_required() {
		let err = validator()
			.validate(&json!({ "full_name": "Test Testsson", "age": 0 }))
			.unwrap_err();
		assert_eq!(err.message, "age is required");

		let err = validator().validate(&json!({ "age": 3 })).unwrap_err();
		assert_eq!(err.message, "full_name is required");
	}

	#[test]
	fn string_limits_count_characters() {
		let name = "ö".repeat(32);
		assert!(validator()
			.validate(&json!({ "full_name": name, "age": 1 }))
			.is_ok());

		let err = validator()
			.validate(&json!({ "full_name": "x".repeat(33), "age": 1 }))
			.unwrap_err();
		assert_eq!(err.message, "full_name must be at most 32 characters");
	}

	#[test]
	fn bounds_are_inclusive() {
		let validator = Validator::new(vec![
			Constraint::min("score", 1.5),
			Constraint::max("score", 10),
		]);

		assert!(validator.validate(&json!({ "score": 1.5 })).is_ok());
		assert!(validator.validate(&json!({ "score": 10 })).is_ok());
		assert_eq!(
			validator.validate(&json!({ "score": 11 })).unwrap_err().message,
			"score must be at most 10"
		);
	}
}
