//! Named filters ("scopes") and their resolution into query narrowing
//!
//! An entity type declares an ordered list of [`NamedFilter`]s. A request
//! selects filters by name and supplies their parameters; each selected
//! filter builds a [`QueryModifier`] that only ever adds constraints, so the
//! resolved modifiers compose in any order.

use super::envelope::{FilterParams, Filters};
use sea_orm::{sea_query::ConditionExpression, Condition, QueryFilter};
use std::{fmt, sync::Arc};

type ModifyFn = dyn Fn(Condition) -> Condition + Send + Sync;
type BuildFn = dyn Fn(&FilterParams) -> QueryModifier + Send + Sync;

/// Narrowing applied to a query's condition before execution
#[derive(Clone)]
pub struct QueryModifier(Arc<ModifyFn>);

impl QueryModifier {
	pub fn new(modify: impl Fn(Condition) -> Condition + Send + Sync + 'static) -> Self {
		Self(Arc::new(modify))
	}

	/// A modifier that leaves the query untouched
	pub fn identity() -> Self {
		Self::new(|condition| condition)
	}

	/// A modifier adding one more predicate to the query
	pub fn filter<E>(expression: E) -> Self
	where
		E: Into<ConditionExpression> + Clone + Send + Sync + 'static,
	{
		Self::new(move |condition| condition.add(expression.clone()))
	}

	pub fn apply(&self, condition: Condition) -> Condition {
		(self.0)(condition)
	}
}

impl fmt::Debug for QueryModifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("QueryModifier")
	}
}

/// A parameterized filter an entity type opts into
#[derive(Clone)]
pub struct NamedFilter {
	name: String,
	build: Arc<BuildFn>,
}

impl NamedFilter {
	pub fn new(
		name: impl Into<String>,
		build: impl Fn(&FilterParams) -> QueryModifier + Send + Sync + 'static,
	) -> Self {
		Self {
			name: name.into(),
			build: Arc::new(build),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn build(&self, params: &FilterParams) -> QueryModifier {
		(self.build)(params)
	}
}

impl fmt::Debug for NamedFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NamedFilter")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// Resolved narrowing for one request
#[derive(Debug, Clone, Default)]
pub struct Scope {
	modifiers: Vec<QueryModifier>,
}

impl Scope {
	/// Select the declared filters named in `requested`, in declaration order.
	///
	/// Requested names without a declaration are ignored, as are declared
	/// filters the request does not mention.
	pub fn resolve(requested: &Filters, declared: &[NamedFilter]) -> Self {
		let modifiers = declared
			.iter()
			.filter_map(|filter| {
				requested
					.get(filter.name())
					.map(|params| filter.build(params))
			})
			.collect();

		Self { modifiers }
	}

	pub fn is_empty(&self) -> bool {
		self.modifiers.is_empty()
	}

	pub fn len(&self) -> usize {
		self.modifiers.len()
	}

	/// Fold every modifier into a single condition, if there is any.
	pub fn condition(&self) -> Option<Condition> {
		if self.modifiers.is_empty() {
			return None;
		}

		Some(
			self.modifiers
				.iter()
				.fold(Condition::all(), |condition, modifier| {
					modifier.apply(condition)
				}),
		)
	}

	/// Narrow any filterable query (select, update or delete).
	pub fn apply<Q: QueryFilter>(&self, query: Q) -> Q {
		match self.condition() {
			Some(condition) => query.filter(condition),
			None => query,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sea_orm::sea_query::{Alias, Expr, Query, SqliteQueryBuilder};

	fn min_age() -> NamedFilter {
		NamedFilter::new("min", |params| match params.get("age") {
			Some(age) => QueryModifier::filter(Expr::col(Alias::new("age")).gt(age.as_str())),
			None => QueryModifier::identity(),
		})
	}

	fn owner() -> NamedFilter {
		NamedFilter::new("owner", |params| {
			let owner = params.get("id").cloned().unwrap_or_default();
			QueryModifier::filter(Expr::col(Alias::new("owner_id")).eq(owner))
		})
	}

	fn request(entries: &[(&str, &[(&str, &str)])]) -> Filters {
		entries
			.iter()
			.map(|(name, params)| {
				(
					name.to_string(),
					params
						.iter()
						.map(|(k, v)| (k.to_string(), v.to_string()))
						.collect(),
				)
			})
			.collect()
	}

	fn render(scope: &Scope) -> String {
		let mut select = Query::select();
		select.column(Alias::new("id")).from(Alias::new("people"));
		if let Some(condition) = scope.condition() {
			select.cond_where(condition);
		}
		select.to_string(SqliteQueryBuilder)
	}

	#[test]
	fn no_declared_filters_resolves_to_nothing() {
		let scope = Scope::resolve(&request(&[("min", &[("age", "44")])]), &[]);

		assert!(scope.is_empty());
		assert!(scope.condition().is_none());
	}

	#[test]
	fn unknown_names_are_ignored() {
		let scope = Scope::resolve(&request(&[("nope", &[("x", "1")])]), &[min_age()]);

		assert!(scope.is_empty());
	}

	#[test]
	fn undeclared_absent_filters_are_not_applied() {
		let scope = Scope::resolve(&request(&[("min", &[("age", "44")])]), &[min_age(), owner()]);

		assert_eq!(scope.len(), 1);
		assert_eq!(render(&scope), r#"SELECT "id" FROM "people" WHERE "age" > '44'"#);
	}

	#[test]
	fn resolution_follows_declaration_order() {
		let requested = request(&[("owner", &[("id", "7")]), ("min", &[("age", "44")])]);
		let scope = Scope::resolve(&requested, &[min_age(), owner()]);

		assert_eq!(scope.len(), 2);
		assert_eq!(
			render(&scope),
			r#"SELECT "id" FROM "people" WHERE "age" > '44' AND "owner_id" = '7'"#
		);
	}

	#[test]
	fn missing_parameters_fall_back_to_identity() {
		let scope = Scope::resolve(&request(&[("min", &[])]), &[min_age()]);

		assert_eq!(scope.len(), 1);
		assert!(scope.condition().unwrap().is_empty());
	}
}
