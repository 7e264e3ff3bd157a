//! Persistence engine operations used by the storage gateway
//!
//! Every operation is generic over a [`Storable`] entity and narrows by the
//! request's resolved [`Scope`]. Keys and equality values arrive as strings
//! and are converted according to the column's declared type.

use crate::gateway::{
	entity::Storable,
	envelope::{Sort, SortDirection},
	scope::Scope,
};
use sea_orm::{
	sea_query::{Expr, SimpleExpr},
	ActiveModelTrait, ColumnTrait, ColumnType, DatabaseConnection, DbErr, EntityName,
	EntityTrait, IdenStatic, IntoActiveModel, Iterable, Order, PrimaryKeyToColumn,
	PrimaryKeyTrait, QueryFilter, QueryOrder, QuerySelect, Value,
};
use serde_json::{Map, Value as Json};
use std::{collections::HashMap, str::FromStr};

type Column<S> = <<S as Storable>::Table as EntityTrait>::Column;

/// Offset/limit window of a search, `take = None` meaning unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
	pub skip: u64,
	pub take: Option<u64>,
}

/// Handle on the relational engine, cheap to clone
#[derive(Debug, Clone)]
pub struct Engine {
	conn: DatabaseConnection,
}

impl Engine {
	pub fn new(conn: DatabaseConnection) -> Self {
		Self { conn }
	}

	pub fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}

	/// Insert a new row; auto-increment keys are assigned by the engine.
	pub async fn insert<S: Storable>(&self, model: S::Model) -> Result<S::Model, DbErr> {
		let mut active = model.into_active_model().reset_all();

		if <<S::Table as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::auto_increment() {
			for key in <S::Table as EntityTrait>::PrimaryKey::iter() {
				active.not_set(key.into_column());
			}
		}

		active.insert(&self.conn).await
	}

	/// Fetch the row identified by `key`, narrowed by `scope`.
	pub async fn fetch<S: Storable>(&self, key: &str, scope: &Scope) -> Result<S::Model, DbErr> {
		let query = S::Table::find().filter(key_condition::<S>(key)?);

		scope
			.apply(query)
			.one(&self.conn)
			.await?
			.ok_or_else(|| not_found::<S>(key))
	}

	/// Replace every non-key column of the row identified by `key`.
	///
	/// Rows excluded by `scope` are not eligible and yield `RecordNotFound`.
	pub async fn save<S: Storable>(
		&self,
		model: S::Model,
		key: &str,
		scope: &Scope,
	) -> Result<S::Model, DbErr> {
		let mut active = model.into_active_model().reset_all();
		for pk in <S::Table as EntityTrait>::PrimaryKey::iter() {
			active.not_set(pk.into_column());
		}

		let update = S::Table::update_many()
			.set(active)
			.filter(key_condition::<S>(key)?);

		let result = scope.apply(update).exec(&self.conn).await?;
		if result.rows_affected == 0 {
			return Err(not_found::<S>(key));
		}

		self.fetch::<S>(key, scope).await
	}

	/// Delete the row identified by `key`. A missing row is not an error.
	pub async fn delete<S: Storable>(&self, key: &str, scope: &Scope) -> Result<u64, DbErr> {
		let delete = S::Table::delete_many().filter(key_condition::<S>(key)?);

		Ok(scope.apply(delete).exec(&self.conn).await?.rows_affected)
	}

	/// Page through rows matching every equality condition and the scope.
	pub async fn find<S: Storable>(
		&self,
		page: Page,
		conditions: &HashMap<String, String>,
		sort: &[Sort],
		scope: &Scope,
	) -> Result<Vec<S::Model>, DbErr> {
		let mut query = S::Table::find();

		for (field, raw) in conditions {
			let column = column::<S>(field)?;
			query = query.filter(column.eq(typed_value(&column, raw)?));
		}

		if sort.is_empty() {
			for pk in <S::Table as EntityTrait>::PrimaryKey::iter() {
				query = query.order_by(pk.into_column(), Order::Asc);
			}
		}

		for directive in sort {
			let order = match directive.direction {
				SortDirection::Asc => Order::Asc,
				SortDirection::Desc => Order::Desc,
			};
			query = query.order_by(column::<S>(&directive.field)?, order);
		}

		scope
			.apply(query)
			.offset(page.skip)
			.limit(page.take)
			.all(&self.conn)
			.await
	}

	/// Change only the listed columns of the row identified by `key`.
	pub async fn patch<S: Storable>(
		&self,
		key: &str,
		data: &Map<String, Json>,
		scope: &Scope,
	) -> Result<u64, DbErr> {
		if data.is_empty() {
			return Ok(0);
		}

		let mut update = S::Table::update_many().filter(key_condition::<S>(key)?);
		for (field, value) in data {
			let column = column::<S>(field)?;
			update = update.col_expr(column, Expr::value(json_value(&column, value)?));
		}

		Ok(scope.apply(update).exec(&self.conn).await?.rows_affected)
	}
}

fn not_found<S: Storable>(key: &str) -> DbErr {
	DbErr::RecordNotFound(format!(
		"{} with key {key} not found",
		S::Table::default().table_name()
	))
}

fn column<S: Storable>(field: &str) -> Result<Column<S>, DbErr> {
	<Column<S> as FromStr>::from_str(field).map_err(|_| {
		DbErr::Custom(format!(
			"unknown field {field} on {}",
			S::Table::default().table_name()
		))
	})
}

/// `pk = key` for entities with a single-column primary key
fn key_condition<S: Storable>(key: &str) -> Result<SimpleExpr, DbErr> {
	let mut keys = <S::Table as EntityTrait>::PrimaryKey::iter();

	match (keys.next(), keys.next()) {
		(Some(pk), None) => {
			let column = pk.into_column();
			Ok(column.eq(typed_value(&column, key)?))
		}
		_ => Err(DbErr::Custom(format!(
			"{} has no single-column primary key",
			S::Table::default().table_name()
		))),
	}
}

fn is_integer(column_type: &ColumnType) -> bool {
	matches!(
		column_type,
		ColumnType::TinyInteger
			| ColumnType::SmallInteger
			| ColumnType::Integer
			| ColumnType::BigInteger
			| ColumnType::TinyUnsigned
			| ColumnType::SmallUnsigned
			| ColumnType::Unsigned
			| ColumnType::BigUnsigned
	)
}

fn is_floating(column_type: &ColumnType) -> bool {
	matches!(
		column_type,
		ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_)
	)
}

/// Convert a textual key or condition value to the column's type.
pub(crate) fn typed_value<C: ColumnTrait>(column: &C, raw: &str) -> Result<Value, DbErr> {
	let def = column.def();
	let column_type = def.get_column_type();
	let invalid = |kind: &str| {
		DbErr::Custom(format!(
			"invalid {kind} value {raw:?} for {}",
			column.as_str()
		))
	};

	if is_integer(column_type) {
		raw.trim()
			.parse::<i64>()
			.map(Value::from)
			.map_err(|_| invalid("integer"))
	} else if is_floating(column_type) {
		raw.trim()
			.parse::<f64>()
			.map(Value::from)
			.map_err(|_| invalid("numeric"))
	} else if matches!(column_type, ColumnType::Boolean) {
		raw.trim()
			.parse::<bool>()
			.map(Value::from)
			.map_err(|_| invalid("boolean"))
	} else {
		Ok(Value::from(raw.to_owned()))
	}
}

/// Convert a JSON patch value to a value for the column.
pub(crate) fn json_value<C: ColumnTrait>(column: &C, value: &Json) -> Result<Value, DbErr> {
	let def = column.def();
	let column_type = def.get_column_type();

	match value {
		Json::Null if is_integer(column_type) => Ok(Value::BigInt(None)),
		Json::Null if is_floating(column_type) => Ok(Value::Double(None)),
		Json::Null if matches!(column_type, ColumnType::Boolean) => Ok(Value::Bool(None)),
		Json::Null => Ok(Value::String(None)),
		Json::Bool(b) => Ok(Value::from(*b)),
		Json::Number(n) => match (n.as_i64(), n.as_f64()) {
			(Some(i), _) if !is_floating(column_type) => Ok(Value::from(i)),
			(_, Some(f)) => Ok(Value::from(f)),
			_ => Err(DbErr::Custom(format!(
				"number {n} out of range for {}",
				column.as_str()
			))),
		},
		Json::String(s) => typed_value(column, s),
		Json::Array(_) | Json::Object(_) => Ok(Value::from(value.clone())),
	}
}
