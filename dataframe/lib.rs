/*!
This crate provides the table type consumed by `ctree`: a set of named, equally long columns where each column is either a `Number` column, an `Ordinal` column whose levels have a meaningful order, or an `Enum` column whose levels do not. Values of level columns are stored as `Option<NonZeroUsize>`, a 1-based index into the column's options, where `None` marks a value that is not one of the options.
*/

#![allow(clippy::tabs_in_doc_comments)]

use itertools::izip;
use ndarray::prelude::*;
use std::num::NonZeroUsize;

pub mod synthetic;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrameView<'a> {
	pub columns: Vec<ColumnView<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Number(NumberColumn),
	Ordinal(EnumColumn),
	Enum(EnumColumn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub data: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<Option<NonZeroUsize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnView<'a> {
	Number(NumberColumnView<'a>),
	Ordinal(EnumColumnView<'a>),
	Enum(EnumColumnView<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [f32],
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumnView<'a> {
	pub name: &'a str,
	pub options: &'a [String],
	pub data: &'a [Option<NonZeroUsize>],
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
	Number,
	Ordinal { options: Vec<String> },
	Enum { options: Vec<String> },
}

/// A single cell. `Ordinal` and `Enum` columns both produce `Value::Enum`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
	Number(f32),
	Enum(Option<NonZeroUsize>),
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> Self {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				ColumnType::Number => Column::Number(NumberColumn::new(column_name)),
				ColumnType::Ordinal { options } => {
					Column::Ordinal(EnumColumn::new(column_name, options))
				}
				ColumnType::Enum { options } => Column::Enum(EnumColumn::new(column_name, options)),
			})
			.collect();
		Self { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn view(&self) -> DataFrameView {
		let columns = self.columns.iter().map(|column| column.view()).collect();
		DataFrameView { columns }
	}

	pub fn to_rows(&self) -> Array2<Value> {
		self.view().to_rows()
	}
}

impl Column {
	pub fn len(&self) -> usize {
		match self {
			Self::Number(s) => s.data.len(),
			Self::Ordinal(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Self::Number(s) => s.name.as_str(),
			Self::Ordinal(s) => s.name.as_str(),
			Self::Enum(s) => s.name.as_str(),
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Self::Number(s) => Some(s),
			_ => None,
		}
	}

	/// Both `Ordinal` and `Enum` columns store their data as an `EnumColumn`.
	pub fn as_enum(&self) -> Option<&EnumColumn> {
		match self {
			Self::Ordinal(s) => Some(s),
			Self::Enum(s) => Some(s),
			_ => None,
		}
	}

	pub fn view(&self) -> ColumnView {
		match self {
			Self::Number(column) => ColumnView::Number(column.view()),
			Self::Ordinal(column) => ColumnView::Ordinal(column.view()),
			Self::Enum(column) => ColumnView::Enum(column.view()),
		}
	}
}

impl NumberColumn {
	pub fn new(name: String) -> Self {
		Self {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> NumberColumnView {
		NumberColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl EnumColumn {
	pub fn new(name: String, options: Vec<String>) -> Self {
		Self {
			name,
			options,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> EnumColumnView {
		EnumColumnView {
			name: &self.name,
			data: &self.data,
			options: &self.options,
		}
	}
}

impl<'a> DataFrameView<'a> {
	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn view(&self) -> Self {
		self.clone()
	}

	pub fn read_row(&self, index: usize, row: &mut [Value]) {
		for (value, column) in row.iter_mut().zip(self.columns.iter()) {
			*value = column.value(index);
		}
	}

	pub fn to_rows(&self) -> Array2<Value> {
		let mut rows = Array2::from_elem((self.nrows(), self.ncols()), Value::Enum(None));
		for (mut ndarray_column, dataframe_column) in
			izip!(rows.axis_iter_mut(Axis(1)), self.columns.iter())
		{
			match dataframe_column {
				ColumnView::Number(column) => {
					for (a, b) in izip!(ndarray_column.iter_mut(), column.data) {
						*a = Value::Number(*b);
					}
				}
				ColumnView::Ordinal(column) | ColumnView::Enum(column) => {
					for (a, b) in izip!(ndarray_column.iter_mut(), column.data) {
						*a = Value::Enum(*b);
					}
				}
			}
		}
		rows
	}
}

impl<'a> ColumnView<'a> {
	pub fn len(&self) -> usize {
		match self {
			Self::Number(s) => s.data.len(),
			Self::Ordinal(s) => s.data.len(),
			Self::Enum(s) => s.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &'a str {
		match self {
			Self::Number(s) => s.name,
			Self::Ordinal(s) => s.name,
			Self::Enum(s) => s.name,
		}
	}

	pub fn value(&self, index: usize) -> Value {
		match self {
			Self::Number(column) => Value::Number(column.data[index]),
			Self::Ordinal(column) | Self::Enum(column) => Value::Enum(column.data[index]),
		}
	}
}

impl<'a> NumberColumnView<'a> {
	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn as_slice(&self) -> &'a [f32] {
		self.data
	}
}

#[cfg(test)]
fn test_dataframe() -> DataFrame {
	let mut dataframe = DataFrame::new(
		vec!["size".to_owned(), "grade".to_owned(), "color".to_owned()],
		vec![
			ColumnType::Number,
			ColumnType::Ordinal {
				options: vec!["low".to_owned(), "high".to_owned()],
			},
			ColumnType::Enum {
				options: vec!["red".to_owned(), "green".to_owned()],
			},
		],
	);
	if let Column::Number(column) = &mut dataframe.columns[0] {
		column.data = vec![1.0, 2.5];
	}
	if let Column::Ordinal(column) = &mut dataframe.columns[1] {
		column.data = vec![NonZeroUsize::new(2), NonZeroUsize::new(1)];
	}
	if let Column::Enum(column) = &mut dataframe.columns[2] {
		column.data = vec![NonZeroUsize::new(1), None];
	}
	dataframe
}

#[test]
fn test_to_rows() {
	let dataframe = test_dataframe();
	let rows = dataframe.to_rows();
	assert_eq!(rows.dim(), (2, 3));
	insta::assert_debug_snapshot!(rows.row(1).to_vec(), @r###"
 [
     Number(
         2.5,
     ),
     Enum(
         Some(
             1,
         ),
     ),
     Enum(
         None,
     ),
 ]
 "###);
}

#[test]
fn test_read_row() {
	let dataframe = test_dataframe();
	let view = dataframe.view();
	assert_eq!((view.nrows(), view.ncols()), (2, 3));
	let mut row = vec![Value::Number(0.0); view.ncols()];
	view.read_row(0, &mut row);
	assert_eq!(row[0], Value::Number(1.0));
	assert_eq!(row[1], Value::Enum(NonZeroUsize::new(2)));
	assert_eq!(row[2], Value::Enum(NonZeroUsize::new(1)));
	assert_eq!(view.columns[2].name(), "color");
	assert!(dataframe.columns[1].as_number().is_none());
	assert_eq!(dataframe.columns[1].as_enum().unwrap().options.len(), 2);
}
