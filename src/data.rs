//! # Return Data
//!
//! $$
//! R = (r_{t,j}) \in \mathbb R^{T\times N},\quad r_{t,j}=\mathrm{NaN}\ \text{if missing}
//! $$
//!
//! Time-indexed return tables, single series views, date windows and the
//! preprocessing transforms applied before statistics are computed.

use std::borrow::Cow;

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;

use crate::error::Result;
use crate::error::StatsError;

/// Inclusive date bounds. `None` leaves that side open.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Window {
  pub start: Option<NaiveDate>,
  pub end: Option<NaiveDate>,
}

impl Window {
  /// Unbounded window.
  pub fn all() -> Self {
    Self::default()
  }

  pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
    Self { start, end }
  }

  pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
    Self {
      start: Some(start),
      end: Some(end),
    }
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
  }
}

fn check_sorted(dates: &[NaiveDate]) -> Result<()> {
  match dates.windows(2).position(|w| w[1] < w[0]) {
    Some(i) => Err(StatsError::UnsortedIndex { row: i + 1 }),
    None => Ok(()),
  }
}

/// A single named return series.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
  name: String,
  dates: Vec<NaiveDate>,
  values: Array1<f64>,
}

impl Series {
  pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Array1<f64>) -> Result<Self> {
    if dates.len() != values.len() {
      return Err(StatsError::ShapeMismatch(format!(
        "{} dates for {} values",
        dates.len(),
        values.len()
      )));
    }
    check_sorted(&dates)?;

    Ok(Self {
      name: name.into(),
      dates,
      values,
    })
  }

  pub fn from_vec(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
    Self::new(name, dates, Array1::from(values))
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn values(&self) -> ArrayView1<'_, f64> {
    self.values.view()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// First and last dates carrying a valid observation.
  pub fn valid_span(&self) -> Option<(NaiveDate, NaiveDate)> {
    let first = self.values.iter().position(|v| !v.is_nan())?;
    let last = self.values.iter().rposition(|v| !v.is_nan())?;
    Some((self.dates[first], self.dates[last]))
  }

  /// Copy without the missing observations.
  pub fn dropna(&self) -> Series {
    let (dates, values): (Vec<_>, Vec<_>) = self
      .dates
      .iter()
      .zip(self.values.iter())
      .filter(|(_, v)| !v.is_nan())
      .map(|(d, v)| (*d, *v))
      .unzip();

    Series {
      name: self.name.clone(),
      dates,
      values: Array1::from(values),
    }
  }

  pub fn window(&self, window: &Window) -> Series {
    let idx: Vec<usize> = (0..self.dates.len())
      .filter(|&i| window.contains(self.dates[i]))
      .collect();

    Series {
      name: self.name.clone(),
      dates: idx.iter().map(|&i| self.dates[i]).collect(),
      values: idx.iter().map(|&i| self.values[i]).collect(),
    }
  }

  /// Same values under a different name.
  pub fn renamed(mut self, name: impl Into<String>) -> Series {
    self.name = name.into();
    self
  }
}

/// Rectangular table of periodic returns sharing one date index.
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnTable {
  dates: Vec<NaiveDate>,
  columns: Vec<String>,
  /// rows = dates, columns = entities
  values: Array2<f64>,
}

impl ReturnTable {
  pub fn new(dates: Vec<NaiveDate>, columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
    if values.nrows() != dates.len() || values.ncols() != columns.len() {
      return Err(StatsError::ShapeMismatch(format!(
        "values are {}x{} but index has {} dates and {} columns",
        values.nrows(),
        values.ncols(),
        dates.len(),
        columns.len()
      )));
    }
    check_sorted(&dates)?;

    Ok(Self {
      dates,
      columns,
      values,
    })
  }

  /// Build a table from equally long named columns.
  pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
    let n = dates.len();
    let mut values = Array2::<f64>::from_elem((n, columns.len()), f64::NAN);
    let mut names = Vec::with_capacity(columns.len());

    for (j, (name, col)) in columns.into_iter().enumerate() {
      if col.len() != n {
        return Err(StatsError::ShapeMismatch(format!(
          "column {name} has {} values for {n} dates",
          col.len()
        )));
      }
      values.column_mut(j).assign(&Array1::from(col));
      names.push(name);
    }

    Self::new(dates, names, values)
  }

  pub fn from_series(series: &[Series]) -> Result<Self> {
    let dates = series.first().map(|s| s.dates.clone()).unwrap_or_default();
    let mut cols = Vec::with_capacity(series.len());
    for s in series {
      if s.dates != dates {
        return Err(StatsError::ShapeMismatch(format!(
          "series {} does not share the table's date index",
          s.name
        )));
      }
      cols.push((s.name.clone(), s.values.to_vec()));
    }
    Self::from_columns(dates, cols)
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn columns(&self) -> &[String] {
    &self.columns
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn nrows(&self) -> usize {
    self.values.nrows()
  }

  pub fn ncols(&self) -> usize {
    self.values.ncols()
  }

  pub fn column_index(&self, name: &str) -> Result<usize> {
    self
      .columns
      .iter()
      .position(|c| c == name)
      .ok_or_else(|| StatsError::ColumnNotFound(name.to_string()))
  }

  pub fn column_values(&self, j: usize) -> ArrayView1<'_, f64> {
    self.values.column(j)
  }

  pub fn column_at(&self, j: usize) -> Series {
    Series {
      name: self.columns[j].clone(),
      dates: self.dates.clone(),
      values: self.values.column(j).to_owned(),
    }
  }

  pub fn column(&self, name: &str) -> Result<Series> {
    Ok(self.column_at(self.column_index(name)?))
  }

  pub fn iter_series(&self) -> impl Iterator<Item = Series> + '_ {
    (0..self.ncols()).map(|j| self.column_at(j))
  }

  /// Sub-table restricted to `names`, in the given order.
  pub fn select(&self, names: &[&str]) -> Result<ReturnTable> {
    let idx = names
      .iter()
      .map(|n| self.column_index(n))
      .collect::<Result<Vec<_>>>()?;

    Ok(ReturnTable {
      dates: self.dates.clone(),
      columns: idx.iter().map(|&j| self.columns[j].clone()).collect(),
      values: self.values.select(Axis(1), &idx),
    })
  }

  /// Copy without `names`; unknown names are ignored.
  pub fn drop_columns(&self, names: &[&str]) -> ReturnTable {
    let idx: Vec<usize> = (0..self.ncols())
      .filter(|&j| !names.contains(&self.columns[j].as_str()))
      .collect();

    ReturnTable {
      dates: self.dates.clone(),
      columns: idx.iter().map(|&j| self.columns[j].clone()).collect(),
      values: self.values.select(Axis(1), &idx),
    }
  }

  /// Rows whose date falls inside `window`. The source table is untouched.
  pub fn window(&self, window: &Window) -> ReturnTable {
    let idx: Vec<usize> = (0..self.nrows())
      .filter(|&i| window.contains(self.dates[i]))
      .collect();

    ReturnTable {
      dates: idx.iter().map(|&i| self.dates[i]).collect(),
      columns: self.columns.clone(),
      values: self.values.select(Axis(0), &idx),
    }
  }

  /// Drop rows where every column is missing.
  pub fn drop_empty_rows(&self) -> ReturnTable {
    let idx: Vec<usize> = (0..self.nrows())
      .filter(|&i| self.values.row(i).iter().any(|v| !v.is_nan()))
      .collect();

    ReturnTable {
      dates: idx.iter().map(|&i| self.dates[i]).collect(),
      columns: self.columns.clone(),
      values: self.values.select(Axis(0), &idx),
    }
  }

  /// Replace missing values with zero between each column's first and last
  /// valid observation. Leading and trailing gaps stay missing.
  pub fn fill_interior_gaps(&self) -> ReturnTable {
    let mut values = self.values.clone();

    for mut col in values.columns_mut() {
      let first = col.iter().position(|v| !v.is_nan());
      let last = col.iter().rposition(|v| !v.is_nan());
      if let (Some(first), Some(last)) = (first, last) {
        for i in first..=last {
          if col[i].is_nan() {
            col[i] = 0.0;
          }
        }
      }
    }

    ReturnTable {
      dates: self.dates.clone(),
      columns: self.columns.clone(),
      values,
    }
  }

  /// Buy-and-hold basket of `names` started with `weights` dollars each,
  /// appended as a column named `group_column` holding the basket's period
  /// returns. Missing constituent returns leave that position unchanged.
  pub fn weighted_group(
    &self,
    names: &[&str],
    weights: &[f64],
    group_column: &str,
  ) -> Result<ReturnTable> {
    if names.len() != weights.len() {
      return Err(StatsError::ShapeMismatch(format!(
        "{} constituents for {} weights",
        names.len(),
        weights.len()
      )));
    }
    if names.is_empty() {
      return Err(StatsError::InvalidParameter(
        "a group needs at least one constituent".to_string(),
      ));
    }

    let members = self.select(names)?;
    let mut positions = weights.to_vec();
    let mut prev_total: f64 = positions.iter().sum();
    let mut group = Array1::<f64>::zeros(members.nrows());

    for (t, row) in members.values.rows().into_iter().enumerate() {
      for (p, r) in positions.iter_mut().zip(row.iter()) {
        if !r.is_nan() {
          *p *= 1.0 + r;
        }
      }
      let total: f64 = positions.iter().sum();
      group[t] = total / prev_total - 1.0;
      prev_total = total;
    }

    let mut values = Array2::<f64>::zeros((members.nrows(), members.ncols() + 1));
    values
      .slice_mut(ndarray::s![.., ..members.ncols()])
      .assign(&members.values);
    values.column_mut(members.ncols()).assign(&group);

    let mut columns = members.columns.clone();
    columns.push(group_column.to_string());

    ReturnTable::new(members.dates, columns, values)
  }
}

/// Boundary conversion for operations defined on one return series only.
pub trait AsSeries {
  /// Borrow or extract the single series, or fail with
  /// [`StatsError::TypeMismatch`] naming `operation`.
  fn as_series(&self, operation: &'static str) -> Result<Cow<'_, Series>>;
}

impl AsSeries for Series {
  fn as_series(&self, _operation: &'static str) -> Result<Cow<'_, Series>> {
    Ok(Cow::Borrowed(self))
  }
}

impl AsSeries for ReturnTable {
  fn as_series(&self, operation: &'static str) -> Result<Cow<'_, Series>> {
    if self.ncols() == 1 {
      Ok(Cow::Owned(self.column_at(0)))
    } else {
      Err(StatsError::TypeMismatch {
        operation,
        columns: self.ncols(),
      })
    }
  }
}
