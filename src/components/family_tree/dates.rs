//! Lenient year extraction and lifespan defaults.
//!
//! Genealogical data is dirty: partial dates, placeholder dates and plain
//! garbage all occur. Nothing here fails; unusable input becomes `None` and
//! [`Lifespan::resolve`] fills in estimates.

use chrono::{Datelike, NaiveDate, Utc};

use super::config::LayoutConfig;

pub fn current_year() -> i32 {
	Utc::now().year()
}

/// Year of an ISO date (`1932-04-11`, `1932-04-11T00:00:00Z`, `1932-04`, `1932`).
pub fn parse_year(raw: &str) -> Option<i32> {
	let raw = raw.trim();
	let year = raw
		.get(..10)
		.and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
		.map(|date| date.year())
		.or_else(|| leading_year(raw))?;
	// 0001-01-01 is the backend's "no date" sentinel
	(year > 1).then_some(year)
}

fn leading_year(raw: &str) -> Option<i32> {
	let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
	if !(3..=4).contains(&digits.len()) {
		return None;
	}
	digits.parse().ok()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifespanEnd {
	Recorded,
	Living,
	/// Deceased with no usable death date.
	Assumed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifespan {
	pub birth_year: i32,
	pub end_year: i32,
	pub birth_estimated: bool,
	pub end: LifespanEnd,
}

impl Lifespan {
	pub fn resolve(
		birth_year: Option<i32>,
		death_year: Option<i32>,
		is_living: bool,
		current_year: i32,
		geometry: &LayoutConfig,
	) -> Self {
		let birth = birth_year.unwrap_or(current_year - geometry.default_age);
		let (end_year, end) = match death_year {
			Some(death) => (death.max(birth), LifespanEnd::Recorded),
			None if is_living => (current_year.max(birth), LifespanEnd::Living),
			None => (birth + geometry.assumed_lifespan, LifespanEnd::Assumed),
		};
		Self {
			birth_year: birth,
			end_year,
			birth_estimated: birth_year.is_none(),
			end,
		}
	}

	/// Caption such as `1921 – 1988`, `1950 –` or `~1974 – ?`.
	pub fn caption(&self) -> String {
		let birth = if self.birth_estimated {
			format!("~{}", self.birth_year)
		} else {
			self.birth_year.to_string()
		};
		match self.end {
			LifespanEnd::Recorded => format!("{birth} – {}", self.end_year),
			LifespanEnd::Living => format!("{birth} –"),
			LifespanEnd::Assumed => format!("{birth} – ?"),
		}
	}
}
