//! Search filters, sorting and pagination

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event::EventStatus;
use crate::constants::{DEFAULT_PER_PAGE, MAX_PER_PAGE};

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A single sort key. Field names are validated by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), direction: SortDirection::Asc }
    }

    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), direction: SortDirection::Desc }
    }

    /// Read a client sort value.
    ///
    /// Accepts `{"start_date": 1}`, `{"created_at": -1}`,
    /// `{"title": "desc"}`, `"title"` and `"-created_at"`. Only the first key
    /// of an object is used.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(raw) => {
                let raw = raw.trim();
                match raw.strip_prefix('-') {
                    Some(field) if !field.is_empty() => Some(Self::desc(field)),
                    Some(_) => None,
                    None if raw.is_empty() => None,
                    None => Some(Self::asc(raw)),
                }
            }
            Value::Object(map) => {
                let (field, order) = map.iter().next()?;
                let direction = match order {
                    Value::Number(n) if n.as_i64() == Some(-1) => SortDirection::Desc,
                    Value::Number(n) if n.as_i64() == Some(1) => SortDirection::Asc,
                    Value::String(s) if s.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                    Value::String(s) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                    _ => return None,
                };
                Some(Self { field: field.clone(), direction })
            }
            _ => None,
        }
    }
}

/// Search request body shared by the search endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub status: Option<String>,
    pub sort: Option<Value>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl SearchParams {
    /// `(limit, offset)` derived from `per_page` and the 1-based `page`.
    pub fn window(&self) -> (u32, u64) {
        let limit = self.per_page.filter(|n| *n > 0).unwrap_or(DEFAULT_PER_PAGE).min(MAX_PER_PAGE);
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let offset = u64::from(page - 1) * u64::from(limit);
        (limit, offset)
    }

    /// Client sort on one of `allowed`, or `default` when absent,
    /// unreadable or naming another field.
    pub fn sort_or(&self, allowed: &[&str], default: SortSpec) -> SortSpec {
        self.sort
            .as_ref()
            .and_then(SortSpec::from_value)
            .filter(|spec| allowed.contains(&spec.field.as_str()))
            .unwrap_or(default)
    }

    /// Trimmed, non-empty free-text search.
    pub fn search_text(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    pub fn category_filter(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    pub fn city_filter(&self) -> Option<&str> {
        non_blank(self.city.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Repository-level event filter.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    /// Literal substring matched against title and description.
    pub search: Option<String>,
    pub category: Option<String>,
    /// Literal substring matched against the venue city.
    pub city: Option<String>,
    pub status: Option<EventStatus>,
    pub organizer_id: Option<String>,
    /// Only events starting at or after this instant.
    pub starts_from: Option<DateTime<Utc>>,
    pub sort: SortSpec,
    pub limit: u32,
    pub offset: u64,
}

/// Repository-level venue filter.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueQuery {
    /// Literal substring matched against name, address and city.
    pub search: Option<String>,
    /// Literal substring matched against the city.
    pub city: Option<String>,
    pub owner_id: Option<String>,
    pub sort: SortSpec,
    pub limit: u32,
    pub offset: u64,
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn window_defaults_to_first_page_of_ten() {
        assert_eq!(SearchParams::default().window(), (10, 0));
    }

    #[test]
    fn window_computes_offset_from_page() {
        let params = SearchParams { per_page: Some(25), page: Some(3), ..Default::default() };
        assert_eq!(params.window(), (25, 50));
    }

    #[test]
    fn window_caps_per_page_and_ignores_page_zero() {
        let params = SearchParams { per_page: Some(10_000), page: Some(0), ..Default::default() };
        assert_eq!(params.window(), (MAX_PER_PAGE, 0));
    }

    #[test]
    fn sort_reads_object_and_string_forms() {
        assert_eq!(SortSpec::from_value(&json!({"start_date": 1})), Some(SortSpec::asc("start_date")));
        assert_eq!(SortSpec::from_value(&json!({"created_at": -1})), Some(SortSpec::desc("created_at")));
        assert_eq!(SortSpec::from_value(&json!({"title": "DESC"})), Some(SortSpec::desc("title")));
        assert_eq!(SortSpec::from_value(&json!("-price")), Some(SortSpec::desc("price")));
        assert_eq!(SortSpec::from_value(&json!("title")), Some(SortSpec::asc("title")));
        assert_eq!(SortSpec::from_value(&json!({"title": 7})), None);
        assert_eq!(SortSpec::from_value(&json!("-")), None);
        assert_eq!(SortSpec::from_value(&json!(3)), None);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let params = SearchParams {
            search: Some("  ".into()),
            city: Some(" Lyon ".into()),
            ..Default::default()
        };
        assert_eq!(params.search_text(), None);
        assert_eq!(params.city_filter(), Some("Lyon"));
        assert_eq!(params.sort_or(&["title"], SortSpec::asc("start_date")), SortSpec::asc("start_date"));
    }

    #[test]
    fn unknown_sort_fields_fall_back_to_default() {
        let params = SearchParams { sort: Some(json!({"password": 1})), ..Default::default() };
        assert_eq!(params.sort_or(&["title"], SortSpec::desc("created_at")), SortSpec::desc("created_at"));

        let params = SearchParams { sort: Some(json!("-title")), ..Default::default() };
        assert_eq!(params.sort_or(&["title"], SortSpec::asc("start_date")), SortSpec::desc("title"));
    }
}
