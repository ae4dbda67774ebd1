//! Query shaping: translates raw query-string pairs into a typed store query
//! (filter conditions, projection, sort, pagination) and packages results with
//! next/prev metadata.

use crate::error::AppError;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;
use mongodb::Collection;
use serde::de::DeserializeOwned;
use serde::Serialize;

const DEFAULT_LIMIT: i64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Comparator {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "gt" => Some(Comparator::Gt),
            "gte" => Some(Comparator::Gte),
            "lt" => Some(Comparator::Lt),
            "lte" => Some(Comparator::Lte),
            "in" => Some(Comparator::In),
            _ => None,
        }
    }

    fn operator(&self) -> &'static str {
        match self {
            Comparator::Eq => "$eq",
            Comparator::Gt => "$gt",
            Comparator::Gte => "$gte",
            Comparator::Lt => "$lt",
            Comparator::Lte => "$lte",
            Comparator::In => "$in",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub comparator: Comparator,
    pub value: Bson,
}

/// A parsed, validated list request. Construction is the only way to obtain
/// one, so every condition has passed the resource's field allow-list.
#[derive(Debug, Clone)]
pub struct ListQuery {
    conditions: Vec<Condition>,
    projection: Option<Document>,
    sort: Document,
    page: u64,
    limit: i64,
}

impl ListQuery {
    /// Parse raw key/value pairs. `allowed_fields` is the closed set of field
    /// names the resource permits filtering and sorting on; anything else is
    /// rejected rather than passed through to the store. An unknown bracket
    /// suffix (`price[bogus]=…`) is rejected the same way.
    pub fn parse(pairs: &[(String, String)], allowed_fields: &[&str]) -> Result<Self, AppError> {
        let mut conditions = Vec::new();
        let mut projection = None;
        let mut sort = None;
        let mut page: u64 = 1;
        let mut limit: i64 = DEFAULT_LIMIT;

        for (key, value) in pairs {
            match key.as_str() {
                "select" => projection = Some(parse_select(value)),
                "sort" => sort = Some(parse_sort(value, allowed_fields)?),
                "page" => {
                    page = value.parse().ok().filter(|p| *p >= 1).ok_or_else(|| {
                        AppError::BadRequest(anyhow::anyhow!(
                            "page must be a positive integer, got '{}'",
                            value
                        ))
                    })?;
                }
                "limit" => {
                    limit = value.parse().ok().filter(|l| *l >= 1).ok_or_else(|| {
                        AppError::BadRequest(anyhow::anyhow!(
                            "limit must be a positive integer, got '{}'",
                            value
                        ))
                    })?;
                }
                _ => conditions.push(parse_condition(key, value, allowed_fields)?),
            }
        }

        Ok(Self {
            conditions,
            projection,
            sort: sort.unwrap_or_else(|| doc! { "created_at": -1 }),
            page,
            limit,
        })
    }

    /// The store filter document, with all conditions on the same field
    /// merged into one sub-document. A lone equality stays a bare scalar;
    /// an equality sharing its field with a range comparator is promoted to
    /// `$eq` inside the merged sub-document so neither condition is lost.
    pub fn filter(&self) -> Document {
        let mut filter = Document::new();
        for cond in &self.conditions {
            let op = cond.comparator.operator();
            match filter.get_mut(&cond.field) {
                Some(Bson::Document(sub)) => {
                    sub.insert(op, cond.value.clone());
                }
                Some(scalar) => {
                    let mut sub = Document::new();
                    sub.insert("$eq", scalar.clone());
                    sub.insert(op, cond.value.clone());
                    *scalar = Bson::Document(sub);
                }
                None => {
                    if cond.comparator == Comparator::Eq {
                        filter.insert(cond.field.clone(), cond.value.clone());
                    } else {
                        let mut sub = Document::new();
                        sub.insert(op, cond.value.clone());
                        filter.insert(cond.field.clone(), Bson::Document(sub));
                    }
                }
            }
        }
        filter
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn projection(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    pub fn sort(&self) -> &Document {
        &self.sort
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn skip(&self) -> u64 {
        // page is caller-controlled and only checked for positivity, so the
        // arithmetic must not overflow.
        self.page.saturating_sub(1).saturating_mul(self.limit as u64)
    }

    fn find_options(&self) -> FindOptions {
        FindOptions::builder()
            .projection(self.projection.clone())
            .sort(self.sort.clone())
            .skip(self.skip())
            .limit(self.limit)
            .build()
    }
}

fn parse_condition(
    key: &str,
    value: &str,
    allowed_fields: &[&str],
) -> Result<Condition, AppError> {
    let (field, comparator) = match (key.find('['), key.ends_with(']')) {
        (Some(open), true) => {
            let field = &key[..open];
            let op = &key[open + 1..key.len() - 1];
            let comparator = Comparator::parse(op).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "unknown comparator '{}' on field '{}'",
                    op,
                    field
                ))
            })?;
            (field, comparator)
        }
        _ => (key, Comparator::Eq),
    };

    if !allowed_fields.contains(&field) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "cannot filter on field '{}'",
            field
        )));
    }

    let value = match comparator {
        Comparator::In => Bson::Array(value.split(',').map(coerce_value).collect()),
        _ => coerce_value(value),
    };

    Ok(Condition {
        field: field.to_string(),
        comparator,
        value,
    })
}

/// Narrowest-type coercion: i64, then f64, then bool, else string. The store
/// needs numeric BSON for range comparators to behave numerically.
fn coerce_value(raw: &str) -> Bson {
    if let Ok(i) = raw.parse::<i64>() {
        return Bson::Int64(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Bson::Double(f);
    }
    match raw {
        "true" => Bson::Boolean(true),
        "false" => Bson::Boolean(false),
        _ => Bson::String(raw.to_string()),
    }
}

fn parse_select(value: &str) -> Document {
    let mut projection = Document::new();
    for field in value.split(',').filter(|f| !f.is_empty()) {
        projection.insert(field, 1);
    }
    projection
}

fn parse_sort(value: &str, allowed_fields: &[&str]) -> Result<Document, AppError> {
    let mut sort = Document::new();
    for field in value.split(',').filter(|f| !f.is_empty()) {
        let (name, direction) = match field.strip_prefix('-') {
            Some(name) => (name, -1),
            None => (field, 1),
        };
        if !allowed_fields.contains(&name) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "cannot sort on field '{}'",
                name
            )));
        }
        sort.insert(name, direction);
    }
    Ok(sort)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageRef {
    pub page: u64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn build(page: u64, limit: i64, total: u64) -> Self {
        let skip = page.saturating_sub(1).saturating_mul(limit as u64);
        let next = if skip.saturating_add(limit as u64) < total {
            Some(PageRef {
                page: page + 1,
                limit,
            })
        } else {
            None
        };
        let prev = if page > 1 {
            Some(PageRef {
                page: page - 1,
                limit,
            })
        } else {
            None
        };
        Self { next, prev }
    }
}

#[derive(Debug, Serialize)]
pub struct PagedResult<T> {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

/// Execute a shaped query: a count over the filter (ignoring skip/limit) for
/// pagination metadata, then the page fetch itself.
pub async fn run_paged<T>(
    collection: &Collection<T>,
    query: &ListQuery,
) -> Result<PagedResult<T>, AppError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let filter = query.filter();

    let total = collection
        .count_documents(filter.clone(), None)
        .await
        .map_err(AppError::from)?;

    let mut cursor = collection
        .find(filter, query.find_options())
        .await
        .map_err(AppError::from)?;

    let mut data = Vec::new();
    while let Some(item) = cursor.try_next().await.map_err(AppError::from)? {
        data.push(item);
    }

    Ok(PagedResult {
        success: true,
        count: data.len(),
        pagination: Pagination::build(query.page(), query.limit(), total),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[&str] = &["name", "price", "careers", "housing", "created_at"];

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bare_value_is_equality() {
        let q = ListQuery::parse(&pairs(&[("name", "Devworks")]), FIELDS).unwrap();
        assert_eq!(q.filter(), doc! { "name": "Devworks" });
    }

    #[test]
    fn bracket_suffix_selects_comparator() {
        let q = ListQuery::parse(&pairs(&[("price", "1000")]), FIELDS).unwrap();
        assert_eq!(q.filter(), doc! { "price": 1000_i64 });

        let q = ListQuery::parse(&pairs(&[("price[gt]", "1000")]), FIELDS).unwrap();
        assert_eq!(q.filter(), doc! { "price": { "$gt": 1000_i64 } });
    }

    #[test]
    fn full_request_shapes_query() {
        // gt comparator, projection, descending sort, skip 10 fetch 10
        let q = ListQuery::parse(
            &pairs(&[
                ("price[gt]", "1000"),
                ("select", "name,price"),
                ("sort", "-price"),
                ("page", "2"),
                ("limit", "10"),
            ]),
            FIELDS,
        )
        .unwrap();

        assert_eq!(q.filter(), doc! { "price": { "$gt": 1000_i64 } });
        assert_eq!(q.projection(), Some(&doc! { "name": 1, "price": 1 }));
        assert_eq!(q.sort(), &doc! { "price": -1 });
        assert_eq!(q.skip(), 10);
        assert_eq!(q.limit(), 10);
    }

    #[test]
    fn range_conditions_on_one_field_merge() {
        let q = ListQuery::parse(
            &pairs(&[("price[gte]", "100"), ("price[lte]", "900")]),
            FIELDS,
        )
        .unwrap();
        assert_eq!(
            q.filter(),
            doc! { "price": { "$gte": 100_i64, "$lte": 900_i64 } }
        );
    }

    #[test]
    fn in_comparator_splits_on_commas() {
        let q = ListQuery::parse(
            &pairs(&[("careers", "")]),
            FIELDS,
        );
        assert!(q.is_ok());

        let q = ListQuery::parse(
            &pairs(&[("careers[in]", "Web Development,Data Science")]),
            FIELDS,
        )
        .unwrap();
        assert_eq!(
            q.filter(),
            doc! { "careers": { "$in": ["Web Development", "Data Science"] } }
        );
    }

    #[test]
    fn equality_and_range_on_one_field_both_apply() {
        // Either ordering keeps both conditions.
        let q = ListQuery::parse(&pairs(&[("price", "5"), ("price[gt]", "3")]), FIELDS).unwrap();
        assert_eq!(
            q.filter(),
            doc! { "price": { "$eq": 5_i64, "$gt": 3_i64 } }
        );

        let q = ListQuery::parse(&pairs(&[("price[gt]", "3"), ("price", "5")]), FIELDS).unwrap();
        assert_eq!(
            q.filter(),
            doc! { "price": { "$gt": 3_i64, "$eq": 5_i64 } }
        );
    }

    #[test]
    fn value_coercion_is_narrowest_type() {
        assert_eq!(coerce_value("42"), Bson::Int64(42));
        assert_eq!(coerce_value("4.5"), Bson::Double(4.5));
        assert_eq!(coerce_value("true"), Bson::Boolean(true));
        assert_eq!(coerce_value("web"), Bson::String("web".to_string()));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = ListQuery::parse(&pairs(&[("password", "x")]), FIELDS).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn malformed_comparator_is_rejected() {
        let err = ListQuery::parse(&pairs(&[("price[bogus]", "1")]), FIELDS).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn sort_on_unknown_field_is_rejected() {
        let err = ListQuery::parse(&pairs(&[("sort", "-secret")]), FIELDS).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn non_positive_page_is_rejected() {
        assert!(ListQuery::parse(&pairs(&[("page", "0")]), FIELDS).is_err());
        assert!(ListQuery::parse(&pairs(&[("page", "abc")]), FIELDS).is_err());
        assert!(ListQuery::parse(&pairs(&[("limit", "-5")]), FIELDS).is_err());
    }

    #[test]
    fn defaults_apply_when_keys_absent() {
        let q = ListQuery::parse(&[], FIELDS).unwrap();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 25);
        assert_eq!(q.skip(), 0);
        assert_eq!(q.sort(), &doc! { "created_at": -1 });
        assert!(q.projection().is_none());
    }

    #[test]
    fn pagination_metadata_middle_page() {
        let p = Pagination::build(2, 10, 25);
        assert_eq!(p.next, Some(PageRef { page: 3, limit: 10 }));
        assert_eq!(p.prev, Some(PageRef { page: 1, limit: 10 }));
    }

    #[test]
    fn pagination_metadata_last_page() {
        let p = Pagination::build(3, 10, 25);
        assert_eq!(p.next, None);
        assert_eq!(p.prev, Some(PageRef { page: 2, limit: 10 }));
    }

    #[test]
    fn pagination_metadata_first_page() {
        let p = Pagination::build(1, 10, 25);
        assert_eq!(p.next, Some(PageRef { page: 2, limit: 10 }));
        assert_eq!(p.prev, None);
    }

    #[test]
    fn enormous_page_saturates_instead_of_overflowing() {
        let q = ListQuery::parse(
            &pairs(&[("page", "18446744073709551615"), ("limit", "25")]),
            FIELDS,
        )
        .unwrap();
        assert_eq!(q.skip(), u64::MAX);

        let p = Pagination::build(q.page(), q.limit(), 100);
        assert_eq!(p.next, None);
        assert!(p.prev.is_some());
    }

    #[test]
    fn pagination_exact_boundary_has_no_next() {
        // skip + limit == total is the last page
        let p = Pagination::build(2, 10, 20);
        assert_eq!(p.next, None);
    }
}
