use bootcamp_service::services::query::{ListQuery, PageRef, Pagination};
use mongodb::bson::doc;

const BOOTCAMP_FIELDS: &[&str] = &[
    "name",
    "careers",
    "housing",
    "average_cost",
    "average_rating",
    "created_at",
];

fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
    raw.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn comparator_select_sort_and_pagination_shape_the_store_query() {
    let query = ListQuery::parse(
        &pairs(&[
            ("average_cost[gt]", "1000"),
            ("select", "name,average_cost"),
            ("sort", "-average_cost"),
            ("page", "2"),
            ("limit", "10"),
        ]),
        BOOTCAMP_FIELDS,
    )
    .expect("valid query");

    assert_eq!(query.filter(), doc! { "average_cost": { "$gt": 1000_i64 } });
    assert_eq!(
        query.projection(),
        Some(&doc! { "name": 1, "average_cost": 1 })
    );
    assert_eq!(query.sort(), &doc! { "average_cost": -1 });
    assert_eq!(query.skip(), 10);
    assert_eq!(query.limit(), 10);
}

#[test]
fn equality_and_in_filters_combine() {
    let query = ListQuery::parse(
        &pairs(&[
            ("housing", "true"),
            ("careers[in]", "Web Development,UI/UX"),
        ]),
        BOOTCAMP_FIELDS,
    )
    .expect("valid query");

    assert_eq!(
        query.filter(),
        doc! {
            "housing": true,
            "careers": { "$in": ["Web Development", "UI/UX"] },
        }
    );
}

#[test]
fn equality_and_range_on_one_field_are_both_kept() {
    let query = ListQuery::parse(
        &pairs(&[("average_cost", "5000"), ("average_cost[gt]", "1000")]),
        BOOTCAMP_FIELDS,
    )
    .expect("valid query");
    assert_eq!(
        query.filter(),
        doc! { "average_cost": { "$eq": 5000_i64, "$gt": 1000_i64 } }
    );
}

#[test]
fn absurdly_large_page_numbers_do_not_panic() {
    let query = ListQuery::parse(
        &pairs(&[("page", "18446744073709551615"), ("limit", "25")]),
        BOOTCAMP_FIELDS,
    )
    .expect("valid query");
    assert_eq!(query.skip(), u64::MAX);
    assert_eq!(Pagination::build(query.page(), query.limit(), 100).next, None);
}

#[test]
fn defaults_are_first_page_of_twenty_five_newest_first() {
    let query = ListQuery::parse(&[], BOOTCAMP_FIELDS).expect("empty query is valid");
    assert_eq!(query.page(), 1);
    assert_eq!(query.limit(), 25);
    assert_eq!(query.sort(), &doc! { "created_at": -1 });
}

#[test]
fn unknown_filter_fields_and_comparators_are_rejected() {
    assert!(ListQuery::parse(&pairs(&[("password", "x")]), BOOTCAMP_FIELDS).is_err());
    assert!(ListQuery::parse(&pairs(&[("average_cost[between]", "1")]), BOOTCAMP_FIELDS).is_err());
    assert!(ListQuery::parse(&pairs(&[("sort", "password")]), BOOTCAMP_FIELDS).is_err());
}

#[test]
fn parsing_is_deterministic_for_identical_requests() {
    let raw = pairs(&[
        ("average_rating[gte]", "7"),
        ("sort", "-created_at"),
        ("page", "3"),
        ("limit", "5"),
    ]);
    let a = ListQuery::parse(&raw, BOOTCAMP_FIELDS).unwrap();
    let b = ListQuery::parse(&raw, BOOTCAMP_FIELDS).unwrap();
    assert_eq!(a.filter(), b.filter());
    assert_eq!(a.sort(), b.sort());
    assert_eq!(a.skip(), b.skip());
    assert_eq!(a.limit(), b.limit());
}

#[test]
fn pagination_metadata_reflects_total() {
    // 25 records, 10 per page
    let middle = Pagination::build(2, 10, 25);
    assert_eq!(middle.next, Some(PageRef { page: 3, limit: 10 }));
    assert_eq!(middle.prev, Some(PageRef { page: 1, limit: 10 }));

    let last = Pagination::build(3, 10, 25);
    assert_eq!(last.next, None);
    assert_eq!(last.prev, Some(PageRef { page: 2, limit: 10 }));

    let first = Pagination::build(1, 10, 25);
    assert_eq!(first.next, Some(PageRef { page: 2, limit: 10 }));
    assert_eq!(first.prev, None);
}
