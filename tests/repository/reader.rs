//! Reads, aggregation, grouping and pagination

use crate::common::*;

#[tokio::test]
async fn sum_by_tag() {
    let t = TestRepo::new();
    seed_amounts(&t, "acme", "T", &[10, 20, 30, 40, 50]).await;
    seed_amounts(&t, "acme", "other", &[1000]).await;

    let total: i64 = t
        .invoices()
        .sum_by(&CONTENT_TAG.eq("T"), &SOME_AMOUNT, Scope::partition("acme"))
        .await
        .unwrap();
    assert_eq!(total, 150);
}

#[tokio::test]
async fn group_by_counts_members() {
    let t = TestRepo::new();
    let mut docs: Vec<Invoice> = [1, 1, 1, 2, 2]
        .iter()
        .map(|&g| Invoice::new("acme", "T", 1, g))
        .collect();
    t.invoices().add_many(&mut docs, None).await.unwrap();

    let groups: Vec<(i32, usize)> = t
        .invoices()
        .group_by(&GROUPING_KEY, |g| (g.key, g.documents.len()), Scope::partition("acme"))
        .await
        .unwrap();
    assert_eq!(groups, vec![(1, 3), (2, 2)]);
}

#[tokio::test]
async fn group_by_filtered_projects_sums() {
    let t = TestRepo::new();
    let mut docs = vec![
        Invoice::new("acme", "T", 5, 1),
        Invoice::new("acme", "T", 7, 2),
        Invoice::new("acme", "X", 100, 2),
        Invoice::new("acme", "T", 9, 2),
    ];
    t.invoices().add_many(&mut docs, None).await.unwrap();

    let sums: Vec<(i32, i64)> = t
        .invoices()
        .group_by_filtered(
            &CONTENT_TAG.eq("T"),
            &GROUPING_KEY,
            |g| (g.key, g.documents.iter().map(|d| d.some_amount).sum::<i64>()),
            Scope::partition("acme"),
        )
        .await
        .unwrap();
    assert_eq!(sums, vec![(1, 5), (2, 16)]);
}

#[tokio::test]
async fn paginated_descending_skips_top_ranked() {
    let t = TestRepo::new();
    let amounts: Vec<i64> = (1..=10).map(|i| i * 10).collect();
    seed_amounts(&t, "acme", "T", &amounts).await;

    let page = t
        .invoices()
        .get_sorted_paginated(
            &CONTENT_TAG.eq("T"),
            &SOME_AMOUNT,
            false,
            Page::new(1, 5),
            Scope::partition("acme"),
        )
        .await
        .unwrap();
    let got: Vec<i64> = page.iter().map(|d| d.some_amount).collect();
    assert_eq!(got, vec![90, 80, 70, 60, 50]);
    assert!(!got.contains(&100));
}

#[tokio::test]
async fn paginated_tail_is_short() {
    let t = TestRepo::new();
    seed_amounts(&t, "acme", "T", &[1, 2, 3, 4, 5, 6]).await;

    let page = t
        .invoices()
        .get_sorted_paginated(&Filter::all(), &SOME_AMOUNT, true, Page::new(2, 5), Scope::partition("acme"))
        .await
        .unwrap();
    let got: Vec<i64> = page.iter().map(|d| d.some_amount).collect();
    assert_eq!(got, vec![3, 4, 5, 6]);
}

#[tokio::test]
async fn paginated_by_sort_definition_and_default_page() {
    let t = TestRepo::new();
    let mut docs = vec![
        Invoice::new("acme", "b", 1, 0),
        Invoice::new("acme", "a", 2, 0),
        Invoice::new("acme", "b", 3, 0),
        Invoice::new("acme", "a", 1, 0),
    ];
    t.invoices().add_many(&mut docs, None).await.unwrap();

    let sort = SortDefinition::ascending("content_tag").then_descending("some_amount");
    let page = t
        .invoices()
        .get_sorted_paginated_by(&Filter::all(), &sort, Page::default(), Scope::partition("acme"))
        .await
        .unwrap();
    let got: Vec<(String, i64)> = page
        .into_iter()
        .map(|d| (d.content_tag, d.some_amount))
        .collect();
    assert_eq!(
        got,
        vec![
            ("a".to_string(), 2),
            ("a".to_string(), 1),
            ("b".to_string(), 3),
            ("b".to_string(), 1)
        ]
    );
}

#[tokio::test]
async fn default_page_holds_fifty() {
    let t = TestRepo::new();
    let amounts: Vec<i64> = (0..60).collect();
    seed_amounts(&t, "acme", "T", &amounts).await;
    let page = t
        .invoices()
        .get_sorted_paginated(&Filter::all(), &SOME_AMOUNT, true, Page::default(), Scope::partition("acme"))
        .await
        .unwrap();
    assert_eq!(page.len(), 50);
    assert_eq!(page[0].some_amount, 0);
}

#[tokio::test]
async fn extremal_documents_and_values() {
    let t = TestRepo::new();
    let docs = seed_amounts(&t, "acme", "T", &[30, 50, 10, 50]).await;
    let scope = Scope::partition("acme");
    let invoices = t.invoices();

    let max = invoices.get_by_max(&Filter::all(), &SOME_AMOUNT, scope).await.unwrap().unwrap();
    assert_eq!(max.id, docs[1].id);
    let min = invoices.get_by_min(&Filter::all(), &SOME_AMOUNT, scope).await.unwrap().unwrap();
    assert_eq!(min.id, docs[2].id);

    assert_eq!(invoices.get_max_value(&Filter::all(), &SOME_AMOUNT, scope).await.unwrap(), Some(50));
    assert_eq!(invoices.get_min_value(&Filter::all(), &SOME_AMOUNT, scope).await.unwrap(), Some(10));
    assert_eq!(
        invoices.get_max_value(&CONTENT_TAG.eq("none"), &SOME_AMOUNT, scope).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn absence_is_not_an_error() {
    let t = TestRepo::new();
    let scope = Scope::partition("empty");
    let invoices = t.invoices();
    assert!(invoices.get_by_id(&Uuid::new_v4(), scope).await.unwrap().is_none());
    assert!(invoices.get_one(&Filter::all(), scope).await.unwrap().is_none());
    assert!(invoices.get_all(&Filter::all(), scope).await.unwrap().is_empty());
    assert!(!invoices.any(&Filter::all(), scope).await.unwrap());
    assert_eq!(invoices.count(&Filter::all(), scope).await.unwrap(), 0);
    assert!(invoices.get_by_max(&Filter::all(), &SOME_AMOUNT, scope).await.unwrap().is_none());
    assert_eq!(invoices.sum_by(&Filter::all(), &SOME_AMOUNT, scope).await.unwrap(), 0);
}

#[tokio::test]
async fn projections() {
    #[derive(Debug, PartialEq, Deserialize)]
    struct AmountOnly {
        some_amount: i64,
    }

    let t = TestRepo::new();
    seed_amounts(&t, "acme", "T", &[1, 2, 3]).await;
    let projection = Projection::include(["some_amount"]).without_id();

    let one: Option<AmountOnly> = t
        .invoices()
        .project_one(&SOME_AMOUNT.eq(2), &projection, Scope::partition("acme"))
        .await
        .unwrap();
    assert_eq!(one, Some(AmountOnly { some_amount: 2 }));

    let many: Vec<AmountOnly> = t
        .invoices()
        .project_many(&SOME_AMOUNT.gte(2), &projection, Scope::partition("acme"))
        .await
        .unwrap();
    assert_eq!(many, vec![AmountOnly { some_amount: 2 }, AmountOnly { some_amount: 3 }]);
}

#[tokio::test]
async fn optional_group_key_collects_missing_values() {
    let t = TestRepo::new();
    for (name, region) in [("a", Some("eu")), ("b", None), ("c", Some("eu"))] {
        t.customers()
            .add_one(&mut Customer::new(name, region), None)
            .await
            .unwrap();
    }
    let region: Field<Option<String>> = Field::new("region");
    let groups: Vec<(Option<String>, usize)> = t
        .customers()
        .group_by(
            &region,
            |g| {
                let n = g.len();
                (g.key, n)
            },
            Scope::none(),
        )
        .await
        .unwrap();
    assert_eq!(groups, vec![(Some("eu".to_string()), 2), (None, 1)]);
}

#[tokio::test]
async fn malformed_filter_propagates_driver_error() {
    let t = TestRepo::new();
    let err = t
        .invoices()
        .get_all(&Filter::eq("", 1), Scope::partition("acme"))
        .await
        .unwrap_err();
    assert!(err.as_driver().is_some());
}
