//! Replace, field set and update-definition paths

use crate::common::*;

#[tokio::test]
async fn update_one_field_changes_only_that_field() {
    let t = TestRepo::new();
    let mut invoice = Invoice::new("acme", "T", 10, 3);
    invoice.note = "keep me".into();
    t.invoices().add_one(&mut invoice, None).await.unwrap();

    assert!(t
        .invoices()
        .update_one_field(&invoice, &SOME_AMOUNT, 99, None)
        .await
        .unwrap());

    let stored = t
        .invoices()
        .get_by_id(&invoice.id, Scope::partition("acme"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.some_amount, 99);
    assert_eq!(
        Invoice {
            some_amount: 10,
            ..stored
        },
        invoice
    );
}

#[tokio::test]
async fn update_one_replaces_whole_document() {
    let t = TestRepo::new();
    let mut invoice = Invoice::new("acme", "T", 10, 3);
    t.invoices().add_one(&mut invoice, None).await.unwrap();

    invoice.note = "revised".into();
    invoice.grouping_key = 4;
    assert!(t.invoices().update_one(&invoice, None).await.unwrap());
    let stored = t
        .invoices()
        .get_by_id(&invoice.id, Scope::partition("acme"))
        .await
        .unwrap();
    assert_eq!(stored, Some(invoice));
}

#[tokio::test]
async fn update_of_absent_document_reports_false() {
    let t = TestRepo::new();
    let mut ghost = Invoice::new("acme", "T", 10, 3);
    ghost.id = Uuid::new_v4();
    assert!(!t.invoices().update_one(&ghost, None).await.unwrap());
    assert!(!t
        .invoices()
        .update_one_field(&ghost, &NOTE, "x".to_string(), None)
        .await
        .unwrap());
    assert!(!t
        .invoices()
        .update_one_definition(&ghost, &UpdateDefinition::new().set("note", "x"), None)
        .await
        .unwrap());
}

#[tokio::test]
async fn update_definition_is_forwarded() {
    let t = TestRepo::new();
    let mut invoice = Invoice::new("acme", "T", 10, 3);
    t.invoices().add_one(&mut invoice, None).await.unwrap();

    let update = UpdateDefinition::new()
        .inc("some_amount", 5)
        .set("note", "bumped")
        .set("meta.reviewed", true);
    assert!(t
        .invoices()
        .update_one_definition(&invoice, &update, None)
        .await
        .unwrap());

    let stored = t
        .invoices()
        .get_by_id(&invoice.id, Scope::partition("acme"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.some_amount, 15);
    assert_eq!(stored.note, "bumped");
    let reviewed: Field<bool> = Field::new("meta.reviewed");
    assert!(t
        .invoices()
        .any(&reviewed.eq(true), Scope::partition("acme"))
        .await
        .unwrap());
}

#[tokio::test]
async fn matching_updates_count_modified() {
    let t = TestRepo::new();
    seed_amounts(&t, "acme", "T", &[1, 2, 3, 4]).await;
    let scope = Scope::partition("acme");
    let invoices = t.invoices();

    let n = invoices
        .update_many_field_matching(&SOME_AMOUNT.gt(2), &CONTENT_TAG, "big".to_string(), scope)
        .await
        .unwrap();
    assert_eq!(n, 2);
    // already "big": matched but unmodified
    let again = invoices
        .update_many_field_matching(&SOME_AMOUNT.gt(2), &CONTENT_TAG, "big".to_string(), scope)
        .await
        .unwrap();
    assert_eq!(again, 0);

    let n = invoices
        .update_many_definition_matching(&Filter::all(), &UpdateDefinition::new().inc("some_amount", 10), scope)
        .await
        .unwrap();
    assert_eq!(n, 4);
    assert_eq!(invoices.sum_by(&Filter::all(), &SOME_AMOUNT, scope).await.unwrap(), 50);

    assert!(invoices
        .update_one_definition_matching(&SOME_AMOUNT.eq(11), &UpdateDefinition::new().set("note", "first"), scope)
        .await
        .unwrap());
    assert!(invoices
        .update_one_field_matching(&SOME_AMOUNT.eq(12), &NOTE, "second".to_string(), scope)
        .await
        .unwrap());
    assert!(!invoices
        .update_one_field_matching(&SOME_AMOUNT.eq(999), &NOTE, "none".to_string(), scope)
        .await
        .unwrap());
}

#[tokio::test]
async fn filter_is_not_folded_with_partition() {
    let t = TestRepo::new();
    seed_amounts(&t, "acme", "T", &[1, 2]).await;
    seed_amounts(&t, "zeta", "T", &[1, 2]).await;

    // the filter names another tenant, but routing alone decides the collection
    let n = t
        .invoices()
        .update_many_field_matching(
            &Filter::eq("tenant", "zeta"),
            &NOTE,
            "hit".to_string(),
            Scope::partition("acme"),
        )
        .await
        .unwrap();
    assert_eq!(n, 0);

    let n = t
        .invoices()
        .update_many_field_matching(&Filter::all(), &NOTE, "hit".to_string(), Scope::partition("acme"))
        .await
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(
        t.invoices()
            .count(&NOTE.eq("hit"), Scope::partition("zeta"))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn update_many_documents_across_partitions() {
    let t = TestRepo::new();
    let mut docs = vec![
        Invoice::new("acme", "T", 1, 0),
        Invoice::new("zeta", "T", 2, 0),
        Invoice::new("acme", "T", 3, 0),
    ];
    t.invoices().add_many(&mut docs, None).await.unwrap();

    for doc in docs.iter_mut() {
        doc.note = "batch".into();
    }
    assert_eq!(t.invoices().update_many(&docs, None).await.unwrap(), 3);
    for pk in ["acme", "zeta"] {
        let all = t.invoices().get_all(&Filter::all(), Scope::partition(pk)).await.unwrap();
        assert!(all.iter().all(|d| d.note == "batch"));
    }
}

#[tokio::test]
async fn update_cannot_change_primary_key() {
    let t = TestRepo::new();
    let mut invoice = Invoice::new("acme", "T", 1, 0);
    t.invoices().add_one(&mut invoice, None).await.unwrap();
    let err = t
        .invoices()
        .update_one_definition(&invoice, &UpdateDefinition::new().set("_id", "other"), None)
        .await
        .unwrap_err();
    assert!(err.as_driver().is_some());
}
