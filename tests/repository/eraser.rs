//! Deletes by instance, key and predicate

use crate::common::*;

#[tokio::test]
async fn delete_one_then_any_is_false() {
    let t = TestRepo::new();
    let mut invoice = Invoice::new("acme", "T", 10, 1);
    t.invoices().add_one(&mut invoice, None).await.unwrap();

    assert_eq!(t.invoices().delete_one(&invoice, None).await.unwrap(), 1);
    let by_id = Filter::eq("_id", invoice.id.to_string());
    assert!(!t.invoices().any(&by_id, Scope::partition("acme")).await.unwrap());
    assert_eq!(t.invoices().delete_one(&invoice, None).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_by_id_respects_partition() {
    let t = TestRepo::new();
    let docs = seed_amounts(&t, "acme", "T", &[1, 2]).await;
    let invoices = t.invoices();

    assert_eq!(invoices.delete_by_id(&docs[0].id, Scope::partition("zeta")).await.unwrap(), 0);
    assert_eq!(invoices.delete_by_id(&docs[0].id, Scope::partition("acme")).await.unwrap(), 1);
    assert_eq!(invoices.count(&Filter::all(), Scope::partition("acme")).await.unwrap(), 1);
}

#[tokio::test]
async fn delete_matching() {
    let t = TestRepo::new();
    seed_amounts(&t, "acme", "T", &[1, 2, 3, 4, 5]).await;
    let scope = Scope::partition("acme");
    let invoices = t.invoices();

    assert_eq!(invoices.delete_one_matching(&SOME_AMOUNT.gt(2), scope).await.unwrap(), 1);
    assert_eq!(invoices.delete_many_matching(&SOME_AMOUNT.gt(2), scope).await.unwrap(), 2);
    assert_eq!(invoices.delete_many_matching(&SOME_AMOUNT.gt(2), scope).await.unwrap(), 0);
    let rest: Vec<i64> = invoices
        .get_all(&Filter::all(), scope)
        .await
        .unwrap()
        .iter()
        .map(|d| d.some_amount)
        .collect();
    assert_eq!(rest, vec![1, 2]);
}

#[tokio::test]
async fn delete_many_documents_grouped_by_partition() {
    let t = TestRepo::new();
    let mut docs = vec![
        Invoice::new("acme", "T", 1, 0),
        Invoice::new("zeta", "T", 2, 0),
        Invoice::new("acme", "T", 3, 0),
        Invoice::new("zeta", "T", 4, 0),
    ];
    t.invoices().add_many(&mut docs, None).await.unwrap();

    let doomed = [docs[0].clone(), docs[1].clone(), docs[3].clone()];
    assert_eq!(t.invoices().delete_many(&doomed, None).await.unwrap(), 3);
    assert_eq!(t.stored("acme-Invoice"), 1);
    assert_eq!(t.stored("zeta-Invoice"), 0);
}

#[tokio::test]
async fn delete_many_of_nothing() {
    let t = TestRepo::new();
    assert_eq!(t.customers().delete_many(&[], None).await.unwrap(), 0);
    assert_eq!(t.client.collections_created(), 0);
}
