//! Inserts and key assignment

use crate::common::*;

#[tokio::test]
async fn add_one_then_get_by_id() {
    let t = TestRepo::new();
    let invoices = t.invoices();
    let mut invoice = Invoice::new("acme", "T", 10, 1);
    invoices.add_one(&mut invoice, None).await.unwrap();

    assert!(!invoice.id.is_nil());
    let found = invoices
        .get_by_id(&invoice.id, Scope::partition("acme"))
        .await
        .unwrap();
    assert_eq!(found, Some(invoice));
}

#[tokio::test]
async fn add_one_never_overwrites_existing_key() {
    let t = TestRepo::new();
    let id = Uuid::new_v4();
    let mut invoice = Invoice::new("acme", "T", 10, 1);
    invoice.id = id;
    t.invoices().add_one(&mut invoice, None).await.unwrap();
    assert_eq!(invoice.id, id);
    assert!(t
        .invoices()
        .get_by_id(&id, Scope::partition("acme"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn object_id_keys_are_generated() {
    let t = TestRepo::new();
    let mut a = Customer::new("ann", None);
    let mut b = Customer::new("bob", Some("eu"));
    t.customers().add_one(&mut a, None).await.unwrap();
    t.customers().add_one(&mut b, None).await.unwrap();

    assert!(!a.id.is_default());
    assert_ne!(a.id, b.id);
    assert_eq!(t.stored("customers"), 2);
}

#[tokio::test]
async fn caller_supplied_key_must_be_set() {
    let t = TestRepo::new();
    let mut blank = Sku {
        code: String::new(),
        stock: 1,
    };
    let err = t.skus().add_one(&mut blank, None).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedKeyType { .. }));

    let mut sku = Sku {
        code: "SKU-1".into(),
        stock: 1,
    };
    t.skus().add_one(&mut sku, None).await.unwrap();
    let found = t
        .skus()
        .get_by_id(&"SKU-1".to_string(), Scope::none())
        .await
        .unwrap();
    assert_eq!(found, Some(sku));
}

#[tokio::test]
async fn duplicate_key_is_a_driver_error() {
    let t = TestRepo::new();
    let mut sku = Sku {
        code: "SKU-1".into(),
        stock: 1,
    };
    t.skus().add_one(&mut sku.clone(), None).await.unwrap();
    let err = t.skus().add_one(&mut sku, None).await.unwrap_err();
    assert!(err.is_duplicate_key());
}

#[tokio::test]
async fn missing_partition_key_fails_before_io() {
    let t = TestRepo::new();
    let mut invoice = Invoice::new("", "T", 10, 1);
    let err = t.invoices().add_one(&mut invoice, None).await.unwrap_err();
    assert!(matches!(err, Error::MissingPartitionKey { .. }));
    assert!(invoice.id.is_nil());
    assert_eq!(t.client.collections_created(), 0);
}

#[tokio::test]
async fn add_many_assigns_every_key() {
    let t = TestRepo::new();
    let mut docs = vec![
        Invoice::new("acme", "T", 1, 1),
        Invoice::new("acme", "T", 2, 1),
        Invoice::new("acme", "T", 3, 1),
    ];
    let preset = Uuid::new_v4();
    docs[1].id = preset;
    t.invoices().add_many(&mut docs, None).await.unwrap();

    assert!(docs.iter().all(|d| !d.id.is_nil()));
    assert_eq!(docs[1].id, preset);
    assert_eq!(t.stored("acme-Invoice"), 3);
}

#[tokio::test]
async fn add_many_empty_is_noop() {
    let t = TestRepo::new();
    t.invoices().add_many(&mut [], None).await.unwrap();
    assert_eq!(t.client.collections_created(), 0);
}

#[tokio::test]
async fn add_many_preserves_order_within_partition() {
    let t = TestRepo::new();
    let mut docs: Vec<Invoice> = (0..6)
        .map(|i| Invoice::new(if i % 2 == 0 { "a" } else { "b" }, "T", i, 0))
        .collect();
    t.invoices().add_many(&mut docs, None).await.unwrap();

    let a = t.invoices().get_all(&Filter::all(), Scope::partition("a")).await.unwrap();
    let amounts: Vec<i64> = a.iter().map(|d| d.some_amount).collect();
    assert_eq!(amounts, vec![0, 2, 4]);
}

#[tokio::test]
async fn cancelled_insert_writes_nothing() {
    let t = TestRepo::new();
    let token = CancellationToken::new();
    token.cancel();
    let mut invoice = Invoice::new("acme", "T", 10, 1);
    let err = t
        .invoices()
        .add_one(&mut invoice, Some(&token))
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(t.stored("acme-Invoice"), 0);
}
