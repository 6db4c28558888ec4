//! Partition routing, isolation and the collection cache

use crate::common::*;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::test]
async fn counts_are_isolated_per_partition() {
    let t = TestRepo::new();
    t.invoices()
        .add_one(&mut Invoice::new("p1", "T", 1, 0), None)
        .await
        .unwrap();
    t.invoices()
        .add_one(&mut Invoice::new("p2", "T", 1, 0), None)
        .await
        .unwrap();

    assert_eq!(t.invoices().count(&Filter::all(), Scope::partition("p1")).await.unwrap(), 1);
    assert_eq!(t.invoices().count(&Filter::all(), Scope::partition("p2")).await.unwrap(), 1);
    assert_eq!(
        t.repo.list_collection_names().await.unwrap(),
        vec!["p1-Invoice", "p2-Invoice"]
    );
}

#[tokio::test]
async fn unpartitioned_types_ignore_partition_scope() {
    let t = TestRepo::new();
    t.customers()
        .add_one(&mut Customer::new("ann", None), None)
        .await
        .unwrap();
    let scoped = t
        .customers()
        .count(&Filter::all(), Scope::partition("anything"))
        .await
        .unwrap();
    assert_eq!(scoped, 1);
    assert_eq!(t.client.collections_created(), 1);
}

#[tokio::test]
async fn collection_handles_are_cached() {
    let t = TestRepo::new();
    for _ in 0..5 {
        t.invoices().count(&Filter::all(), Scope::partition("p1")).await.unwrap();
        t.customers().count(&Filter::all(), Scope::none()).await.unwrap();
    }
    assert_eq!(t.repo.access().cached_collections(), 2);
    assert_eq!(t.client.collections_created(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_inserts_share_one_collection() {
    let t = Arc::new(TestRepo::new());
    let mut tasks = Vec::new();
    for i in 0..32 {
        let t = Arc::clone(&t);
        tasks.push(tokio::spawn(async move {
            let mut doc = Invoice::new("hot", "T", i, 0);
            t.invoices().add_one(&mut doc, None).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(t.client.collections_created(), 1);
    assert_eq!(t.stored("hot-Invoice"), 32);
}

#[tokio::test]
async fn drop_collection_only_affects_one_partition() {
    let t = TestRepo::new();
    seed_amounts(&t, "p1", "T", &[1, 2]).await;
    seed_amounts(&t, "p2", "T", &[3]).await;

    assert!(t.repo.drop_collection::<Invoice>(Scope::partition("p1")).await.unwrap());
    assert_eq!(t.invoices().count(&Filter::all(), Scope::partition("p1")).await.unwrap(), 0);
    assert_eq!(t.invoices().count(&Filter::all(), Scope::partition("p2")).await.unwrap(), 1);
}

#[tokio::test]
async fn drop_is_seen_by_every_repository_on_the_client() {
    let t = TestRepo::new();
    let other = Repository::new(t.client.clone(), t.repo.config().clone()).unwrap();
    let other_invoices = other.documents::<Invoice>();
    let p1 = Scope::partition("p1");

    seed_amounts(&t, "p1", "T", &[1]).await;
    assert_eq!(other_invoices.count(&Filter::all(), p1).await.unwrap(), 1);

    assert!(t.repo.drop_collection::<Invoice>(p1).await.unwrap());
    assert_eq!(other_invoices.count(&Filter::all(), p1).await.unwrap(), 0);
    assert!(t.repo.list_collection_names().await.unwrap().is_empty());

    other_invoices
        .add_one(&mut Invoice::new("p1", "T", 2, 0), None)
        .await
        .unwrap();
    assert_eq!(t.invoices().count(&Filter::all(), p1).await.unwrap(), 1);
    assert_eq!(other_invoices.count(&Filter::all(), p1).await.unwrap(), 1);
    assert_eq!(t.repo.list_collection_names().await.unwrap(), vec!["p1-Invoice"]);
    assert_eq!(t.client.collections_created(), 1);
}

#[test]
fn custom_separator_names_collections() {
    let t = TestRepo::with_config(RepositoryConfig {
        partition_separator: "::".into(),
        ..RepositoryConfig::for_database("sep")
    });
    assert_eq!(t.repo.collection_name::<Invoice>(Some("acme")), "acme::Invoice");
    assert_eq!(t.repo.collection_name::<Customer>(Some("acme")), "customers");
}

fn tenant() -> impl Strategy<Value = String> {
    prop_oneof![Just("p1".to_string()), Just("p2".to_string()), Just("p3".to_string())]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn add_many_splits_batches_by_partition(tenants in prop::collection::vec(tenant(), 1..40)) {
        let repo = blocking_repo();
        let invoices = repo.documents::<Invoice>();
        let mut docs: Vec<Invoice> = tenants
            .iter()
            .enumerate()
            .map(|(i, t)| Invoice::new(t, "T", i as i64, 0))
            .collect();
        invoices.add_many(&mut docs, None).unwrap();

        let mut expected: HashMap<&str, Vec<i64>> = HashMap::new();
        for doc in &docs {
            expected.entry(doc.tenant.as_str()).or_default().push(doc.some_amount);
        }

        let none = Vec::new();
        let mut total = 0;
        for pk in ["p1", "p2", "p3"] {
            let stored: Vec<i64> = invoices
                .get_all(&Filter::all(), Scope::partition(pk))
                .unwrap()
                .iter()
                .map(|d| d.some_amount)
                .collect();
            prop_assert_eq!(&stored, expected.get(pk).unwrap_or(&none));
            total += stored.len();
        }
        prop_assert_eq!(total, docs.len());
    }

    #[test]
    fn preset_keys_survive_insert(preset in prop::collection::vec(any::<bool>(), 1..20)) {
        let repo = blocking_repo();
        let invoices = repo.documents::<Invoice>();
        let mut docs: Vec<Invoice> = preset
            .iter()
            .map(|&set| {
                let mut doc = Invoice::new("p1", "T", 0, 0);
                if set {
                    doc.id = Uuid::new_v4();
                }
                doc
            })
            .collect();
        let before: Vec<Uuid> = docs.iter().map(|d| d.id).collect();
        invoices.add_many(&mut docs, None).unwrap();

        for (doc, old) in docs.iter().zip(&before) {
            prop_assert!(!doc.id.is_nil());
            if !old.is_nil() {
                prop_assert_eq!(doc.id, *old);
            }
        }
    }
}
