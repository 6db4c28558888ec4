//! Synchronous facade

use crate::common::*;

#[test]
fn blocking_round_trip() {
    let repo = blocking_repo();
    let invoices = repo.documents::<Invoice>();
    let scope = Scope::partition("acme");

    let mut invoice = Invoice::new("acme", "T", 10, 1);
    invoices.add_one(&mut invoice, None).unwrap();
    assert_eq!(invoices.get_by_id(&invoice.id, scope).unwrap(), Some(invoice.clone()));

    assert!(invoices.update_one_field(&invoice, &NOTE, "sync".to_string(), None).unwrap());
    let stored = invoices.get_one(&NOTE.eq("sync"), scope).unwrap().unwrap();
    assert_eq!(stored.id, invoice.id);

    assert_eq!(invoices.delete_by_id(&invoice.id, scope).unwrap(), 1);
    assert!(!invoices.any(&Filter::all(), scope).unwrap());
}

#[test]
fn blocking_scenarios() {
    let repo = blocking_repo();
    let invoices = repo.documents::<Invoice>();
    let scope = Scope::partition("acme");

    let mut docs: Vec<Invoice> = [(10, 1), (20, 1), (30, 1), (40, 2), (50, 2)]
        .iter()
        .map(|&(amount, group)| Invoice::new("acme", "T", amount, group))
        .collect();
    invoices.add_many(&mut docs, None).unwrap();

    assert_eq!(invoices.sum_by(&CONTENT_TAG.eq("T"), &SOME_AMOUNT, scope).unwrap(), 150);
    let groups: Vec<(i32, usize)> = invoices
        .group_by(&GROUPING_KEY, |g| (g.key, g.len()), scope)
        .unwrap();
    assert_eq!(groups, vec![(1, 3), (2, 2)]);

    let page = invoices
        .get_sorted_paginated(&Filter::all(), &SOME_AMOUNT, false, Page::new(1, 2), scope)
        .unwrap();
    assert_eq!(page.iter().map(|d| d.some_amount).collect::<Vec<_>>(), vec![40, 30]);

    assert_eq!(
        invoices
            .update_many_definition_matching(&GROUPING_KEY.eq(2), &UpdateDefinition::new().set("note", "g2"), scope)
            .unwrap(),
        2
    );
    assert_eq!(invoices.delete_many_matching(&NOTE.eq("g2"), scope).unwrap(), 2);
    assert_eq!(invoices.count(&Filter::all(), scope).unwrap(), 3);
}

#[test]
fn blocking_indexes() {
    let repo = blocking_repo();
    let name = repo
        .create_combined_text_index::<Invoice>(&["content_tag", "note"], IndexOptions::new(), Scope::partition("acme"))
        .unwrap();
    assert_eq!(name, "content_tag_text_note_text");
    assert_eq!(
        repo.get_index_names::<Invoice>(Scope::partition("acme")).unwrap(),
        vec!["_id_", "content_tag_text_note_text"]
    );
}
