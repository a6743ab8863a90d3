// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the pack config controller over in-memory adapters.

use http::StatusCode;
use packcfg::adapters::{InMemoryPackRegistry, InMemoryStore};
use packcfg::domain::Pack;
use packcfg::ports::Store;
use packcfg::service::{ConfigStore, EncryptionGate, PackConfigController};
use std::sync::Arc;

struct Fixture {
    controller: PackConfigController,
    backing: Arc<InMemoryStore>,
}

fn fixture(gate: EncryptionGate) -> Fixture {
    let packs = InMemoryPackRegistry::with_packs([
        Pack::new("5f1b", "aws").unwrap(),
        Pack::new("77ce", "slack").unwrap(),
    ])
    .unwrap();
    let backing = Arc::new(InMemoryStore::new());
    let store = ConfigStore::new(backing.clone(), Arc::new(gate));
    Fixture {
        controller: PackConfigController::new(Arc::new(packs), store),
        backing,
    }
}

fn keyed() -> Fixture {
    fixture(EncryptionGate::new(&[11u8; 32]))
}

#[test]
fn test_get_all_empty_pack() {
    let f = keyed();
    let reply = f.controller.get_all("aws").unwrap();
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, Some(vec![]));
}

#[test]
fn test_unknown_pack_is_not_found_everywhere() {
    let f = keyed();
    let put = f
        .controller
        .put("linux", "region", br#"{"value": "x"}"#)
        .unwrap_err();
    assert_eq!(put.status, StatusCode::NOT_FOUND);
    assert_eq!(put.code, "PackNotFound");
    assert_eq!(
        put.faultstring,
        "Pack with ref_or_id \"linux\" does not exist"
    );

    assert_eq!(
        f.controller.get_all("linux").unwrap_err().status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        f.controller.get_one("linux", "region").unwrap_err().status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        f.controller.delete("linux", "region").unwrap_err().status,
        StatusCode::NOT_FOUND
    );
    assert!(f.backing.is_empty());
}

#[test]
fn test_unknown_pack_is_checked_before_body() {
    let f = keyed();
    let error = f.controller.put("linux", "region", b"not json").unwrap_err();
    assert_eq!(error.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_put_then_get_one() {
    let f = keyed();
    let put = f
        .controller
        .put("aws", "region", br#"{"value": "us-east-1"}"#)
        .unwrap();
    assert_eq!(put.status, StatusCode::OK);
    let item = put.body.unwrap();
    assert_eq!(item.pack, "aws");
    assert_eq!(item.name, "region");
    assert!(!item.secret);

    let got = f.controller.get_one("aws", "region").unwrap();
    assert_eq!(got.status, StatusCode::OK);
    assert_eq!(got.body.unwrap().value, "us-east-1");
}

#[test]
fn test_ref_and_id_address_the_same_items() {
    let f = keyed();
    f.controller
        .put("5f1b", "region", br#"{"value": "us-east-1"}"#)
        .unwrap();

    let by_ref = f.controller.get_all("aws").unwrap().body.unwrap();
    let by_id = f.controller.get_all("5f1b").unwrap().body.unwrap();
    assert_eq!(by_ref, by_id);
    assert_eq!(by_ref.len(), 1);
    assert_eq!(by_ref[0].pack, "aws");
}

#[test]
fn test_secret_round_trip_and_storage() {
    let f = keyed();
    f.controller
        .put(
            "aws",
            "secret_key",
            br#"{"value": "wJalrXUtnFEMI", "secret": true}"#,
        )
        .unwrap();

    let raw = f.backing.get("aws:secret_key").unwrap().unwrap();
    assert!(!raw.contains("wJalrXUtnFEMI"));

    let item = f
        .controller
        .get_one("aws", "secret_key")
        .unwrap()
        .body
        .unwrap();
    assert_eq!(item.value, "wJalrXUtnFEMI");
    assert!(item.secret);
}

#[test]
fn test_secret_without_key_is_conflict() {
    let f = fixture(EncryptionGate::unprovisioned());
    let error = f
        .controller
        .put("aws", "secret_key", br#"{"value": "x", "secret": true}"#)
        .unwrap_err();
    assert_eq!(error.status, StatusCode::CONFLICT);
    assert_eq!(error.code, "KeyNotProvisioned");
    assert!(f.backing.is_empty());

    let plain = f
        .controller
        .put("aws", "region", br#"{"value": "us-east-1"}"#)
        .unwrap();
    assert_eq!(plain.status, StatusCode::OK);
}

#[test]
fn test_reading_secret_without_key_is_conflict() {
    let backing = Arc::new(InMemoryStore::new());
    let packs = Arc::new(
        InMemoryPackRegistry::with_packs([Pack::new("5f1b", "aws").unwrap()]).unwrap(),
    );

    let writer = PackConfigController::new(
        packs.clone(),
        ConfigStore::new(backing.clone(), Arc::new(EncryptionGate::new(&[1u8; 32]))),
    );
    writer
        .put("aws", "token", br#"{"value": "t0k3n", "secret": true}"#)
        .unwrap();

    let reader = PackConfigController::new(
        packs,
        ConfigStore::new(backing, Arc::new(EncryptionGate::unprovisioned())),
    );
    assert_eq!(
        reader.get_one("aws", "token").unwrap_err().status,
        StatusCode::CONFLICT
    );
    assert_eq!(
        reader.get_all("aws").unwrap_err().status,
        StatusCode::CONFLICT
    );
}

#[test]
fn test_delete_then_get_is_not_found() {
    let f = keyed();
    f.controller
        .put("aws", "region", br#"{"value": "us-east-1"}"#)
        .unwrap();

    let deleted = f.controller.delete("aws", "region").unwrap();
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let error = f.controller.get_one("aws", "region").unwrap_err();
    assert_eq!(error.status, StatusCode::NOT_FOUND);
    assert_eq!(error.code, "KeyNotFound");

    let again = f.controller.delete("aws", "region").unwrap_err();
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[test]
fn test_items_are_scoped_to_their_pack() {
    let f = keyed();
    f.controller
        .put("aws", "token", br#"{"value": "a"}"#)
        .unwrap();
    f.controller
        .put("slack", "token", br#"{"value": "b"}"#)
        .unwrap();

    let aws = f.controller.get_all("aws").unwrap().body.unwrap();
    assert_eq!(aws.len(), 1);
    assert_eq!(aws[0].value, "a");

    f.controller.delete("slack", "token").unwrap();
    assert_eq!(
        f.controller.get_one("aws", "token").unwrap().body.unwrap().value,
        "a"
    );
}

#[test]
fn test_bad_bodies_are_bad_requests() {
    let f = keyed();
    let bodies: [&[u8]; 4] = [
        b"not json",
        br#"{"secret": true}"#,
        br#"{"value": "x", "extra": 1}"#,
        br#"{"value": "x", "name": "other"}"#,
    ];
    for body in bodies {
        let error = f.controller.put("aws", "region", body).unwrap_err();
        assert_eq!(
            error.status,
            StatusCode::BAD_REQUEST,
            "{}",
            String::from_utf8_lossy(body)
        );
    }
    assert!(f.backing.is_empty());
}

#[test]
fn test_matching_body_name_is_accepted() {
    let f = keyed();
    let reply = f
        .controller
        .put("aws", "region", br#"{"value": "x", "name": "region"}"#)
        .unwrap();
    assert_eq!(reply.status, StatusCode::OK);
}

#[test]
fn test_corrupt_stored_value_is_server_error() {
    let f = keyed();
    f.backing.put("aws:region", "not json").unwrap();
    let error = f.controller.get_one("aws", "region").unwrap_err();
    assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.code, "StoreError");
}

#[test]
fn test_concurrent_puts_to_distinct_keys() {
    let f = keyed();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let controller = f.controller.clone();
            std::thread::spawn(move || {
                let body = format!(r#"{{"value": "v{}", "secret": true}}"#, i);
                controller
                    .put("aws", &format!("item{}", i), body.as_bytes())
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let items = f.controller.get_all("aws").unwrap().body.unwrap();
    assert_eq!(items.len(), 8);
    assert!(items
        .iter()
        .all(|item| item.secret && item.value == format!("v{}", &item.name[4..])));
}
