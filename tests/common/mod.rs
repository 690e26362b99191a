#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use unikv::{KvsEngine, KvsError, Result, Store};

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Foo {
    pub bar: String,
    pub baz: Vec<i64>,
    pub qux: Option<bool>,
}

pub const WORKERS: usize = 1000;

// Reading, writing, overwriting and deleting a struct value
pub fn check_store<E: KvsEngine>(store: &Store<E>) -> Result<()> {
    let key = "check_store";
    let mut actual = Foo::default();
    assert!(!store.get_into(key, &mut actual)?);

    let expected = Foo {
        bar: "baz".to_owned(),
        baz: vec![1, -2, 3],
        qux: Some(true),
    };
    store.set(key, &expected)?;
    assert!(store.get_into(key, &mut actual)?);
    assert_eq!(actual, expected);

    let replacement = Foo {
        bar: "qux".to_owned(),
        ..Foo::default()
    };
    store.set(key, &replacement)?;
    assert_eq!(store.get::<Foo>(key)?, Some(replacement));

    store.delete(key)?;
    assert_eq!(store.get::<Foo>(key)?, None);
    store.delete(key)?;
    Ok(())
}

// A miss must leave the destination alone
pub fn check_miss_keeps_destination<E: KvsEngine>(store: &Store<E>) -> Result<()> {
    let mut dest = Foo {
        bar: "untouched".to_owned(),
        ..Foo::default()
    };
    let before = dest.clone();
    assert!(!store.get_into("never_set", &mut dest)?);
    assert_eq!(dest, before);
    Ok(())
}

pub fn check_empty_key<E: KvsEngine>(store: &Store<E>) {
    assert!(matches!(store.set("", &Foo::default()), Err(KvsError::InvalidKey)));
    assert!(matches!(store.get::<Foo>(""), Err(KvsError::InvalidKey)));
    let mut dest = Foo::default();
    assert!(matches!(store.get_into("", &mut dest), Err(KvsError::InvalidKey)));
    assert!(matches!(store.delete(""), Err(KvsError::InvalidKey)));
}

pub fn check_nil_value<E: KvsEngine>(store: &Store<E>) -> Result<()> {
    assert!(matches!(store.set("nil", &None::<Foo>), Err(KvsError::NilValue)));
    assert!(matches!(store.set("nil", &()), Err(KvsError::NilValue)));
    assert_eq!(store.get::<Foo>("nil")?, None);
    Ok(())
}

fn round_trip<E, T>(store: &Store<E>, key: &str, value: T) -> Result<()>
where
    E: KvsEngine,
    T: Serialize + DeserializeOwned + PartialEq + Debug,
{
    store.set(key, &value)?;
    assert_eq!(store.get::<T>(key)?, Some(value), "key {}", key);
    Ok(())
}

// Every kind of value serde can describe
pub fn check_types<E: KvsEngine>(store: &Store<E>) -> Result<()> {
    round_trip(store, "bool", true)?;
    round_trip(store, "u8", u8::MAX)?;
    round_trip(store, "u16", u16::MAX)?;
    round_trip(store, "u32", u32::MAX)?;
    round_trip(store, "u64", u64::MAX)?;
    round_trip(store, "i8", i8::MIN)?;
    round_trip(store, "i16", i16::MIN)?;
    round_trip(store, "i32", i32::MIN)?;
    round_trip(store, "i64", i64::MIN)?;
    round_trip(store, "f32", 1.5f32)?;
    round_trip(store, "f64", -0.125f64)?;
    round_trip(store, "char", 'λ')?;
    round_trip(store, "string", "hello, world".to_owned())?;
    round_trip(store, "empty_string", String::new())?;
    round_trip(store, "bytes", vec![0u8, 1, 2, 255])?;
    round_trip(store, "strings", vec!["a".to_owned(), "b".to_owned()])?;
    round_trip(store, "tuple", (1u32, "two".to_owned(), 3.0f64))?;
    round_trip(store, "some", Some(42i32))?;

    let mut map = HashMap::new();
    map.insert("one".to_owned(), 1i32);
    map.insert("two".to_owned(), 2);
    round_trip(store, "hash_map", map)?;

    let mut tree = BTreeMap::new();
    tree.insert("k".to_owned(), Foo::default());
    round_trip(store, "btree_map", tree)?;

    round_trip(store, "struct", Foo::default())?;
    round_trip(
        store,
        "nested",
        vec![Foo {
            bar: "x".to_owned(),
            baz: vec![i64::MAX],
            qux: None,
        }],
    )?;
    Ok(())
}

pub fn check_closed<E: KvsEngine>(store: &Store<E>) -> Result<()> {
    store.set("before_close", &Foo::default())?;
    store.close()?;
    assert!(matches!(store.set("k", &Foo::default()), Err(KvsError::Closed)));
    assert!(matches!(store.get::<Foo>("before_close"), Err(KvsError::Closed)));
    assert!(matches!(store.delete("k"), Err(KvsError::Closed)));
    store.close()
}

fn interact_with_store<E: KvsEngine>(store: &Store<E>, key: &str) {
    let expected = Foo::default();
    store.set(key, &expected).unwrap();
    let mut actual = Foo {
        bar: "stale".to_owned(),
        ..Foo::default()
    };
    assert!(store.get_into(key, &mut actual).unwrap());
    assert_eq!(actual, expected);
}

// Many threads each set and read back their own key, then every key is
// checked once more from the calling thread.
pub fn check_concurrent<E: KvsEngine>(store: &Store<E>) -> Result<()> {
    crossbeam_utils::thread::scope(|s| {
        for i in 0..WORKERS {
            s.spawn(move |_| interact_with_store(store, &i.to_string()));
        }
    })
    .expect("a worker panicked");

    let expected = Foo::default();
    for i in 0..WORKERS {
        assert_eq!(store.get::<Foo>(&i.to_string())?, Some(expected.clone()));
    }
    Ok(())
}
