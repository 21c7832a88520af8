use super::*;
use crate::module::DataType;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

mod common {
    use super::*;

    pub(super) struct Tracked {
        pub(super) value: u32,
        pub(super) frees: Arc<AtomicUsize>,
    }

    pub(super) struct Other;

    fn free_tracked(data: Box<dyn Any + Send>) {
        if let Ok(tracked) = data.downcast::<Tracked>() {
            tracked.frees.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn free_other(_data: Box<dyn Any + Send>) {}

    pub(super) fn registry() -> (TypeRegistry, ModuleType, ModuleType) {
        let mut types = TypeRegistry::default();
        let tracked = types.register(DataType::new("tracked01", 1, free_tracked), "test");
        let other = types.register(DataType::new("othertype", 1, free_other), "test");
        (types, tracked, other)
    }

    pub(super) fn make_key(s: &str) -> Key {
        Key::parse(s).unwrap()
    }
}

use common::{Other, Tracked, make_key, registry};

#[test]
fn empty_key_reads_as_none() {
    let (types, tracked, _) = registry();
    let mut keyspace = Keyspace::default();
    let key = make_key("missing");

    assert!(ReadKey::new(&keyspace, &key).is_empty());
    assert_eq!(ReadKey::new(&keyspace, &key).key_type(), KeyType::Empty);

    let write = WriteKey::new(&mut keyspace, &types, &key);
    assert!(write.module_value::<Tracked>(tracked).unwrap().is_none());
    assert!(write.string_value().unwrap().is_none());
}

#[test]
fn module_value_round_trips_through_typed_accessors() {
    let (types, tracked, _) = registry();
    let mut keyspace = Keyspace::default();
    let key = make_key("k");
    let frees = Arc::new(AtomicUsize::new(0));

    let mut write = WriteKey::new(&mut keyspace, &types, &key);
    write
        .set_module_value(
            tracked,
            Tracked {
                value: 7,
                frees: frees.clone(),
            },
        )
        .unwrap();
    write
        .module_value_mut::<Tracked>(tracked)
        .unwrap()
        .unwrap()
        .value += 1;

    let read = ReadKey::new(&keyspace, &key);
    assert_eq!(read.key_type(), KeyType::Module(tracked));
    assert_eq!(
        read.module_value::<Tracked>(tracked).unwrap().unwrap().value,
        8
    );
    assert_eq!(frees.load(Ordering::SeqCst), 0);
}

#[test]
fn foreign_values_are_wrong_type() {
    let (types, tracked, other) = registry();
    let mut keyspace = Keyspace::default();
    let string_key = make_key("s");
    let other_key = make_key("o");

    WriteKey::new(&mut keyspace, &types, &string_key).set_string("plain");
    WriteKey::new(&mut keyspace, &types, &other_key)
        .set_module_value(other, Other)
        .unwrap();

    let read = ReadKey::new(&keyspace, &string_key);
    assert_eq!(
        read.module_value::<Tracked>(tracked).err(),
        Some(CommandError::WrongType)
    );

    let read = ReadKey::new(&keyspace, &other_key);
    assert_eq!(
        read.module_value::<Tracked>(tracked).err(),
        Some(CommandError::WrongType)
    );
    assert_eq!(read.string_value().err(), Some(CommandError::WrongType));
}

#[test]
fn mismatched_payload_is_wrong_type() {
    let (types, tracked, _) = registry();
    let mut keyspace = Keyspace::default();
    let key = make_key("k");

    let mut write = WriteKey::new(&mut keyspace, &types, &key);
    write.set_module_value(tracked, Other).unwrap();

    assert_eq!(
        write.module_value::<Tracked>(tracked).err(),
        Some(CommandError::WrongType)
    );
}

#[test]
fn delete_overwrite_and_clear_each_free_once() {
    let (types, tracked, _) = registry();
    let mut keyspace = Keyspace::default();
    let frees = Arc::new(AtomicUsize::new(0));
    let key = make_key("k");

    let insert = |keyspace: &mut Keyspace, key: &Key| {
        WriteKey::new(keyspace, &types, key)
            .set_module_value(
                tracked,
                Tracked {
                    value: 0,
                    frees: frees.clone(),
                },
            )
            .unwrap();
    };

    insert(&mut keyspace, &key);
    assert!(WriteKey::new(&mut keyspace, &types, &key).delete());
    assert!(!WriteKey::new(&mut keyspace, &types, &key).delete());
    assert_eq!(frees.load(Ordering::SeqCst), 1);

    insert(&mut keyspace, &key);
    WriteKey::new(&mut keyspace, &types, &key).set_string("overwrite");
    assert_eq!(frees.load(Ordering::SeqCst), 2);

    insert(&mut keyspace, &make_key("a"));
    insert(&mut keyspace, &make_key("b"));
    assert_eq!(keyspace.clear(), 3);
    assert_eq!(frees.load(Ordering::SeqCst), 4);
}

#[test]
fn set_module_value_rejects_unregistered_type() {
    let (types, _, _) = registry();
    let mut keyspace = Keyspace::default();
    let key = make_key("k");

    let result = WriteKey::new(&mut keyspace, &types, &key).set_module_value(ModuleType(99), Other);

    assert!(matches!(result, Err(CommandError::Err(_))));
    assert!(ReadKey::new(&keyspace, &key).is_empty());
}
