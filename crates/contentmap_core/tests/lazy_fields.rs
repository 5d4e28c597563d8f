use contentmap_core::db::open_db_in_memory;
use contentmap_core::{
    ContentStore, Converter, ConverterRegistry, FieldDescriptor, FieldKind, FieldValue, NodeMapper,
    Record, SqliteContentStore, TypeDescriptor, TypeRegistry, UserId,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingUpper {
    reads: Arc<AtomicUsize>,
}

impl Converter for CountingUpper {
    fn read(&self, raw: &str) -> Result<FieldValue, String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(FieldValue::Text(raw.to_uppercase()))
    }

    fn write(&self, value: &FieldValue) -> Result<String, String> {
        Ok(value.to_raw())
    }
}

fn shouting_title(_record: &Record, base: Option<FieldValue>) -> Option<FieldValue> {
    let text = base
        .and_then(|value| value.as_text().map(str::to_string))
        .unwrap_or_default();
    Some(FieldValue::Text(format!("{text}!")))
}

fn setup_types() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types
        .register(
            TypeDescriptor::new("Page")
                .with_field(FieldDescriptor::new("name_plain", "name_plain", FieldKind::Text))
                .with_field(
                    FieldDescriptor::new("summary", "summary", FieldKind::Text)
                        .with_converter("counting_upper")
                        .overridable(),
                )
                .with_field(
                    FieldDescriptor::new("headline", "headline", FieldKind::Text).overridable(),
                )
                .with_override("headline", shouting_title),
        )
        .unwrap();
    types
}

#[test]
fn overridable_fields_are_not_computed_eagerly() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteContentStore::try_new(&conn).unwrap();
    let types = setup_types();
    let reads = Arc::new(AtomicUsize::new(0));
    let mut converters = ConverterRegistry::new();
    converters
        .register_named(
            "counting_upper",
            Arc::new(CountingUpper {
                reads: Arc::clone(&reads),
            }),
        )
        .unwrap();

    let id = store
        .create_node("Lazy", 1, "Page", UserId::new_v4())
        .unwrap();
    store.set_field(id, "name_plain", "plain").unwrap();
    store.set_field(id, "summary", "deferred").unwrap();

    let mapper = NodeMapper::new(&store, &types, &converters);
    let record = mapper.map_by_id(id).unwrap().unwrap();

    // Eager population must not have touched the converter.
    assert_eq!(reads.load(Ordering::SeqCst), 0);
    assert_eq!(record.get("summary"), None);
    assert_eq!(
        record.get("name_plain"),
        Some(FieldValue::Text("plain".to_string()))
    );
}

#[test]
fn first_access_computes_and_caches_exactly_once() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteContentStore::try_new(&conn).unwrap();
    let types = setup_types();
    let reads = Arc::new(AtomicUsize::new(0));
    let mut converters = ConverterRegistry::new();
    converters
        .register_named(
            "counting_upper",
            Arc::new(CountingUpper {
                reads: Arc::clone(&reads),
            }),
        )
        .unwrap();

    let id = store
        .create_node("Lazy", 1, "Page", UserId::new_v4())
        .unwrap();
    store.set_field(id, "summary", "deferred").unwrap();

    let mapper = NodeMapper::new(&store, &types, &converters);
    let record = mapper.map_by_id(id).unwrap().unwrap();

    let first = mapper.field(&record, "summary").unwrap();
    assert_eq!(first, Some(FieldValue::Text("DEFERRED".to_string())));
    assert_eq!(reads.load(Ordering::SeqCst), 1);

    let second = mapper.field(&record, "summary").unwrap();
    assert_eq!(second, first);
    assert_eq!(reads.load(Ordering::SeqCst), 1, "cache must absorb rereads");

    // The cached value is now visible through plain record access too.
    assert_eq!(
        record.get("summary"),
        Some(FieldValue::Text("DEFERRED".to_string()))
    );
}

#[test]
fn override_hook_receives_the_base_converted_value() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteContentStore::try_new(&conn).unwrap();
    let types = setup_types();
    let converters = ConverterRegistry::new();

    let id = store
        .create_node("Hooked", 1, "Page", UserId::new_v4())
        .unwrap();
    store.set_field(id, "headline", "Breaking").unwrap();

    let mapper = NodeMapper::new(&store, &types, &converters);
    let record = mapper.map_by_id(id).unwrap().unwrap();

    let value = mapper.field(&record, "headline").unwrap();
    assert_eq!(value, Some(FieldValue::Text("Breaking!".to_string())));
}

#[test]
fn undeclared_field_access_yields_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteContentStore::try_new(&conn).unwrap();
    let types = setup_types();
    let converters = ConverterRegistry::new();

    let id = store
        .create_node("Plain", 1, "Page", UserId::new_v4())
        .unwrap();
    let mapper = NodeMapper::new(&store, &types, &converters);
    let record = mapper.map_by_id(id).unwrap().unwrap();

    assert_eq!(mapper.field(&record, "does_not_exist").unwrap(), None);
}
