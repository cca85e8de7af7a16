//! Converter lookup: factory order, qualifiers, lists, recursion and caching.

use std::sync::Arc;
use std::thread;

use recbind::{
    ConfigError, Constructor, Converter, DecodeError, Decoded, EncodeError, FieldReader,
    FieldWriter, Parameter, Property, Qualifiers, Record, RecordShape, Registry, StreamError,
    StreamErrorKind, TypeKind, TypeRef, expect_value, read_null,
};

#[derive(Debug, PartialEq)]
struct Node {
    value: i64,
    next: Option<Box<Node>>,
    children: Vec<Node>,
}

impl Record for Node {
    fn shape() -> RecordShape<Self> {
        RecordShape::builder("Node")
            .constructor(
                Constructor::builder()
                    .param(Parameter::of::<i64>("value"))
                    .param(Parameter::nullable::<Node>("next").default_null())
                    .param(Parameter::of::<Vec<Node>>("children").default_value(|| Vec::<Node>::new()))
                    .build(|args| {
                        Ok(Node {
                            value: args.take(0)?,
                            next: args.take_nullable::<Node>(1)?.map(Box::new),
                            children: args.take(2)?,
                        })
                    }),
            )
            .property(Property::new("value", |n: &Node| &n.value))
            .property(Property::nullable("next", |n: &Node| n.next.as_deref()))
            .property(Property::new("children", |n: &Node| &n.children))
            .build()
    }
}

#[test]
fn recursive_records_resolve() {
    recbind_testhelpers::setup();

    let registry = Registry::builder().record::<Node>().list::<Node>().build();
    let nodes = registry.adapter::<Node>().unwrap();

    let json = r#"{"value":1,"next":{"value":2,"next":null,"children":[]},"children":[{"value":3,"next":null,"children":[]}]}"#;
    let node = nodes.from_json(json).unwrap();
    assert_eq!(node.value, 1);
    assert_eq!(node.next.as_ref().map(|n| n.value), Some(2));
    assert_eq!(node.children.len(), 1);
    assert_eq!(node.children[0].value, 3);
    assert_eq!(nodes.to_json(&node).unwrap(), json);
}

#[test]
fn nested_errors_carry_the_full_path() {
    recbind_testhelpers::setup();

    let registry = Registry::builder().record::<Node>().list::<Node>().build();
    let nodes = registry.adapter::<Node>().unwrap();

    let err = nodes
        .from_json(r#"{"value": 1, "children": [{"value": 2}, {"next": null}]}"#)
        .unwrap_err();
    assert!(matches!(
        &err,
        DecodeError::MissingProperty { property: "value", .. }
    ));
    assert_eq!(
        err.path().map(ToString::to_string).as_deref(),
        Some("$.children[1]")
    );
}

#[derive(Debug, PartialEq)]
struct Greeting {
    text: String,
    plain: String,
}

impl Record for Greeting {
    fn shape() -> RecordShape<Self> {
        RecordShape::builder("Greeting")
            .constructor(
                Constructor::builder()
                    .param(Parameter::of::<String>("text").qualifier("upper"))
                    .param(Parameter::of::<String>("plain"))
                    .build(|args| {
                        Ok(Greeting {
                            text: args.take(0)?,
                            plain: args.take(1)?,
                        })
                    }),
            )
            .property(Property::new("text", |g: &Greeting| &g.text))
            .property(Property::new("plain", |g: &Greeting| &g.plain))
            .build()
    }
}

struct Upper;

impl Converter for Upper {
    fn decode(&self, reader: &mut dyn FieldReader) -> Result<Decoded, DecodeError> {
        if read_null(reader)? {
            return Ok(None);
        }
        Ok(Some(Box::new(reader.next_string()?.to_uppercase())))
    }

    fn encode(
        &self,
        writer: &mut dyn FieldWriter,
        value: Option<&dyn std::any::Any>,
    ) -> Result<(), EncodeError> {
        let Some(value) = value else {
            return Ok(writer.null_value()?);
        };
        let text = expect_value::<String>(writer, value)?;
        Ok(writer.string_value(&text.to_lowercase())?)
    }
}

fn upper_factory(
    ty: &TypeRef,
    qualifiers: &Qualifiers,
    _registry: &Registry,
) -> Result<Option<Arc<dyn Converter>>, ConfigError> {
    if ty.is::<String>() && qualifiers.contains("upper") {
        return Ok(Some(Arc::new(Upper)));
    }
    Ok(None)
}

#[test]
fn qualified_lookups_reach_user_factories() {
    recbind_testhelpers::setup();

    let registry = Registry::builder()
        .add(upper_factory)
        .record::<Greeting>()
        .build();
    let greetings = registry.adapter::<Greeting>().unwrap();

    let greeting = greetings
        .from_json(r#"{"text": "hello", "plain": "world"}"#)
        .unwrap();
    assert_eq!(
        greeting,
        Greeting {
            text: String::from("HELLO"),
            plain: String::from("world"),
        }
    );
    assert_eq!(
        greetings.to_json(&greeting).unwrap(),
        r#"{"text":"hello","plain":"world"}"#
    );
}

#[test]
fn qualified_lookup_without_a_factory_fails() {
    recbind_testhelpers::setup();

    let registry = Registry::builder().record::<Greeting>().build();
    let err = registry.adapter::<Greeting>().unwrap_err();
    assert!(matches!(
        err.root_cause(),
        ConfigError::NoConverter { qualifiers, .. } if qualifiers.contains("upper")
    ));
    assert_eq!(err.code(), "recbind::config::in_property");
}

#[derive(Debug, PartialEq)]
struct Temperature {
    celsius: f64,
}

impl Record for Temperature {
    fn shape() -> RecordShape<Self> {
        // never inspected: a generated converter is registered
        RecordShape::builder("Temperature")
            .kind(TypeKind::Interface)
            .build()
    }
}

struct TemperatureConverter;

impl Converter for TemperatureConverter {
    fn decode(&self, reader: &mut dyn FieldReader) -> Result<Decoded, DecodeError> {
        if read_null(reader)? {
            return Ok(None);
        }
        let text = reader.next_string()?;
        let celsius = text
            .strip_suffix('C')
            .and_then(|number| number.parse::<f64>().ok())
            .ok_or_else(|| {
                StreamError::new(
                    StreamErrorKind::InvalidValue {
                        message: format!("`{text}` is not a temperature"),
                    },
                    reader.path(),
                )
            })?;
        Ok(Some(Box::new(Temperature { celsius })))
    }

    fn encode(
        &self,
        writer: &mut dyn FieldWriter,
        value: Option<&dyn std::any::Any>,
    ) -> Result<(), EncodeError> {
        let Some(value) = value else {
            return Ok(writer.null_value()?);
        };
        let temperature = expect_value::<Temperature>(writer, value)?;
        Ok(writer.string_value(&format!("{}C", temperature.celsius))?)
    }
}

#[test]
fn generated_converters_win_over_inspection() {
    recbind_testhelpers::setup();

    let registry = Registry::builder()
        .record::<Temperature>()
        .generated::<Temperature>(TemperatureConverter)
        .build();
    let temperatures = registry.adapter::<Temperature>().unwrap();
    let value = temperatures.from_json(r#""21.5C""#).unwrap();
    assert_eq!(value, Temperature { celsius: 21.5 });
    assert_eq!(temperatures.to_json(&value).unwrap(), r#""21.5C""#);

    let err = temperatures.from_json(r#""warm""#).unwrap_err();
    assert_eq!(err.code(), "recbind::stream::invalid_value");
}

#[test]
fn without_the_generated_converter_the_shape_is_refused() {
    recbind_testhelpers::setup();

    let registry = Registry::builder().record::<Temperature>().build();
    let err = registry.adapter::<Temperature>().unwrap_err();
    insta::assert_snapshot!(err, @"cannot bind interface Temperature");
}

#[test]
fn lists_of_scalars() {
    recbind_testhelpers::setup();

    let registry = Registry::builder().list::<i64>().build();
    let lists = registry.adapter::<Vec<i64>>().unwrap();
    assert_eq!(lists.from_json("[1, 2.0, -3]").unwrap(), vec![1, 2, -3]);
    assert_eq!(lists.to_json(&vec![4, 5]).unwrap(), "[4,5]");

    let err = lists.from_json("[1, null]").unwrap_err();
    let DecodeError::Stream(stream) = &err else {
        panic!("expected a stream error, got {err:?}");
    };
    assert_eq!(stream.path.to_string(), "$[1]");
}

#[test]
fn unregistered_types_have_no_converter() {
    recbind_testhelpers::setup();

    let registry = Registry::default();
    let err = registry.adapter::<Vec<String>>().unwrap_err();
    assert!(matches!(err, ConfigError::NoConverter { .. }));
    assert_eq!(err.code(), "recbind::config::no_converter");
}

#[test]
fn lookups_are_cached_and_ignore_nullability() {
    recbind_testhelpers::setup();

    let registry = Registry::builder().record::<Node>().list::<Node>().build();
    let none = Qualifiers::new();
    let first = registry.lookup(&TypeRef::of::<Node>(), &none, "first").unwrap();
    let second = registry
        .lookup(&TypeRef::nullable::<Node>(), &none, "second")
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let clone = registry.clone();
    let third = clone.lookup(&TypeRef::of::<Node>(), &none, "third").unwrap();
    assert!(Arc::ptr_eq(&first, &third));
}

#[test]
fn adapters_are_shared_across_threads() {
    recbind_testhelpers::setup();

    let registry = Registry::builder().record::<Node>().list::<Node>().build();
    let nodes = registry.adapter::<Node>().unwrap();

    let handles: Vec<_> = (0..4_i64)
        .map(|i| {
            let nodes = nodes.clone();
            thread::spawn(move || {
                let json = format!(r#"{{"value": {i}, "next": null}}"#);
                nodes.from_json(&json).map(|node| node.value)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Ok(i as i64));
    }
}
