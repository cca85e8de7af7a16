//! Encoding records and round-tripping them.

use recbind::{
    Constructor, EncodeError, FieldWriter, JsonWriter, Parameter, Property, Record, RecordShape,
    Registry, SerializeOptions,
};

#[derive(Debug, Clone, PartialEq)]
struct Profile {
    id: u64,
    display_name: String,
    email: Option<String>,
    score: f64,
    verified: bool,
    notes: String,
    cache_key: String,
}

impl Record for Profile {
    fn shape() -> RecordShape<Self> {
        RecordShape::builder("Profile")
            .constructor(
                Constructor::builder()
                    .param(Parameter::of::<u64>("id"))
                    .param(Parameter::of::<String>("display_name").rename("displayName"))
                    .param(Parameter::nullable::<String>("email").default_null())
                    .param(Parameter::of::<f64>("score").default_value(|| 0.0_f64))
                    .param(Parameter::of::<bool>("verified").default_value(|| false))
                    .param(Parameter::of::<String>("cache_key").default_value(String::new))
                    .build(|args| {
                        Ok(Profile {
                            id: args.take(0)?,
                            display_name: args.take(1)?,
                            email: args.take_nullable(2)?,
                            score: args.take(3)?,
                            verified: args.take(4)?,
                            notes: String::new(),
                            cache_key: args.take(5)?,
                        })
                    }),
            )
            .property(Property::new("id", |p: &Profile| &p.id))
            .property(Property::new("display_name", |p: &Profile| &p.display_name))
            .property(Property::nullable("email", |p: &Profile| p.email.as_ref()))
            .property(Property::new("score", |p: &Profile| &p.score))
            .property(Property::new("verified", |p: &Profile| &p.verified))
            .property(
                Property::new("notes", |p: &Profile| &p.notes)
                    .rename("note")
                    .setter(|p, notes| p.notes = notes),
            )
            .property(Property::new("cache_key", |p: &Profile| &p.cache_key).transient())
            .build()
    }
}

fn profile() -> Profile {
    Profile {
        id: 42,
        display_name: String::from("Ada"),
        email: None,
        score: 2.5,
        verified: true,
        notes: String::from("likes \"quotes\""),
        cache_key: String::new(),
    }
}

fn registry() -> Registry {
    Registry::builder().record::<Profile>().build()
}

#[test]
fn fields_are_written_in_declaration_order() {
    recbind_testhelpers::setup();

    let profiles = registry().adapter::<Profile>().unwrap();
    let json = profiles.to_json(&profile()).unwrap();
    insta::assert_snapshot!(json, @r#"{"id":42,"displayName":"Ada","email":null,"score":2.5,"verified":true,"note":"likes \"quotes\""}"#);
}

#[test]
fn shuffled_input_encodes_in_declaration_order() {
    recbind_testhelpers::setup();

    let profiles = registry().adapter::<Profile>().unwrap();
    let decoded = profiles
        .from_json(
            r#"{"note": "likes \"quotes\"", "verified": true, "score": 2.5,
                "email": null, "displayName": "Ada", "id": 42}"#,
        )
        .unwrap();
    assert_eq!(decoded, profile());
    assert_eq!(
        profiles.to_json(&decoded).unwrap(),
        profiles.to_json(&profile()).unwrap()
    );
}

#[test]
fn round_trip() {
    recbind_testhelpers::setup();

    let profiles = registry().adapter::<Profile>().unwrap();
    let mut original = profile();
    original.email = Some(String::from("ada@example.com"));

    let json = profiles.to_json(&original).unwrap();
    assert_eq!(profiles.from_json(&json).unwrap(), original);

    let pretty = profiles.to_json_pretty(&original).unwrap();
    assert_eq!(profiles.from_json(&pretty).unwrap(), original);
}

#[test]
fn transient_property_is_neither_read_nor_written() {
    recbind_testhelpers::setup();

    let profiles = registry().adapter::<Profile>().unwrap();
    let mut value = profile();
    value.cache_key = String::from("secret");
    assert!(!profiles.to_json(&value).unwrap().contains("secret"));

    let decoded = profiles
        .from_json(r#"{"id": 1, "displayName": "B", "email": null, "cache_key": "ignored"}"#)
        .unwrap();
    assert_eq!(decoded.cache_key, "");
}

#[test]
fn nulls_can_be_left_out() {
    recbind_testhelpers::setup();

    let profiles = registry().adapter::<Profile>().unwrap();
    let json = profiles
        .to_json_with(&profile(), SerializeOptions::new().serialize_nulls(false))
        .unwrap();
    assert!(!json.contains("email"));

    // a nullable parameter with a default reads back as null when absent
    assert_eq!(profiles.from_json(&json).unwrap(), profile());
}

#[test]
fn pretty_output() {
    recbind_testhelpers::setup();

    let profiles = registry().adapter::<Profile>().unwrap();
    let json = profiles.to_json_pretty(&profile()).unwrap();
    insta::assert_snapshot!(json, @r#"
    {
      "id": 42,
      "displayName": "Ada",
      "email": null,
      "score": 2.5,
      "verified": true,
      "note": "likes \"quotes\""
    }
    "#);
}

#[test]
fn non_finite_floats_are_refused() {
    recbind_testhelpers::setup();

    let profiles = registry().adapter::<Profile>().unwrap();
    let mut value = profile();
    value.score = f64::NAN;
    let err = profiles.to_json(&value).unwrap_err();
    assert!(matches!(err, EncodeError::Stream(_)));
    assert_eq!(err.code(), "recbind::stream::non_finite_number");
}

#[test]
fn adapter_writes_into_a_shared_writer() {
    recbind_testhelpers::setup();

    let profiles = registry().adapter::<Profile>().unwrap();
    let mut writer = JsonWriter::new();
    writer.begin_array().unwrap();
    profiles.encode(&mut writer, &profile()).unwrap();
    profiles.encode_nullable(&mut writer, None).unwrap();
    writer.end_array().unwrap();
    let json = writer.finish_string().unwrap();
    assert!(json.starts_with(r#"[{"id":42,"#));
    assert!(json.ends_with("},null]"));
}
