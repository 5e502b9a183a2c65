//! End-to-end binding behavior through the public API.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;

use databind::adapters::ErasedAdapter;
use databind::any_value::{self, AnyValue};
use databind::error::{BuildError, DecodeError};
use databind::info::{
    Args, Described, OpaqueInfo, ParamInfo, PropertyInfo, Slot, StructInfo, TypeDescriptor,
    TypeInfo, TypeInfoCell,
};
use databind::registry::{AdapterFactory, AdapterRegistry, DefaultValueProvider, Resolver};
use databind::token::{Peek, ReadError, TokenReader, ValueReader, ValueWriter};
use databind::{EncodeError, Object, OrderedMap, TextMap, Value};

// -----------------------------------------------------------------------------
// Fixture: Account

#[derive(Debug, PartialEq)]
struct Account {
    id: i64,
    email: Option<String>,
    retries: i64,
    note: Option<String>,
    display: String,
    cached: String,
}

fn construct_account(mut args: Args<'_>) -> Result<Box<dyn AnyValue>, DecodeError> {
    let id = args.required::<i64>(0, "id")?;
    let email = args.optional::<String>(1, "email")?;
    let retries = args.defaulted::<i64>(2, "retries", || 3)?;
    Ok(Box::new(Account {
        id,
        email,
        retries,
        note: None,
        display: String::new(),
        cached: "derived".to_string(),
    }))
}

fn get_account_id(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let account = any_value::downcast_ref::<Account>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "Account" })?;
    Ok(Some(&account.id))
}

fn get_account_email(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let account = any_value::downcast_ref::<Account>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "Account" })?;
    Ok(account.email.as_ref().map(|email| email as &dyn AnyValue))
}

fn get_account_retries(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let account = any_value::downcast_ref::<Account>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "Account" })?;
    Ok(Some(&account.retries))
}

fn get_account_note(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let account = any_value::downcast_ref::<Account>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "Account" })?;
    Ok(account.note.as_ref().map(|note| note as &dyn AnyValue))
}

fn set_account_note(instance: &mut dyn AnyValue, slot: Slot) -> Result<(), DecodeError> {
    let account = any_value::downcast_mut::<Account>(instance)
        .ok_or(DecodeError::InvalidSlot { field: "note" })?;
    account.note = slot.into_optional::<String>("note")?;
    Ok(())
}

fn get_account_display(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let account = any_value::downcast_ref::<Account>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "Account" })?;
    Ok(Some(&account.display))
}

fn set_account_display(instance: &mut dyn AnyValue, slot: Slot) -> Result<(), DecodeError> {
    let account = any_value::downcast_mut::<Account>(instance)
        .ok_or(DecodeError::InvalidSlot { field: "display" })?;
    account.display = slot.into_required::<String>("display")?;
    Ok(())
}

impl Described for Account {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Struct(StructInfo::new::<Account>(
                "Account",
                vec![
                    ParamInfo::required::<i64>("id"),
                    ParamInfo::nullable::<String>("email"),
                    ParamInfo::defaulted::<i64>("retries"),
                ],
                vec![
                    PropertyInfo::new::<i64>("id", get_account_id),
                    PropertyInfo::new::<String>("email", get_account_email).nullable(),
                    PropertyInfo::new::<i64>("retries", get_account_retries),
                    PropertyInfo::new::<String>("note", get_account_note)
                        .nullable()
                        .with_setter(set_account_note),
                    PropertyInfo::new::<String>("display", get_account_display)
                        .with_wire_name("display_name")
                        .with_setter(set_account_display),
                    PropertyInfo::transient::<String>("cached"),
                ],
                construct_account,
            ))
        })
    }
}

// -----------------------------------------------------------------------------
// Helpers

fn decode_account(registry: &AdapterRegistry, json: &str) -> Result<Account, DecodeError> {
    let adapter = registry.adapter::<Account>().unwrap();
    let input = Value::from_json_str(json).unwrap();
    adapter.decode(&mut ValueReader::new(&input))
}

fn encode_to_value<T: Described>(registry: &AdapterRegistry, value: &T) -> Value {
    let adapter = registry.adapter::<T>().unwrap();
    let mut writer = ValueWriter::new();
    adapter.encode(&mut writer, value).unwrap();
    writer.into_value().unwrap()
}

// -----------------------------------------------------------------------------
// Account binding

#[test]
fn decodes_through_constructor_and_setters() {
    let registry = AdapterRegistry::new();
    let account = decode_account(
        &registry,
        r#"{"id":7,"email":"ada@example.com","retries":5,"note":"vip","display_name":"Ada","extra":true}"#,
    )
    .unwrap();
    assert_eq!(
        account,
        Account {
            id: 7,
            email: Some("ada@example.com".to_string()),
            retries: 5,
            note: Some("vip".to_string()),
            display: "Ada".to_string(),
            cached: "derived".to_string(),
        }
    );
}

#[test]
fn encodes_with_wire_names_and_skips_transient() {
    let registry = AdapterRegistry::new();
    let account = Account {
        id: 7,
        email: None,
        retries: 5,
        note: Some("vip".to_string()),
        display: "Ada".to_string(),
        cached: "derived".to_string(),
    };
    let encoded = encode_to_value(&registry, &account);
    let expected = Value::from_json_str(
        r#"{"id":7,"email":null,"retries":5,"note":"vip","display_name":"Ada"}"#,
    )
    .unwrap();
    assert_eq!(encoded, expected);
}

#[test]
fn absent_nullable_field_is_none() {
    let registry = AdapterRegistry::new();
    let account = decode_account(&registry, r#"{"id":1}"#).unwrap();
    assert_eq!(account.email, None);
    assert_eq!(account.note, None);
    // Constructor default fills the absent parameter.
    assert_eq!(account.retries, 3);
    // Setter never ran; the constructed value stands.
    assert_eq!(account.display, "");
}

#[test]
fn missing_required_field_fails() {
    let registry = AdapterRegistry::builder().without_builtin_defaults().build();
    let err = decode_account(&registry, r#"{"email":"x@y"}"#).unwrap_err();
    assert!(matches!(err, DecodeError::MissingProperty { field, .. } if field == "id"));
}

#[test]
fn explicit_null_for_non_nullable_fails_without_defaults() {
    let registry = AdapterRegistry::builder().without_builtin_defaults().build();
    let err = decode_account(&registry, r#"{"id":null}"#).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedNull { field, .. } if field == "id"));
}

#[test]
fn builtin_defaults_fill_missing_and_null() {
    let registry = AdapterRegistry::new();
    // Absent required field.
    assert_eq!(decode_account(&registry, "{}").unwrap().id, 0);
    // Present but null.
    assert_eq!(decode_account(&registry, r#"{"id":null}"#).unwrap().id, 0);
}

#[test]
fn custom_provider_runs_before_builtin() {
    struct FortyTwo;
    impl DefaultValueProvider for FortyTwo {
        fn provide(&self, descriptor: &TypeDescriptor) -> Option<Box<dyn AnyValue>> {
            descriptor
                .info()
                .ty()
                .is::<i64>()
                .then(|| Box::new(42_i64) as Box<dyn AnyValue>)
        }
    }
    let registry = AdapterRegistry::builder().with_provider(FortyTwo).build();
    assert_eq!(decode_account(&registry, "{}").unwrap().id, 42);
}

#[test]
fn unknown_fields_denied_on_request() {
    let registry = AdapterRegistry::builder().deny_unknown_fields().build();
    let err = decode_account(&registry, r#"{"id":1,"extra":true}"#).unwrap_err();
    assert!(matches!(err, DecodeError::UnknownField { field, .. } if field == "extra"));
}

// -----------------------------------------------------------------------------
// Fixture: Session (nullable parameter with a constructor default)

#[derive(Debug, PartialEq)]
struct Session {
    token: String,
    peer: Option<String>,
}

fn construct_session(mut args: Args<'_>) -> Result<Box<dyn AnyValue>, DecodeError> {
    Ok(Box::new(Session {
        token: args.required::<String>(0, "token")?,
        peer: args.optional_defaulted::<String>(1, "peer", || Some("unknown".to_string()))?,
    }))
}

fn get_session_token(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let session = any_value::downcast_ref::<Session>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "Session" })?;
    Ok(Some(&session.token))
}

fn get_session_peer(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let session = any_value::downcast_ref::<Session>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "Session" })?;
    Ok(session.peer.as_ref().map(|peer| peer as &dyn AnyValue))
}

impl Described for Session {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Struct(StructInfo::new::<Session>(
                "Session",
                vec![
                    ParamInfo::required::<String>("token"),
                    ParamInfo::nullable::<String>("peer").with_default(),
                ],
                vec![
                    PropertyInfo::new::<String>("token", get_session_token),
                    PropertyInfo::new::<String>("peer", get_session_peer).nullable(),
                ],
                construct_session,
            ))
        })
    }
}

#[test]
fn defaulted_nullable_parameter_distinguishes_absent_from_null() {
    let registry = AdapterRegistry::builder().without_builtin_defaults().build();
    let adapter = registry.adapter::<Session>().unwrap();

    let absent = Value::from_json_str(r#"{"token":"t1"}"#).unwrap();
    let session = adapter.decode(&mut ValueReader::new(&absent)).unwrap();
    assert_eq!(session.peer, Some("unknown".to_string()));

    let null = Value::from_json_str(r#"{"token":"t1","peer":null}"#).unwrap();
    let session = adapter.decode(&mut ValueReader::new(&null)).unwrap();
    assert_eq!(session.peer, None);

    let present = Value::from_json_str(r#"{"token":"t1","peer":"carol"}"#).unwrap();
    let session = adapter.decode(&mut ValueReader::new(&present)).unwrap();
    assert_eq!(session.peer, Some("carol".to_string()));
}

// -----------------------------------------------------------------------------
// Build-time validation

#[derive(Debug)]
struct BadTransient;

impl Described for BadTransient {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Struct(StructInfo::new::<BadTransient>(
                "BadTransient",
                vec![ParamInfo::required::<i64>("secret")],
                vec![PropertyInfo::transient::<i64>("secret")],
                |_| Ok(Box::new(BadTransient)),
            ))
        })
    }
}

#[test]
fn transient_parameter_needs_a_default() {
    let registry = AdapterRegistry::new();
    let err = registry.adapter::<BadTransient>().unwrap_err();
    assert!(matches!(
        err,
        BuildError::TransientRequiresDefault { property: "secret", .. }
    ));
}

#[derive(Debug)]
struct DupWire;

fn get_dup_a(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let fixture = any_value::downcast_ref::<DupWire>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "DupWire" })?;
    let _ = fixture;
    Ok(None)
}

impl Described for DupWire {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Struct(StructInfo::new::<DupWire>(
                "DupWire",
                vec![
                    ParamInfo::nullable::<i64>("a"),
                    ParamInfo::nullable::<i64>("b"),
                ],
                vec![
                    PropertyInfo::new::<i64>("a", get_dup_a).nullable(),
                    PropertyInfo::new::<i64>("b", get_dup_a)
                        .nullable()
                        .with_wire_name("a"),
                ],
                |_| Ok(Box::new(DupWire)),
            ))
        })
    }
}

#[test]
fn duplicate_wire_names_fail_the_build() {
    let registry = AdapterRegistry::new();
    let err = registry.adapter::<DupWire>().unwrap_err();
    assert!(matches!(
        err,
        BuildError::DuplicateWireName { wire_name: "a", .. }
    ));
}

#[derive(Debug)]
struct Mismatched;

impl Described for Mismatched {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Struct(StructInfo::new::<Mismatched>(
                "Mismatched",
                vec![ParamInfo::required::<i64>("x")],
                vec![PropertyInfo::new::<String>("x", get_dup_a)],
                |_| Ok(Box::new(Mismatched)),
            ))
        })
    }
}

#[test]
fn parameter_and_property_types_must_agree() {
    let registry = AdapterRegistry::new();
    let err = registry.adapter::<Mismatched>().unwrap_err();
    assert!(matches!(
        err,
        BuildError::PropertyTypeMismatch { property: "x", .. }
    ));
}

// -----------------------------------------------------------------------------
// Containers

#[test]
fn text_map_round_trip() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<TextMap>().unwrap();
    let input = Value::from_json_str(r#"{"host":"localhost","port":"9092"}"#).unwrap();
    let map = adapter.decode(&mut ValueReader::new(&input)).unwrap();
    assert_eq!(map.get("port").map(String::as_str), Some("9092"));

    let mut writer = ValueWriter::new();
    adapter.encode(&mut writer, &map).unwrap();
    assert_eq!(writer.into_value(), Some(input));
}

#[test]
fn ordered_map_keeps_dynamic_keys_as_text() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<OrderedMap<Value, Value>>().unwrap();
    let input = Value::from_json_str(r#"{"1":true,"two":[2]}"#).unwrap();
    let map = adapter.decode(&mut ValueReader::new(&input)).unwrap();
    // Promoted names always come back as text values.
    assert_eq!(map.get(&Value::from("1")), Some(&Value::Bool(true)));

    let mut writer = ValueWriter::new();
    adapter.encode(&mut writer, &map).unwrap();
    assert_eq!(writer.into_value(), Some(input));
}

#[test]
fn ordered_map_rejects_null_values() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<OrderedMap<Value, Value>>().unwrap();
    let input = Value::from_json_str(r#"{"a":null}"#).unwrap();
    let err = adapter.decode(&mut ValueReader::new(&input)).unwrap_err();
    assert!(matches!(err, DecodeError::NullValue { .. }));
}

#[test]
fn ordered_map_rejects_null_keys_on_encode() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<OrderedMap<Value, Value>>().unwrap();
    let map = OrderedMap::from([(Value::Null, Value::Int(1))]);
    let mut writer = ValueWriter::new();
    let err = adapter.encode(&mut writer, &map).unwrap_err();
    assert!(matches!(err, EncodeError::NullKey { .. }));
}

#[test]
fn dynamic_object_keeps_null_values() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<Object>().unwrap();
    let input = Value::from_json_str(r#"{"a":null,"b":1}"#).unwrap();
    let object = adapter.decode(&mut ValueReader::new(&input)).unwrap();
    assert_eq!(object.get("a"), Some(&Value::Null));

    let mut writer = ValueWriter::new();
    adapter.encode(&mut writer, &object).unwrap();
    assert_eq!(writer.into_value(), Some(input));
}

#[test]
fn concurrent_map_decodes() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<DashMap<Value, Value>>().unwrap();
    let input = Value::from_json_str(r#"{"a":1,"b":2}"#).unwrap();
    let map = adapter.decode(&mut ValueReader::new(&input)).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(
        map.get(&Value::from("a")).map(|entry| entry.value().clone()),
        Some(Value::Int(1))
    );
}

#[test]
fn dynamic_value_round_trip() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<Value>().unwrap();
    let input = Value::from_json_str(r#"{"a":[1,null,{"b":true}],"c":2.5}"#).unwrap();
    let decoded = adapter.decode(&mut ValueReader::new(&input)).unwrap();
    assert_eq!(decoded, input);

    let mut writer = ValueWriter::new();
    adapter.encode(&mut writer, &decoded).unwrap();
    assert_eq!(writer.into_value(), Some(input));
}

// -----------------------------------------------------------------------------
// Duplicate detection (needs a reader that can replay duplicate names)

enum Tok {
    BeginObject,
    EndObject,
    Name(&'static str),
    Int(i64),
    Null,
}

/// A scripted reader for token sequences no tree can hold, like
/// duplicated field names.
struct ScriptReader {
    tokens: VecDeque<Tok>,
    promote: bool,
}

impl ScriptReader {
    fn new(tokens: Vec<Tok>) -> Self {
        Self {
            tokens: tokens.into(),
            promote: false,
        }
    }

    fn mismatch(&self, expected: &'static str) -> ReadError {
        ReadError::UnexpectedToken {
            expected,
            found: "something else",
            path: self.path(),
        }
    }
}

impl TokenReader for ScriptReader {
    fn begin_object(&mut self) -> Result<(), ReadError> {
        match self.tokens.pop_front() {
            Some(Tok::BeginObject) => Ok(()),
            _ => Err(self.mismatch("an object")),
        }
    }

    fn end_object(&mut self) -> Result<(), ReadError> {
        match self.tokens.pop_front() {
            Some(Tok::EndObject) => Ok(()),
            _ => Err(self.mismatch("end of object")),
        }
    }

    fn begin_array(&mut self) -> Result<(), ReadError> {
        Err(self.mismatch("an array"))
    }

    fn end_array(&mut self) -> Result<(), ReadError> {
        Err(self.mismatch("end of array"))
    }

    fn has_next(&mut self) -> Result<bool, ReadError> {
        Ok(!matches!(self.tokens.front(), Some(Tok::EndObject) | None))
    }

    fn next_name(&mut self) -> Result<String, ReadError> {
        match self.tokens.pop_front() {
            Some(Tok::Name(name)) => Ok(name.to_string()),
            _ => Err(self.mismatch("a field name")),
        }
    }

    fn next_bool(&mut self) -> Result<bool, ReadError> {
        Err(self.mismatch("a boolean"))
    }

    fn next_int(&mut self) -> Result<i64, ReadError> {
        match self.tokens.pop_front() {
            Some(Tok::Int(n)) => Ok(n),
            _ => Err(self.mismatch("an integer")),
        }
    }

    fn next_float(&mut self) -> Result<f64, ReadError> {
        self.next_int().map(|n| n as f64)
    }

    fn next_str(&mut self) -> Result<String, ReadError> {
        if self.promote {
            self.promote = false;
            return self.next_name();
        }
        Err(self.mismatch("a string"))
    }

    fn next_null(&mut self) -> Result<(), ReadError> {
        match self.tokens.pop_front() {
            Some(Tok::Null) => {
                self.promote = false;
                Ok(())
            }
            _ => Err(self.mismatch("null")),
        }
    }

    fn peek(&mut self) -> Result<Peek, ReadError> {
        Ok(match self.tokens.front() {
            Some(Tok::BeginObject) => Peek::BeginObject,
            Some(Tok::EndObject) => Peek::EndObject,
            Some(Tok::Name(_)) if self.promote => Peek::Str,
            Some(Tok::Name(_)) => Peek::Name,
            Some(Tok::Int(_)) => Peek::Int,
            Some(Tok::Null) => Peek::Null,
            None => Peek::EndOfDocument,
        })
    }

    fn skip_value(&mut self) -> Result<(), ReadError> {
        match self.tokens.pop_front() {
            Some(Tok::Name(_)) => self.skip_value(),
            Some(Tok::Int(_) | Tok::Null) => Ok(()),
            _ => Err(self.mismatch("a value")),
        }
    }

    fn promote_name_to_value(&mut self) -> Result<(), ReadError> {
        self.promote = true;
        Ok(())
    }

    fn path(&self) -> String {
        "$".to_string()
    }
}

#[test]
fn duplicate_field_fails_the_decode() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<Account>().unwrap();
    let mut reader = ScriptReader::new(vec![
        Tok::BeginObject,
        Tok::Name("id"),
        Tok::Int(1),
        Tok::Name("id"),
        Tok::Int(2),
        Tok::EndObject,
    ]);
    let err = adapter.decode(&mut reader).unwrap_err();
    assert!(matches!(err, DecodeError::DuplicateField { field, .. } if field == "id"));
}

#[test]
fn duplicate_map_key_names_both_values() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<OrderedMap<Value, Value>>().unwrap();
    let mut reader = ScriptReader::new(vec![
        Tok::BeginObject,
        Tok::Name("a"),
        Tok::Int(1),
        Tok::Name("a"),
        Tok::Int(2),
        Tok::EndObject,
    ]);
    let err = adapter.decode(&mut reader).unwrap_err();
    match err {
        DecodeError::DuplicateKey {
            key,
            first,
            second,
            ..
        } => {
            assert!(key.contains('a'));
            assert!(first.contains('1'));
            assert!(second.contains('2'));
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }
}

#[test]
fn null_map_key_fails_the_decode() {
    let registry = AdapterRegistry::new();
    let adapter = registry.adapter::<OrderedMap<Value, Value>>().unwrap();
    let mut reader = ScriptReader::new(vec![
        Tok::BeginObject,
        Tok::Null,
        Tok::Int(1),
        Tok::EndObject,
    ]);
    let err = adapter.decode(&mut reader).unwrap_err();
    assert!(matches!(err, DecodeError::NullKey { .. }));
}

// -----------------------------------------------------------------------------
// Cyclic types

#[derive(Debug, PartialEq)]
struct TreeNode {
    value: i64,
    next: Option<Box<TreeNode>>,
}

fn construct_tree_node(mut args: Args<'_>) -> Result<Box<dyn AnyValue>, DecodeError> {
    Ok(Box::new(TreeNode {
        value: args.required::<i64>(0, "value")?,
        next: args.optional::<Box<TreeNode>>(1, "next")?,
    }))
}

fn get_tree_value(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let node = any_value::downcast_ref::<TreeNode>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "TreeNode" })?;
    Ok(Some(&node.value))
}

fn get_tree_next(value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    let node = any_value::downcast_ref::<TreeNode>(value)
        .ok_or(EncodeError::MismatchedValue { expected: "TreeNode" })?;
    Ok(node.next.as_ref().map(|next| next as &dyn AnyValue))
}

impl Described for TreeNode {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Struct(StructInfo::new::<TreeNode>(
                "TreeNode",
                vec![
                    ParamInfo::required::<i64>("value"),
                    ParamInfo::nullable::<Box<TreeNode>>("next"),
                ],
                vec![
                    PropertyInfo::new::<i64>("value", get_tree_value),
                    PropertyInfo::new::<Box<TreeNode>>("next", get_tree_next).nullable(),
                ],
                construct_tree_node,
            ))
        })
    }
}

impl Described for Box<TreeNode> {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Box<TreeNode>>("Box<TreeNode>")))
    }
}

struct BoxedNodeAdapter {
    inner: Arc<dyn ErasedAdapter>,
}

impl ErasedAdapter for BoxedNodeAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        match self.inner.decode_value(reader)? {
            Some(value) => {
                let node = any_value::take::<TreeNode>(value)
                    .ok_or(DecodeError::MismatchedValue { expected: "TreeNode" })?;
                Ok(Some(Box::new(Box::new(node))))
            }
            None => Ok(None),
        }
    }

    fn encode_value(
        &self,
        writer: &mut dyn databind::token::TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        let boxed = value
            .and_then(any_value::downcast_ref::<Box<TreeNode>>)
            .ok_or(EncodeError::MismatchedValue { expected: "Box<TreeNode>" })?;
        self.inner.encode_value(writer, Some(&**boxed))
    }
}

impl std::fmt::Debug for BoxedNodeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoxedNodeAdapter")
    }
}

struct BoxedNodeFactory;

impl AdapterFactory for BoxedNodeFactory {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError> {
        if !descriptor.is_plain::<Box<TreeNode>>() {
            return Ok(None);
        }
        let inner = resolver.resolve(&TypeDescriptor::of::<TreeNode>())?;
        Ok(Some(Arc::new(BoxedNodeAdapter { inner })))
    }
}

#[test]
fn cyclic_type_resolves_and_round_trips() {
    let registry = AdapterRegistry::builder()
        .with_factory(BoxedNodeFactory)
        .build();
    let adapter = registry.adapter::<TreeNode>().unwrap();

    let input = Value::from_json_str(r#"{"value":1,"next":{"value":2,"next":null}}"#).unwrap();
    let node = adapter.decode(&mut ValueReader::new(&input)).unwrap();
    assert_eq!(
        node,
        TreeNode {
            value: 1,
            next: Some(Box::new(TreeNode {
                value: 2,
                next: None,
            })),
        }
    );

    let mut writer = ValueWriter::new();
    adapter.encode(&mut writer, &node).unwrap();
    assert_eq!(writer.into_value(), Some(input));
}

// -----------------------------------------------------------------------------
// Failed cyclic builds

#[derive(Debug)]
struct Mystery;

impl Described for Mystery {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Mystery>("Mystery")))
    }
}

#[derive(Debug)]
struct NodeA;

#[derive(Debug)]
struct NodeB;

fn get_none(_value: &dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError> {
    Ok(None)
}

impl Described for NodeA {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Struct(StructInfo::new::<NodeA>(
                "NodeA",
                vec![
                    ParamInfo::nullable::<Box<NodeB>>("b"),
                    ParamInfo::nullable::<Mystery>("bad"),
                ],
                vec![
                    PropertyInfo::new::<Box<NodeB>>("b", get_none).nullable(),
                    PropertyInfo::new::<Mystery>("bad", get_none).nullable(),
                ],
                |_| Ok(Box::new(NodeA)),
            ))
        })
    }
}

impl Described for NodeB {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Struct(StructInfo::new::<NodeB>(
                "NodeB",
                vec![ParamInfo::nullable::<Box<NodeA>>("a")],
                vec![PropertyInfo::new::<Box<NodeA>>("a", get_none).nullable()],
                |_| Ok(Box::new(NodeB)),
            ))
        })
    }
}

impl Described for Box<NodeA> {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Box<NodeA>>("Box<NodeA>")))
    }
}

impl Described for Box<NodeB> {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Box<NodeB>>("Box<NodeB>")))
    }
}

struct LinkAdapter {
    inner: Arc<dyn ErasedAdapter>,
}

impl ErasedAdapter for LinkAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        self.inner.decode_value(reader)
    }

    fn encode_value(
        &self,
        writer: &mut dyn databind::token::TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        self.inner.encode_value(writer, value)
    }
}

impl std::fmt::Debug for LinkAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LinkAdapter")
    }
}

struct LinkFactory;

impl AdapterFactory for LinkFactory {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError> {
        if descriptor.is_plain::<Box<NodeA>>() {
            let inner = resolver.resolve(&TypeDescriptor::of::<NodeA>())?;
            return Ok(Some(Arc::new(LinkAdapter { inner })));
        }
        if descriptor.is_plain::<Box<NodeB>>() {
            let inner = resolver.resolve(&TypeDescriptor::of::<NodeB>())?;
            return Ok(Some(Arc::new(LinkAdapter { inner })));
        }
        Ok(None)
    }
}

#[test]
fn failed_cyclic_build_commits_nothing() {
    let registry = AdapterRegistry::builder().with_factory(LinkFactory).build();
    // NodeA needs NodeB, which needs NodeA back; NodeA then trips on the
    // unsupported `Mystery` property after NodeB finished building.
    assert!(matches!(
        registry.adapter::<NodeA>(),
        Err(BuildError::UnsupportedType { path: "Mystery" })
    ));
    // The finished half of the cycle must not have been kept: resolving
    // it again fails the same way instead of serving an adapter wired to
    // a stand-in that was never filled.
    assert!(matches!(
        registry.adapter::<NodeB>(),
        Err(BuildError::UnsupportedType { path: "Mystery" })
    ));
    // Unrelated types still resolve.
    assert!(registry.adapter::<Value>().is_ok());
}

// -----------------------------------------------------------------------------
// Concurrency

#[test]
fn concurrent_resolution_yields_one_adapter() {
    let registry = AdapterRegistry::new();
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let account = decode_account(&registry, r#"{"id":9}"#).unwrap();
                assert_eq!(account.id, 9);
            });
        }
    });
    let first = registry.resolve(&TypeDescriptor::of::<Account>()).unwrap();
    let second = registry.resolve(&TypeDescriptor::of::<Account>()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
