use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::ErasedAdapter;
use crate::any_value::AnyValue;
use crate::error::{BuildError, DecodeError, EncodeError};
use crate::info::{Args, Constructor, Getter, Setter, Slot, TypeDescriptor, TypeInfo};
use crate::registry::{AdapterFactory, ProviderChain, Resolver, UnknownFieldPolicy};
use crate::token::{TokenReader, TokenWriter};

// -----------------------------------------------------------------------------
// Binding table

/// One wire field of a bound type: its resolved sub-adapter plus the
/// accessors that move the value in and out of instances.
struct Binding {
    /// Property name, used in error messages.
    name: &'static str,
    wire_name: &'static str,
    nullable: bool,
    descriptor: TypeDescriptor,
    adapter: Arc<dyn ErasedAdapter>,
    get: Option<Getter>,
    set: Option<Setter>,
}

/// Decode-time metadata for one constructor argument slot.
struct SlotMeta {
    name: &'static str,
    nullable: bool,
    has_default: bool,
    descriptor: TypeDescriptor,
}

// -----------------------------------------------------------------------------
// BoundAdapter

/// The adapter for a structured type, driven entirely by the binding
/// table precomputed at build time.
///
/// Slots `0..arity` feed the constructor positionally; slots past the
/// arity are properties applied through their setters after
/// construction. During decode each slot moves through the explicit
/// absent / null / present states, so a field that never appeared is
/// always distinguishable from one that was present with a null.
struct BoundAdapter {
    path: &'static str,
    arity: usize,
    bindings: Box<[Option<Binding>]>,
    slot_meta: Box<[SlotMeta]>,
    wire_table: HashMap<&'static str, usize>,
    construct: Constructor,
    providers: ProviderChain,
    policy: UnknownFieldPolicy,
}

impl ErasedAdapter for BoundAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        reader.begin_object()?;
        let mut slots: Vec<Slot> = (0..self.bindings.len()).map(|_| Slot::Absent).collect();
        while reader.has_next()? {
            let name = reader.next_name()?;
            let Some(&index) = self.wire_table.get(name.as_str()) else {
                match self.policy {
                    UnknownFieldPolicy::Skip => {
                        reader.skip_value()?;
                        continue;
                    }
                    UnknownFieldPolicy::Deny => {
                        return Err(DecodeError::UnknownField {
                            field: name,
                            path: reader.path(),
                        });
                    }
                }
            };
            if slots[index].is_filled() {
                return Err(DecodeError::DuplicateField {
                    field: name,
                    path: reader.path(),
                });
            }
            let binding = self.bindings[index]
                .as_ref()
                .expect("wire table only maps occupied slots");
            slots[index] = match binding.adapter.decode_value(reader)? {
                Some(value) => Slot::Present(value),
                None if binding.nullable => Slot::Null,
                None => match self.providers.provide(&binding.descriptor) {
                    Some(fallback) => Slot::Present(fallback),
                    None => {
                        return Err(DecodeError::UnexpectedNull {
                            field: binding.name.to_string(),
                            path: reader.path(),
                        });
                    }
                },
            };
        }
        reader.end_object()?;

        // Settle the constructor slots nothing in the input wrote.
        for (index, meta) in self.slot_meta.iter().enumerate() {
            if slots[index].is_filled() || meta.has_default {
                continue;
            }
            if meta.nullable {
                slots[index] = Slot::Null;
                continue;
            }
            match self.providers.provide(&meta.descriptor) {
                Some(fallback) => slots[index] = Slot::Present(fallback),
                None => {
                    return Err(DecodeError::MissingProperty {
                        field: meta.name.to_string(),
                        path: reader.path(),
                    });
                }
            }
        }

        let mut instance = (self.construct)(Args::new(&mut slots[..self.arity]))?;

        for index in self.arity..self.bindings.len() {
            let slot = core::mem::replace(&mut slots[index], Slot::Absent);
            if !slot.is_filled() {
                continue;
            }
            let binding = self.bindings[index]
                .as_ref()
                .expect("slots past the arity always hold a binding");
            let set = binding
                .set
                .expect("non-parameter bindings always carry a setter");
            set(instance.as_mut(), slot)?;
        }

        Ok(Some(instance))
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        let value = value.ok_or(EncodeError::MismatchedValue {
            expected: self.path,
        })?;
        writer.begin_object()?;
        for binding in self.bindings.iter().flatten() {
            let Some(get) = binding.get else {
                continue;
            };
            writer.write_name(binding.wire_name)?;
            binding.adapter.encode_value(writer, get(value)?)?;
        }
        writer.end_object()?;
        Ok(())
    }
}

impl fmt::Debug for BoundAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundAdapter({})", self.path)
    }
}

// -----------------------------------------------------------------------------
// BindFactory

/// The fallback factory: builds a [`BoundAdapter`] for any structured
/// type from its declared metadata.
///
/// Build-time validation is deliberately strict; every inconsistency
/// between a type's constructor parameters and its properties fails the
/// resolution rather than surfacing later as a bad decode.
#[derive(Debug)]
pub struct BindFactory;

impl AdapterFactory for BindFactory {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError> {
        if !descriptor.qualifiers().is_empty() {
            return Ok(None);
        }
        let TypeInfo::Struct(info) = descriptor.info() else {
            return Ok(None);
        };
        let path = info.ty().path();
        let params = info.params();

        let param_index: HashMap<&str, usize> = params
            .iter()
            .enumerate()
            .map(|(index, param)| (param.name(), index))
            .collect();

        let mut bindings: Vec<Option<Binding>> = (0..params.len()).map(|_| None).collect();

        for property in info.properties() {
            let param = param_index.get(property.name()).copied();

            if property.is_transient() {
                // A transient parameter never receives input, so the
                // constructor must be able to fill it alone.
                if let Some(index) = param {
                    if !params[index].has_default() {
                        return Err(BuildError::TransientRequiresDefault {
                            path,
                            property: property.name(),
                        });
                    }
                }
                continue;
            }

            if let Some(index) = param {
                let declared = &params[index];
                if declared.info().id() != property.info().id()
                    || declared.is_nullable() != property.is_nullable()
                {
                    return Err(BuildError::PropertyTypeMismatch {
                        path,
                        property: property.name(),
                        param_type: declared.info().path(),
                        property_type: property.info().path(),
                    });
                }
            } else if property.setter().is_none() {
                // Neither constructed nor settable: not part of the wire
                // contract.
                continue;
            }

            let sub = TypeDescriptor::unqualified(property.info());
            let binding = Binding {
                name: property.name(),
                wire_name: property.wire_name(),
                nullable: property.is_nullable(),
                descriptor: sub,
                adapter: resolver.resolve(&sub)?,
                get: property.getter(),
                set: property.setter(),
            };
            match param {
                Some(index) => bindings[index] = Some(binding),
                // Settable non-parameter properties take the slots past
                // the constructor arity.
                None => bindings.push(Some(binding)),
            }
        }

        for (index, param) in params.iter().enumerate() {
            if bindings[index].is_none() && !param.has_default() {
                return Err(BuildError::MissingParamProperty {
                    path,
                    param: param.name(),
                });
            }
        }

        let slot_meta: Vec<SlotMeta> = params
            .iter()
            .map(|param| SlotMeta {
                name: param.name(),
                nullable: param.is_nullable(),
                has_default: param.has_default(),
                descriptor: TypeDescriptor::unqualified(param.info()),
            })
            .collect();

        let mut wire_table: HashMap<&'static str, usize> = HashMap::new();
        for (index, binding) in bindings.iter().enumerate() {
            let Some(binding) = binding else { continue };
            if wire_table.insert(binding.wire_name, index).is_some() {
                return Err(BuildError::DuplicateWireName {
                    path,
                    wire_name: binding.wire_name,
                });
            }
        }

        Ok(Some(Arc::new(BoundAdapter {
            path,
            arity: params.len(),
            bindings: bindings.into_boxed_slice(),
            slot_meta: slot_meta.into_boxed_slice(),
            wire_table,
            construct: info.constructor(),
            providers: resolver.default_providers(),
            policy: resolver.unknown_field_policy(),
        })))
    }
}
