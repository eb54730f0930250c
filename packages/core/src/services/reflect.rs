//! Host Type Descriptors
//!
//! Host types take part in node conversion by implementing [`Reflect`]: a
//! static [`TypeDescriptor`] describing their shape, plus conversion to and
//! from the dynamic [`HostValue`] form.
//!
//! Primitive types, `Vec<T>` and a few numeric widenings are covered here.
//! Records and fieldless enums are wired up with [`reflect_record!`] and
//! [`reflect_enum!`]:
//!
//! ```rust
//! use valuespace_core::{reflect_enum, reflect_record};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! enum Priority {
//!     #[default]
//!     Low,
//!     High,
//! }
//! reflect_enum!(Priority { Low, High });
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Task {
//!     title: String,
//!     priority: Priority,
//!     tags: Vec<String>,
//!     cached_html: String,
//! }
//! reflect_record!(Task { title, priority, tags }, ignore { cached_html });
//! ```
//!
//! Descriptors refer to element and field types through `fn` pointers, so a
//! type may appear inside its own descriptor.

use crate::models::{PrimitiveKind, PrimitiveValue};
use crate::services::error::BridgeError;
use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::any::TypeId;
use std::str::FromStr;

/// Lazily produced descriptor of a nested type
pub type DescriptorFn = fn() -> TypeDescriptor;

/// Constructor of a type's default host value
pub type DefaultFn = fn() -> Result<HostValue, BridgeError>;

/// Dynamic form of a host value
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Primitive(PrimitiveValue),

    /// Underlying value of an enum member
    Enum(i64),

    List(Vec<HostValue>),

    /// Field values keyed by field name, in declaration order
    Record(IndexMap<String, HostValue>),
}

impl HostValue {
    /// Short shape name used in diagnostics
    pub fn kind_name(&self) -> String {
        match self {
            Self::Primitive(value) => value.kind().to_string(),
            Self::Enum(_) => "enum".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Record(_) => "record".to_string(),
        }
    }

    /// Unwrap a record, failing with `InstanceMismatch` for other shapes
    pub fn into_record(self, type_name: &str) -> Result<IndexMap<String, HostValue>, BridgeError> {
        match self {
            Self::Record(fields) => Ok(fields),
            other => Err(BridgeError::instance_mismatch(type_name, other.kind_name())),
        }
    }

    /// Unwrap an enum value, failing with `InstanceMismatch` for other shapes
    pub fn into_enum(self, type_name: &str) -> Result<i64, BridgeError> {
        match self {
            Self::Enum(value) => Ok(value),
            other => Err(BridgeError::instance_mismatch(type_name, other.kind_name())),
        }
    }
}

/// One member of an enumeration type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMemberDescriptor {
    pub name: String,

    /// Underlying value (the discriminant for Rust enums)
    pub value: i64,
}

impl EnumMemberDescriptor {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One member of a record type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,

    /// `None` for members excluded from conversion
    pub descriptor: Option<DescriptorFn>,
}

impl FieldDescriptor {
    /// Field of type `T`, named by `name`
    ///
    /// The accessor is never called; it ties the field to its type.
    pub fn of<S, T, F>(name: impl Into<String>, _accessor: F) -> Self
    where
        T: Reflect,
        F: Fn(&S) -> &T,
    {
        Self {
            name: name.into(),
            descriptor: Some(T::descriptor),
        }
    }

    /// Member that is never converted
    pub fn ignored(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.descriptor.is_none()
    }
}

/// Structural shape of a host type
#[derive(Debug, Clone)]
pub enum TypeShape {
    Primitive(PrimitiveKind),
    Enum(Vec<EnumMemberDescriptor>),

    /// Ordered collection; `appendable` types can be rebuilt element by element
    List {
        element: DescriptorFn,
        appendable: bool,
    },

    /// Named fields in declaration order
    Record { fields: Vec<FieldDescriptor> },
}

/// Static description of a host type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Type name used in diagnostics
    pub name: String,

    pub shape: TypeShape,

    /// Default instance constructor, if the type has one
    pub default: Option<DefaultFn>,

    /// Rust type behind the descriptor, when known
    pub type_id: Option<TypeId>,
}

impl TypeDescriptor {
    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            shape: TypeShape::Primitive(kind),
            default: None,
            type_id: None,
        }
    }

    pub fn enumeration(name: impl Into<String>, members: Vec<EnumMemberDescriptor>) -> Self {
        Self {
            name: name.into(),
            shape: TypeShape::Enum(members),
            default: None,
            type_id: None,
        }
    }

    pub fn list(name: impl Into<String>, element: DescriptorFn, appendable: bool) -> Self {
        Self {
            name: name.into(),
            shape: TypeShape::List {
                element,
                appendable,
            },
            default: None,
            type_id: None,
        }
    }

    pub fn record(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            shape: TypeShape::Record { fields },
            default: None,
            type_id: None,
        }
    }

    /// Tie the descriptor to the Rust type `T`
    pub fn with_type<T: 'static>(mut self) -> Self {
        self.type_id = Some(TypeId::of::<T>());
        self
    }

    /// Attach a default instance constructor
    pub fn with_default(mut self, default: DefaultFn) -> Self {
        self.default = Some(default);
        self
    }

    /// Field by name (ignored fields included)
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        match &self.shape {
            TypeShape::Record { fields } => fields.iter().find(|field| field.name == name),
            _ => None,
        }
    }
}

/// Host type convertible to and from value trees
pub trait Reflect: Sized {
    /// Shape of the type
    fn descriptor() -> TypeDescriptor;

    /// Dynamic form of this value
    ///
    /// Fails with `ValueMismatch` when the value has no exact dynamic form.
    fn to_host(&self) -> Result<HostValue, BridgeError>;

    /// Rebuild a value from its dynamic form
    fn from_host(value: HostValue) -> Result<Self, BridgeError>;
}

macro_rules! reflect_primitive {
    ($ty:ty, $name:literal, $variant:ident) => {
        impl Reflect for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::primitive($name, PrimitiveKind::$variant)
            }

            fn to_host(&self) -> Result<HostValue, BridgeError> {
                Ok(HostValue::Primitive(PrimitiveValue::from(self.clone())))
            }

            fn from_host(value: HostValue) -> Result<Self, BridgeError> {
                match value {
                    HostValue::Primitive(PrimitiveValue::$variant(inner)) => Ok(inner),
                    other => Err(BridgeError::value_mismatch(
                        PrimitiveKind::$variant.to_string(),
                        other.kind_name(),
                    )),
                }
            }
        }
    };
}

reflect_primitive!(String, "String", String);
reflect_primitive!(i64, "i64", Integer);
reflect_primitive!(Decimal, "Decimal", Decimal);
reflect_primitive!(bool, "bool", Boolean);
reflect_primitive!(DateTime<Utc>, "DateTime<Utc>", DateTime);
reflect_primitive!(TimeDelta, "TimeDelta", Duration);

macro_rules! reflect_narrow_integer {
    ($ty:ty, $name:literal) => {
        impl Reflect for $ty {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::primitive($name, PrimitiveKind::Integer)
            }

            fn to_host(&self) -> Result<HostValue, BridgeError> {
                Ok(HostValue::Primitive(PrimitiveValue::Integer(i64::from(*self))))
            }

            fn from_host(value: HostValue) -> Result<Self, BridgeError> {
                let wide = i64::from_host(value)?;
                <$ty>::try_from(wide).map_err(|_| {
                    BridgeError::value_mismatch($name, format!("out of range integer {}", wide))
                })
            }
        }
    };
}

reflect_narrow_integer!(i32, "i32");
reflect_narrow_integer!(u32, "u32");

/// Floats are carried as decimals through their shortest round-trip text
///
/// A float whose text does not fit a decimal exactly (non-finite, beyond
/// `Decimal::MAX`, or more than 28 fractional digits) is rejected.
impl Reflect for f64 {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::primitive("f64", PrimitiveKind::Decimal)
    }

    fn to_host(&self) -> Result<HostValue, BridgeError> {
        let text = self.to_string();
        let decimal = Decimal::from_str(&text)
            .ok()
            .filter(|decimal| decimal_to_f64(decimal) == Some(*self))
            .ok_or_else(|| BridgeError::value_mismatch("decimal", format!("f64 {}", text)))?;
        Ok(HostValue::Primitive(PrimitiveValue::Decimal(decimal)))
    }

    fn from_host(value: HostValue) -> Result<Self, BridgeError> {
        let decimal = Decimal::from_host(value)?;
        decimal_to_f64(&decimal)
            .ok_or_else(|| BridgeError::value_mismatch("f64", format!("decimal {}", decimal)))
    }
}

/// Nearest float to `decimal`, parsed from its exact text
fn decimal_to_f64(decimal: &Decimal) -> Option<f64> {
    decimal.to_string().parse::<f64>().ok()
}

impl<T: Reflect> Reflect for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::list(format!("Vec<{}>", T::descriptor().name), T::descriptor, true)
            .with_default(|| Ok(HostValue::List(Vec::new())))
    }

    fn to_host(&self) -> Result<HostValue, BridgeError> {
        self.iter()
            .map(Reflect::to_host)
            .collect::<Result<Vec<_>, _>>()
            .map(HostValue::List)
    }

    fn from_host(value: HostValue) -> Result<Self, BridgeError> {
        match value {
            HostValue::List(items) => items.into_iter().map(T::from_host).collect(),
            other => Err(BridgeError::value_mismatch("list", other.kind_name())),
        }
    }
}

/// Implement [`Reflect`] for a record type
///
/// Listed fields are converted in order; fields after `ignore` are skipped
/// by conversion and rejected when present in a host record. The type must
/// implement `Default`, which supplies the starting instance for
/// `from_host` and the default constructor of the descriptor.
#[macro_export]
macro_rules! reflect_record {
    ($ty:ident { $($field:ident),* $(,)? } $(, ignore { $($ignored:ident),* $(,)? })?) => {
        impl $crate::services::Reflect for $ty {
            fn descriptor() -> $crate::services::TypeDescriptor {
                $crate::services::TypeDescriptor::record(
                    stringify!($ty),
                    vec![
                        $($crate::services::FieldDescriptor::of(
                            stringify!($field),
                            |value: &$ty| &value.$field,
                        ),)*
                        $($($crate::services::FieldDescriptor::ignored(stringify!($ignored)),)*)?
                    ],
                )
                .with_type::<$ty>()
                .with_default(|| {
                    $crate::services::Reflect::to_host(&<$ty as ::std::default::Default>::default())
                })
            }

            fn to_host(
                &self,
            ) -> ::std::result::Result<$crate::services::HostValue, $crate::services::BridgeError> {
                #[allow(unused_mut)]
                let mut fields = $crate::IndexMap::new();
                $(fields.insert(
                    stringify!($field).to_string(),
                    $crate::services::Reflect::to_host(&self.$field)?,
                );)*
                Ok($crate::services::HostValue::Record(fields))
            }

            fn from_host(
                value: $crate::services::HostValue,
            ) -> ::std::result::Result<Self, $crate::services::BridgeError> {
                #[allow(unused_mut)]
                let mut fields = value.into_record(stringify!($ty))?;
                #[allow(unused_mut)]
                let mut instance = <$ty as ::std::default::Default>::default();
                $(if let Some(field) = fields.shift_remove(stringify!($field)) {
                    instance.$field = $crate::services::Reflect::from_host(field)?;
                })*
                if let Some((member, _)) = fields.into_iter().next() {
                    return Err($crate::services::BridgeError::member_not_found(
                        stringify!($ty),
                        member,
                    ));
                }
                Ok(instance)
            }
        }
    };
}

/// Implement [`Reflect`] for a fieldless enum
///
/// Members are listed in declaration order; their discriminants become the
/// member values.
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::services::Reflect for $ty {
            fn descriptor() -> $crate::services::TypeDescriptor {
                $crate::services::TypeDescriptor::enumeration(
                    stringify!($ty),
                    vec![$($crate::services::EnumMemberDescriptor::new(
                        stringify!($variant),
                        $ty::$variant as i64,
                    )),+],
                )
            }

            fn to_host(
                &self,
            ) -> ::std::result::Result<$crate::services::HostValue, $crate::services::BridgeError> {
                match self {
                    $($ty::$variant => {
                        Ok($crate::services::HostValue::Enum($ty::$variant as i64))
                    })+
                }
            }

            fn from_host(
                value: $crate::services::HostValue,
            ) -> ::std::result::Result<Self, $crate::services::BridgeError> {
                let raw = value.into_enum(stringify!($ty))?;
                $(if raw == $ty::$variant as i64 {
                    return Ok($ty::$variant);
                })+
                Err($crate::services::BridgeError::InvalidEnumValue {
                    type_name: stringify!($ty).to_string(),
                    value: raw,
                })
            }
        }
    };
}
