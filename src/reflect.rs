//! Structural description of Rust types, the input consumed by the schema synthesis.
//!
//! A type describes itself through [`Reflect`]: a name, an optional description and a
//! [`Shape`]. Nested types are held as [`TypeRef`] handles which resolve lazily, so a
//! type may refer to itself (directly or through other types) without building an
//! infinite description.

use std::{
    any::type_name,
    borrow::Cow,
    collections::{BTreeSet, HashSet},
    fmt,
    time::SystemTime,
};

use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::model::SchemaType;

/// Name given to the absence type `()`.
pub const ABSENT_TYPE_NAME: &str = "Unit";

/// Types that can describe their own structure.
///
/// Implement [`Reflect::type_info`] for request, response and location types. The
/// default [`Reflect::type_ref`] is rarely overridden; wrappers such as `Option<T>` and
/// `Box<T>` use it to forward to their inner type.
///
/// ```ignore
/// impl Reflect for Widget {
///     fn type_info() -> TypeInfo {
///         TypeInfo::object("Widget")
///             .field::<String>("id")
///             .field::<Option<String>>("color")
///     }
/// }
/// ```
pub trait Reflect {
    /// Structural description of the type.
    fn type_info() -> TypeInfo;

    /// Lazy handle to the type, used wherever the type is referenced from another one.
    fn type_ref() -> TypeRef {
        TypeRef::new(type_name::<Self>(), Self::type_info)
    }
}

/// Lazy handle on a reflected type.
///
/// The Rust type name is kept as the identity of the handle; it is what the definition
/// registry compares to detect two distinct types claiming one definition name.
#[derive(Clone, Copy)]
pub struct TypeRef {
    rust_name: &'static str,
    nullable: bool,
    info: fn() -> TypeInfo,
}

impl TypeRef {
    /// Build a handle from a Rust type name and the function describing the type.
    pub fn new(rust_name: &'static str, info: fn() -> TypeInfo) -> Self {
        Self {
            rust_name,
            nullable: false,
            info,
        }
    }

    /// Handle for `T`.
    pub fn of<T: Reflect>() -> Self {
        T::type_ref()
    }

    /// Same handle, flagged as permitting absence.
    pub fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    /// Same handle, with the nullable flag cleared.
    pub fn non_null(self) -> Self {
        Self {
            nullable: false,
            ..self
        }
    }

    /// Whether a value of this type may be absent.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Fully qualified Rust name of the underlying type.
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    /// Resolve the description of the referenced type.
    pub fn info(&self) -> TypeInfo {
        (self.info)()
    }

    /// Whether the handle points at the absence type.
    pub fn is_absent(&self) -> bool {
        matches!(self.info().shape, Shape::Absent)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRef")
            .field("rust_name", &self.rust_name)
            .field("nullable", &self.nullable)
            .finish()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.rust_name == other.rust_name && self.nullable == other.nullable
    }
}

impl Eq for TypeRef {}

/// Primitive kinds a value can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Primitive {
    String,
    Boolean,
    Int32,
    Int64,
    Float,
    Double,
    Date,
    DateTime,
    Uuid,
}

impl Primitive {
    /// Swagger `type` for the primitive.
    pub fn schema_type(self) -> SchemaType {
        match self {
            Primitive::String | Primitive::Date | Primitive::DateTime | Primitive::Uuid => {
                SchemaType::String
            }
            Primitive::Boolean => SchemaType::Boolean,
            Primitive::Int32 | Primitive::Int64 => SchemaType::Integer,
            Primitive::Float | Primitive::Double => SchemaType::Number,
        }
    }

    /// Swagger `format` for the primitive, if it has one.
    pub fn format(self) -> Option<&'static str> {
        match self {
            Primitive::String | Primitive::Boolean => None,
            Primitive::Int32 => Some("int32"),
            Primitive::Int64 => Some("int64"),
            Primitive::Float => Some("float"),
            Primitive::Double => Some("double"),
            Primitive::Date => Some("date"),
            Primitive::DateTime => Some("date-time"),
            Primitive::Uuid => Some("uuid"),
        }
    }
}

/// Structure of a reflected type.
#[derive(Debug, Clone)]
pub enum Shape {
    /// The "no content" type; never registered, never emitted as a schema.
    Absent,
    /// Scalar value.
    Primitive(Primitive),
    /// Collection of the referenced element type.
    Array(TypeRef),
    /// String enumeration with its literal values.
    Enum(Vec<String>),
    /// Composite type with its fields in declaration order.
    Object(Vec<FieldInfo>),
}

/// A named field of an object type.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Name as it appears on the wire.
    pub name: String,
    /// Declared type; nullable when the field may be absent.
    pub ty: TypeRef,
    /// Human readable description.
    pub description: Option<String>,
}

impl FieldInfo {
    /// Field `name` of type `T`.
    pub fn new<T: Reflect>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: T::type_ref(),
            description: None,
        }
    }

    /// Whether the field's type permits absence.
    pub fn is_nullable(&self) -> bool {
        self.ty.is_nullable()
    }
}

/// Description of one type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    /// Name used for the definition entry of object types.
    pub name: Cow<'static, str>,
    /// Emitted as the schema `description`.
    pub description: Option<String>,
    /// Structure of the type.
    pub shape: Shape,
}

impl TypeInfo {
    /// Object type with no fields yet.
    pub fn object(name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_shape(name, Shape::Object(Vec::new()))
    }

    /// String enumeration.
    pub fn enumeration<I, V>(name: impl Into<Cow<'static, str>>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self::with_shape(
            name,
            Shape::Enum(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Primitive type.
    pub fn primitive(name: impl Into<Cow<'static, str>>, primitive: Primitive) -> Self {
        Self::with_shape(name, Shape::Primitive(primitive))
    }

    /// Collection of `T`.
    pub fn array<T: Reflect>() -> Self {
        Self::with_shape("array", Shape::Array(T::type_ref()))
    }

    /// The absence type.
    pub fn absent() -> Self {
        Self::with_shape(ABSENT_TYPE_NAME, Shape::Absent)
    }

    fn with_shape(name: impl Into<Cow<'static, str>>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            description: None,
            shape,
        }
    }

    /// Attach a description to the type.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field of type `T`. Only meaningful on object types.
    pub fn field<T: Reflect>(self, name: impl Into<String>) -> Self {
        self.push_field(FieldInfo::new::<T>(name))
    }

    /// Append a documented field of type `T`. Only meaningful on object types.
    pub fn described_field<T: Reflect>(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let mut field = FieldInfo::new::<T>(name);
        field.description = Some(description.into());
        self.push_field(field)
    }

    fn push_field(mut self, field: FieldInfo) -> Self {
        if let Shape::Object(fields) = &mut self.shape {
            fields.push(field);
        }
        self
    }

    /// Fields of an object type; empty for every other shape.
    pub fn fields(&self) -> &[FieldInfo] {
        match &self.shape {
            Shape::Object(fields) => fields,
            _ => &[],
        }
    }
}

macro_rules! reflect_primitive {
    ($($ty:ty => $name:literal, $primitive:ident;)*) => {
        $(
            impl Reflect for $ty {
                fn type_info() -> TypeInfo {
                    TypeInfo::primitive($name, Primitive::$primitive)
                }
            }
        )*
    };
}

reflect_primitive! {
    String => "string", String;
    &'static str => "string", String;
    char => "string", String;
    bool => "boolean", Boolean;
    i8 => "integer", Int32;
    i16 => "integer", Int32;
    i32 => "integer", Int32;
    u8 => "integer", Int32;
    u16 => "integer", Int32;
    i64 => "integer", Int64;
    u32 => "integer", Int64;
    u64 => "integer", Int64;
    isize => "integer", Int64;
    usize => "integer", Int64;
    f32 => "number", Float;
    f64 => "number", Double;
    Uuid => "uuid", Uuid;
    Date => "date", Date;
    OffsetDateTime => "date-time", DateTime;
    SystemTime => "date-time", DateTime;
}

impl Reflect for () {
    fn type_info() -> TypeInfo {
        TypeInfo::absent()
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_info() -> TypeInfo {
        T::type_info()
    }

    fn type_ref() -> TypeRef {
        T::type_ref().nullable()
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn type_info() -> TypeInfo {
        T::type_info()
    }

    fn type_ref() -> TypeRef {
        T::type_ref()
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::array::<T>()
    }
}

impl<T: Reflect> Reflect for HashSet<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::array::<T>()
    }
}

impl<T: Reflect> Reflect for BTreeSet<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::array::<T>()
    }
}
