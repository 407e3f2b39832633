//! Maps reflected types to schema fragments.
//!
//! Object types are only ever expanded by [`describe`], which builds their definition.
//! At every use site ([`fragment`]) they collapse to a `$ref` and are handed back to the
//! caller in [`Described::referenced`]; the caller decides when (and whether) to register
//! them. This keeps descriptions of self-referential types finite.

use tracing::debug;

use crate::{
    model::{Schema, SchemaType},
    reflect::{Primitive, Shape, TypeInfo, TypeRef},
};

/// A schema plus the object types it references by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Described {
    /// Definition or use-site schema.
    pub schema: Schema,
    /// Object types reached through `$ref`, in discovery order.
    pub referenced: Vec<TypeRef>,
}

impl Described {
    fn inline(schema: Schema) -> Self {
        Self {
            schema,
            referenced: Vec::new(),
        }
    }
}

/// Full description of `ty`, as stored in the definitions table.
pub fn describe(ty: &TypeRef) -> Described {
    describe_info(ty, ty.info())
}

/// Same as [`describe`] for a description that was already resolved from `ty`.
pub fn describe_info(ty: &TypeRef, info: TypeInfo) -> Described {
    let TypeInfo {
        name,
        description,
        shape,
    } = info;

    let mut described = match shape {
        Shape::Object(fields) => {
            let mut schema = Schema::of_type(SchemaType::Object);
            let mut referenced = Vec::new();

            for field in fields {
                let Some(property) = fragment(&field.ty) else {
                    debug!(definition = %name, field = %field.name, "skipping absence-typed property");
                    continue;
                };

                if !field.is_nullable() {
                    schema.required.push(field.name.clone());
                }

                let mut property_schema = property.schema;
                if property_schema.reference.is_none() {
                    property_schema.description = field.description;
                }
                schema.properties.insert(field.name, property_schema);
                referenced.extend(property.referenced);
            }

            Described { schema, referenced }
        }
        other => match fragment_of_shape(ty, &name, other) {
            Some(described) => described,
            None => Described::inline(Schema::default()),
        },
    };

    if described.schema.reference.is_none() {
        described.schema.description = description.or(described.schema.description);
    }
    described
}

/// Schema used where `ty` appears: inline for primitives, enums and arrays, a `$ref` for
/// object types. Returns `None` for the absence type.
pub fn fragment(ty: &TypeRef) -> Option<Described> {
    let info = ty.info();
    fragment_of_shape(ty, &info.name, info.shape)
}

fn fragment_of_shape(ty: &TypeRef, name: &str, shape: Shape) -> Option<Described> {
    match shape {
        Shape::Absent => None,
        Shape::Primitive(primitive) => Some(Described::inline(primitive_schema(primitive))),
        Shape::Enum(values) => Some(Described::inline(Schema {
            enum_values: values,
            ..Schema::of_type(SchemaType::String)
        })),
        Shape::Array(element) => {
            let items = fragment(&element)?;
            Some(Described {
                schema: Schema::array(items.schema),
                referenced: items.referenced,
            })
        }
        Shape::Object(_) => Some(Described {
            schema: Schema::reference(name),
            referenced: vec![ty.non_null()],
        }),
    }
}

/// Swagger type and format for a primitive.
pub fn primitive_schema(primitive: Primitive) -> Schema {
    Schema {
        format: primitive.format().map(str::to_string),
        ..Schema::of_type(primitive.schema_type())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::reflect::Reflect;

    struct Node;

    impl Reflect for Node {
        fn type_info() -> TypeInfo {
            TypeInfo::object("Node")
                .field::<String>("name")
                .field::<Vec<Node>>("children")
        }
    }

    struct Widget;

    impl Reflect for Widget {
        fn type_info() -> TypeInfo {
            TypeInfo::object("Widget")
                .describe("A thing on a shelf")
                .described_field::<String>("id", "Stable identifier")
                .field::<Option<String>>("color")
                .field::<Option<i64>>("weight")
                .field::<Outline>("shape")
                .field::<Option<Node>>("root")
                .field::<()>("nothing")
        }
    }

    struct Outline;

    impl Reflect for Outline {
        fn type_info() -> TypeInfo {
            TypeInfo::enumeration("Shape", ["round", "square"])
        }
    }

    #[test]
    fn object_lists_properties_and_required_fields() {
        let described = describe(&TypeRef::of::<Widget>());
        let value = serde_json::to_value(&described.schema).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "object",
                "description": "A thing on a shelf",
                "properties": {
                    "id": { "type": "string", "description": "Stable identifier" },
                    "color": { "type": "string" },
                    "weight": { "type": "integer", "format": "int64" },
                    "shape": { "type": "string", "enum": ["round", "square"] },
                    "root": { "$ref": "#/definitions/Node" }
                },
                "required": ["id", "shape"]
            })
        );
        assert_eq!(described.referenced, vec![TypeRef::of::<Node>()]);
    }

    #[test]
    fn self_reference_becomes_a_ref() {
        let described = describe(&TypeRef::of::<Node>());
        let children = &described.schema.properties["children"];

        assert_eq!(children.schema_type, Some(SchemaType::Array));
        assert_eq!(
            children.items.as_ref().and_then(|items| items.referenced_name()),
            Some("Node")
        );
        assert_eq!(described.referenced, vec![TypeRef::of::<Node>()]);
    }

    #[test]
    fn description_is_deterministic() {
        let first = describe(&TypeRef::of::<Widget>());
        let second = describe(&TypeRef::of::<Widget>());
        assert_eq!(first, second);
    }

    #[test]
    fn fragments_of_the_absence_type_are_empty() {
        assert!(fragment(&TypeRef::of::<()>()).is_none());
        assert!(fragment(&TypeRef::of::<Vec<()>>()).is_none());
    }

    #[test]
    fn array_of_objects_references_the_element() {
        let described = fragment(&TypeRef::of::<Vec<Widget>>()).unwrap();
        let value = serde_json::to_value(&described.schema).unwrap();

        assert_eq!(
            value,
            json!({ "type": "array", "items": { "$ref": "#/definitions/Widget" } })
        );
        assert_eq!(described.referenced, vec![TypeRef::of::<Widget>()]);
    }

    #[test]
    fn nullable_object_reference_is_registered_as_the_plain_type() {
        let described = fragment(&TypeRef::of::<Option<Widget>>()).unwrap();
        assert_eq!(described.referenced, vec![TypeRef::of::<Widget>()]);
        assert!(!described.referenced[0].is_nullable());
    }
}
