//! Turns declared fields into Swagger parameters.

use tracing::warn;

use crate::{
    introspect::{self, Described},
    model::{Parameter, ParameterIn},
    reflect::{FieldInfo, Shape, TypeRef},
};

/// A bound parameter plus the object types its schema references.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// Parameter entry of the operation.
    pub parameter: Parameter,
    /// Object types the parameter schema references.
    pub referenced: Vec<TypeRef>,
}

/// Names of the `{name}` placeholders of a path template, in order.
pub fn path_tokens(template: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        tokens.push(&after[..end]);
        rest = &after[end + 1..];
    }

    tokens
}

/// Bind one field.
///
/// With no explicit `origin` the field belongs to the location type: it is a path
/// parameter when the template has a matching placeholder and a query parameter
/// otherwise. Absence-typed fields produce nothing.
pub fn bind(field: &FieldInfo, path_template: &str, origin: Option<ParameterIn>) -> Option<Bound> {
    let location = origin.unwrap_or_else(|| {
        if path_tokens(path_template).contains(&field.name.as_str()) {
            ParameterIn::Path
        } else {
            ParameterIn::Query
        }
    });
    let required = !field.is_nullable();

    if location == ParameterIn::Path && !required {
        warn!(
            path = path_template,
            parameter = %field.name,
            "nullable field bound to a path placeholder; documenting it as optional"
        );
    }

    let Described { schema, referenced } = introspect::fragment(&field.ty)?;
    let mut parameter = Parameter::new(field.name.clone(), location, required);
    parameter.description = field.description.clone();

    if schema.reference.is_some() {
        parameter.schema = Some(schema);
    } else {
        parameter.schema_type = schema.schema_type;
        parameter.format = schema.format;
        parameter.items = schema.items;
        parameter.enum_values = schema.enum_values;
    }

    Some(Bound {
        parameter,
        referenced,
    })
}

/// Bind every field of `ty`, in declaration order.
pub fn bind_all(ty: &TypeRef, path_template: &str, origin: Option<ParameterIn>) -> Vec<Bound> {
    let info = ty.info();
    match &info.shape {
        Shape::Object(fields) => fields
            .iter()
            .filter_map(|field| bind(field, path_template, origin))
            .collect(),
        Shape::Absent => Vec::new(),
        _ => {
            warn!(
                path = path_template,
                type_name = %info.name,
                "parameter source is not an object type; no parameters bound"
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        model::SchemaType,
        reflect::{Reflect, TypeInfo},
    };

    struct WidgetLocation;

    impl Reflect for WidgetLocation {
        fn type_info() -> TypeInfo {
            TypeInfo::object("WidgetLocation")
                .field::<String>("id")
                .field::<Option<String>>("color")
        }
    }

    struct Paging;

    impl Reflect for Paging {
        fn type_info() -> TypeInfo {
            TypeInfo::object("Paging")
                .field::<Option<u32>>("page")
                .field::<Vec<String>>("sort")
                .field::<Filter>("filter")
        }
    }

    struct Filter;

    impl Reflect for Filter {
        fn type_info() -> TypeInfo {
            TypeInfo::object("Filter").field::<String>("expression")
        }
    }

    struct Tracing;

    impl Reflect for Tracing {
        fn type_info() -> TypeInfo {
            TypeInfo::object("Tracing")
                .described_field::<String>("X-Request-Id", "Correlation identifier")
                .field::<()>("ignored")
        }
    }

    #[test]
    fn tokens_are_extracted_in_order() {
        assert_eq!(path_tokens("/a/{first}/b/{second}"), vec!["first", "second"]);
        assert!(path_tokens("/plain").is_empty());
        assert!(path_tokens("/broken/{open").is_empty());
    }

    #[test]
    fn location_fields_split_between_path_and_query() {
        let bound = bind_all(&TypeRef::of::<WidgetLocation>(), "/widgets/{id}", None);
        let parameters: Vec<_> = bound
            .into_iter()
            .map(|bound| serde_json::to_value(bound.parameter).unwrap())
            .collect();

        assert_eq!(
            parameters,
            vec![
                json!({ "name": "id", "in": "path", "required": true, "type": "string" }),
                json!({ "name": "color", "in": "query", "required": false, "type": "string" }),
            ]
        );
    }

    #[test]
    fn explicit_origin_wins_over_placeholders() {
        let bound = bind_all(
            &TypeRef::of::<WidgetLocation>(),
            "/widgets/{id}",
            Some(ParameterIn::Query),
        );
        assert!(
            bound
                .iter()
                .all(|bound| bound.parameter.location == ParameterIn::Query)
        );
    }

    #[test]
    fn query_arrays_and_objects() {
        let bound = bind_all(&TypeRef::of::<Paging>(), "/widgets", Some(ParameterIn::Query));

        let page = &bound[0].parameter;
        assert_eq!(page.schema_type, Some(SchemaType::Integer));
        assert_eq!(page.format.as_deref(), Some("int64"));
        assert!(!page.required);

        let sort = &bound[1].parameter;
        assert_eq!(sort.schema_type, Some(SchemaType::Array));
        assert_eq!(
            sort.items.as_ref().and_then(|items| items.schema_type),
            Some(SchemaType::String)
        );

        let filter = &bound[2];
        assert_eq!(
            filter
                .parameter
                .schema
                .as_ref()
                .and_then(|schema| schema.referenced_name()),
            Some("Filter")
        );
        assert_eq!(filter.referenced, vec![TypeRef::of::<Filter>()]);
    }

    #[test]
    fn header_fields_keep_descriptions_and_skip_absence() {
        let bound = bind_all(&TypeRef::of::<Tracing>(), "/", Some(ParameterIn::Header));

        assert_eq!(bound.len(), 1);
        let header = &bound[0].parameter;
        assert_eq!(header.name, "X-Request-Id");
        assert_eq!(header.location, ParameterIn::Header);
        assert_eq!(header.description.as_deref(), Some("Correlation identifier"));
    }

    #[test]
    fn non_object_sources_bind_nothing() {
        assert!(bind_all(&TypeRef::of::<String>(), "/", None).is_empty());
        assert!(bind_all(&TypeRef::of::<()>(), "/", None).is_empty());
    }
}
