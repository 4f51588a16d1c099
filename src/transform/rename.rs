use crate::ast::{Literal, Operator, ResolvedValue};
use crate::error::{ResolveError, TransformError};
use crate::parser::parse;
use crate::resolver::Resolver;
use crate::schema::{PropertyKind, SchemaLookup};

/// Rewrite every use of `old_value` as a value of `property` to `new_value`.
///
/// Only comparisons and `IN` members bound to `property` change; the same
/// text compared against another property stays as it is. The result is the
/// canonical rendering of the rewritten query, so `new_value` is quoted only
/// when it has to be.
///
/// `source` must still resolve against `schema`, so call this before the
/// schema drops `old_value`.
pub fn rename_value(
    source: &str,
    property: &str,
    old_value: &str,
    new_value: &str,
    schema: &dyn SchemaLookup,
) -> Result<String, TransformError> {
    let resolver = Resolver::new(schema);
    let mut query = resolver.query(parse(source)?)?;

    let definition = schema
        .find_property(property)
        .ok_or_else(|| ResolveError::UnknownProperty {
            name: property.to_string(),
            suggestion: None,
        })?;
    let old = resolver.value(&definition, Operator::Eq, Literal::text(old_value))?;
    let new = match definition.kind {
        PropertyKind::Enumerated { numeric: true } | PropertyKind::Numeric => {
            ResolvedValue::number(new_value)
                .unwrap_or_else(|| ResolvedValue::Text(new_value.to_string()))
        }
        _ => ResolvedValue::Text(new_value.to_string()),
    };

    let mut renamed = 0usize;
    if let Some(filter) = query.filter.as_mut() {
        filter.for_each_value_mut(&mut |bound, value| {
            if bound.definition == definition && *value == old {
                *value = new.clone();
                renamed += 1;
            }
        });
    }

    tracing::debug!(property, old_value, new_value, renamed, "renamed property value");
    Ok(query.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyDefinition, SchemaSnapshot};
    use pretty_assertions::assert_eq;

    fn schema() -> SchemaSnapshot {
        SchemaSnapshot::new()
            .with_property(
                PropertyDefinition::new(
                    "Feature",
                    "cp_feature",
                    PropertyKind::Enumerated { numeric: false },
                )
                .with_values(["Dashboard", "Notifications", "Applications"]),
            )
            .with_property(
                PropertyDefinition::new(
                    "Feature Thing",
                    "cp_feature_thing",
                    PropertyKind::Enumerated { numeric: false },
                )
                .with_values(["Dashboard"]),
            )
    }

    #[test]
    fn test_rename_only_touches_named_property() {
        let out = rename_value(
            "feature = Dashboard AND \"Feature Thing\" = \"Dashboard\"",
            "Feature",
            "Dashboard",
            "Project Monitoring",
            &schema(),
        )
        .unwrap();
        assert_eq!(out, "Feature = 'Project Monitoring' AND 'Feature Thing' = Dashboard");
    }

    #[test]
    fn test_rename_inside_in_list() {
        let out = rename_value(
            "feature IN (Dashboard, Notifications)",
            "feature",
            "dashboard",
            "Info Radiator",
            &schema(),
        )
        .unwrap();
        assert_eq!(out, "Feature IN ('Info Radiator', Notifications)");
    }

    #[test]
    fn test_unquoted_when_safe() {
        let out = rename_value("feature != Dashboard", "Feature", "Dashboard", "Radiator", &schema())
            .unwrap();
        assert_eq!(out, "Feature != Radiator");
    }

    #[test]
    fn test_unknown_property() {
        let err = rename_value("feature = Dashboard", "Nope", "Dashboard", "X", &schema())
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::Resolve(ResolveError::UnknownProperty { .. })
        ));
    }
}
