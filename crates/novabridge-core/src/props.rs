//! `Component.Property` addressing for property writes.
//!
//! A property token is split on its first `.`. When the left-hand side
//! names a component of the actor the write targets that component;
//! otherwise the whole token is a flat property of the actor itself.

use novabridge_host::{ComponentSummary, PropertyEntry};

/// Where a property token resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address<'a> {
    /// A field of a component.
    Component {
        /// The matched component.
        component: &'a ComponentSummary,
        /// Field name (right of the first `.`).
        property: &'a str,
    },
    /// A field of the actor (the whole token).
    Actor {
        /// Field name.
        property: &'a str,
    },
}

/// Lowercase, keep only alphanumerics, then drop trailing digits.
///
/// `"Light Component_0"` and `"LightComponent12"` both become
/// `"lightcomponent"`.
pub fn normalize_component_key(value: &str) -> String {
    let mut key: String = value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    while key.ends_with(|c: char| c.is_ascii_digit()) {
        key.pop();
    }
    key
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Find the component a key refers to.
///
/// The first pass looks for an exact name, an exact class name, or a
/// name containing the key. The second pass compares normalized keys of
/// the name and of the class (with and without a leading `U`), in both
/// containment directions. First match wins.
pub fn resolve_component<'a>(
    components: &'a [ComponentSummary],
    key: &str,
) -> Option<&'a ComponentSummary> {
    if key.is_empty() {
        return None;
    }
    if let Some(found) = components
        .iter()
        .find(|c| c.name == key || c.class == key || contains_ignore_case(&c.name, key))
    {
        return Some(found);
    }

    let wanted = normalize_component_key(key);
    if wanted.is_empty() {
        return None;
    }
    let related = |candidate: &str| {
        !candidate.is_empty() && (candidate.contains(&wanted) || wanted.contains(candidate))
    };
    components.iter().find(|c| {
        let name_key = normalize_component_key(&c.name);
        let class_key = normalize_component_key(&c.class);
        let unprefixed = c
            .class
            .strip_prefix('U')
            .map(normalize_component_key)
            .unwrap_or_default();
        related(&name_key) || related(&class_key) || related(&unprefixed)
    })
}

/// Resolve a property token against the actor's components.
pub fn address<'a>(components: &'a [ComponentSummary], token: &'a str) -> Address<'a> {
    if let Some((left, right)) = token.split_once('.') {
        if let Some(component) = resolve_component(components, left) {
            return Address::Component {
                component,
                property: right,
            };
        }
    }
    Address::Actor { property: token }
}

/// Exact field name, then a case-insensitive match.
pub fn resolve_property<'a>(entries: &'a [PropertyEntry], name: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|e| e.name == name)
        .or_else(|| entries.iter().find(|e| e.name.eq_ignore_ascii_case(name)))
        .map(|e| e.name.as_str())
}

/// Material slot addressed by a property starting with `Material`.
///
/// The prefix matches case-insensitively, so `Material`, `Materials` and
/// `MaterialOverride` all address a slot. The index comes from the
/// leading digits after a `[` and is 0 when there is no bracket or no
/// digits follow it.
pub fn material_slot(property: &str) -> Option<usize> {
    let prefix = property.get(..8)?;
    if !prefix.eq_ignore_ascii_case("Material") {
        return None;
    }
    let Some((_, index)) = property.split_once('[') else {
        return Some(0);
    };
    let digits: String = index
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    Some(digits.parse().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp(name: &str, class: &str) -> ComponentSummary {
        ComponentSummary {
            name: name.to_owned(),
            class: class.to_owned(),
            primitive: false,
        }
    }

    #[test]
    fn normalize_strips_noise_and_suffix() {
        assert_eq!(normalize_component_key("LightComponent0"), "lightcomponent");
        assert_eq!(normalize_component_key("Light Component_12"), "lightcomponent");
        assert_eq!(normalize_component_key("123"), "");
    }

    #[test]
    fn light_resolves_to_light_component() {
        let components = [comp("LightComponent0", "PointLightComponent")];
        let found = resolve_component(&components, "Light");
        assert_eq!(found.map(|c| c.name.as_str()), Some("LightComponent0"));
    }

    #[test]
    fn normalized_class_match_without_u_prefix() {
        let components = [
            comp("Root", "USceneComponent"),
            comp("Beam", "USpotLightComponent"),
        ];
        let found = resolve_component(&components, "spot_light_component_1");
        assert_eq!(found.map(|c| c.name.as_str()), Some("Beam"));
    }

    #[test]
    fn first_pass_substring_ignores_case() {
        let components = [
            comp("Beam", "PointLightComponent"),
            comp("KeyLIGHTRig", "SceneComponent"),
        ];
        let found = resolve_component(&components, "light");
        assert_eq!(found.map(|c| c.name.as_str()), Some("KeyLIGHTRig"));
    }

    #[test]
    fn exact_class_beats_fuzzy() {
        let components = [
            comp("MeshA", "InstancedStaticMeshComponent"),
            comp("MeshB", "StaticMeshComponent"),
        ];
        let found = resolve_component(&components, "StaticMeshComponent");
        assert_eq!(found.map(|c| c.name.as_str()), Some("MeshB"));
    }

    #[test]
    fn unknown_component_falls_back_to_actor() {
        let components = [comp("LightComponent0", "PointLightComponent")];
        assert_eq!(
            address(&components, "Tags.Count"),
            Address::Actor {
                property: "Tags.Count"
            }
        );
        assert!(matches!(
            address(&components, "Light.Intensity"),
            Address::Component {
                property: "Intensity",
                ..
            }
        ));
    }

    #[test]
    fn property_lookup_prefers_exact_case() {
        let entries = [
            PropertyEntry {
                name: "intensity".to_owned(),
                value: "1".to_owned(),
            },
            PropertyEntry {
                name: "Intensity".to_owned(),
                value: "2".to_owned(),
            },
        ];
        assert_eq!(resolve_property(&entries, "Intensity"), Some("Intensity"));
        assert_eq!(resolve_property(&entries, "INTENSITY"), Some("intensity"));
        assert_eq!(resolve_property(&entries, "Radius"), None);
    }

    #[test]
    fn material_slots() {
        assert_eq!(material_slot("Material"), Some(0));
        assert_eq!(material_slot("material[2]"), Some(2));
        assert_eq!(material_slot("Material[ 3 ]"), Some(3));
        assert_eq!(material_slot("Material[x]"), Some(0));
        assert_eq!(material_slot("Material[-1]"), Some(0));
        assert_eq!(material_slot("MaterialOverride"), Some(0));
        assert_eq!(material_slot("Materials[1]"), Some(1));
        assert_eq!(material_slot("Material_2"), Some(0));
        assert_eq!(material_slot("Mat"), None);
        assert_eq!(material_slot("Intensity"), None);
    }
}
