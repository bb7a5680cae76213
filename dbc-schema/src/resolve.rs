//! The inheritance resolver (C2): deep-merges a device spec with its
//! `base[]` chain into one fully-populated [`RawDeviceSpec`].

use std::collections::{
    HashMap,
    HashSet,
};

use crate::{
    error::SpecError,
    raw::{
        RawDeviceSpec,
        RawEnum,
        RawEnumValue,
    },
};

/// Looks up a base spec by its lowercased name.
///
/// Implemented for an in-memory map (testable without touching the
/// filesystem) and for a directory-backed loader in [`crate::loader`].
pub trait BaseSpecSource {
    /// Loads the base spec named `name` (already lowercased by the caller).
    fn load_base(&self, name: &str) -> Result<RawDeviceSpec, SpecError>;
}

impl BaseSpecSource for HashMap<String, RawDeviceSpec> {
    fn load_base(&self, name: &str) -> Result<RawDeviceSpec, SpecError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| SpecError::MissingBase(name.to_string()))
    }
}

/// Resolves `root`'s `base[]` chain, producing one spec whose maps are the
/// deep merge of every base in the chain (root/upper overrides base on key
/// collision).
///
/// Processes `root.base` once, in declared order — deeper multi-level
/// chains are carried into the result's own `base` field for provenance but
/// are not independently re-resolved; see `DESIGN.md` for the rationale.
pub fn resolve_inheritance(
    root: RawDeviceSpec,
    source: &dyn BaseSpecSource,
) -> Result<RawDeviceSpec, SpecError> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(root.name.to_lowercase());

    let mut upper = root;
    let bases_to_process = upper.base.clone();

    for base_name in bases_to_process {
        let lowered = base_name.to_lowercase();
        if !seen.insert(lowered.clone()) {
            return Err(SpecError::CyclicBase(lowered));
        }
        tracing::debug!(base = %lowered, "merging base spec");
        let mut base_spec = source.load_base(&lowered)?;

        base_spec.arch = upper.arch.clone();
        base_spec.dev_class = upper.dev_class.clone();
        base_spec.dev_type = upper.dev_type;
        base_spec.name = upper.name.clone();
        base_spec.vendordep = upper.vendordep.clone();

        for name in &upper.base {
            if !base_spec.base.contains(name) {
                base_spec.base.push(name.clone());
            }
        }

        merge_map(&mut base_spec.enums, upper.enums.clone());
        merge_map(&mut base_spec.types, upper.types.clone());
        merge_map(&mut base_spec.msg, upper.msg.clone());
        merge_map(&mut base_spec.settings, upper.settings.clone());
        merge_map(&mut base_spec.setting_commands, upper.setting_commands.clone());

        tracing::debug!(
            name = %base_spec.name,
            messages = base_spec.msg.len(),
            settings = base_spec.settings.len(),
            "inheritance merge step complete"
        );
        upper = base_spec;
    }

    synthesize_setting_enums(&mut upper);
    validate_enum_defaults(&upper)?;
    Ok(upper)
}

/// Merges `overrides` into `base`, keeping `base`'s entries for keys not
/// present in `overrides` and letting `overrides` win on collision.
fn merge_map<V>(base: &mut std::collections::BTreeMap<String, V>, overrides: std::collections::BTreeMap<String, V>) {
    for (key, value) in overrides {
        base.insert(key, value);
    }
}

/// Synthesizes the `SETTING` and `SETTING_COMMAND` enums from the
/// resolved spec's `settings` and `setting_commands` maps.
fn synthesize_setting_enums(spec: &mut RawDeviceSpec) {
    let setting_values = spec
        .settings
        .iter()
        .map(|(name, setting)| {
            (
                name.clone(),
                RawEnumValue {
                    id: setting.id as u64,
                    comment: setting.comment.clone(),
                },
            )
        })
        .collect();
    spec.enums.insert(
        "SETTING".to_string(),
        RawEnum {
            btype: "uint".to_string(),
            bits: 8,
            is_public: true,
            default_value: String::new(),
            values: setting_values,
        },
    );

    let command_values = spec
        .setting_commands
        .iter()
        .map(|(name, msg)| {
            (
                name.clone(),
                RawEnumValue {
                    id: msg.id as u64,
                    comment: msg.comment.clone(),
                },
            )
        })
        .collect();
    spec.enums.insert(
        "SETTING_COMMAND".to_string(),
        RawEnum {
            btype: "uint".to_string(),
            bits: 8,
            is_public: true,
            default_value: String::new(),
            values: command_values,
        },
    );
}

fn validate_enum_defaults(spec: &RawDeviceSpec) -> Result<(), SpecError> {
    for (name, e) in &spec.enums {
        if e.default_value.is_empty() {
            if name == "SETTING" || name == "SETTING_COMMAND" {
                continue;
            }
            return Err(SpecError::UnknownEnumDefault {
                enum_name: name.clone(),
                default_value: e.default_value.clone(),
            });
        }
        if !e.values.contains_key(&e.default_value) {
            return Err(SpecError::UnknownEnumDefault {
                enum_name: name.clone(),
                default_value: e.default_value.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::raw::{
        RawMessage,
        RawSetting,
    };

    fn minimal_spec(name: &str, base: Vec<String>) -> RawDeviceSpec {
        RawDeviceSpec {
            name: name.to_string(),
            base,
            arch: String::new(),
            is_public: true,
            dev_type: 0,
            dev_class: String::new(),
            msg: BTreeMap::new(),
            settings: BTreeMap::new(),
            types: BTreeMap::new(),
            enums: BTreeMap::new(),
            setting_commands: BTreeMap::new(),
            vendordep: None,
        }
    }

    #[test]
    fn upper_fields_overwrite_base_identity_fields() {
        let mut base = minimal_spec("base_device", vec![]);
        base.arch = "base_arch".to_string();
        base.dev_type = 1;

        let mut root = minimal_spec("motor", vec!["base_device".to_string()]);
        root.arch = "motor_arch".to_string();
        root.dev_type = 7;

        let mut sources = HashMap::new();
        sources.insert("base_device".to_string(), base);

        let resolved = resolve_inheritance(root, &sources).unwrap();
        assert_eq!(resolved.name, "motor");
        assert_eq!(resolved.arch, "motor_arch");
        assert_eq!(resolved.dev_type, 7);
    }

    #[test]
    fn upper_maps_override_base_maps_on_collision() {
        let mut base = minimal_spec("base_device", vec![]);
        base.msg.insert(
            "status".to_string(),
            RawMessage {
                id: 1,
                min_length: None,
                max_length: None,
                length: Some(1),
                source: None,
                is_public: true,
                vendordep: false,
                comment: "base status".to_string(),
                signals: vec![],
            },
        );
        base.msg.insert(
            "heartbeat".to_string(),
            RawMessage {
                id: 2,
                min_length: None,
                max_length: None,
                length: Some(1),
                source: None,
                is_public: true,
                vendordep: false,
                comment: "base heartbeat".to_string(),
                signals: vec![],
            },
        );

        let mut root = minimal_spec("motor", vec!["base_device".to_string()]);
        root.msg.insert(
            "status".to_string(),
            RawMessage {
                id: 1,
                min_length: None,
                max_length: None,
                length: Some(2),
                source: None,
                is_public: true,
                vendordep: false,
                comment: "motor status".to_string(),
                signals: vec![],
            },
        );

        let mut sources = HashMap::new();
        sources.insert("base_device".to_string(), base);

        let resolved = resolve_inheritance(root, &sources).unwrap();
        assert_eq!(resolved.msg.len(), 2);
        assert_eq!(resolved.msg["status"].comment, "motor status");
        assert_eq!(resolved.msg["heartbeat"].comment, "base heartbeat");
    }

    #[test]
    fn synthesizes_setting_and_setting_command_enums() {
        let mut root = minimal_spec("motor", vec![]);
        root.settings.insert(
            "max_speed".to_string(),
            RawSetting {
                id: 3,
                comment: "top speed".to_string(),
                dtype: "uint:16".to_string(),
                readable: true,
                writable: true,
                reset_on_default: false,
                vendordep: false,
            },
        );

        let sources = HashMap::new();
        let resolved = resolve_inheritance(root, &sources).unwrap();
        let setting_enum = &resolved.enums["SETTING"];
        assert_eq!(setting_enum.values["max_speed"].id, 3);
        assert!(resolved.enums.contains_key("SETTING_COMMAND"));
    }

    #[test]
    fn missing_base_is_reported() {
        let root = minimal_spec("motor", vec!["nonexistent".to_string()]);
        let sources = HashMap::new();
        let err = resolve_inheritance(root, &sources).unwrap_err();
        assert!(matches!(err, SpecError::MissingBase(_)));
    }

    #[test]
    fn unknown_enum_default_is_rejected() {
        let mut root = minimal_spec("motor", vec![]);
        root.enums.insert(
            "Mode".to_string(),
            RawEnum {
                btype: "uint".to_string(),
                bits: 8,
                is_public: true,
                default_value: "Ghost".to_string(),
                values: BTreeMap::new(),
            },
        );
        let sources = HashMap::new();
        let err = resolve_inheritance(root, &sources).unwrap_err();
        assert!(matches!(err, SpecError::UnknownEnumDefault { .. }));
    }
}
