use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::*;

/// Namespace an alias lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NameKind {
    Type,
    Command,
    Enum,
}

impl NameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameKind::Type => "type",
            NameKind::Command => "command",
            NameKind::Enum => "enum",
        }
    }
}

/// Result of the last selection pass. Dropped by `Registry::api_reset`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Selection {
    /// Selected features, in the order they are emitted.
    pub features: Vec<String>,
    pub feature_dictionary: BTreeMap<String, FeatureDictionary>,
    pub valid_extension_structs: BTreeMap<String, Vec<String>>,
    /// Success codes added to commands by `<extend>` tags.
    pub command_extension_successes: Vec<CommandExtension>,
    /// Error codes added to commands by `<extend>` tags.
    pub command_extension_errors: Vec<CommandExtension>,
    /// Group members taken out by `<remove>` blocks.
    pub group_removed: BTreeMap<String, BTreeSet<String>>,
    /// Group members the selected features want emitted.
    pub group_required: BTreeMap<String, BTreeSet<String>>,
}

/// The typed model of one registry document, plus the state of the last
/// selection run over it.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub(crate) types: BTreeMap<String, TypeInfo>,
    pub(crate) groups: BTreeMap<String, GroupInfo>,
    pub(crate) enums: BTreeMap<String, EnumInfo>,
    pub(crate) commands: BTreeMap<String, CmdInfo>,
    /// Core versions in document order, then extensions in document order.
    pub(crate) features: Vec<FeatureInfo>,
    pub(crate) feature_index: BTreeMap<String, usize>,
    pub(crate) platforms: BTreeMap<String, String>,
    pub(crate) spirv_extensions: Vec<SpirvInfo>,
    pub(crate) spirv_capabilities: Vec<SpirvInfo>,
    pub(crate) formats: Vec<FormatInfo>,
    pub(crate) sync_stages: Vec<SyncStageInfo>,
    pub(crate) sync_access: Vec<SyncAccessInfo>,
    pub(crate) sync_pipelines: Vec<SyncPipelineInfo>,
    pub(crate) aliases: BTreeMap<NameKind, BTreeMap<String, String>>,
    pub(crate) reverse_aliases: BTreeMap<NameKind, BTreeMap<String, Vec<String>>>,
    pub(crate) enum_to_type: BTreeMap<String, String>,
    pub(crate) selection: Option<Selection>,
}

impl Registry {
    pub fn types(&self) -> &BTreeMap<String, TypeInfo> {
        &self.types
    }

    pub fn type_info(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    pub fn groups(&self) -> &BTreeMap<String, GroupInfo> {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&GroupInfo> {
        self.groups.get(name)
    }

    pub fn enums(&self) -> &BTreeMap<String, EnumInfo> {
        &self.enums
    }

    pub fn enum_info(&self, name: &str) -> Option<&EnumInfo> {
        self.enums.get(name)
    }

    pub fn commands(&self) -> &BTreeMap<String, CmdInfo> {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<&CmdInfo> {
        self.commands.get(name)
    }

    /// Core versions then extensions, each in document order.
    pub fn features(&self) -> &[FeatureInfo] {
        &self.features
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureInfo> {
        self.feature_index.get(name).map(|&idx| &self.features[idx])
    }

    pub fn platforms(&self) -> &BTreeMap<String, String> {
        &self.platforms
    }

    pub fn spirv_extensions(&self) -> &[SpirvInfo] {
        &self.spirv_extensions
    }

    pub fn spirv_capabilities(&self) -> &[SpirvInfo] {
        &self.spirv_capabilities
    }

    pub fn formats(&self) -> &[FormatInfo] {
        &self.formats
    }

    pub fn sync_stages(&self) -> &[SyncStageInfo] {
        &self.sync_stages
    }

    pub fn sync_access(&self) -> &[SyncAccessInfo] {
        &self.sync_access
    }

    pub fn sync_pipelines(&self) -> &[SyncPipelineInfo] {
        &self.sync_pipelines
    }

    //----------------------------------------------------------------------------------------------
    /// Direct alias target of `name`, one step, without closure.
    pub fn alias_of(&self, kind: NameKind, name: &str) -> Option<&str> {
        self.aliases
            .get(&kind)
            .and_then(|map| map.get(name))
            .map(|s| s.as_str())
    }

    /// Names that declare themselves an alias of `name`, in name order.
    pub fn aliases_of(&self, kind: NameKind, name: &str) -> &[String] {
        self.reverse_aliases
            .get(&kind)
            .and_then(|map| map.get(name))
            .map_or(&[], |v| v.as_slice())
    }

    /// Canonical name of `name` after following every alias step.
    pub fn resolve<'a>(&'a self, kind: NameKind, name: &'a str) -> &'a str {
        let map = match self.aliases.get(&kind) {
            Some(map) => map,
            None => return name,
        };
        let mut current = name;
        // Cycles are rejected when the model is built; the bound only
        // keeps a hand-assembled registry from spinning.
        for _ in 0..=map.len() {
            match map.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Group an enum value belongs to, with type aliases resolved.
    pub fn enum_type(&self, name: &str) -> Option<&str> {
        self.enum_to_type.get(name).map(|s| s.as_str())
    }

    /// Signature of a command. For an alias it is the signature of the
    /// aliased command with the prototype name rewritten.
    pub fn command_definition(&self, name: &str) -> Option<Cow<'_, CommandDefinition>> {
        let canonical = self.resolve(NameKind::Command, name);
        match &self.commands.get(canonical)?.body {
            CommandBody::Definition(def) if canonical == name => Some(Cow::Borrowed(def)),
            CommandBody::Definition(def) => {
                let mut def = def.clone();
                def.proto.name = String::from(name);
                Some(Cow::Owned(def))
            }
            CommandBody::AliasOf(_) => None,
        }
    }

    /// Dispatch level from the handle type of the first parameter.
    pub fn command_level(&self, name: &str) -> CommandLevel {
        let first = self
            .command_definition(name)
            .and_then(|def| def.params.first().map(|p| p.type_name.clone()));
        match first.as_deref().map(|t| self.resolve(NameKind::Type, t)) {
            Some("VkInstance") => CommandLevel::Instance,
            Some("VkPhysicalDevice") => CommandLevel::PhysicalDevice,
            Some("VkDevice") | Some("VkQueue") | Some("VkCommandBuffer") => CommandLevel::Device,
            _ => CommandLevel::Global,
        }
    }

    /// Members of a group in emission order: values in document order,
    /// then aliases. After a selection run, only members the selected
    /// features require and that no `<remove>` took out are returned.
    pub fn group_enums(&self, name: &str) -> Vec<&EnumInfo> {
        let group = match self.groups.get(name) {
            Some(g) => g,
            None => return Vec::new(),
        };
        let keep = |enum_name: &str| match &self.selection {
            Some(sel) => {
                let removed = sel
                    .group_removed
                    .get(name)
                    .map_or(false, |s| s.contains(enum_name));
                let required = sel
                    .group_required
                    .get(name)
                    .map_or(false, |s| s.contains(enum_name));
                required && !removed
            }
            None => true,
        };
        let members: Vec<&EnumInfo> = group
            .enums
            .iter()
            .filter(|n| keep(n.as_str()))
            .filter_map(|n| self.enums.get(n))
            .collect();
        let (values, aliases): (Vec<&EnumInfo>, Vec<&EnumInfo>) =
            members.into_iter().partition(|e| e.value.alias().is_none());
        values.into_iter().chain(aliases).collect()
    }

    //----------------------------------------------------------------------------------------------
    /// Names of the features chosen by the last selection run, in emission order.
    pub fn selected_features(&self) -> Vec<&FeatureInfo> {
        match &self.selection {
            Some(sel) => sel.features.iter().filter_map(|n| self.feature(n)).collect(),
            None => Vec::new(),
        }
    }

    pub fn feature_dictionary(&self) -> Option<&BTreeMap<String, FeatureDictionary>> {
        self.selection.as_ref().map(|s| &s.feature_dictionary)
    }

    /// For each struct, the required structs that may extend it, sorted.
    pub fn valid_extension_structs(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        self.selection.as_ref().map(|s| &s.valid_extension_structs)
    }

    /// Success codes `<extend>` tags of the selected features add to
    /// commands, limited to required codes.
    pub fn command_extension_successes(&self) -> &[CommandExtension] {
        self.selection
            .as_ref()
            .map_or(&[], |s| s.command_extension_successes.as_slice())
    }

    pub fn command_extension_errors(&self) -> &[CommandExtension] {
        self.selection
            .as_ref()
            .map_or(&[], |s| s.command_extension_errors.as_slice())
    }

    /// Clears the state of the previous selection run so the next one
    /// starts from an unselected model.
    pub fn api_reset(&mut self) {
        for info in self.types.values_mut() {
            info.required = false;
            info.selected_structextends.clear();
            info.additional_validity.clear();
            info.removed_validity.clear();
            info.deprecation = Deprecation::default();
        }
        for info in self.enums.values_mut() {
            info.required = false;
            info.deprecation = Deprecation::default();
        }
        for info in self.commands.values_mut() {
            info.required = false;
            info.selected_successcodes.clear();
            info.selected_errorcodes.clear();
            info.additional_validity.clear();
            info.removed_validity.clear();
            info.deprecation = Deprecation::default();
        }
        for feature in self.features.iter_mut() {
            feature.emit = false;
        }
        for spirv in self
            .spirv_extensions
            .iter_mut()
            .chain(self.spirv_capabilities.iter_mut())
        {
            spirv.emit = false;
        }
        for format in self.formats.iter_mut() {
            format.emit = false;
        }
        self.selection = None;
    }

    //----------------------------------------------------------------------------------------------
    pub(crate) fn add_alias(&mut self, kind: NameKind, name: &str, target: &str) {
        self.aliases
            .entry(kind)
            .or_default()
            .insert(String::from(name), String::from(target));
    }

    pub(crate) fn build_reverse_aliases(&mut self) {
        self.reverse_aliases.clear();
        for (kind, map) in self.aliases.iter() {
            let reverse = self.reverse_aliases.entry(*kind).or_default();
            for (name, target) in map.iter() {
                reverse.entry(target.clone()).or_default().push(name.clone());
            }
        }
    }

    /// Fails on the first alias chain that comes back to a name it
    /// already passed through.
    pub(crate) fn check_alias_cycles(&self) -> Result<(), FatalError> {
        for map in self.aliases.values() {
            for start in map.keys() {
                let mut seen = BTreeSet::new();
                let mut current = start.as_str();
                while let Some(next) = map.get(current) {
                    if !seen.insert(current) {
                        return Err(FatalError::AliasCycle(start.clone()));
                    }
                    current = next;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn registry_with_aliases() -> Registry {
        let mut reg = Registry::default();
        reg.add_alias(NameKind::Command, "vkFooKHR", "vkFoo");
        reg.add_alias(NameKind::Command, "vkFooEXT", "vkFooKHR");
        reg.add_alias(NameKind::Type, "VkBarKHR", "VkBar");
        reg.build_reverse_aliases();
        reg
    }

    #[test]
    fn test_resolve() {
        let reg = registry_with_aliases();
        assert_eq!(reg.resolve(NameKind::Command, "vkFooEXT"), "vkFoo");
        assert_eq!(reg.resolve(NameKind::Command, "vkFoo"), "vkFoo");
        assert_eq!(reg.resolve(NameKind::Type, "vkFooKHR"), "vkFooKHR");
        assert_eq!(reg.alias_of(NameKind::Command, "vkFooEXT"), Some("vkFooKHR"));
        assert_eq!(reg.aliases_of(NameKind::Command, "vkFoo"), &["vkFooKHR".to_string()]);
        assert!(reg.aliases_of(NameKind::Enum, "vkFoo").is_empty());
        for name in ["vkFoo", "vkFooKHR", "vkFooEXT", "unknown"].iter() {
            let once = reg.resolve(NameKind::Command, name);
            assert_eq!(reg.resolve(NameKind::Command, once), once);
        }
    }

    #[test]
    fn test_alias_cycle() {
        let mut reg = registry_with_aliases();
        assert!(reg.check_alias_cycles().is_ok());
        reg.add_alias(NameKind::Command, "vkFoo", "vkFooEXT");
        match reg.check_alias_cycles() {
            Err(FatalError::AliasCycle(_)) => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_command_definition_rewrites_name() {
        let mut reg = registry_with_aliases();
        let mut def = CommandDefinition::default();
        def.proto.name = String::from("vkFoo");
        def.proto.type_name = String::from("void");
        def.params.push(Decl {
            name: String::from("device"),
            type_name: String::from("VkDevice"),
            code: String::from("VkDevice device"),
            ..Decl::default()
        });
        reg.commands.insert(
            String::from("vkFoo"),
            CmdInfo::new(String::from("vkFoo"), CommandBody::Definition(def.clone())),
        );
        let alias = reg.command_definition("vkFooEXT").unwrap();
        assert_eq!(alias.proto.name, "vkFooEXT");
        assert_eq!(alias.params, def.params);
        assert_eq!(reg.command_level("vkFooEXT"), CommandLevel::Device);
        assert_eq!(reg.command_level("vkMissing"), CommandLevel::Global);
    }
}
