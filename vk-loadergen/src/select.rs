//! Selection of the versions and extensions to generate, and tagging of
//! everything their `<require>`, `<deprecate>` and `<remove>` blocks name.

use std::collections::{BTreeMap, BTreeSet};

use crate::depends::parse_depends;
use crate::emit::Diagnostics;
use crate::options::GeneratorOptions;
use crate::registry::{NameKind, Registry, Selection};
use crate::types::*;

/// Runs selection over `reg` and stores its outcome in the registry. The
/// registry is expected to be freshly reset.
pub(crate) fn select(reg: &mut Registry, options: &GeneratorOptions, diag: &mut Diagnostics) {
    let names = choose_features(reg, options, diag);
    let selected: BTreeSet<String> = names.iter().cloned().collect();
    let features: Vec<FeatureInfo> = names.iter().filter_map(|n| reg.feature(n).cloned()).collect();

    let mut selector = Selector {
        reg,
        options,
        diag,
        selection: Selection {
            features: names,
            ..Selection::default()
        },
    };

    for feature in features.iter() {
        log::debug!("pass 1: tagging required interfaces of {}", feature.name);
        selector.fill_feature_dictionary(feature);
        selector.require_feature(feature, &selected);
    }
    for feature in features.iter() {
        log::debug!("pass 2: tagging deprecations of {}", feature.name);
        selector.deprecate_feature(feature);
        selector.assign_validity(feature);
    }
    for feature in features.iter() {
        log::debug!("pass 3: tagging removed interfaces of {}", feature.name);
        selector.remove_feature(feature);
    }

    selector.tag_group_members(&selected);
    selector.strip_unsupported();
    selector.tag_valid_extension_structs();
    selector.tag_catalogues();

    let Selector { reg, selection, .. } = selector;
    reg.selection = Some(selection);
}

/// Picks the versions matching `versions` in document order, then the
/// extensions that pass the extension filters in extension number order,
/// and sets their emit flags.
fn choose_features(reg: &mut Registry, options: &GeneratorOptions, diag: &mut Diagnostics) -> Vec<String> {
    let mut versions = Vec::new();
    let mut extensions = Vec::new();
    let mut api_match = false;

    for (idx, feature) in reg.features.iter_mut().enumerate() {
        match &feature.kind {
            FeatureKind::Version { .. } => {
                if !feature.api.iter().any(|a| *a == options.apiname) {
                    continue;
                }
                api_match = true;
                if options.versions.is_match(&feature.name) {
                    feature.emit = options.emitversions.is_match(&feature.name);
                    log::debug!("including version {} (emit: {})", feature.name, feature.emit);
                    versions.push(idx);
                } else {
                    log::debug!("not including version {}", feature.name);
                }
            }
            FeatureKind::Extension(ext) => {
                let mut include = match &options.default_extensions {
                    Some(default) => ext.supported.iter().any(|s| s == default),
                    None => false,
                };
                if options.add_extensions.is_match(&feature.name) {
                    if ext.supported.iter().any(|s| *s == options.apiname) {
                        include = true;
                    } else {
                        diag.error(Error::UnsupportedExtension {
                            name: feature.name.clone(),
                            api: options.apiname.clone(),
                        });
                        include = false;
                    }
                }
                if options.remove_extensions.is_match(&feature.name) {
                    include = false;
                }
                if include {
                    feature.emit = options.emit_extensions.is_match(&feature.name);
                    extensions.push(idx);
                } else {
                    log::trace!("not including extension {}", feature.name);
                }
            }
        }
    }

    if !api_match {
        diag.error(Error::NoMatchingVersions {
            api: options.apiname.clone(),
        });
    }

    extensions.sort_by_key(|&idx| reg.features[idx].number());

    let mut chosen: Vec<&FeatureInfo> = versions
        .iter()
        .chain(extensions.iter())
        .map(|&idx| &reg.features[idx])
        .collect();
    if let Some(sort) = options.sort_procedure {
        sort(&mut chosen);
    }
    chosen.iter().map(|f| f.name.clone()).collect()
}

struct Selector<'a> {
    reg: &'a mut Registry,
    options: &'a GeneratorOptions,
    diag: &'a mut Diagnostics,
    selection: Selection,
}

impl<'a> Selector<'a> {
    /// A block applies when its `api` list, if any, names the target API
    /// and its profile, if any, equals the requested one.
    fn match_api_profile(&self, api: &[String], profile: Option<&str>) -> bool {
        if !api.is_empty() && !api.iter().any(|a| *a == self.options.apiname) {
            return false;
        }
        match (profile, self.options.profile.as_deref()) {
            (Some(block), Some(wanted)) => block == wanted,
            _ => true,
        }
    }

    /// Evaluates a `depends` guard over the selected feature names. A guard
    /// that does not parse is reported and treated as satisfied.
    fn depends_satisfied(&mut self, feature: &str, depends: Option<&str>, selected: &BTreeSet<String>) -> bool {
        let text = match depends {
            Some(text) => text,
            None => return true,
        };
        match parse_depends(text) {
            Ok(expr) => expr.evaluate(&|name: &str| selected.contains(name)),
            Err(e) => {
                self.diag.error(Error::SchemaViolation {
                    xpath: format!("{}/require", feature),
                    desc: format!("malformed depends expression '{}' ({:?})", text, e.code),
                });
                true
            }
        }
    }

    //----------------------------------------------------------------------------------------------
    fn mark_type_required(&mut self, name: &str, required: bool) {
        let info = match self.reg.types.get_mut(name) {
            Some(info) => info,
            None => {
                if !name.contains(".h") {
                    self.diag.error(Error::Undefined {
                        kind: "type",
                        name: String::from(name),
                    });
                }
                return;
            }
        };
        if !required {
            info.required = false;
            return;
        }
        if info.required {
            return;
        }
        info.required = true;

        let deps: Vec<String> = info
            .requires
            .iter()
            .chain(info.alias.iter())
            .chain(info.type_refs.iter())
            .filter(|dep| dep.as_str() != name)
            .cloned()
            .collect();
        let enum_refs = info.enum_refs.clone();
        let bitvalues = info.bitvalues.clone();

        for dep in deps.iter() {
            self.mark_type_required(dep, true);
        }
        for e in enum_refs.iter() {
            self.mark_enum_required(e, true);
        }
        if let Some(bitvalues) = bitvalues {
            self.mark_type_required(&bitvalues, true);
        }
    }

    /// Sets the flag on an enum and on its alias target. Removal also takes
    /// the enum out of its group.
    fn mark_enum_required(&mut self, name: &str, required: bool) {
        let (group, alias) = match self.reg.enums.get_mut(name) {
            Some(info) => {
                info.required = required;
                (info.group.clone(), info.value.alias().map(String::from))
            }
            None => {
                self.diag.error(Error::Undefined {
                    kind: "enum",
                    name: String::from(name),
                });
                return;
            }
        };
        if !required {
            if let Some(group) = group {
                self.selection
                    .group_removed
                    .entry(group)
                    .or_default()
                    .insert(String::from(name));
            }
        }
        if let Some(alias) = alias {
            self.mark_enum_required(&alias, required);
        }
    }

    /// Command aliases are duplicated signatures rather than C aliases, so
    /// the target is only followed when the options ask for it.
    fn mark_cmd_required(&mut self, name: &str, required: bool) {
        let alias = match self.reg.commands.get_mut(name) {
            Some(info) => {
                info.required = required;
                info.alias().map(String::from)
            }
            None => {
                self.diag.error(Error::Undefined {
                    kind: "command",
                    name: String::from(name),
                });
                return;
            }
        };
        if self.options.require_command_aliases {
            if let Some(alias) = alias {
                self.mark_cmd_required(&alias, required);
            }
        }
        if required {
            let refs: Vec<String> = match self.reg.command_definition(name) {
                Some(def) => def.type_refs().map(String::from).collect(),
                None => Vec::new(),
            };
            for ty in refs.iter() {
                self.mark_type_required(ty, true);
            }
        }
    }

    fn mark_required(&mut self, feature: &str, items: &[InterfaceItem], required: bool) {
        for item in items.iter() {
            match item {
                InterfaceItem::Type { name } => self.mark_type_required(name, required),
                InterfaceItem::Enum { name, .. } => self.mark_enum_required(name, required),
                InterfaceItem::Command { name } => self.mark_cmd_required(name, required),
                InterfaceItem::Extend {
                    kind,
                    name,
                    successcodes,
                    errorcodes,
                } if required => {
                    if kind != "command" {
                        self.diag.error(Error::UnsupportedExtend {
                            feature: String::from(feature),
                            kind: kind.clone(),
                        });
                        continue;
                    }
                    let record = |value: &String| CommandExtension {
                        command: name.clone(),
                        value: value.clone(),
                        extension: String::from(feature),
                    };
                    self.selection
                        .command_extension_successes
                        .extend(successcodes.iter().map(record));
                    self.selection
                        .command_extension_errors
                        .extend(errorcodes.iter().map(record));
                }
                _ => (),
            }
        }
    }

    //----------------------------------------------------------------------------------------------
    fn require_feature(&mut self, feature: &FeatureInfo, selected: &BTreeSet<String>) {
        for block in feature.requires.iter() {
            if !self.match_api_profile(&block.api, block.profile.as_deref()) {
                continue;
            }
            if !self.depends_satisfied(&feature.name, block.depends.as_deref(), selected) {
                log::debug!(
                    "{}: skipping block guarded by {}",
                    feature.name,
                    block.depends.as_deref().unwrap_or("")
                );
                continue;
            }
            self.mark_required(&feature.name, &block.items, true);
        }
    }

    fn remove_feature(&mut self, feature: &FeatureInfo) {
        for block in feature.removes.iter() {
            if !self.match_api_profile(&block.api, block.profile.as_deref()) {
                continue;
            }
            self.mark_required(&feature.name, &block.items, false);
            self.record_validity(&feature.name, &block.items, true);
        }
    }

    fn deprecate_feature(&mut self, feature: &FeatureInfo) {
        let is_version = feature.is_version();
        for block in feature.deprecates.iter() {
            if !self.match_api_profile(&block.api, block.profile.as_deref()) {
                continue;
            }
            for item in block.items.iter() {
                let (kind, name, deprecation) = match item {
                    InterfaceItem::Type { name } => {
                        ("type", name, self.reg.types.get_mut(name).map(|i| &mut i.deprecation))
                    }
                    InterfaceItem::Command { name } => (
                        "command",
                        name,
                        self.reg.commands.get_mut(name).map(|i| &mut i.deprecation),
                    ),
                    InterfaceItem::Enum { name, .. } => {
                        ("enum", name, self.reg.enums.get_mut(name).map(|i| &mut i.deprecation))
                    }
                    _ => continue,
                };
                match deprecation {
                    Some(d) => {
                        if is_version {
                            d.by_version = Some(feature.name.clone());
                        } else if !d.by_extensions.contains(&feature.name) {
                            d.by_extensions.push(feature.name.clone());
                        }
                        if block.explanationlink.is_some() {
                            d.link = block.explanationlink.clone();
                        }
                    }
                    None => self.diag.error(Error::Undefined {
                        kind,
                        name: name.clone(),
                    }),
                }
            }
        }
    }

    fn assign_validity(&mut self, feature: &FeatureInfo) {
        for block in feature.requires.iter() {
            if self.match_api_profile(&block.api, block.profile.as_deref()) {
                self.record_validity(&feature.name, &block.items, false);
            }
        }
    }

    fn record_validity(&mut self, feature: &str, items: &[InterfaceItem], removed: bool) {
        for item in items.iter() {
            let (command, struct_, text) = match item {
                InterfaceItem::Usage {
                    command,
                    struct_,
                    text,
                } => (command, struct_, text),
                _ => continue,
            };
            if let Some(command) = command {
                match self.reg.commands.get_mut(command) {
                    Some(info) if removed => info.removed_validity.push(text.clone()),
                    Some(info) => info.additional_validity.push(text.clone()),
                    None => self.diag.error(Error::DanglingReference {
                        kind: "usage",
                        name: String::from(feature),
                        target: command.clone(),
                    }),
                }
            }
            if let Some(struct_) = struct_ {
                match self.reg.types.get_mut(struct_) {
                    Some(info) if removed => info.removed_validity.push(text.clone()),
                    Some(info) => info.additional_validity.push(text.clone()),
                    None => self.diag.error(Error::DanglingReference {
                        kind: "usage",
                        name: String::from(feature),
                        target: struct_.clone(),
                    }),
                }
            }
        }
    }

    //----------------------------------------------------------------------------------------------
    /// Records what every applicable `<require>` block of `feature` lists,
    /// whether or not its `depends` guard holds.
    fn fill_feature_dictionary(&mut self, feature: &FeatureInfo) {
        let mut dict = FeatureDictionary::default();
        for block in feature.requires.iter() {
            if !self.match_api_profile(&block.api, block.profile.as_deref()) {
                continue;
            }
            let key = block.depends.clone();
            for item in block.items.iter() {
                match item {
                    InterfaceItem::Type { name } => {
                        if !self.reg.types.contains_key(name) {
                            continue;
                        }
                        let canonical = self.reg.resolve(NameKind::Type, name);
                        let info = match self.reg.types.get(canonical) {
                            Some(info) => info,
                            None => continue,
                        };
                        let extends = if info.structextends.is_empty() {
                            None
                        } else {
                            Some(info.structextends.join(","))
                        };
                        dict.types
                            .entry(info.category)
                            .or_default()
                            .entry(key.clone())
                            .or_default()
                            .entry(extends)
                            .or_default()
                            .push(name.clone());
                    }
                    InterfaceItem::Enum { name, extends } => dict
                        .enum_constants
                        .entry(key.clone())
                        .or_default()
                        .entry(extends.clone())
                        .or_default()
                        .push(name.clone()),
                    InterfaceItem::Command { name } => dict
                        .commands
                        .entry(key.clone())
                        .or_default()
                        .push(name.clone()),
                    _ => (),
                }
            }
        }
        self.selection
            .feature_dictionary
            .insert(feature.name.clone(), dict);
    }

    /// Limits `structextends`, `successcodes` and `errorcodes` to what
    /// ended up required.
    fn strip_unsupported(&mut self) {
        let required_types: BTreeSet<String> = self
            .reg
            .types
            .iter()
            .filter(|(_, info)| info.required)
            .map(|(name, _)| name.clone())
            .collect();
        let required_enums: BTreeSet<String> = self
            .reg
            .enums
            .iter()
            .filter(|(_, info)| info.required)
            .map(|(name, _)| name.clone())
            .collect();

        for info in self.reg.types.values_mut() {
            info.selected_structextends = info
                .structextends
                .iter()
                .filter(|s| required_types.contains(*s))
                .cloned()
                .collect();
        }
        for info in self.reg.commands.values_mut() {
            info.selected_successcodes = info
                .successcodes
                .iter()
                .filter(|s| required_enums.contains(*s))
                .cloned()
                .collect();
            info.selected_errorcodes = info
                .errorcodes
                .iter()
                .filter(|s| required_enums.contains(*s))
                .cloned()
                .collect();
        }
        self.selection
            .command_extension_successes
            .retain(|c| required_enums.contains(&c.value));
        self.selection
            .command_extension_errors
            .retain(|c| required_enums.contains(&c.value));
    }

    fn tag_valid_extension_structs(&mut self) {
        let mut valid: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for info in self.reg.types.values() {
            if !info.required || info.category != TypeCategory::Struct {
                continue;
            }
            for parent in info.selected_structextends.iter() {
                valid.entry(parent.clone()).or_default().push(info.name.clone());
            }
        }
        for children in valid.values_mut() {
            children.sort();
        }
        self.selection.valid_extension_structs = valid;
    }

    /// Decides which members of each required group get emitted: those
    /// injected by any selected extension the options ask for or by any
    /// emitted version, the native ones, and the targets of those that
    /// are aliases. Members removed by a `<remove>` block never are.
    fn tag_group_members(&mut self, selected: &BTreeSet<String>) {
        let mut group_required: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (group_name, group) in self.reg.groups.iter() {
            if group.kind == GroupKind::Constants {
                continue;
            }
            if !self.reg.types.get(group_name).map_or(false, |t| t.required) {
                continue;
            }

            let mut members = BTreeSet::new();
            for name in group.enums.iter() {
                let info = match self.reg.enums.get(name) {
                    Some(info) => info,
                    None => continue,
                };
                let options = self.options;
                let required = info.injectors.is_empty()
                    || info.injectors.iter().any(|injector| {
                        let emitted = if injector.is_version {
                            options.emitversions.is_match(&injector.feature)
                        } else {
                            (match &options.default_extensions {
                                Some(default) => injector.supported.contains(default),
                                None => false,
                            }) || options.add_extensions.is_match(&injector.feature)
                        };
                        selected.contains(&injector.feature) && emitted
                    });
                if required {
                    members.insert(name.clone());
                }
            }

            let mut pending: Vec<String> = members.iter().cloned().collect();
            while let Some(name) = pending.pop() {
                let target = self
                    .reg
                    .enums
                    .get(&name)
                    .and_then(|e| e.value.alias())
                    .filter(|t| group.enums.iter().any(|n| n == t));
                if let Some(target) = target {
                    if members.insert(String::from(target)) {
                        pending.push(String::from(target));
                    }
                }
            }

            if let Some(removed) = self.selection.group_removed.get(group_name) {
                members.retain(|n| !removed.contains(n));
            }
            group_required.insert(group_name.clone(), members);
        }

        for name in group_required.values().flatten() {
            if let Some(info) = self.reg.enums.get_mut(name) {
                info.required = true;
            }
        }
        self.selection.group_required = group_required;
    }

    fn tag_catalogues(&mut self) {
        let options = self.options;
        for spirv in self
            .reg
            .spirv_extensions
            .iter_mut()
            .chain(self.reg.spirv_capabilities.iter_mut())
        {
            spirv.emit = options.emit_spirv.is_match(&spirv.name);
        }
        for format in self.reg.formats.iter_mut() {
            format.emit = options.emit_formats.is_match(&format.name);
        }
    }
}
