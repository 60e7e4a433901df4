use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use crate::c;
use crate::normalize::{merge_apis, strip_nonmatching_apis};
use crate::options::GeneratorOptions;
use crate::registry::{NameKind, Registry};
use crate::tree::{self, Element};
use crate::types::*;
use crate::util::*;

//--------------------------------------------------------------------------------------------------
/// Parses the registry file at `path` and builds the model for
/// `options.apiname`.
pub fn parse_file(
    path: &std::path::Path,
    options: &GeneratorOptions,
) -> Result<(Registry, Vec<Error>), FatalError> {
    parse_tree(tree::read_file(path)?, options)
}

/// Parses a registry document from a stream and builds the model for
/// `options.apiname`.
pub fn parse_stream<T: Read>(
    stream: T,
    options: &GeneratorOptions,
) -> Result<(Registry, Vec<Error>), FatalError> {
    parse_tree(tree::read_stream(stream)?, options)
}

/// Normalizes an already read element tree and builds the model from it.
/// Merge mode is used when `options.merge_api_names` is not empty,
/// strip mode otherwise.
pub fn parse_tree(
    mut root: Element,
    options: &GeneratorOptions,
) -> Result<(Registry, Vec<Error>), FatalError> {
    if options.merge_api_names.is_empty() {
        strip_nonmatching_apis(&mut root, &options.apiname);
    } else {
        merge_apis(&mut root, &options.merge_api_names, &options.apiname)?;
    }

    let mut ctx = ParseCtx::new();
    let registry = build_registry(&mut ctx, &root)?;
    Ok((registry, ctx.errors))
}

//--------------------------------------------------------------------------------------------------
fn build_registry(ctx: &mut ParseCtx, root: &Element) -> Result<Registry, FatalError> {
    let mut reg = Registry::default();
    let mut features = Vec::new();
    let mut extensions = Vec::new();

    ctx.push_element("registry");
    match_elements! {ctx, child in root,
        "comment" | "vendorids" | "tags" | "videocodecs" => {},
        "platforms" => parse_platforms(ctx, &mut reg, child),
        "types" => parse_types(ctx, &mut reg, child)?,
        "enums" => if let Some((group, members)) = parse_group(ctx, child) {
            add_group(ctx, &mut reg, group, members);
        },
        "commands" => parse_commands(ctx, &mut reg, child)?,
        "feature" => features.push(child),
        "extensions" => extensions.extend(child.find_all("extension")),
        "formats" => parse_formats(ctx, &mut reg, child),
        "spirvextensions" => {
            reg.spirv_extensions = parse_spirv(ctx, child, "spirvextension");
        },
        "spirvcapabilities" => {
            reg.spirv_capabilities = parse_spirv(ctx, child, "spirvcapability");
        },
        "sync" => parse_sync(ctx, &mut reg, child)
    }

    // Versions and extensions inject enums into groups and tag commands,
    // so they are read once every group and command exists.
    ctx.push_element("feature");
    for element in features {
        if let Some(info) = parse_feature(ctx, element) {
            add_feature(ctx, &mut reg, info, element);
        }
    }
    ctx.pop_element();

    ctx.push_element("extensions");
    ctx.push_element("extension");
    for element in extensions {
        if let Some(info) = parse_extension(ctx, &reg.platforms, element) {
            add_feature(ctx, &mut reg, info, element);
        }
    }
    ctx.pop_element();
    ctx.pop_element();
    ctx.pop_element();

    reg.check_alias_cycles()?;
    reg.build_reverse_aliases();
    inherit_command_attributes(&mut reg);
    build_enum_to_type(&mut reg);
    check_references(ctx, &reg);
    check_group_values(ctx, &reg);

    Ok(reg)
}

//--------------------------------------------------------------------------------------------------
fn parse_platforms(ctx: &mut ParseCtx, reg: &mut Registry, element: &Element) {
    match_elements! {ctx, child in element,
        "platform" => {
            let name = child.attr("name");
            let protect = child.attr("protect");
            match (name, protect) {
                (Some(name), Some(protect)) => {
                    reg.platforms.insert(String::from(name), String::from(protect));
                }
                (None, _) => ctx.error(Error::MissingAttribute {
                    xpath: ctx.xpath.clone(),
                    name: String::from("name"),
                }),
                (_, None) => ctx.error(Error::MissingAttribute {
                    xpath: ctx.xpath.clone(),
                    name: String::from("protect"),
                }),
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
fn parse_types(ctx: &mut ParseCtx, reg: &mut Registry, element: &Element) -> Result<(), FatalError> {
    match_elements! {ctx, child in element,
        "comment" => {},
        "type" => if let Some(info) = parse_type(ctx, child)? {
            add_type(ctx, reg, info);
        }
    }
    Ok(())
}

fn parse_type(ctx: &mut ParseCtx, element: &Element) -> Result<Option<TypeInfo>, FatalError> {
    let mut name = None;
    let mut category = None;
    let mut api = Vec::new();
    let mut requires = None;
    let mut alias = None;
    let mut bitvalues = None;
    let mut parent = None;
    let mut returnedonly = false;
    let mut structextends = Vec::new();
    let mut comment = None;

    match_attributes! {ctx, a in element,
        "name"          => name          = Some(a.value.clone()),
        "category"      => category      = Some(a.value.as_str()),
        "api"           => api           = split_list(&a.value),
        "requires"      => requires      = Some(a.value.clone()),
        "alias"         => alias         = Some(a.value.clone()),
        "bitvalues"     => bitvalues     = Some(a.value.clone()),
        "parent"        => parent        = Some(a.value.clone()),
        "returnedonly"  => returnedonly  = a.value == "true",
        "structextends" => structextends = split_list(&a.value),
        "comment"       => comment       = Some(a.value.clone())
    }

    let name = match name.or_else(|| element.descendants("name").first().map(|e| e.text())) {
        Some(name) => name,
        None => {
            return Err(FatalError::SchemaViolation {
                xpath: ctx.xpath.clone(),
                desc: String::from("type has no name"),
            })
        }
    };

    let category = match TypeCategory::from_attribute(category) {
        Some(category) => category,
        None => {
            return Err(FatalError::SchemaViolation {
                xpath: ctx.xpath.clone(),
                desc: format!(
                    "type '{}' has unknown category '{}'",
                    name,
                    category.unwrap_or_default()
                ),
            })
        }
    };

    if alias.as_deref() == Some(name.as_str()) {
        ctx.error(Error::SelfAlias {
            kind: "type",
            name: name.clone(),
        });
        alias = None;
    }

    let mut type_refs = Vec::new();
    for t in element.descendants("type") {
        push_unique(&mut type_refs, t.text());
    }
    let mut enum_refs = Vec::new();
    for e in element.descendants("enum") {
        push_unique(&mut enum_refs, e.text());
    }

    let mut members = Vec::new();
    let mut code = String::new();
    match category {
        TypeCategory::Struct | TypeCategory::Union => {
            for member in element.find_all("member") {
                ctx.push_element("member");
                if let Some(decl) = parse_decl(ctx, member) {
                    members.push(decl);
                }
                ctx.pop_element();
            }
        }
        _ => code = c::normalize_code(&element.text_without(&["comment"])),
    }

    Ok(Some(TypeInfo {
        name,
        category,
        api,
        requires,
        alias,
        bitvalues,
        parent,
        returnedonly,
        structextends,
        type_refs,
        enum_refs,
        members,
        code,
        comment,
        ..TypeInfo::default()
    }))
}

fn add_type(ctx: &mut ParseCtx, reg: &mut Registry, info: TypeInfo) {
    if reg.types.contains_key(&info.name) {
        ctx.error(Error::DuplicateDefinition {
            kind: "type",
            name: info.name,
        });
        return;
    }
    if let Some(alias) = &info.alias {
        reg.add_alias(NameKind::Type, &info.name, alias);
    }
    reg.types.insert(info.name.clone(), info);
}

/// A `<member>`, `<param>` or `<proto>` declaration.
fn parse_decl(ctx: &mut ParseCtx, element: &Element) -> Option<Decl> {
    let mut len = None;
    let mut altlen = None;
    let mut optional = None;
    let mut externsync = None;
    let mut values = None;
    let mut api = Vec::new();

    match_attributes! {ctx, a in element,
        "len"        => len        = Some(a.value.clone()),
        "altlen"     => altlen     = Some(a.value.clone()),
        "optional"   => optional   = Some(a.value.clone()),
        "externsync" => externsync = Some(a.value.clone()),
        "values"     => values     = Some(a.value.clone()),
        "api"        => api        = split_list(&a.value)
    }

    let name = match element.child_text("name") {
        Some(name) => name,
        None => {
            ctx.error(Error::MissingElement {
                xpath: ctx.xpath.clone(),
                name: String::from("name"),
            });
            return None;
        }
    };
    let type_name = element.child_text("type").unwrap_or_default();
    let code = c::normalize_code(&element.text_without(&["comment"]));
    let declarator = c::parse_declarator(&code, &name);

    Some(Decl {
        name,
        type_name,
        is_const: declarator.is_const,
        pointer_depth: declarator.pointer_depth,
        array: declarator.array,
        bitfield_width: declarator.bitfield_width,
        len,
        altlen,
        optional,
        externsync,
        values,
        api,
        code,
    })
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}

//--------------------------------------------------------------------------------------------------
/// Where an enum defined inside a `<require>` block comes from.
struct EnumOrigin<'a> {
    feature: &'a str,
    is_version: bool,
    number: Option<i64>,
    supported: &'a [String],
}

fn defines_value(element: &Element) -> bool {
    ["value", "bitpos", "offset", "alias"]
        .iter()
        .any(|a| element.attr(a).is_some())
}

fn parse_group(ctx: &mut ParseCtx, element: &Element) -> Option<(GroupInfo, Vec<EnumInfo>)> {
    let mut name = None;
    let mut kind = None;
    let mut bitwidth = None;
    let mut comment = None;

    match_attributes! {ctx, a in element,
        "name"     => name     = Some(a.value.as_str()),
        "type"     => kind     = Some(a.value.as_str()),
        "bitwidth" => bitwidth = Some(a.value.as_str()),
        "comment"  => comment  = Some(a.value.clone())
    }

    unwrap_attribute!(ctx, enums, name);

    let kind = match kind {
        None => GroupKind::Constants,
        Some("enum") => GroupKind::Enum,
        Some("bitmask") => GroupKind::Bitmask,
        Some(other) => {
            ctx.error(Error::UnexpectedAttributeValue {
                xpath: ctx.xpath.clone(),
                name: String::from("type"),
                value: String::from(other),
            });
            GroupKind::Enum
        }
    };
    let bitwidth = match bitwidth {
        Some(text) => parse_integer(ctx, text).unwrap_or(32) as u32,
        None => 32,
    };

    let mut members = Vec::new();
    match_elements! {ctx, child in element,
        "enum" => if let Some(mut info) = parse_enum(ctx, child, None) {
            info.group = Some(String::from(name));
            members.push(info);
        },
        "unused" | "comment" => {}
    }

    Some((
        GroupInfo {
            name: String::from(name),
            kind,
            bitwidth,
            enums: Vec::new(),
            comment,
        },
        members,
    ))
}

fn add_group(ctx: &mut ParseCtx, reg: &mut Registry, group: GroupInfo, members: Vec<EnumInfo>) {
    if reg.groups.contains_key(&group.name) {
        ctx.error(Error::DuplicateDefinition {
            kind: "group",
            name: group.name,
        });
        return;
    }
    let name = group.name.clone();
    reg.groups.insert(name.clone(), group);
    for info in members {
        let member = info.name.clone();
        if add_enum(ctx, reg, info) {
            if let Some(group) = reg.groups.get_mut(&name) {
                group.enums.push(member);
            }
        }
    }
}

fn parse_enum(ctx: &mut ParseCtx, element: &Element, origin: Option<&EnumOrigin>) -> Option<EnumInfo> {
    let mut name = None;
    let mut value = None;
    let mut bitpos = None;
    let mut offset = None;
    let mut extnumber = None;
    let mut dir = None;
    let mut alias = None;
    let mut type_name = None;
    let mut api = Vec::new();
    let mut extends = None;
    let mut comment = None;

    match_attributes! {ctx, a in element,
        "name"      => name      = Some(a.value.as_str()),
        "value"     => value     = Some(a.value.as_str()),
        "bitpos"    => bitpos    = Some(a.value.as_str()),
        "offset"    => offset    = Some(a.value.as_str()),
        "extnumber" => extnumber = Some(a.value.as_str()),
        "dir"       => dir       = Some(a.value.as_str()),
        "alias"     => alias     = Some(a.value.as_str()),
        "type"      => type_name = Some(a.value.clone()),
        "api"       => api       = split_list(&a.value),
        "extends"   => extends   = Some(a.value.clone()),
        "comment"   => comment   = Some(a.value.clone())
    }

    unwrap_attribute!(ctx, enum_value, name);

    let value = if let Some(alias) = alias {
        if alias == name {
            ctx.error(Error::SelfAlias {
                kind: "enum",
                name: String::from(name),
            });
            return None;
        }
        EnumValue::Alias(String::from(alias))
    } else if let Some(value) = value {
        EnumValue::Literal(String::from(value))
    } else if let Some(bitpos) = bitpos {
        match parse_integer(ctx, bitpos)? {
            pos @ 0..=63 => EnumValue::Bitpos(pos as u32),
            _ => {
                ctx.error(Error::UnexpectedAttributeValue {
                    xpath: ctx.xpath.clone(),
                    name: String::from("bitpos"),
                    value: String::from(bitpos),
                });
                return None;
            }
        }
    } else if let Some(offset) = offset {
        let offset = parse_integer(ctx, offset)?;
        let extnumber = match (extnumber, origin.and_then(|o| o.number)) {
            (Some(text), _) => parse_integer(ctx, text)?,
            (None, Some(number)) => number,
            (None, None) => {
                ctx.error(Error::MissingAttribute {
                    xpath: ctx.xpath.clone(),
                    name: String::from("extnumber"),
                });
                return None;
            }
        };
        EnumValue::Offset {
            extnumber,
            offset,
            negative: dir == Some("-"),
        }
    } else {
        ctx.error(Error::SchemaViolation {
            xpath: ctx.xpath.clone(),
            desc: format!("enum '{}' has no value", name),
        });
        return None;
    };

    let mut info = EnumInfo::new(String::from(name), value);
    info.group = extends.clone();
    info.extends = extends;
    info.type_name = type_name;
    info.api = api;
    info.comment = comment;
    if let Some(origin) = origin {
        if origin.is_version {
            info.version = Some(String::from(origin.feature));
        } else {
            info.extname = Some(String::from(origin.feature));
        }
        info.supported = origin.supported.to_vec();
        info.injectors.push(EnumInjector {
            feature: String::from(origin.feature),
            is_version: origin.is_version,
            supported: origin.supported.to_vec(),
        });
    }
    Some(info)
}

/// Adds an enum to the dictionary, and to the group it extends. Returns
/// false when the name was already defined.
fn add_enum(ctx: &mut ParseCtx, reg: &mut Registry, info: EnumInfo) -> bool {
    if let Some(existing) = reg.enums.get_mut(&info.name) {
        let same_group = info.extends.is_some() && existing.group == info.group;
        if existing.is_equivalent(&info) || (same_group && existing.value == info.value) {
            log::debug!("enum {} is defined again with the same value", info.name);
            for injector in info.injectors {
                if !existing.injectors.iter().any(|i| i.feature == injector.feature) {
                    existing.injectors.push(injector);
                }
            }
        } else if same_group {
            ctx.error(Error::DuplicateGroupEnum {
                group: info.group.unwrap_or_default(),
                name: info.name,
            });
        } else {
            ctx.error(Error::DuplicateDefinition {
                kind: "enum",
                name: info.name,
            });
        }
        return false;
    }

    if let (Some(_), Some(group_name)) = (&info.extends, &info.group) {
        match reg.groups.get_mut(group_name) {
            Some(group) => group.enums.push(info.name.clone()),
            None => ctx.error(Error::DanglingReference {
                kind: "enum",
                name: info.name.clone(),
                target: group_name.clone(),
            }),
        }
    }
    if let EnumValue::Alias(target) = &info.value {
        reg.add_alias(NameKind::Enum, &info.name, target);
    }
    reg.enums.insert(info.name.clone(), info);
    true
}

//--------------------------------------------------------------------------------------------------
fn parse_commands(ctx: &mut ParseCtx, reg: &mut Registry, element: &Element) -> Result<(), FatalError> {
    match_elements! {ctx, child in element,
        "command" => if let Some(info) = parse_command(ctx, child)? {
            if reg.commands.contains_key(&info.name) {
                ctx.error(Error::DuplicateDefinition {
                    kind: "command",
                    name: info.name,
                });
            } else {
                if let Some(alias) = info.alias() {
                    reg.add_alias(NameKind::Command, &info.name, alias);
                }
                reg.commands.insert(info.name.clone(), info);
            }
        }
    }
    Ok(())
}

fn parse_command(ctx: &mut ParseCtx, element: &Element) -> Result<Option<CmdInfo>, FatalError> {
    let mut name = None;
    let mut alias = None;
    let mut queues = None;
    let mut successcodes = Vec::new();
    let mut errorcodes = Vec::new();
    let mut export = Vec::new();
    let mut api = Vec::new();
    let mut comment = None;

    match_attributes! {ctx, a in element,
        "name"         => name         = Some(a.value.clone()),
        "alias"        => alias        = Some(a.value.clone()),
        "queues"       => queues       = Some(a.value.as_str()),
        "successcodes" => successcodes = split_list(&a.value),
        "errorcodes"   => errorcodes   = split_list(&a.value),
        "export"       => export       = split_list(&a.value),
        "api"          => api          = split_list(&a.value),
        "comment"      => comment      = Some(a.value.clone())
    }

    let name = match name.or_else(|| element.find("proto").and_then(|p| p.child_text("name"))) {
        Some(name) => name,
        None => {
            return Err(FatalError::SchemaViolation {
                xpath: ctx.xpath.clone(),
                desc: String::from("command has no name"),
            })
        }
    };

    let mut counters = Vec::new();
    let body = if let Some(alias) = alias {
        if alias == name {
            ctx.error(Error::SelfAlias {
                kind: "command",
                name,
            });
            return Ok(None);
        }
        CommandBody::AliasOf(alias)
    } else {
        let mut proto = None;
        let mut params = Vec::new();
        match_elements! {ctx, child in element,
            "proto" => proto = parse_decl(ctx, child),
            "param" => if let Some(param) = parse_decl(ctx, child) {
                params.push(param);
            },
            "description" | "implicitexternsyncparams" => {}
        }
        let proto = match proto {
            Some(proto) => proto,
            None => {
                ctx.error(Error::MissingElement {
                    xpath: ctx.xpath.clone(),
                    name: String::from("proto"),
                });
                return Ok(None);
            }
        };

        let lengths: BTreeSet<&str> = params
            .iter()
            .filter_map(|p| p.len.as_deref())
            .flat_map(|len| len.split(','))
            .map(|len| len.trim())
            .collect();
        counters = params
            .iter()
            .filter(|p| lengths.contains(p.name.as_str()))
            .map(|p| p.name.clone())
            .collect();

        CommandBody::Definition(CommandDefinition { proto, params })
    };

    let mut queue_flags = CommandQueue::empty();
    for queue in queues.map(split_list).unwrap_or_default() {
        match CommandQueue::from_xml_name(&queue) {
            Some(flag) => queue_flags |= flag,
            None => ctx.error(Error::UnexpectedAttributeValue {
                xpath: ctx.xpath.clone(),
                name: String::from("queues"),
                value: queue,
            }),
        }
    }

    let mut info = CmdInfo::new(name, body);
    info.api = api;
    info.queues = queue_flags;
    info.successcodes = successcodes;
    info.errorcodes = errorcodes;
    info.export = export;
    info.counters = counters;
    info.comment = comment;
    Ok(Some(info))
}

//--------------------------------------------------------------------------------------------------
fn parse_feature(ctx: &mut ParseCtx, element: &Element) -> Option<FeatureInfo> {
    let mut name = None;
    let mut api = Vec::new();
    let mut number = None;
    let mut sortorder = None;
    let mut depends = None;
    let mut comment = None;

    match_attributes! {ctx, a in element,
        "name"      => name      = Some(a.value.as_str()),
        "api"       => api       = split_list(&a.value),
        "number"    => number    = Some(a.value.clone()),
        "sortorder" => sortorder = Some(a.value.as_str()),
        "depends"   => depends   = Some(a.value.clone()),
        "comment"   => comment   = Some(a.value.clone())
    }

    unwrap_attribute!(ctx, feature, name);
    unwrap_attribute!(ctx, feature, number);
    let sortorder = sortorder.and_then(|text| parse_integer(ctx, text)).unwrap_or(0);
    let (requires, removes, deprecates) = parse_feature_blocks(ctx, element);

    Some(FeatureInfo {
        name: String::from(name),
        kind: FeatureKind::Version { number },
        api,
        protect: None,
        sortorder,
        depends,
        comment,
        requires,
        removes,
        deprecates,
        emit: false,
    })
}

fn parse_extension(
    ctx: &mut ParseCtx,
    platforms: &BTreeMap<String, String>,
    element: &Element,
) -> Option<FeatureInfo> {
    let mut name = None;
    let mut number = None;
    let mut ext_type = None;
    let mut supported = Vec::new();
    let mut platform = None;
    let mut protect = None;
    let mut provisional = None;
    let mut promotedto = None;
    let mut deprecatedby = None;
    let mut obsoletedby = None;
    let mut specialuse = Vec::new();
    let mut sortorder = None;
    let mut depends = None;
    let mut requires = None;
    let mut requires_core = None;
    let mut comment = None;

    match_attributes! {ctx, a in element,
        "name"         => name          = Some(a.value.as_str()),
        "number"       => number        = Some(a.value.as_str()),
        "type"         => ext_type      = Some(a.value.as_str()),
        "supported"    => supported     = split_list(&a.value),
        "platform"     => platform      = Some(a.value.as_str()),
        "protect"      => protect       = Some(a.value.clone()),
        "provisional"  => provisional   = Some(a.value.as_str()),
        "promotedto"   => promotedto    = Some(a.value.clone()),
        "deprecatedby" => deprecatedby  = Some(a.value.clone()),
        "obsoletedby"  => obsoletedby   = Some(a.value.clone()),
        "specialuse"   => specialuse    = split_list(&a.value),
        "sortorder"    => sortorder     = Some(a.value.as_str()),
        "depends"      => depends       = Some(a.value.clone()),
        "requires"     => requires      = Some(a.value.as_str()),
        "requiresCore" => requires_core = Some(a.value.as_str()),
        "comment"      => comment       = Some(a.value.clone())
    }

    unwrap_attribute!(ctx, extension, name);

    let number = number.and_then(|text| parse_integer(ctx, text)).unwrap_or(0);
    let sortorder = sortorder.and_then(|text| parse_integer(ctx, text)).unwrap_or(0);

    let ext_type = match ext_type {
        None => None,
        Some("instance") => Some(ExtensionType::Instance),
        Some("device") => Some(ExtensionType::Device),
        Some(other) => {
            ctx.error(Error::UnexpectedAttributeValue {
                xpath: ctx.xpath.clone(),
                name: String::from("type"),
                value: String::from(other),
            });
            None
        }
    };

    let provisional = match provisional {
        Some("true") => true,
        None => false,
        Some(value) => {
            ctx.error(Error::SchemaViolation {
                xpath: ctx.xpath.clone(),
                desc: format!("Unexpected value of 'provisional' attribute: {}", value),
            });
            false
        }
    };

    let protect = match (protect, platform) {
        (Some(protect), _) => Some(protect),
        (None, Some(platform)) => match platforms.get(platform) {
            Some(protect) => Some(protect.clone()),
            None => {
                ctx.error(Error::DanglingReference {
                    kind: "extension",
                    name: String::from(name),
                    target: String::from(platform),
                });
                None
            }
        },
        (None, None) => None,
    };
    let protect = protect.or_else(|| {
        if provisional {
            Some(String::from("VK_ENABLE_BETA_EXTENSIONS"))
        } else {
            None
        }
    });

    // Older registries spell the dependencies as `requiresCore` plus a
    // `requires` list; both must hold.
    let depends = depends.or_else(|| {
        let mut terms: Vec<String> = requires_core
            .map(|v| format!("VK_VERSION_{}", v.replace('.', "_")))
            .into_iter()
            .collect();
        terms.extend(requires.map(split_list).unwrap_or_default());
        if terms.is_empty() {
            None
        } else {
            Some(terms.join("+"))
        }
    });

    let category = String::from(name.split('_').nth(1).unwrap_or(""));
    let (requires, removes, deprecates) = parse_feature_blocks(ctx, element);

    Some(FeatureInfo {
        name: String::from(name),
        kind: FeatureKind::Extension(ExtensionDetails {
            number,
            ext_type,
            supported,
            category,
            platform: platform.map(String::from),
            promotedto,
            deprecatedby,
            obsoletedby,
            provisional,
            specialuse,
        }),
        api: Vec::new(),
        protect,
        sortorder,
        depends,
        comment,
        requires,
        removes,
        deprecates,
        emit: false,
    })
}

fn parse_feature_blocks(
    ctx: &mut ParseCtx,
    element: &Element,
) -> (Vec<RequireBlock>, Vec<RequireBlock>, Vec<DeprecateBlock>) {
    let mut requires = Vec::new();
    let mut removes = Vec::new();
    let mut deprecates = Vec::new();
    match_elements! {ctx, child in element,
        "require" => requires.push(parse_require_block(ctx, child)),
        "remove" => removes.push(parse_require_block(ctx, child)),
        "deprecate" => deprecates.push(parse_deprecate_block(ctx, child))
    }
    (requires, removes, deprecates)
}

fn parse_require_block(ctx: &mut ParseCtx, element: &Element) -> RequireBlock {
    let mut api = Vec::new();
    let mut profile = None;
    let mut depends = None;
    let mut feature = None;
    let mut extension = None;
    let mut comment = None;

    match_attributes! {ctx, a in element,
        "api"       => api       = split_list(&a.value),
        "profile"   => profile   = Some(a.value.clone()),
        "depends"   => depends   = Some(a.value.clone()),
        "feature"   => feature   = Some(a.value.clone()),
        "extension" => extension = Some(a.value.clone()),
        "comment"   => comment   = Some(a.value.clone())
    }

    let depends = depends.or_else(|| {
        let terms: Vec<String> = feature.into_iter().chain(extension).collect();
        if terms.is_empty() {
            None
        } else {
            Some(terms.join("+"))
        }
    });

    RequireBlock {
        api,
        profile,
        depends,
        comment,
        items: parse_interface_items(ctx, element),
    }
}

fn parse_deprecate_block(ctx: &mut ParseCtx, element: &Element) -> DeprecateBlock {
    let mut api = Vec::new();
    let mut profile = None;
    let mut explanationlink = None;

    match_attributes! {ctx, a in element,
        "api"             => api             = split_list(&a.value),
        "profile"         => profile         = Some(a.value.clone()),
        "explanationlink" => explanationlink = Some(a.value.clone())
    }

    DeprecateBlock {
        api,
        profile,
        explanationlink,
        items: parse_interface_items(ctx, element),
    }
}

fn parse_interface_items(ctx: &mut ParseCtx, element: &Element) -> Vec<InterfaceItem> {
    let mut items = Vec::new();
    match_elements! {ctx, child in element,
        "comment" => {},
        "type" | "enum" | "command" | "extend" | "usage" | "feature" => {
            if let Some(item) = parse_interface_item(ctx, child) {
                items.push(item);
            }
        }
    }
    items
}

fn parse_interface_item(ctx: &mut ParseCtx, element: &Element) -> Option<InterfaceItem> {
    let name = element.attr("name");
    match element.name.as_str() {
        "type" => {
            unwrap_attribute!(ctx, item, name);
            Some(InterfaceItem::Type {
                name: String::from(name),
            })
        }
        "enum" => {
            unwrap_attribute!(ctx, item, name);
            Some(InterfaceItem::Enum {
                name: String::from(name),
                extends: element.attr("extends").map(String::from),
            })
        }
        "command" => {
            unwrap_attribute!(ctx, item, name);
            Some(InterfaceItem::Command {
                name: String::from(name),
            })
        }
        "extend" => {
            unwrap_attribute!(ctx, item, name);
            Some(InterfaceItem::Extend {
                kind: String::from(element.attr("type").unwrap_or("")),
                name: String::from(name),
                successcodes: attr_list(element, "successcodes"),
                errorcodes: attr_list(element, "errorcodes"),
            })
        }
        "usage" => Some(InterfaceItem::Usage {
            command: element.attr("command").map(String::from),
            struct_: element.attr("struct").map(String::from),
            text: normalize_whitespace(&element.text()),
        }),
        "feature" => {
            unwrap_attribute!(ctx, item, name);
            let struct_ = element.attr("struct");
            unwrap_attribute!(ctx, item, struct_);
            Some(InterfaceItem::Feature {
                name: String::from(name),
                struct_: String::from(struct_),
            })
        }
        _ => None,
    }
}

/// Injects the enums defined by the feature's `<require>` blocks, tags the
/// commands it requires, then records the feature.
fn add_feature(ctx: &mut ParseCtx, reg: &mut Registry, info: FeatureInfo, element: &Element) {
    if reg.feature_index.contains_key(&info.name) {
        ctx.error(Error::DuplicateDefinition {
            kind: "feature",
            name: info.name,
        });
        return;
    }

    let supported: &[String] = match &info.kind {
        FeatureKind::Extension(ext) => &ext.supported,
        FeatureKind::Version { .. } => &[],
    };
    let origin = EnumOrigin {
        feature: &info.name,
        is_version: info.is_version(),
        number: info.extension().map(|ext| ext.number),
        supported,
    };

    for require in element.find_all("require") {
        ctx.push_element("require");
        for child in require.elements() {
            match child.name.as_str() {
                "enum" if defines_value(child) => {
                    ctx.push_element("enum");
                    if let Some(mut enum_info) = parse_enum(ctx, child, Some(&origin)) {
                        if let Some(extends) = &enum_info.extends {
                            let group = reg.resolve(NameKind::Type, extends);
                            enum_info.group = Some(String::from(group));
                        }
                        add_enum(ctx, reg, enum_info);
                    }
                    ctx.pop_element();
                }
                "command" => {
                    if let Some(name) = child.attr("name") {
                        match reg.commands.get_mut(name) {
                            Some(cmd) if origin.is_version => {
                                if cmd.version.is_none() {
                                    cmd.version = Some(info.name.clone());
                                }
                            }
                            Some(cmd) => {
                                if !cmd.extensions.contains(&info.name) {
                                    cmd.extensions.push(info.name.clone());
                                }
                            }
                            None => ctx.error(Error::Undefined {
                                kind: "command",
                                name: String::from(name),
                            }),
                        }
                    }
                }
                _ => {}
            }
        }
        ctx.pop_element();
    }

    reg.feature_index
        .insert(info.name.clone(), reg.features.len());
    reg.features.push(info);
}

//--------------------------------------------------------------------------------------------------
fn parse_formats(ctx: &mut ParseCtx, reg: &mut Registry, element: &Element) {
    match_elements! {ctx, child in element,
        "format" => if let Some(format) = parse_format(ctx, child) {
            reg.formats.push(format);
        }
    }
}

fn parse_format(ctx: &mut ParseCtx, element: &Element) -> Option<FormatInfo> {
    let mut format = FormatInfo::default();
    let mut name = None;

    match_attributes! {ctx, a in element,
        "name"           => name                    = Some(a.value.clone()),
        "class"          => format.class            = a.value.clone(),
        "blockSize"      => format.blocksize        = parse_integer(ctx, &a.value).unwrap_or(0) as u32,
        "texelsPerBlock" => format.texels_per_block = parse_integer(ctx, &a.value).unwrap_or(0) as u32,
        "blockExtent"    => format.block_extent     = Some(a.value.clone()),
        "packed"         => format.packed           = parse_integer(ctx, &a.value).map(|v| v as u32),
        "compressed"     => format.compressed       = Some(a.value.clone()),
        "chroma"         => format.chroma           = Some(a.value.clone())
    }

    unwrap_attribute!(ctx, format, name);
    format.name = name;

    match_elements! {ctx, child in element,
        "component" => {
            let mut component = FormatComponent::default();
            match_attributes! {ctx, a in child,
                "name"          => component.name           = a.value.clone(),
                "bits"          => component.bits           = a.value.clone(),
                "numericFormat" => component.numeric_format = a.value.clone(),
                "planeIndex"    => component.plane_index    = parse_integer(ctx, &a.value).map(|v| v as u32)
            }
            format.components.push(component);
        },
        "plane" => {
            let mut plane = FormatPlane::default();
            match_attributes! {ctx, a in child,
                "index"         => plane.index          = parse_integer(ctx, &a.value).unwrap_or(0) as u32,
                "widthDivisor"  => plane.width_divisor  = parse_integer(ctx, &a.value).unwrap_or(1) as u32,
                "heightDivisor" => plane.height_divisor = parse_integer(ctx, &a.value).unwrap_or(1) as u32,
                "compatible"    => plane.compatible     = a.value.clone()
            }
            format.planes.push(plane);
        },
        "spirvimageformat" => format.spirv_image_format = child.attr("name").map(String::from)
    }

    Some(format)
}

fn parse_spirv(ctx: &mut ParseCtx, element: &Element, tag: &str) -> Vec<SpirvInfo> {
    let mut result = Vec::new();
    for child in element.elements() {
        ctx.push_element(&child.name);
        if child.name == tag {
            if let Some(name) = child.attr("name") {
                let enables = child
                    .find_all("enable")
                    .filter_map(|e| parse_spirv_enable(ctx, e))
                    .collect();
                result.push(SpirvInfo {
                    name: String::from(name),
                    enables,
                    emit: false,
                });
            } else {
                ctx.error(Error::MissingAttribute {
                    xpath: ctx.xpath.clone(),
                    name: String::from("name"),
                });
            }
        } else {
            ctx.error(Error::UnexpectedElement {
                xpath: ctx.xpath.clone(),
                name: child.name.clone(),
            });
        }
        ctx.pop_element();
    }
    result
}

fn parse_spirv_enable(ctx: &mut ParseCtx, element: &Element) -> Option<SpirvEnable> {
    let attr = |name: &str| element.attr(name).map(String::from);
    if let Some(version) = attr("version") {
        Some(SpirvEnable::Version(version))
    } else if let Some(extension) = attr("extension") {
        Some(SpirvEnable::Extension(extension))
    } else if let (Some(struct_), Some(feature)) = (attr("struct"), attr("feature")) {
        Some(SpirvEnable::Feature {
            struct_,
            feature,
            requires: attr("requires"),
            alias: attr("alias"),
        })
    } else if let (Some(property), Some(member), Some(value)) =
        (attr("property"), attr("member"), attr("value"))
    {
        Some(SpirvEnable::Property {
            property,
            member,
            value,
            requires: attr("requires"),
        })
    } else {
        ctx.error(Error::SchemaViolation {
            xpath: ctx.xpath.clone(),
            desc: String::from("<enable> names no version, extension, feature or property"),
        });
        None
    }
}

fn parse_sync(ctx: &mut ParseCtx, reg: &mut Registry, element: &Element) {
    match_elements! {ctx, child in element,
        "comment" => {},
        "syncstage" => {
            let name = child.attr("name");
            if let Some(name) = name {
                let mut stage = SyncStageInfo {
                    name: String::from(name),
                    alias: child.attr("alias").map(String::from),
                    ..SyncStageInfo::default()
                };
                for support in child.find_all("syncsupport") {
                    stage.support_queues.extend(attr_list(support, "queues"));
                }
                for equivalent in child.find_all("syncequivalent") {
                    stage.equivalent.extend(attr_list(equivalent, "stage"));
                }
                reg.sync_stages.push(stage);
            }
        },
        "syncaccess" => {
            let name = child.attr("name");
            if let Some(name) = name {
                let mut access = SyncAccessInfo {
                    name: String::from(name),
                    alias: child.attr("alias").map(String::from),
                    ..SyncAccessInfo::default()
                };
                for support in child.find_all("syncsupport") {
                    access.support_stages.extend(attr_list(support, "stage"));
                }
                for equivalent in child.find_all("syncequivalent") {
                    access.equivalent.extend(attr_list(equivalent, "access"));
                }
                reg.sync_access.push(access);
            }
        },
        "syncpipeline" => {
            let name = child.attr("name");
            if let Some(name) = name {
                let stages = child
                    .find_all("syncpipelinestage")
                    .map(|s| SyncPipelineStage {
                        stage: normalize_whitespace(&s.text()),
                        order: s.attr("order").map(String::from),
                        before: s.attr("before").map(String::from),
                        after: s.attr("after").map(String::from),
                    })
                    .collect();
                reg.sync_pipelines.push(SyncPipelineInfo {
                    name: String::from(name),
                    depends: child.attr("depends").map(String::from),
                    stages,
                });
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
/// Aliases without their own export list take their target's. Commands
/// only available through extensions take the guard of the first one.
fn inherit_command_attributes(reg: &mut Registry) {
    let mut exports = Vec::new();
    let mut protects = Vec::new();
    for info in reg.commands.values() {
        if info.alias().is_some() && info.export.is_empty() {
            let target = reg.resolve(NameKind::Command, &info.name);
            if let Some(target) = reg.commands.get(target) {
                if !target.export.is_empty() {
                    exports.push((info.name.clone(), target.export.clone()));
                }
            }
        }
        if info.version.is_none() {
            let protect = info
                .extensions
                .first()
                .and_then(|ext| reg.feature(ext))
                .and_then(|f| f.protect.clone());
            if protect.is_some() {
                protects.push((info.name.clone(), protect));
            }
        }
    }
    for (name, export) in exports {
        if let Some(info) = reg.commands.get_mut(&name) {
            info.export = export;
        }
    }
    for (name, protect) in protects {
        if let Some(info) = reg.commands.get_mut(&name) {
            info.protect = protect;
        }
    }
}

fn build_enum_to_type(reg: &mut Registry) {
    let mut map = BTreeMap::new();
    for group in reg.groups.values() {
        if group.kind == GroupKind::Constants {
            continue;
        }
        for name in group.enums.iter() {
            map.insert(name.clone(), group.name.clone());
        }
    }
    reg.enum_to_type = map;
}

/// Reports references the model cannot follow. They are left in place and
/// skipped during selection.
fn check_references(ctx: &mut ParseCtx, reg: &Registry) {
    for info in reg.types.values() {
        let targets = info
            .requires
            .iter()
            .chain(info.alias.iter())
            .chain(info.bitvalues.iter());
        for target in targets {
            if !reg.types.contains_key(target) {
                ctx.error(Error::DanglingReference {
                    kind: "type",
                    name: info.name.clone(),
                    target: target.clone(),
                });
            }
        }
    }

    for info in reg.commands.values() {
        match &info.body {
            CommandBody::AliasOf(target) => {
                if !reg.commands.contains_key(target) {
                    ctx.error(Error::DanglingReference {
                        kind: "command",
                        name: info.name.clone(),
                        target: target.clone(),
                    });
                }
            }
            CommandBody::Definition(def) => {
                for type_name in def.type_refs() {
                    if !reg.types.contains_key(reg.resolve(NameKind::Type, type_name)) {
                        ctx.error(Error::DanglingReference {
                            kind: "command",
                            name: info.name.clone(),
                            target: String::from(type_name),
                        });
                    }
                }
            }
        }
    }

    for info in reg.enums.values() {
        if let EnumValue::Alias(target) = &info.value {
            if !reg.enums.contains_key(target) {
                ctx.error(Error::DanglingReference {
                    kind: "enum",
                    name: info.name.clone(),
                    target: target.clone(),
                });
            }
        }
    }
}

/// Two distinct non-alias members of one group must not share a value.
fn check_group_values(ctx: &mut ParseCtx, reg: &Registry) {
    for group in reg.groups.values() {
        if group.kind == GroupKind::Constants {
            continue;
        }
        let mut seen: BTreeMap<i128, &str> = BTreeMap::new();
        for name in group.enums.iter() {
            let value = match reg.enums.get(name).and_then(|e| e.value.numeric_value()) {
                Some(value) => value,
                None => continue,
            };
            match seen.entry(value) {
                Entry::Occupied(other) => ctx.error(Error::ValueCollision {
                    group: group.name.clone(),
                    name: name.clone(),
                    other: String::from(*other.get()),
                    value,
                }),
                Entry::Vacant(slot) => {
                    slot.insert(name);
                }
            }
        }
    }
}
