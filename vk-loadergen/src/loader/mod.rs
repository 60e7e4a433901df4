//! Generator for the dispatch-table and trampoline sources of the Vulkan
//! loader.
//!
//! The generator only records commands while the emitter walks the
//! selected features; every artifact is written in `end_file`, once all
//! features are known.

mod header;
mod layer;
pub mod names;
mod source;
mod tramp;

use std::io::{self, Write};

use crate::c;
use crate::emit::{Diagnostics, Generator};
use crate::options::GeneratorOptions;
use crate::registry::{NameKind, Registry};
use crate::types::*;

/// Text artifacts the loader generator produces, selected by
/// `GeneratorOptions::filename`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// `vk_loader_extensions.h`
    LoaderHeader,
    /// `vk_loader_extensions.c`
    LoaderSource,
    /// `vk_layer_dispatch_table.h`
    LayerDispatchTable,
}

impl Artifact {
    pub const ALL: [Artifact; 3] = [
        Artifact::LoaderHeader,
        Artifact::LoaderSource,
        Artifact::LayerDispatchTable,
    ];

    pub fn filename(&self) -> &'static str {
        match self {
            Artifact::LoaderHeader => "vk_loader_extensions.h",
            Artifact::LoaderSource => "vk_loader_extensions.c",
            Artifact::LayerDispatchTable => "vk_layer_dispatch_table.h",
        }
    }

    pub fn from_filename(name: &str) -> Option<Artifact> {
        Artifact::ALL.iter().copied().find(|a| a.filename() == name)
    }
}

//--------------------------------------------------------------------------------------------------
/// A version or extension as the loader sees it.
#[derive(Debug, Clone)]
pub(crate) struct FeatureData {
    pub name: String,
    /// Version number like `1.0`; `None` for extensions.
    pub version: Option<String>,
    pub ext_type: Option<ExtensionType>,
    pub protect: Option<String>,
    /// `VK_..._EXTENSION_NAME` constant of an extension.
    pub name_define: Option<String>,
    pub commands: Vec<CommandData>,
}

impl FeatureData {
    pub fn is_core(&self) -> bool {
        self.version.is_some()
    }

    /// Text of the `// ---- ...` comment opening a section of this feature.
    pub fn title(&self) -> String {
        match &self.version {
            Some(version) => format!("Core Vulkan {}", version),
            None => format!("{} extension", self.name),
        }
    }

    pub fn is_instance_extension(&self) -> bool {
        self.ext_type == Some(ExtensionType::Instance)
    }

    /// Whether trampolines and terminators of this extension are generated
    /// rather than written by hand.
    pub fn has_generated_entry_points(&self) -> bool {
        !self.is_core()
            && !names::contains(names::WSI_EXT_NAMES, &self.name)
            && !names::contains(names::AVOID_EXT_NAMES, &self.name)
    }

    /// Instance extensions tracked in `loader_instance_extension_enable_list`.
    pub fn has_enable_flag(&self) -> bool {
        self.is_instance_extension() && !names::contains(names::WSI_EXT_NAMES, &self.name)
    }

    pub fn name_literal(&self) -> String {
        match &self.name_define {
            Some(define) => define.clone(),
            None => format!("\"{}\"", self.name),
        }
    }
}

/// A command with its signature resolved through aliases.
#[derive(Debug, Clone)]
pub(crate) struct CommandData {
    pub name: String,
    /// Command this one aliases, fully resolved.
    pub canonical: String,
    pub level: CommandLevel,
    /// Type of the first parameter, aliases resolved.
    pub handle: String,
    pub protect: Option<String>,
    pub return_type: String,
    pub params: Vec<Decl>,
}

impl CommandData {
    /// Name without the `vk` prefix, as used for dispatch table fields.
    pub fn stem(&self) -> &str {
        self.name.strip_prefix("vk").unwrap_or(&self.name)
    }

    pub fn canonical_stem(&self) -> &str {
        self.canonical.strip_prefix("vk").unwrap_or(&self.canonical)
    }

    pub fn is_alias(&self) -> bool {
        self.canonical != self.name
    }

    pub fn in_device_table(&self) -> bool {
        self.level == CommandLevel::Device
    }

    pub fn in_instance_table(&self) -> bool {
        !self.in_device_table()
    }

    pub fn needs_terminator(&self) -> bool {
        names::needs_terminator(&self.name, self.level)
    }

    /// Instance-table commands with a terminator in `instance_disp`.
    pub fn in_instance_disp(&self) -> bool {
        self.in_instance_table()
            && !names::contains(names::ADD_INST_CMDS, &self.name)
            && self.name != "vkGetInstanceProcAddr"
    }

    /// Commands the loader fetches from each driver.
    pub fn in_icd_dispatch(&self) -> bool {
        self.in_instance_disp() || (self.in_device_table() && self.needs_terminator())
    }

    /// Device commands reached through the device terminator dispatch.
    pub fn in_device_terminator_dispatch(&self) -> bool {
        self.in_device_table() && self.needs_terminator() && self.name != "vkGetDeviceProcAddr"
    }

    pub fn returns_void(&self) -> bool {
        self.return_type == "void"
    }

    pub fn returns_result(&self) -> bool {
        self.return_type == "VkResult"
    }

    pub fn first_param(&self) -> &str {
        self.params.first().map_or("", |p| p.name.as_str())
    }

    pub fn arg_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }

    /// `VKAPI_ATTR <ret> VKAPI_CALL <name>(` followed by one parameter per
    /// line, names aligned, and the closing parenthesis.
    pub fn cdecl(&self, name: &str) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let (ty, rest) = split_decl(p);
                let pad = if ty.len() < PARAM_ALIGN { PARAM_ALIGN - ty.len() } else { 1 };
                format!("\n    {}{}{}", ty, " ".repeat(pad), rest)
            })
            .collect();
        format!(
            "VKAPI_ATTR {} VKAPI_CALL {}({})",
            self.return_type,
            name,
            params.join(",")
        )
    }
}

/// Column, after the indentation, parameter names start at.
const PARAM_ALIGN: usize = 44;

/// Splits a declaration into its type text and the name with any array
/// suffix.
fn split_decl(decl: &Decl) -> (String, String) {
    let code = decl.code.as_str();
    let name = decl.name.as_str();
    if name.is_empty() {
        return (String::from(code), String::new());
    }
    let mut end = code.len();
    while let Some(pos) = code[..end].rfind(name) {
        let before = code[..pos].chars().last();
        let after = code[pos + name.len()..].chars().next();
        if !before.map_or(false, c::is_c_identifier_char) && !after.map_or(false, c::is_c_identifier_char) {
            return (String::from(code[..pos].trim_end()), String::from(code[pos..].trim()));
        }
        end = pos;
    }
    (String::from(code), String::from(name))
}

fn return_type(proto: &Decl) -> String {
    let mut ty = String::new();
    if proto.is_const {
        ty.push_str("const ");
    }
    ty.push_str(&proto.type_name);
    for _ in 0..proto.pointer_depth {
        ty.push('*');
    }
    ty
}

//--------------------------------------------------------------------------------------------------
/// Writes `body` for each command passing `filter`, feature by feature.
/// Every feature with at least one such command opens with a
/// `// ---- <feature> <what>` comment, and each command sits inside the
/// platform guard it needs.
pub(crate) fn write_sections<W, F, B>(
    out: &mut W,
    features: &[FeatureData],
    indent: &str,
    what: &str,
    filter: F,
    mut body: B,
) -> io::Result<()>
where
    W: Write,
    F: Fn(&FeatureData, &CommandData) -> bool,
    B: FnMut(&mut W, &FeatureData, &CommandData) -> io::Result<()>,
{
    for feature in features.iter() {
        let commands: Vec<&CommandData> = feature
            .commands
            .iter()
            .filter(|cmd| filter(feature, cmd))
            .collect();
        if commands.is_empty() {
            continue;
        }
        writeln!(out)?;
        writeln!(out, "{}// ---- {} {}", indent, feature.title(), what)?;
        for cmd in commands {
            write_guarded(out, cmd.protect.as_deref(), |out| body(out, feature, cmd))?;
        }
    }
    Ok(())
}

/// Wraps the output of `body` in `#if defined(<protect>)` when there is a
/// guard.
pub(crate) fn write_guarded<W, B>(out: &mut W, protect: Option<&str>, body: B) -> io::Result<()>
where
    W: Write,
    B: FnOnce(&mut W) -> io::Result<()>,
{
    if let Some(protect) = protect {
        writeln!(out, "#if defined({})", protect)?;
    }
    body(out)?;
    if let Some(protect) = protect {
        writeln!(out, "#endif // {}", protect)?;
    }
    Ok(())
}

pub(crate) fn write_banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "// *** THIS FILE IS GENERATED - DO NOT EDIT! ***")?;
    writeln!(out, "// See vk-loadergen for modifications")?;
    writeln!(out)?;
    writeln!(out, "/*")?;
    writeln!(out, " * Copyright (c) 2015-2024 The Khronos Group Inc.")?;
    writeln!(out, " * Copyright (c) 2015-2024 Valve Corporation")?;
    writeln!(out, " * Copyright (c) 2015-2024 LunarG, Inc.")?;
    writeln!(out, " *")?;
    writeln!(out, " * Licensed under the Apache License, Version 2.0 (the \"License\");")?;
    writeln!(out, " * you may not use this file except in compliance with the License.")?;
    writeln!(out, " * You may obtain a copy of the License at")?;
    writeln!(out, " *")?;
    writeln!(out, " *     http://www.apache.org/licenses/LICENSE-2.0")?;
    writeln!(out, " *")?;
    writeln!(out, " * Unless required by applicable law or agreed to in writing, software")?;
    writeln!(out, " * distributed under the License is distributed on an \"AS IS\" BASIS,")?;
    writeln!(out, " * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.")?;
    writeln!(out, " * See the License for the specific language governing permissions and")?;
    writeln!(out, " * limitations under the License.")?;
    writeln!(out, " */")?;
    writeln!(out)?;
    writeln!(out, "// clang-format off")?;
    Ok(())
}

//--------------------------------------------------------------------------------------------------
/// Produces one loader artifact per run. Recoverable problems go to the
/// diagnostics sink handed to `new`.
pub struct LoaderGenerator<W: Write> {
    out: W,
    diag: Diagnostics,
    artifact: Option<Artifact>,
    features: Vec<FeatureData>,
}

impl<W: Write> LoaderGenerator<W> {
    pub fn new(out: W, diag: Diagnostics) -> Self {
        LoaderGenerator {
            out,
            diag,
            artifact: None,
            features: Vec::new(),
        }
    }

    /// Returns the output and the errors reported while generating.
    pub fn finish(self) -> (W, Vec<Error>) {
        (self.out, self.diag.into_errors())
    }
}

impl<W: Write> Generator for LoaderGenerator<W> {
    fn begin_file(&mut self, _reg: &Registry, options: &GeneratorOptions) -> Result<(), FatalError> {
        let artifact = Artifact::from_filename(&options.filename)
            .ok_or_else(|| FatalError::UnknownArtifact(options.filename.clone()))?;
        self.artifact = Some(artifact);
        self.features.clear();
        Ok(())
    }

    fn begin_feature(&mut self, _reg: &Registry, feature: &FeatureInfo, _emit: bool) -> Result<(), FatalError> {
        let version = match &feature.kind {
            FeatureKind::Version { number } => Some(number.clone()),
            FeatureKind::Extension(_) => None,
        };
        let name_define = feature
            .requires
            .iter()
            .flat_map(|block| block.items.iter())
            .find_map(|item| match item {
                InterfaceItem::Enum { name, extends: None } if name.ends_with("_EXTENSION_NAME") => Some(name.clone()),
                _ => None,
            });
        self.features.push(FeatureData {
            name: feature.name.clone(),
            version,
            ext_type: feature.extension().and_then(|ext| ext.ext_type),
            protect: feature.protect.clone(),
            name_define,
            commands: Vec::new(),
        });
        Ok(())
    }

    fn gen_cmd(&mut self, reg: &Registry, info: &CmdInfo, name: &str, _alias: Option<&str>) -> Result<(), FatalError> {
        let def = match reg.command_definition(name) {
            Some(def) => def,
            None => {
                self.diag.error(Error::DanglingReference {
                    kind: "command",
                    name: String::from(name),
                    target: String::from(reg.resolve(NameKind::Command, name)),
                });
                return Ok(());
            }
        };
        let feature = match self.features.last_mut() {
            Some(feature) => feature,
            None => {
                self.diag.error(Error::Internal {
                    desc: "command generated outside of a feature",
                });
                return Ok(());
            }
        };
        let handle = def
            .params
            .first()
            .map_or("", |p| reg.resolve(NameKind::Type, &p.type_name));
        feature.commands.push(CommandData {
            name: String::from(name),
            canonical: String::from(reg.resolve(NameKind::Command, name)),
            level: reg.command_level(name),
            handle: String::from(handle),
            protect: info.protect.clone().or_else(|| feature.protect.clone()),
            return_type: return_type(&def.proto),
            params: def.params.clone(),
        });
        Ok(())
    }

    fn end_file(&mut self, _reg: &Registry) -> Result<(), FatalError> {
        let artifact = match self.artifact {
            Some(artifact) => artifact,
            None => {
                self.diag.error(Error::Internal {
                    desc: "end_file without begin_file",
                });
                return Ok(());
            }
        };
        log::debug!("writing {}", artifact.filename());
        match artifact {
            Artifact::LoaderHeader => header::write(&mut self.out, &self.features)?,
            Artifact::LoaderSource => source::write(&mut self.out, &self.features)?,
            Artifact::LayerDispatchTable => layer::write(&mut self.out, &self.features)?,
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Runs the whole pipeline for one loader artifact over an already parsed
/// registry. Returns the output and every recoverable error.
pub fn generate<W: Write>(reg: &mut Registry, artifact: Artifact, out: W) -> Result<(W, Vec<Error>), FatalError> {
    let options = GeneratorOptions::loader(artifact.filename());
    let mut generator = LoaderGenerator::new(out, Diagnostics::new("vk_loadergen::loader"));
    let mut errors = reg.api_gen(&options, &mut generator)?;
    let (out, generator_errors) = generator.finish();
    errors.extend(generator_errors);
    Ok((out, errors))
}

#[cfg(test)]
mod test {
    use super::*;

    pub(super) fn decl(ty: &str, name: &str, code: &str) -> Decl {
        Decl {
            name: String::from(name),
            type_name: String::from(ty),
            pointer_depth: code.matches('*').count() as u8,
            code: String::from(code),
            ..Decl::default()
        }
    }

    #[test]
    fn test_split_decl() {
        let d = decl("VkAllocationCallbacks", "pAllocator", "const VkAllocationCallbacks* pAllocator");
        assert_eq!(
            split_decl(&d),
            (String::from("const VkAllocationCallbacks*"), String::from("pAllocator"))
        );
        let d = decl("float", "blendConstants", "const float blendConstants[4]");
        assert_eq!(
            split_decl(&d),
            (String::from("const float"), String::from("blendConstants[4]"))
        );
        let d = decl("VkImage", "image", "VkImage image");
        assert_eq!(split_decl(&d), (String::from("VkImage"), String::from("image")));
    }

    #[test]
    fn test_cdecl() {
        let cmd = CommandData {
            name: String::from("vkDestroyThing"),
            canonical: String::from("vkDestroyThing"),
            level: CommandLevel::Device,
            handle: String::from("VkDevice"),
            protect: None,
            return_type: String::from("void"),
            params: vec![
                decl("VkDevice", "device", "VkDevice device"),
                decl("VkAllocationCallbacks", "pAllocator", "const VkAllocationCallbacks* pAllocator"),
            ],
        };
        assert_eq!(
            cmd.cdecl("terminator_DestroyThing"),
            "VKAPI_ATTR void VKAPI_CALL terminator_DestroyThing(\n    \
             VkDevice                                    device,\n    \
             const VkAllocationCallbacks*                pAllocator)"
        );
        assert_eq!(cmd.stem(), "DestroyThing");
    }

    #[test]
    fn test_artifact_names() {
        for artifact in Artifact::ALL.iter() {
            assert_eq!(Artifact::from_filename(artifact.filename()), Some(*artifact));
        }
        assert_eq!(Artifact::from_filename("vulkan_core.h"), None);
    }
}
