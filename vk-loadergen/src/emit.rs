//! Walks the selected features and hands every required definition to a
//! [`Generator`], dependencies first, each definition once.

use std::collections::BTreeSet;

use crate::options::GeneratorOptions;
use crate::registry::{NameKind, Registry};
use crate::select;
use crate::types::*;

/// Sink for recoverable errors. Each error is logged at `warn` under the
/// sink's target and kept for the caller.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    target: String,
    errors: Vec<Error>,
}

impl Diagnostics {
    pub fn new(target: &str) -> Self {
        Diagnostics {
            target: String::from(target),
            errors: Vec::new(),
        }
    }

    pub fn error(&mut self, error: Error) {
        log::warn!(target: self.target.as_str(), "{}", error);
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }
}

/// Output plug-in driven by [`Registry::api_gen`].
///
/// Calls arrive in this order: `begin_file`, then for each selected feature
/// `begin_feature`, the `gen_*` calls for what each of its `<require>`
/// blocks names in turn, `end_feature`,
/// then the catalogue calls (`gen_spirv`, `gen_format`, `gen_sync_*`) and
/// finally `end_file`. `gen_*` calls for a feature that is selected but not
/// emitted are suppressed, though its definitions still count as declared.
pub trait Generator {
    fn begin_file(&mut self, reg: &Registry, options: &GeneratorOptions) -> Result<(), FatalError>;

    fn end_file(&mut self, reg: &Registry) -> Result<(), FatalError>;

    fn begin_feature(&mut self, _reg: &Registry, _feature: &FeatureInfo, _emit: bool) -> Result<(), FatalError> {
        Ok(())
    }

    fn end_feature(&mut self, _reg: &Registry) -> Result<(), FatalError> {
        Ok(())
    }

    fn gen_type(&mut self, _reg: &Registry, _info: &TypeInfo, _name: &str, _alias: Option<&str>) -> Result<(), FatalError> {
        Ok(())
    }

    /// `name` is the enumerated type being declared. For an alias type,
    /// `info` is the group of the aliased type and `alias` names it.
    fn gen_group(&mut self, _reg: &Registry, _info: &GroupInfo, _name: &str, _alias: Option<&str>) -> Result<(), FatalError> {
        Ok(())
    }

    fn gen_enum(&mut self, _reg: &Registry, _info: &EnumInfo, _name: &str, _alias: Option<&str>) -> Result<(), FatalError> {
        Ok(())
    }

    fn gen_cmd(&mut self, _reg: &Registry, _info: &CmdInfo, _name: &str, _alias: Option<&str>) -> Result<(), FatalError> {
        Ok(())
    }

    fn gen_spirv(&mut self, _reg: &Registry, _info: &SpirvInfo, _name: &str, _alias: Option<&str>) -> Result<(), FatalError> {
        Ok(())
    }

    fn gen_format(&mut self, _reg: &Registry, _info: &FormatInfo, _name: &str, _alias: Option<&str>) -> Result<(), FatalError> {
        Ok(())
    }

    fn gen_sync_stage(&mut self, _reg: &Registry, _info: &SyncStageInfo) -> Result<(), FatalError> {
        Ok(())
    }

    fn gen_sync_access(&mut self, _reg: &Registry, _info: &SyncAccessInfo) -> Result<(), FatalError> {
        Ok(())
    }

    fn gen_sync_pipeline(&mut self, _reg: &Registry, _info: &SyncPipelineInfo) -> Result<(), FatalError> {
        Ok(())
    }
}

impl Registry {
    /// Resets the previous selection, selects what `options` asks for and
    /// drives `generator` over it. Returns the recoverable errors found by
    /// selection and emission.
    pub fn api_gen<G: Generator>(&mut self, options: &GeneratorOptions, generator: &mut G) -> Result<Vec<Error>, FatalError> {
        self.api_reset();
        let mut diag = Diagnostics::new("vk_loadergen::select");
        select::select(self, options, &mut diag);
        emit(self, options, generator, &mut diag)?;
        Ok(diag.into_errors())
    }
}

fn emit<G: Generator>(
    reg: &Registry,
    options: &GeneratorOptions,
    generator: &mut G,
    diag: &mut Diagnostics,
) -> Result<(), FatalError> {
    generator.begin_file(reg, options)?;

    let mut emitter = Emitter {
        reg,
        options,
        diag,
        generator,
        declared: BTreeSet::new(),
        emit: false,
    };

    for feature in reg.selected_features() {
        log::debug!("generating interface of {} (emit: {})", feature.name, feature.emit);
        emitter.emit = feature.emit;
        emitter.generator.begin_feature(reg, feature, feature.emit)?;

        // One <require> block at a time: its types, then enums, then commands.
        for block in feature.requires.iter() {
            for item in block.items.iter() {
                if let InterfaceItem::Type { name } = item {
                    emitter.generate_type(name)?;
                }
            }
            for item in block.items.iter() {
                // Extending enums were folded into their group by the model builder.
                if let InterfaceItem::Enum { name, extends: None } = item {
                    emitter.generate_enum(name)?;
                }
            }
            for item in block.items.iter() {
                if let InterfaceItem::Command { name } = item {
                    emitter.generate_command(name)?;
                }
            }
        }

        emitter.generator.end_feature(reg)?;
    }

    let generator = emitter.generator;
    for spirv in reg.spirv_extensions().iter().chain(reg.spirv_capabilities()) {
        if spirv.emit {
            generator.gen_spirv(reg, spirv, &spirv.name, None)?;
        }
    }
    for format in reg.formats().iter().filter(|f| f.emit) {
        generator.gen_format(reg, format, &format.name, None)?;
    }
    for stage in reg.sync_stages() {
        generator.gen_sync_stage(reg, stage)?;
    }
    for access in reg.sync_access() {
        generator.gen_sync_access(reg, access)?;
    }
    for pipeline in reg.sync_pipelines() {
        generator.gen_sync_pipeline(reg, pipeline)?;
    }

    generator.end_file(reg)
}

struct Emitter<'a, G> {
    reg: &'a Registry,
    options: &'a GeneratorOptions,
    diag: &'a mut Diagnostics,
    generator: &'a mut G,
    declared: BTreeSet<(NameKind, String)>,
    /// Whether the feature being walked produces output.
    emit: bool,
}

impl<'a, G: Generator> Emitter<'a, G> {
    /// Marks `name` declared. False when it is not required or was
    /// declared before.
    fn declare(&mut self, kind: NameKind, name: &str, required: bool) -> bool {
        if !required {
            log::trace!("skipping {} {} (not required)", kind.as_str(), name);
            return false;
        }
        if !self.declared.insert((kind, String::from(name))) {
            log::trace!("skipping {} {} (already declared)", kind.as_str(), name);
            return false;
        }
        true
    }

    fn generate_type(&mut self, name: &str) -> Result<(), FatalError> {
        let reg = self.reg;
        let info = match reg.types.get(name) {
            Some(info) => info,
            None => {
                log::debug!("no entry found for type {}", name);
                return Ok(());
            }
        };
        if !self.declare(NameKind::Type, name, info.required) {
            return Ok(());
        }
        let alias = info.alias.as_deref();
        let follow = self.options.require_depends;

        if follow {
            if let Some(alias) = alias {
                self.generate_type(alias)?;
            }
            if let Some(requires) = &info.requires {
                self.generate_type(requires)?;
            }
            for ty in info.type_refs.iter() {
                self.generate_type(ty)?;
            }
            for e in info.enum_refs.iter() {
                self.generate_enum(e)?;
            }
        }

        match info.category {
            TypeCategory::Enum => {
                let group = match reg.groups.get(alias.unwrap_or(name)) {
                    Some(group) => group,
                    None => {
                        self.diag.error(Error::Undefined {
                            kind: "group",
                            name: String::from(alias.unwrap_or(name)),
                        });
                        return Ok(());
                    }
                };
                if self.emit {
                    self.generator.gen_group(reg, group, name, alias)?;
                }
            }
            _ => {
                if self.emit {
                    self.generator.gen_type(reg, info, name, alias)?;
                }
                if let (TypeCategory::Bitmask, Some(bitvalues), true) = (info.category, &info.bitvalues, follow) {
                    self.generate_type(bitvalues)?;
                }
            }
        }
        Ok(())
    }

    fn generate_enum(&mut self, name: &str) -> Result<(), FatalError> {
        let reg = self.reg;
        let info = match reg.enums.get(name) {
            Some(info) => info,
            None => {
                log::debug!("no entry found for enum {}", name);
                return Ok(());
            }
        };
        if !self.declare(NameKind::Enum, name, info.required) {
            return Ok(());
        }
        let alias = info.value.alias();
        if let (Some(alias), true) = (alias, self.options.require_depends) {
            self.generate_enum(alias)?;
        }
        if self.emit {
            self.generator.gen_enum(reg, info, name, alias)?;
        }
        Ok(())
    }

    fn generate_command(&mut self, name: &str) -> Result<(), FatalError> {
        let reg = self.reg;
        let info = match reg.commands.get(name) {
            Some(info) => info,
            None => {
                log::debug!("no entry found for command {}", name);
                return Ok(());
            }
        };
        if !self.declare(NameKind::Command, name, info.required) {
            return Ok(());
        }
        let alias = info.alias();
        if self.options.require_depends {
            if let Some(alias) = alias {
                self.generate_command(alias)?;
            }
            if let Some(def) = reg.command_definition(name) {
                for ty in def.type_refs() {
                    self.generate_type(ty)?;
                }
            }
        }
        if self.emit {
            self.generator.gen_cmd(reg, info, name, alias)?;
        }
        Ok(())
    }
}
