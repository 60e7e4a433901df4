use std::collections::BTreeMap;

/// Errors from which the pipeline cannot recover. Any output produced before
/// one of these is returned should be discarded by the caller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FatalError {
    #[error("document has no <registry> root element")]
    MissingRegistryElement,
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("malformed XML: {0}")]
    XmlError(#[from] xml::reader::Error),
    #[error("{xpath}: {desc}")]
    SchemaViolation { xpath: String, desc: String },
    #[error("{xpath}: '{name}' has more than one definition for API '{api}'")]
    AmbiguousVariant {
        xpath: String,
        name: String,
        api: String,
    },
    #[error("{xpath}: no definition of '{name}' is written for any merged API")]
    NoMatchingVariant { xpath: String, name: String },
    #[error("alias chain through '{0}' is cyclic")]
    AliasCycle(String),
    #[error("no generator artifact is named '{0}'")]
    UnknownArtifact(String),
}

/// Errors from which the pipeline can recover. They are collected in the
/// order they were found and never change the outcome of a run: the
/// offending reference is not followed, the duplicate definition is dropped,
/// the unsupported extension is left out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{xpath}: unexpected element <{name}>")]
    UnexpectedElement { xpath: String, name: String },
    #[error("{xpath}: unexpected value '{value}' for attribute '{name}'")]
    UnexpectedAttributeValue {
        xpath: String,
        name: String,
        value: String,
    },
    #[error("{xpath}: missing element <{name}>")]
    MissingElement { xpath: String, name: String },
    #[error("{xpath}: missing attribute '{name}'")]
    MissingAttribute { xpath: String, name: String },
    #[error("{xpath}: {desc}")]
    SchemaViolation { xpath: String, desc: String },
    #[error("{xpath}: '{text}' is not an integer: {error}")]
    ParseIntError {
        xpath: String,
        text: String,
        error: std::num::ParseIntError,
    },
    #[error("{kind} '{name}' refers to '{target}', which is not defined")]
    DanglingReference {
        kind: &'static str,
        name: String,
        target: String,
    },
    #[error("{kind} '{name}' is not defined")]
    Undefined { kind: &'static str, name: String },
    #[error("attempt to redefine {kind} '{name}' with a different definition")]
    DuplicateDefinition { kind: &'static str, name: String },
    #[error("enum '{name}' is added to group '{group}' twice with different values")]
    DuplicateGroupEnum { group: String, name: String },
    #[error("enums '{name}' and '{other}' of group '{group}' share the value {value}")]
    ValueCollision {
        group: String,
        name: String,
        other: String,
        value: i128,
    },
    #[error("{kind} '{name}' is an alias of itself")]
    SelfAlias { kind: &'static str, name: String },
    #[error("extension '{name}' was requested but does not support API '{api}'")]
    UnsupportedExtension { name: String, api: String },
    #[error("<extend type=\"{kind}\"> in '{feature}' is not supported")]
    UnsupportedExtend { feature: String, kind: String },
    #[error("no API versions match API '{api}'")]
    NoMatchingVersions { api: String },
    #[error("internal error: {desc}")]
    Internal { desc: &'static str },
}

//--------------------------------------------------------------------------------------------------
/// Category of a `<type>` definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum TypeCategory {
    Basetype,
    Handle,
    Struct,
    Union,
    Enum,
    Bitmask,
    Funcpointer,
    Define,
    Include,
    /// Types declared without a `category`, like `uint32_t` or platform types.
    None,
}

impl TypeCategory {
    pub fn from_attribute(value: Option<&str>) -> Option<TypeCategory> {
        Some(match value {
            None => TypeCategory::None,
            Some("basetype") => TypeCategory::Basetype,
            Some("handle") => TypeCategory::Handle,
            Some("struct") => TypeCategory::Struct,
            Some("union") => TypeCategory::Union,
            Some("enum") => TypeCategory::Enum,
            Some("bitmask") => TypeCategory::Bitmask,
            Some("funcpointer") => TypeCategory::Funcpointer,
            Some("define") => TypeCategory::Define,
            Some("include") => TypeCategory::Include,
            Some(_) => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeCategory::Basetype => "basetype",
            TypeCategory::Handle => "handle",
            TypeCategory::Struct => "struct",
            TypeCategory::Union => "union",
            TypeCategory::Enum => "enum",
            TypeCategory::Bitmask => "bitmask",
            TypeCategory::Funcpointer => "funcpointer",
            TypeCategory::Define => "define",
            TypeCategory::Include => "include",
            TypeCategory::None => "none",
        }
    }
}

impl Default for TypeCategory {
    fn default() -> Self {
        TypeCategory::None
    }
}

/// Deprecation stamped onto a type, command or enum by `<deprecate>` blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Deprecation {
    /// Core version that deprecated the element, like `VK_VERSION_1_1`.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub by_version: Option<String>,

    /// Extensions that deprecated the element.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub by_extensions: Vec<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub link: Option<String>,
}

impl Deprecation {
    pub fn is_deprecated(&self) -> bool {
        self.by_version.is_some() || !self.by_extensions.is_empty()
    }
}

/// Array dimension of a member or parameter declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ArrayLength {
    Literal(u64),
    Constant(String),
}

/// A single C declaration: a struct member, a command parameter, or the
/// return part of a command prototype.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Decl {
    pub name: String,

    /// Text of the `<type>` tag, like `VkInstance` or `uint32_t`.
    pub type_name: String,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub is_const: bool,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub pointer_depth: u8,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub array: Vec<ArrayLength>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub bitfield_width: Option<u32>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub len: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub altlen: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub optional: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub externsync: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub values: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Vec<String>,

    /// Whitespace-normalized C text of the declaration, like
    /// `const VkAllocationCallbacks* pAllocator`.
    pub code: String,
}

impl Decl {
    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }
}

//--------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct TypeInfo {
    pub name: String,
    pub category: TypeCategory,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Vec<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub requires: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub alias: Option<String>,

    /// Group providing flag values for a bitmask type.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub bitvalues: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub parent: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub returnedonly: bool,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub structextends: Vec<String>,

    /// Nested `<type>` tokens, in document order, without repetition.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub type_refs: Vec<String>,

    /// Nested `<enum>` tokens, in document order, without repetition.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub enum_refs: Vec<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub members: Vec<Decl>,

    /// C text of non-aggregate definitions.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub code: String,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub comment: Option<String>,

    // Selection state, cleared by `Registry::api_reset`.
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub required: bool,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub selected_structextends: Vec<String>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub additional_validity: Vec<String>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub removed_validity: Vec<String>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub deprecation: Deprecation,
}

//--------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum GroupKind {
    Enum,
    Bitmask,
    /// The untyped `API Constants` block.
    Constants,
}

impl Default for GroupKind {
    fn default() -> Self {
        GroupKind::Constants
    }
}

/// Named enumerated type: the `<enums>` block of a C enum or bitmask, plus
/// every value injected into it by versions and extensions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct GroupInfo {
    pub name: String,
    pub kind: GroupKind,
    pub bitwidth: u32,

    /// Member names in document order, injected members appended in the
    /// order their versions and extensions were read.
    pub enums: Vec<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub comment: Option<String>,
}

/// How an enum gets its value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum EnumValue {
    /// `value` attribute, kept as written (may be a C expression).
    Literal(String),
    Bitpos(u32),
    /// Value computed from an extension number.
    Offset {
        extnumber: i64,
        offset: i64,
        negative: bool,
    },
    Alias(String),
}

pub const EXTENSION_ENUM_BASE: i128 = 1_000_000_000;
pub const EXTENSION_ENUM_BLOCK: i128 = 1000;

impl EnumValue {
    /// Numeric value of the enum, when it has one that is not an alias.
    pub fn numeric_value(&self) -> Option<i128> {
        match self {
            EnumValue::Literal(text) => parse_c_integer(text),
            EnumValue::Bitpos(bitpos) if *bitpos < 64 => Some(1i128 << bitpos),
            EnumValue::Bitpos(_) => None,
            EnumValue::Offset {
                extnumber,
                offset,
                negative,
            } => {
                let value = EXTENSION_ENUM_BASE
                    + (i128::from(*extnumber) - 1) * EXTENSION_ENUM_BLOCK
                    + i128::from(*offset);
                Some(if *negative { -value } else { value })
            }
            EnumValue::Alias(_) => None,
        }
    }

    /// Value as it should appear in C source.
    pub fn c_value(&self, bitwidth: u32) -> String {
        match self {
            EnumValue::Literal(text) => text.clone(),
            EnumValue::Bitpos(bitpos) => {
                let value = 1u128.checked_shl(*bitpos).unwrap_or(0);
                if bitwidth == 64 || *bitpos >= 32 {
                    format!("0x{:08x}ULL", value)
                } else {
                    format!("0x{:08x}", value)
                }
            }
            EnumValue::Offset { .. } => match self.numeric_value() {
                Some(v) => v.to_string(),
                None => String::new(),
            },
            EnumValue::Alias(name) => name.clone(),
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            EnumValue::Alias(name) => Some(name),
            _ => None,
        }
    }
}

fn parse_c_integer(text: &str) -> Option<i128> {
    let text = text.trim();
    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let text = text.trim_end_matches(|c| c == 'U' || c == 'u' || c == 'L' || c == 'l');
    let value = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16).ok()?
    } else {
        text.parse::<i128>().ok()?
    };
    Some(if negative { -value } else { value })
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct EnumInfo {
    pub name: String,
    pub value: EnumValue,

    /// Group this enum is a member of, natively or through `extends`.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub group: Option<String>,

    /// Raw `extends` attribute; set only on enums injected by a version or extension.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub extends: Option<String>,

    /// C type of an API constant, like `uint32_t`.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub type_name: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Vec<String>,

    /// Extension that injected this enum.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub extname: Option<String>,

    /// `supported` list of the injecting extension.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub supported: Vec<String>,

    /// Core version that injected this enum.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub version: Option<String>,

    /// Every version or extension whose `<require>` adds this enum, in
    /// document order. The first one also fills `extname` or `version`.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub injectors: Vec<EnumInjector>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub comment: Option<String>,

    #[cfg_attr(feature = "serialize", serde(skip))]
    pub required: bool,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub deprecation: Deprecation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct EnumInjector {
    pub feature: String,
    pub is_version: bool,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub supported: Vec<String>,
}

impl EnumInfo {
    pub fn new(name: String, value: EnumValue) -> Self {
        EnumInfo {
            name,
            value,
            group: None,
            extends: None,
            type_name: None,
            api: Vec::new(),
            extname: None,
            supported: Vec::new(),
            version: None,
            injectors: Vec::new(),
            comment: None,
            required: false,
            deprecation: Deprecation::default(),
        }
    }

    /// Two definitions of the same enum are equivalent when they land in the
    /// same group and agree on the value, the extension offset, or the alias.
    pub fn is_equivalent(&self, other: &EnumInfo) -> bool {
        if self.extends != other.extends {
            return false;
        }
        match (&self.value, &other.value) {
            (EnumValue::Literal(a), EnumValue::Literal(b)) => a == b,
            (EnumValue::Bitpos(a), EnumValue::Bitpos(b)) => a == b,
            (
                EnumValue::Offset {
                    extnumber: n1,
                    offset: o1,
                    negative: d1,
                },
                EnumValue::Offset {
                    extnumber: n2,
                    offset: o2,
                    negative: d2,
                },
            ) => n1 == n2 && o1 == o2 && d1 == d2,
            (EnumValue::Alias(a), EnumValue::Alias(b)) => a == b,
            _ => false,
        }
    }
}

//--------------------------------------------------------------------------------------------------
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
    pub struct CommandQueue: u32 {
        const GRAPHICS = 1 << 0;
        const COMPUTE = 1 << 1;
        const TRANSFER = 1 << 2;
        const SPARSE_BINDING = 1 << 3;
        const PROTECTED = 1 << 4;
        const VIDEO_DECODE = 1 << 5;
        const VIDEO_ENCODE = 1 << 6;
        const OPTICAL_FLOW = 1 << 7;
        const DATA_GRAPH = 1 << 8;
    }
}

impl CommandQueue {
    const NAMES: [(CommandQueue, &'static str); 9] = [
        (CommandQueue::GRAPHICS, "graphics"),
        (CommandQueue::COMPUTE, "compute"),
        (CommandQueue::TRANSFER, "transfer"),
        (CommandQueue::SPARSE_BINDING, "sparse_binding"),
        (CommandQueue::PROTECTED, "protected"),
        (CommandQueue::VIDEO_DECODE, "decode"),
        (CommandQueue::VIDEO_ENCODE, "encode"),
        (CommandQueue::OPTICAL_FLOW, "opticalflow"),
        (CommandQueue::DATA_GRAPH, "data_graph"),
    ];

    /// Parses one name of the `queues` attribute, spelled as in the
    /// registry (`sparse_binding`, not `SPARSE_BINDING`).
    pub fn from_xml_name(name: &str) -> Option<CommandQueue> {
        CommandQueue::NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(q, _)| *q)
    }
}

impl core::fmt::Display for CommandQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut prepend_comma = false;
        for (queue, name) in CommandQueue::NAMES.iter() {
            if self.contains(*queue) {
                if prepend_comma {
                    f.write_str(",")?;
                }
                f.write_str(name)?;
                prepend_comma = true;
            }
        }
        Ok(())
    }
}

/// Prototype and parameters of a command that is not an alias.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct CommandDefinition {
    /// `name` is the command name, `type_name` the return type.
    pub proto: Decl,
    pub params: Vec<Decl>,
}

impl CommandDefinition {
    pub fn return_type(&self) -> &str {
        &self.proto.type_name
    }

    /// Every `<type>` token of the prototype and the parameters.
    pub fn type_refs(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.proto.type_name.as_str())
            .chain(self.params.iter().map(|p| p.type_name.as_str()))
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum CommandBody {
    Definition(CommandDefinition),
    /// Signature is that of the named command, with the name rewritten.
    AliasOf(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct CmdInfo {
    pub name: String,
    pub body: CommandBody,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Vec<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "CommandQueue::is_empty")
    )]
    pub queues: CommandQueue,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub successcodes: Vec<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub errorcodes: Vec<String>,

    /// Export targets. An alias without its own list inherits its target's.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub export: Vec<String>,

    /// Parameters whose values are the length of another parameter.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub counters: Vec<String>,

    /// First core version requiring this command.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub version: Option<String>,

    /// Every extension requiring this command, in document order.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub extensions: Vec<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub protect: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub comment: Option<String>,

    #[cfg_attr(feature = "serialize", serde(skip))]
    pub required: bool,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub selected_successcodes: Vec<String>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub selected_errorcodes: Vec<String>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub additional_validity: Vec<String>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub removed_validity: Vec<String>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub deprecation: Deprecation,
}

impl CmdInfo {
    pub fn new(name: String, body: CommandBody) -> Self {
        CmdInfo {
            name,
            body,
            api: Vec::new(),
            queues: CommandQueue::empty(),
            successcodes: Vec::new(),
            errorcodes: Vec::new(),
            export: Vec::new(),
            counters: Vec::new(),
            version: None,
            extensions: Vec::new(),
            protect: None,
            comment: None,
            required: false,
            selected_successcodes: Vec::new(),
            selected_errorcodes: Vec::new(),
            additional_validity: Vec::new(),
            removed_validity: Vec::new(),
            deprecation: Deprecation::default(),
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match &self.body {
            CommandBody::AliasOf(target) => Some(target),
            CommandBody::Definition(_) => None,
        }
    }
}

/// Dispatch level of a command, from the handle type of its first parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandLevel {
    /// No dispatchable first parameter, like `vkCreateInstance`.
    Global,
    Instance,
    PhysicalDevice,
    /// `VkDevice`, `VkQueue` or `VkCommandBuffer`.
    Device,
}

//--------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ExtensionType {
    Instance,
    Device,
}

impl ExtensionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionType::Instance => "instance",
            ExtensionType::Device => "device",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ExtensionDetails {
    pub number: i64,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub ext_type: Option<ExtensionType>,

    /// API names, or `disabled`.
    pub supported: Vec<String>,

    /// Vendor tag, the second `_`-separated word of the name.
    pub category: String,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub platform: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub promotedto: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub deprecatedby: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub obsoletedby: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub provisional: bool,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub specialuse: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum FeatureKind {
    /// Core version; `number` is the `number` attribute, like `1.2`.
    Version { number: String },
    Extension(ExtensionDetails),
}

/// A core version (`<feature>`) or an `<extension>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct FeatureInfo {
    pub name: String,
    pub kind: FeatureKind,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Vec<String>,

    /// Preprocessor guard, resolved from `protect`, `platform` or `provisional`.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub protect: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub sortorder: i64,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub depends: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub comment: Option<String>,

    pub requires: Vec<RequireBlock>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub removes: Vec<RequireBlock>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub deprecates: Vec<DeprecateBlock>,

    #[cfg_attr(feature = "serialize", serde(skip))]
    pub emit: bool,
}

impl FeatureInfo {
    pub fn is_version(&self) -> bool {
        matches!(self.kind, FeatureKind::Version { .. })
    }

    pub fn extension(&self) -> Option<&ExtensionDetails> {
        match &self.kind {
            FeatureKind::Extension(ext) => Some(ext),
            FeatureKind::Version { .. } => None,
        }
    }

    /// Extension number, 0 for core versions.
    pub fn number(&self) -> i64 {
        self.extension().map_or(0, |ext| ext.number)
    }

    /// Version number as `(major, minor)`, `(0, 0)` for extensions.
    pub fn version_number(&self) -> (u32, u32) {
        match &self.kind {
            FeatureKind::Version { number } => {
                let mut parts = number.split('.').map(|p| p.trim().parse::<u32>().unwrap_or(0));
                let major = parts.next().unwrap_or(0);
                let minor = parts.next().unwrap_or(0);
                (major, minor)
            }
            FeatureKind::Extension(_) => (0, 0),
        }
    }

    /// Vendor tag of an extension; empty for core versions.
    pub fn category(&self) -> &str {
        self.extension().map_or("", |ext| ext.category.as_str())
    }
}

/// Child of a `<require>` or `<remove>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum InterfaceItem {
    Type {
        name: String,
    },
    Enum {
        name: String,
        #[cfg_attr(
            feature = "serialize",
            serde(default, skip_serializing_if = "is_default")
        )]
        extends: Option<String>,
    },
    Command {
        name: String,
    },
    /// Adds to an existing element; only `type="command"` is understood.
    Extend {
        kind: String,
        name: String,
        #[cfg_attr(
            feature = "serialize",
            serde(default, skip_serializing_if = "is_default")
        )]
        successcodes: Vec<String>,
        #[cfg_attr(
            feature = "serialize",
            serde(default, skip_serializing_if = "is_default")
        )]
        errorcodes: Vec<String>,
    },
    /// Extra valid-usage text for a command or struct.
    Usage {
        #[cfg_attr(
            feature = "serialize",
            serde(default, skip_serializing_if = "is_default")
        )]
        command: Option<String>,
        #[cfg_attr(
            feature = "serialize",
            serde(default, skip_serializing_if = "is_default")
        )]
        struct_: Option<String>,
        text: String,
    },
    /// API feature bit required through a feature struct member.
    Feature { name: String, struct_: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct RequireBlock {
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Vec<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub profile: Option<String>,

    /// Dependency expression guarding this block.
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub depends: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub comment: Option<String>,

    pub items: Vec<InterfaceItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct DeprecateBlock {
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub api: Vec<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub profile: Option<String>,

    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub explanationlink: Option<String>,

    pub items: Vec<InterfaceItem>,
}

//--------------------------------------------------------------------------------------------------
/// Per selected feature, the names its `<require>` blocks list, keyed by
/// the block's `depends` expression and then by `structextends` (types) or
/// `extends` (enums).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureDictionary {
    pub types: BTreeMap<TypeCategory, BTreeMap<Option<String>, BTreeMap<Option<String>, Vec<String>>>>,
    pub enum_constants: BTreeMap<Option<String>, BTreeMap<Option<String>, Vec<String>>>,
    pub commands: BTreeMap<Option<String>, Vec<String>>,
}

/// Success or error code added to a command by an `<extend>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExtension {
    pub command: String,
    pub value: String,
    pub extension: String,
}

//--------------------------------------------------------------------------------------------------
/// Way a SPIR-V extension or capability gets enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub enum SpirvEnable {
    Version(String),
    Extension(String),
    Feature {
        struct_: String,
        feature: String,
        requires: Option<String>,
        alias: Option<String>,
    },
    Property {
        property: String,
        member: String,
        value: String,
        requires: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct SpirvInfo {
    pub name: String,
    pub enables: Vec<SpirvEnable>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub emit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FormatComponent {
    pub name: String,
    pub bits: String,
    pub numeric_format: String,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub plane_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FormatPlane {
    pub index: u32,
    pub width_divisor: u32,
    pub height_divisor: u32,
    pub compatible: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct FormatInfo {
    pub name: String,
    pub class: String,
    pub blocksize: u32,
    pub texels_per_block: u32,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub block_extent: Option<String>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub packed: Option<u32>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub compressed: Option<String>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub chroma: Option<String>,
    pub components: Vec<FormatComponent>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub planes: Vec<FormatPlane>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub spirv_image_format: Option<String>,
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub emit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct SyncStageInfo {
    pub name: String,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub alias: Option<String>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub support_queues: Vec<String>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub equivalent: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct SyncAccessInfo {
    pub name: String,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub alias: Option<String>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub support_stages: Vec<String>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub equivalent: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SyncPipelineStage {
    pub stage: String,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub order: Option<String>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub before: Option<String>,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
#[non_exhaustive]
pub struct SyncPipelineInfo {
    pub name: String,
    #[cfg_attr(
        feature = "serialize",
        serde(default, skip_serializing_if = "is_default")
    )]
    pub depends: Option<String>,
    pub stages: Vec<SyncPipelineStage>,
}

#[cfg(feature = "serialize")]
fn is_default<T: Default + Eq>(v: &T) -> bool {
    v.eq(&T::default())
}
