//! Options controlling which parts of the registry a generator sees.

use regex::Regex;

use crate::types::FeatureInfo;

/// Pattern text that never matches a registry name.
pub const NO_MATCH: &str = "_nomatch_^";

/// Name selector built from a regular expression. Names match when the
/// expression matches at their start.
#[derive(Debug, Clone)]
pub enum Pattern {
    All,
    Nothing,
    Regex(Regex),
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Pattern, regex::Error> {
        Ok(match pattern {
            ".*" => Pattern::All,
            NO_MATCH => Pattern::Nothing,
            p => Pattern::Regex(Regex::new(&format!("^(?:{})", p))?),
        })
    }

    /// Matches exactly the given names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Pattern {
        if names.is_empty() {
            return Pattern::Nothing;
        }
        let alternatives = names
            .iter()
            .map(|n| regex::escape(n.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        match Regex::new(&format!("^(?:{})$", alternatives)) {
            Ok(re) => Pattern::Regex(re),
            Err(_) => Pattern::Nothing,
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        match self {
            Pattern::All => true,
            Pattern::Nothing => false,
            Pattern::Regex(re) => re.is_match(name),
        }
    }
}

/// Builds an alternation `^(a|b|c)$` out of `names`. An empty list gives
/// `default`, or a pattern matching nothing when there is no default.
pub fn make_re_string<S: AsRef<str>>(names: &[S], default: Option<&str>) -> String {
    if names.is_empty() {
        return String::from(default.unwrap_or(NO_MATCH));
    }
    let alternatives = names.iter().map(|n| n.as_ref()).collect::<Vec<_>>().join("|");
    format!("^({})$", alternatives)
}

/// Reorders the features about to be emitted.
pub type SortProcedure = fn(&mut Vec<&FeatureInfo>);

/// Stable sort by extension number, then core version number, then
/// category (core versions, KHR/ARB/OES, others), then `sortorder`. The
/// last key applied is the primary one.
pub fn sort_features(features: &mut Vec<&FeatureInfo>) {
    features.sort_by_key(|f| f.number());
    features.sort_by_key(|f| f.version_number());
    features.sort_by_key(|f| {
        if f.is_version() {
            0
        } else {
            match f.category() {
                "KHR" | "ARB" | "OES" => 1,
                _ => 2,
            }
        }
    });
    features.sort_by_key(|f| f.sortorder);
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Name of the artifact to produce.
    pub filename: String,
    pub apiname: String,
    pub profile: Option<String>,
    pub versions: Pattern,
    pub emitversions: Pattern,
    /// Name matched against the `supported` list of each extension.
    pub default_extensions: Option<String>,
    pub add_extensions: Pattern,
    pub remove_extensions: Pattern,
    pub emit_extensions: Pattern,
    pub emit_spirv: Pattern,
    pub emit_formats: Pattern,
    /// Source APIs folded into `apiname`; empty selects strip mode.
    pub merge_api_names: Vec<String>,
    pub require_command_aliases: bool,
    pub require_depends: bool,
    pub sort_procedure: Option<SortProcedure>,
}

impl GeneratorOptions {
    pub fn new(filename: &str, apiname: &str) -> Self {
        GeneratorOptions {
            filename: String::from(filename),
            apiname: String::from(apiname),
            profile: None,
            versions: Pattern::All,
            emitversions: Pattern::All,
            default_extensions: Some(String::from(apiname)),
            add_extensions: Pattern::Nothing,
            remove_extensions: Pattern::Nothing,
            emit_extensions: Pattern::All,
            emit_spirv: Pattern::Nothing,
            emit_formats: Pattern::Nothing,
            merge_api_names: Vec::new(),
            require_command_aliases: false,
            require_depends: true,
            sort_procedure: Some(sort_features),
        }
    }

    /// Options for the Vulkan loader artifacts: every version and every
    /// extension supported by `vulkan`, visited in registry order.
    pub fn loader(filename: &str) -> Self {
        GeneratorOptions {
            sort_procedure: None,
            ..GeneratorOptions::new(filename, "vulkan")
        }
    }

    pub fn profile(mut self, profile: &str) -> Self {
        self.profile = Some(String::from(profile));
        self
    }

    pub fn versions(mut self, pattern: Pattern) -> Self {
        self.versions = pattern;
        self
    }

    pub fn emitversions(mut self, pattern: Pattern) -> Self {
        self.emitversions = pattern;
        self
    }

    pub fn default_extensions(mut self, name: Option<&str>) -> Self {
        self.default_extensions = name.map(String::from);
        self
    }

    pub fn add_extensions(mut self, pattern: Pattern) -> Self {
        self.add_extensions = pattern;
        self
    }

    pub fn remove_extensions(mut self, pattern: Pattern) -> Self {
        self.remove_extensions = pattern;
        self
    }

    pub fn emit_extensions(mut self, pattern: Pattern) -> Self {
        self.emit_extensions = pattern;
        self
    }

    pub fn emit_spirv(mut self, pattern: Pattern) -> Self {
        self.emit_spirv = pattern;
        self
    }

    pub fn emit_formats(mut self, pattern: Pattern) -> Self {
        self.emit_formats = pattern;
        self
    }

    pub fn merge_api_names(mut self, names: &[&str]) -> Self {
        self.merge_api_names = names.iter().map(|n| String::from(*n)).collect();
        self
    }

    pub fn require_command_aliases(mut self, value: bool) -> Self {
        self.require_command_aliases = value;
        self
    }

    pub fn require_depends(mut self, value: bool) -> Self {
        self.require_depends = value;
        self
    }

    pub fn sort_procedure(mut self, procedure: Option<SortProcedure>) -> Self {
        self.sort_procedure = procedure;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pattern() {
        let p = Pattern::new("VK_VERSION_1_[01]").unwrap();
        assert!(p.is_match("VK_VERSION_1_0"));
        assert!(p.is_match("VK_VERSION_1_1"));
        assert!(!p.is_match("VK_VERSION_1_2"));
        assert!(!p.is_match("XVK_VERSION_1_0"));
        assert!(!Pattern::new(NO_MATCH).unwrap().is_match("anything"));
        assert!(Pattern::new(".*").unwrap().is_match(""));
        assert!(Pattern::new("(").is_err());
    }

    #[test]
    fn test_from_names() {
        let p = Pattern::from_names(&["VK_KHR_surface", "VK_EXT_debug_utils"]);
        assert!(p.is_match("VK_KHR_surface"));
        assert!(!p.is_match("VK_KHR_surface_protected_capabilities"));
        assert!(!Pattern::from_names::<&str>(&[]).is_match("VK_KHR_surface"));
    }

    #[test]
    fn test_make_re_string() {
        assert_eq!(make_re_string(&["a", "b"], None), "^(a|b)$");
        assert_eq!(make_re_string::<&str>(&[], Some(".*")), ".*");
        assert_eq!(make_re_string::<&str>(&[], None), NO_MATCH);
    }

    #[test]
    fn test_defaults() {
        let o = GeneratorOptions::new("out.h", "vulkan");
        assert_eq!(o.default_extensions.as_deref(), Some("vulkan"));
        assert!(o.require_depends);
        assert!(!o.require_command_aliases);
        assert!(o.sort_procedure.is_some());
        assert!(GeneratorOptions::loader("vk_loader_extensions.c").sort_procedure.is_none());
    }
}
