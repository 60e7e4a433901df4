use crate::tree::Element;
use crate::types::Error;

//--------------------------------------------------------------------------------------------------
/// Tracks where in the document the model builder currently is, and
/// collects recoverable errors found along the way.
pub(crate) struct ParseCtx {
    pub xpath: String,
    pub errors: Vec<Error>,
}

impl ParseCtx {
    pub fn new() -> Self {
        ParseCtx {
            xpath: String::from(""),
            errors: Vec::new(),
        }
    }

    pub fn push_element(&mut self, name: &str) {
        self.xpath.push('/');
        self.xpath.push_str(name);
    }

    pub fn pop_element(&mut self) {
        if let Some(separator_pos) = self.xpath.rfind('/') {
            self.xpath.truncate(separator_pos);
        } else {
            self.errors.push(Error::Internal {
                desc: "ParseCtx push_element/pop_element mismatch.",
            });
        }
    }

    pub fn error(&mut self, error: Error) {
        log::warn!("{}", error);
        self.errors.push(error);
    }
}

//--------------------------------------------------------------------------------------------------
macro_rules! unwrap_attribute (
    ($ctx:expr, $element:ident, $attribute:ident) => {
        let $attribute = match $attribute {
            Some(val) => val,
            None => {
                $ctx.error(Error::MissingAttribute {
                    xpath: $ctx.xpath.clone(),
                    name: String::from(stringify!($attribute)),
                });
                return None;
            }
        };
    };
);

/// Attributes the model does not use are skipped without complaint; the
/// registry keeps growing new ones.
macro_rules! match_attributes {
    ($ctx:expr, $a:ident in $element:expr, $($($p:pat)|+ => $e:expr),+) => {
        for $a in $element.attributes.iter() {
            let n = $a.name.as_str();
            match n {
                $(
                    $($p)|+ => $e,
                )+
                _ => {}
            }
        }
    };
}

macro_rules! match_elements {
    ($ctx:expr, $child:ident in $element:expr, $($($p:pat)|+ => $e:expr),+) => {
        for $child in $element.elements() {
            let name = $child.name.as_str();
            $ctx.push_element(name);
            match name {
                $(
                    $($p)|+ => $e,
                )+
                _ => {
                    $ctx.error(Error::UnexpectedElement {
                        xpath: $ctx.xpath.clone(),
                        name: String::from(name),
                    });
                }
            }
            $ctx.pop_element();
        }
    };
}

//--------------------------------------------------------------------------------------------------
pub(crate) fn parse_integer(ctx: &mut ParseCtx, text: &str) -> Option<i64> {
    let parse_res = if text.starts_with("0x") {
        i64::from_str_radix(text.split_at(2).1, 16)
    } else {
        i64::from_str_radix(text, 10)
    };

    match parse_res {
        Ok(v) => Some(v),
        Err(error) => {
            ctx.error(Error::ParseIntError {
                xpath: ctx.xpath.clone(),
                text: String::from(text),
                error,
            });
            None
        }
    }
}

/// Splits a comma-separated attribute into its names.
pub(crate) fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub(crate) fn attr_list(element: &Element, name: &str) -> Vec<String> {
    element.attr(name).map(split_list).unwrap_or_default()
}

/// Whether `name` is one of the comma-separated tokens of `list`.
pub(crate) fn api_name_match(name: &str, list: Option<&str>) -> bool {
    match list {
        Some(list) => list.split(',').any(|token| token.trim() == name),
        None => false,
    }
}

/// Collapses whitespace runs to one space and trims the ends.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_api_name_match() {
        assert!(api_name_match("vulkan", Some("vulkan,vulkansc")));
        assert!(!api_name_match("vulkan", Some("vulkansc")));
        assert!(!api_name_match("vulkan", None));
    }

    #[test]
    fn test_parse_integer() {
        let mut ctx = ParseCtx::new();
        assert_eq!(parse_integer(&mut ctx, "0x10"), Some(16));
        assert_eq!(parse_integer(&mut ctx, "42"), Some(42));
        assert_eq!(parse_integer(&mut ctx, "x"), None);
        assert_eq!(ctx.errors.len(), 1);
    }
}
