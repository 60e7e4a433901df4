//! Just enough C to take apart the declarations found in `<member>`,
//! `<param>` and `<proto>` tags.

use crate::types::ArrayLength;

//--------------------------------------------------------------------------------------------------
/// Joins lines ending in a backslash and turns `\r\n` into `\n`.
struct LineSplice<'a> {
    src: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> LineSplice<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src: src.chars().peekable(),
        }
    }
}

impl<'a> Iterator for LineSplice<'a> {
    type Item = char;
    fn next(&mut self) -> Option<char> {
        loop {
            let c = self.src.next()?;
            match c {
                '\r' => {
                    if let Some('\n') = self.src.peek() {
                        self.src.next();
                    }
                    return Some('\n');
                }
                '\\' => {
                    if let Some('\n') | Some('\r') = self.src.peek() {
                        if self.src.next() == Some('\r') {
                            if let Some('\n') = self.src.peek() {
                                self.src.next();
                            }
                        }
                        continue;
                    }
                    return Some('\\');
                }
                c => return Some(c),
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
/// Replaces comments with a single space and merges whitespace runs.
struct StripComments<'a> {
    src: LineSplice<'a>,
    peek: Option<char>,
    prev_space: bool,
}

impl<'a> StripComments<'a> {
    fn new(code: &'a str) -> Self {
        let mut src = LineSplice::new(code);
        let peek = src.next();
        Self {
            src,
            peek,
            prev_space: false,
        }
    }

    fn is_merged_whitespace(c: char) -> bool {
        c == '\t' || ('\u{000B}' <= c && c <= '\u{000D}') || c == ' ' || c == '\n'
    }

    fn space(&mut self) -> Option<char> {
        if self.prev_space {
            None
        } else {
            self.prev_space = true;
            Some(' ')
        }
    }
}

impl<'a> Iterator for StripComments<'a> {
    type Item = char;
    fn next(&mut self) -> Option<char> {
        loop {
            let c = self.peek?;
            if c == '/' {
                self.peek = self.src.next();
                match self.peek {
                    Some('/') => {
                        self.peek = None;
                        while let Some(c) = self.src.next() {
                            if c == '\n' {
                                self.peek = Some(c);
                                break;
                            }
                        }
                        if let Some(c) = self.space() {
                            return Some(c);
                        }
                    }
                    Some('*') => {
                        self.peek = None;
                        while let Some(c) = self.src.next() {
                            if c == '*' {
                                if let Some('/') = self.src.next() {
                                    self.peek = self.src.next();
                                    break;
                                }
                            }
                        }
                        if let Some(c) = self.space() {
                            return Some(c);
                        }
                    }
                    _ => {
                        self.prev_space = false;
                        return Some('/');
                    }
                }
            } else if StripComments::is_merged_whitespace(c) {
                self.peek = None;
                while let Some(c) = self.src.next() {
                    if !StripComments::is_merged_whitespace(c) {
                        self.peek = Some(c);
                        break;
                    }
                }
                if let Some(c) = self.space() {
                    return Some(c);
                }
            } else {
                self.peek = self.src.next();
                self.prev_space = false;
                return Some(c);
            }
        }
    }
}

/// Removes comments and collapses whitespace, trimming both ends.
pub fn normalize_code(code: &str) -> String {
    let text: String = StripComments::new(code).collect();
    String::from(text.trim())
}

//--------------------------------------------------------------------------------------------------
/// Splits code into identifiers (including numbers) and single-character
/// punctuation. Whitespace comes out as its own tokens.
pub struct TokenIter<'a> {
    src: &'a str,
}

impl<'a> TokenIter<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src }
    }
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = &'a str;
    fn next(&mut self) -> Option<&'a str> {
        let mut iter = self.src.char_indices();
        let (_, c) = iter.next()?;
        let end = if is_c_identifier_char(c) {
            iter.find(|(_, c)| !is_c_identifier_char(*c))
                .map_or(self.src.len(), |(idx, _)| idx)
        } else {
            c.len_utf8()
        };
        let split = self.src.split_at(end);
        self.src = split.1;
        Some(split.0)
    }
}

pub fn is_c_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn is_c_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_c_identifier_char)
}

//--------------------------------------------------------------------------------------------------
/// Shape of a declarator: qualifiers, indirection and array dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Declarator {
    pub is_const: bool,
    pub pointer_depth: u8,
    pub array: Vec<ArrayLength>,
    pub bitfield_width: Option<u32>,
}

/// Analyzes a declaration like `const VkFoo* const* pFoo[4]` whose
/// declared name is `name`. Tokens before the name give constness and
/// indirection, tokens after it give array dimensions or a bitfield width.
pub fn parse_declarator(code: &str, name: &str) -> Declarator {
    let code = normalize_code(code);
    let tokens: Vec<&str> = TokenIter::new(&code).filter(|t| t.trim() != "").collect();
    let name_pos = tokens
        .iter()
        .rposition(|t| *t == name)
        .unwrap_or(tokens.len());

    let mut result = Declarator::default();
    let mut seen_type = false;
    for token in tokens[..name_pos].iter() {
        match *token {
            "const" if !seen_type => result.is_const = true,
            "const" | "struct" | "union" | "enum" => {}
            "*" => result.pointer_depth += 1,
            t if is_c_identifier(t) => seen_type = true,
            _ => {}
        }
    }

    let mut rest = tokens.iter().skip(name_pos + 1).peekable();
    while let Some(token) = rest.next() {
        match *token {
            "[" => {
                let mut inner = String::new();
                for t in rest.by_ref() {
                    if *t == "]" {
                        break;
                    }
                    inner.push_str(t);
                }
                result.array.push(match inner.parse::<u64>() {
                    Ok(v) => ArrayLength::Literal(v),
                    Err(_) => ArrayLength::Constant(inner),
                });
            }
            ":" => {
                result.bitfield_width = rest.peek().and_then(|t| t.parse::<u32>().ok());
                rest.next();
            }
            _ => {}
        }
    }
    result
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_code() {
        let code = "typedef void // some comment    \n /* some other comment     */ (VKAPI_PTR *PFN_vkInternalAllocationNotification)(\\\r\n    void*                                       pUserData,\r\n    size_t                                      size);";
        assert_eq!(
            normalize_code(code),
            "typedef void (VKAPI_PTR *PFN_vkInternalAllocationNotification)( void* pUserData, size_t size);"
        );
    }

    #[test]
    fn test_tokens() {
        let tokens: Vec<_> = TokenIter::new("const char* const* ppNames").collect();
        assert_eq!(
            tokens,
            vec!["const", " ", "char", "*", " ", "const", "*", " ", "ppNames"]
        );
        assert!(is_c_identifier("VK_UUID_SIZE"));
        assert!(!is_c_identifier("a b"));
    }

    #[test]
    fn test_declarator() {
        let d = parse_declarator("const VkAllocationCallbacks* pAllocator", "pAllocator");
        assert!(d.is_const);
        assert_eq!(d.pointer_depth, 1);
        assert!(d.array.is_empty());

        let d = parse_declarator("const char* const* ppEnabledLayerNames", "ppEnabledLayerNames");
        assert!(d.is_const);
        assert_eq!(d.pointer_depth, 2);

        let d = parse_declarator("uint8_t pipelineCacheUUID[VK_UUID_SIZE]", "pipelineCacheUUID");
        assert_eq!(d.array, vec![ArrayLength::Constant(String::from("VK_UUID_SIZE"))]);

        let d = parse_declarator("float matrix[3][4]", "matrix");
        assert_eq!(d.array, vec![ArrayLength::Literal(3), ArrayLength::Literal(4)]);

        let d = parse_declarator("uint32_t instanceCustomIndex:24", "instanceCustomIndex");
        assert_eq!(d.bitfield_width, Some(24));
        assert!(!d.is_const);
    }
}
