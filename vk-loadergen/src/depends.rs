//! Dependency expressions of `depends` attributes.
//!
//! ```text
//! expr   := term ( ',' term )*        // OR
//! term   := factor ( '+' factor )*    // AND
//! factor := NAME | '(' expr ')'
//! ```

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::map,
    error::ParseError,
    multi::separated_list1,
    sequence::delimited,
    Finish, IResult,
};

/// A combinator that takes a parser `inner` and produces a parser that also consumes both leading and
/// trailing whitespace, returning the output of `inner`.
fn ws<'a, F: 'a, O, E: ParseError<&'a str>>(
    inner: F,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where
    F: FnMut(&'a str) -> IResult<&'a str, O, E>,
{
    delimited(multispace0, inner, multispace0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum Depends {
    Name(String),
    And(Vec<Depends>),
    Or(Vec<Depends>),
}

fn name(input: &str) -> IResult<&str, Depends> {
    map(
        ws(take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')),
        |s: &str| Depends::Name(String::from(s)),
    )(input)
}

fn factor(input: &str) -> IResult<&str, Depends> {
    alt((name, delimited(ws(char('(')), expr, ws(char(')')))))(input)
}

fn term(input: &str) -> IResult<&str, Depends> {
    map(separated_list1(char('+'), factor), |mut v| {
        if v.len() == 1 {
            v.remove(0)
        } else {
            Depends::And(v)
        }
    })(input)
}

fn expr(input: &str) -> IResult<&str, Depends> {
    map(separated_list1(char(','), term), |mut v| {
        if v.len() == 1 {
            v.remove(0)
        } else {
            Depends::Or(v)
        }
    })(input)
}

/// Parses a whole `depends` attribute. Trailing input is an error.
pub fn parse_depends(input: &str) -> Result<Depends, nom::error::Error<String>> {
    match expr(input).finish() {
        Ok(("", depends)) => Ok(depends),
        Ok((rest, _)) => Err(nom::error::Error::new(
            String::from(rest),
            nom::error::ErrorKind::Eof,
        )),
        Err(e) => Err(nom::error::Error::new(String::from(e.input), e.code)),
    }
}

impl Depends {
    /// Evaluates the expression with `pred` deciding each name.
    pub fn evaluate<F: Fn(&str) -> bool>(&self, pred: &F) -> bool {
        match self {
            Depends::Name(name) => pred(name),
            Depends::And(terms) => terms.iter().all(|t| t.evaluate(pred)),
            Depends::Or(terms) => terms.iter().any(|t| t.evaluate(pred)),
        }
    }

    /// Every name in the expression, left to right.
    pub fn names(&self) -> Vec<&str> {
        let mut result = Vec::new();
        self.collect_names(&mut result);
        result
    }

    fn collect_names<'a>(&'a self, result: &mut Vec<&'a str>) {
        match self {
            Depends::Name(name) => result.push(name),
            Depends::And(terms) | Depends::Or(terms) => {
                terms.iter().for_each(|t| t.collect_names(result))
            }
        }
    }

    /// Renders the expression as a C boolean expression, with `render`
    /// producing the text for each name, e.g. `defined(VK_KHR_surface)`.
    pub fn to_language<F: Fn(&str) -> String>(&self, render: &F) -> String {
        self.render(render, false)
    }

    fn render<F: Fn(&str) -> String>(&self, render: &F, nested: bool) -> String {
        let (terms, op) = match self {
            Depends::Name(name) => return render(name),
            Depends::And(terms) => (terms, " && "),
            Depends::Or(terms) => (terms, " || "),
        };
        let text = terms
            .iter()
            .map(|t| t.render(render, true))
            .collect::<Vec<_>>()
            .join(op);
        if nested {
            format!("({})", text)
        } else {
            text
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn n(s: &str) -> Depends {
        Depends::Name(String::from(s))
    }

    #[test]
    fn test_parse_precedence() {
        assert_eq!(
            parse_depends("A+B,C").unwrap(),
            Depends::Or(vec![Depends::And(vec![n("A"), n("B")]), n("C")])
        );
        assert_eq!(
            parse_depends("A+(B,C)").unwrap(),
            Depends::And(vec![n("A"), Depends::Or(vec![n("B"), n("C")])])
        );
        assert_eq!(parse_depends("VK_VERSION_1_1").unwrap(), n("VK_VERSION_1_1"));
    }

    #[test]
    fn test_parse_error() {
        assert!(parse_depends("A+").is_err());
        assert!(parse_depends("(A,B").is_err());
        assert!(parse_depends("").is_err());
    }

    #[test]
    fn test_evaluate() {
        let d = parse_depends("(VK_KHR_a+VK_KHR_b),VK_VERSION_1_1").unwrap();
        assert!(d.evaluate(&|name: &str| name == "VK_VERSION_1_1"));
        assert!(d.evaluate(&|name: &str| name.starts_with("VK_KHR")));
        assert!(!d.evaluate(&|name: &str| name == "VK_KHR_a"));
        assert_eq!(d.names(), vec!["VK_KHR_a", "VK_KHR_b", "VK_VERSION_1_1"]);
    }

    #[test]
    fn test_to_language() {
        let d = parse_depends("(A+B),C").unwrap();
        assert_eq!(
            d.to_language(&|name: &str| format!("defined({})", name)),
            "(defined(A) && defined(B)) || defined(C)"
        );
    }
}
