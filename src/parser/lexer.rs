// Token-level parsers shared by the command grammar

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{map, map_res, recognize, value},
    multi::many0_count,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so surrounding whitespace is ignored
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Bare name: letter or underscore first, then letters, digits and underscores
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Double-quoted string with `\"` and `\\` escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    alt((
        // escaped_transform refuses empty input, so "" is its own case
        value(String::new(), tag("\"\"")),
        delimited(
            char('"'),
            escaped_transform(
                is_not("\\\""),
                '\\',
                alt((value("\\", char('\\')), value("\"", char('"')))),
            ),
            char('"'),
        ),
    ))(input)
}

pub fn count_literal(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

/// A column reference: bare identifier, or quoted when the name has spaces
pub fn column_ref(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("sales_2024 rest"), Ok((" rest", "sales_2024".to_string())));
        assert_eq!(identifier("_x"), Ok(("", "_x".to_string())));
        assert!(identifier("9lives").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""east""#), Ok(("", "east".to_string())));
        assert_eq!(string_literal(r#""""#), Ok(("", String::new())));
        assert_eq!(string_literal(r#""say \"hi\"""#), Ok(("", r#"say "hi""#.to_string())));
        assert!(string_literal(r#""unterminated"#).is_err());
    }

    #[test]
    fn test_ws() {
        assert_eq!(ws(identifier)("  name  |"), Ok(("|", "name".to_string())));
    }

    #[test]
    fn test_count_literal() {
        assert_eq!(count_literal("10)"), Ok((")", 10)));
        assert!(count_literal("-1").is_err());
    }

    #[test]
    fn test_column_ref() {
        assert_eq!(column_ref(r#""unit price""#), Ok(("", "unit price".to_string())));
        assert_eq!(column_ref("region"), Ok(("", "region".to_string())));
    }
}
