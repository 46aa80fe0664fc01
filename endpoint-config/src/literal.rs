//! Parsing of authored default/min/max literals.

use matter_data_model::DefaultAttributeValue;
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{hex_digit1, multispace0},
    combinator::{all_consuming, map_res, value},
    number::complete::recognize_float,
    sequence::{delimited, preceded},
    IResult,
};

fn boolean(span: &str) -> IResult<&str, DefaultAttributeValue> {
    alt((
        value(DefaultAttributeValue::Bool(true), tag_no_case("true")),
        value(DefaultAttributeValue::Bool(false), tag_no_case("false")),
    ))(span)
}

fn hex_number(span: &str) -> IResult<&str, DefaultAttributeValue> {
    map_res(preceded(tag_no_case("0x"), hex_digit1), |digits: &str| {
        u64::from_str_radix(digits, 16).map(DefaultAttributeValue::Hex)
    })(span)
}

fn decimal(span: &str) -> IResult<&str, DefaultAttributeValue> {
    map_res(recognize_float, |text: &str| {
        if text.contains(|c: char| matches!(c, '.' | 'e' | 'E')) {
            text.parse::<f64>()
                .map(DefaultAttributeValue::Float)
                .map_err(|e| e.to_string())
        } else if text.starts_with('-') {
            text.parse::<i64>()
                .map(DefaultAttributeValue::Signed)
                .map_err(|e| e.to_string())
        } else {
            text.trim_start_matches('+')
                .parse::<u64>()
                .map(DefaultAttributeValue::Number)
                .map_err(|e| e.to_string())
        }
    })(span)
}

/// Parses a numeric or boolean literal such as `0x1F`, `-5`, `1.5` or `true`.
///
/// String-typed attributes never go through here: their default is
/// the raw text.
pub fn parse_literal(text: &str) -> Result<DefaultAttributeValue, String> {
    all_consuming(delimited(
        multispace0,
        alt((boolean, hex_number, decimal)),
        multispace0,
    ))(text)
    .map(|(_, value)| value)
    .map_err(|_| format!("'{}' is not a numeric or boolean literal", text))
}
