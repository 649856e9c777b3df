//! Code formats and full-code composition for the account hierarchy

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{CoreError, CoreResult};

/// The four levels of the chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HierarchyLevel {
    /// Top level, one digit (1-9)
    Group,
    /// One digit (1-9) under a group
    Class,
    /// Two digits (01-99) under a class
    SubClass,
    /// Two digits (01-99) under a subclass; the only ledger-linkable level
    Detail,
}

impl HierarchyLevel {
    /// Digits a code at this level occupies inside a full code
    pub fn code_len(&self) -> usize {
        match self {
            HierarchyLevel::Group | HierarchyLevel::Class => 1,
            HierarchyLevel::SubClass | HierarchyLevel::Detail => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HierarchyLevel::Group => "group",
            HierarchyLevel::Class => "class",
            HierarchyLevel::SubClass => "subclass",
            HierarchyLevel::Detail => "detail",
        }
    }

    /// Validate a code for this level.
    ///
    /// Group and class codes are a single digit 1-9; subclass and detail
    /// codes are two digits 01-99. Zero is reserved at every level.
    pub fn validate_code(&self, code: &str) -> CoreResult<()> {
        if code.len() != self.code_len() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::Validation(format!(
                "{} code must be exactly {} digit(s), got '{}'",
                self.label(),
                self.code_len(),
                code
            )));
        }

        if code.bytes().all(|b| b == b'0') {
            return Err(CoreError::Validation(format!(
                "{} code cannot be zero",
                self.label()
            )));
        }

        Ok(())
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A full account code split into its level segments.
///
/// Full codes identify their level by length alone: 1 digit names a group,
/// 2 a class, 4 a subclass, 6 a detail. Segments are positional, so
/// "110101" reads group 1, class 1, subclass 01, detail 01.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullCode {
    pub group: String,
    pub class: Option<String>,
    pub subclass: Option<String>,
    pub detail: Option<String>,
}

impl FullCode {
    /// The deepest level this code addresses
    pub fn level(&self) -> HierarchyLevel {
        if self.detail.is_some() {
            HierarchyLevel::Detail
        } else if self.subclass.is_some() {
            HierarchyLevel::SubClass
        } else if self.class.is_some() {
            HierarchyLevel::Class
        } else {
            HierarchyLevel::Group
        }
    }
}

impl fmt::Display for FullCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.group)?;
        if let Some(class) = &self.class {
            write!(f, "{}", class)?;
        }
        if let Some(subclass) = &self.subclass {
            write!(f, "{}", subclass)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, "{}", detail)?;
        }
        Ok(())
    }
}

/// Concatenate the four level codes into a 6-digit full code
pub fn compose_full_code(group: &str, class: &str, subclass: &str, detail: &str) -> String {
    format!("{}{}{}{}", group, class, subclass, detail)
}

/// Parse a full code by length, validating every segment
pub fn parse_full_code(code: &str) -> CoreResult<FullCode> {
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "full code must contain only digits, got '{}'",
            code
        )));
    }

    let (group, class, subclass, detail) = match code.len() {
        1 => (&code[0..1], None, None, None),
        2 => (&code[0..1], Some(&code[1..2]), None, None),
        4 => (&code[0..1], Some(&code[1..2]), Some(&code[2..4]), None),
        6 => (
            &code[0..1],
            Some(&code[1..2]),
            Some(&code[2..4]),
            Some(&code[4..6]),
        ),
        _ => {
            return Err(CoreError::Validation(format!(
                "full code must be 1, 2, 4, or 6 digits, got '{}'",
                code
            )))
        }
    };

    HierarchyLevel::Group.validate_code(group)?;
    if let Some(class) = class {
        HierarchyLevel::Class.validate_code(class)?;
    }
    if let Some(subclass) = subclass {
        HierarchyLevel::SubClass.validate_code(subclass)?;
    }
    if let Some(detail) = detail {
        HierarchyLevel::Detail.validate_code(detail)?;
    }

    Ok(FullCode {
        group: group.to_string(),
        class: class.map(str::to_string),
        subclass: subclass.map(str::to_string),
        detail: detail.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_digit_levels_reject_zero_and_length() {
        assert!(HierarchyLevel::Group.validate_code("1").is_ok());
        assert!(HierarchyLevel::Group.validate_code("9").is_ok());
        assert!(HierarchyLevel::Group.validate_code("0").is_err());
        assert!(HierarchyLevel::Group.validate_code("10").is_err());
        assert!(HierarchyLevel::Class.validate_code("a").is_err());
    }

    #[test]
    fn two_digit_levels_require_padded_range() {
        assert!(HierarchyLevel::SubClass.validate_code("01").is_ok());
        assert!(HierarchyLevel::SubClass.validate_code("99").is_ok());
        assert!(HierarchyLevel::SubClass.validate_code("00").is_err());
        assert!(HierarchyLevel::Detail.validate_code("1").is_err());
        assert!(HierarchyLevel::Detail.validate_code("100").is_err());
    }

    #[test]
    fn full_code_level_follows_length() {
        assert_eq!(parse_full_code("1").unwrap().level(), HierarchyLevel::Group);
        assert_eq!(parse_full_code("11").unwrap().level(), HierarchyLevel::Class);
        assert_eq!(
            parse_full_code("1101").unwrap().level(),
            HierarchyLevel::SubClass
        );
        assert_eq!(
            parse_full_code("110101").unwrap().level(),
            HierarchyLevel::Detail
        );
    }

    #[test]
    fn full_code_splits_into_segments() {
        let parsed = parse_full_code("110203").unwrap();
        assert_eq!(parsed.group, "1");
        assert_eq!(parsed.class.as_deref(), Some("1"));
        assert_eq!(parsed.subclass.as_deref(), Some("02"));
        assert_eq!(parsed.detail.as_deref(), Some("03"));
        assert_eq!(parsed.to_string(), "110203");
    }

    #[test]
    fn odd_lengths_and_zero_segments_are_rejected() {
        assert!(parse_full_code("110").is_err());
        assert!(parse_full_code("11010").is_err());
        assert!(parse_full_code("1100").is_err());
        assert!(parse_full_code("010101").is_err());
        assert!(parse_full_code("").is_err());
    }

    #[test]
    fn compose_and_parse_agree() {
        let full = compose_full_code("1", "1", "01", "01");
        assert_eq!(full, "110101");
        let parsed = parse_full_code(&full).unwrap();
        assert_eq!(parsed.to_string(), full);
    }
}
