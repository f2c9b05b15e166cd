//! Parser for CPE 2.3 formatted strings (`cpe:2.3:part:vendor:product:...`).
use std::fmt;
use std::str::FromStr;

pub mod component;
pub mod part;

use component::Component;
use part::Part;

/// Number of `:` separated fields in a CPE 2.3 formatted string, prefix included.
const FIELDS: usize = 13;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Product {
    pub vendor: String,
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpe23 {
    pub part: Part,
    pub vendor: Component,
    pub product: Component,
    pub version: Component,
    pub update: Component,
    pub edition: Component,
    pub language: Component,
    pub sw_edition: Component,
    pub target_sw: Component,
    pub target_hw: Component,
    pub other: Component,
}

impl Cpe23 {
    pub fn product(&self) -> Product {
        Product {
            vendor: self.vendor.to_string(),
            product: self.product.to_string(),
        }
    }
}

impl TryFrom<&str> for Cpe23 {
    type Error = String;
    fn try_from(val: &str) -> Result<Self, Self::Error> {
        Cpe23::from_str(val)
    }
}

impl FromStr for Cpe23 {
    type Err = String;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        let fields = split_fields(val);
        if fields.len() != FIELDS {
            return Err(format!(
                "expected {} fields in cpe string, found {}",
                FIELDS,
                fields.len()
            ));
        }

        let (prefix, ver) = (fields[0], fields[1]);
        if !prefix.eq_ignore_ascii_case("cpe") {
            return Err(format!("expected 'cpe' found '{}'", prefix));
        } else if ver != "2.3" {
            return Err(format!("expected cpe v2.3, found v{}", ver));
        }

        Ok(Self {
            part: fields[2].parse()?,
            vendor: fields[3].parse()?,
            product: fields[4].parse()?,
            version: fields[5].parse()?,
            update: fields[6].parse()?,
            edition: fields[7].parse()?,
            language: fields[8].parse()?,
            sw_edition: fields[9].parse()?,
            target_sw: fields[10].parse()?,
            target_hw: fields[11].parse()?,
            other: fields[12].parse()?,
        })
    }
}

impl fmt::Display for Cpe23 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "cpe:2.3:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.part,
            self.vendor,
            self.product,
            self.version,
            self.update,
            self.edition,
            self.language,
            self.sw_edition,
            self.target_sw,
            self.target_hw,
            self.other
        )
    }
}

/// Splits on `:` separators, leaving backslash-escaped colons inside their field.
fn split_fields(val: &str) -> Vec<&str> {
    let mut fields = Vec::with_capacity(FIELDS);
    let mut start = 0;
    let mut escaped = false;

    for (i, c) in val.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            ':' => {
                fields.push(&val[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&val[start..]);

    fields
}
