use std::fmt;
use std::str::FromStr;

/// A single attribute value of a CPE 2.3 formatted string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    Any,
    NotApplicable,
    Value(String),
}

impl FromStr for Component {
    type Err = String;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        Ok(match val {
            "*" => Component::Any,
            "-" => Component::NotApplicable,
            "" => return Err("empty cpe component".to_owned()),
            _ => Component::Value(val.to_owned()),
        })
    }
}

impl Component {
    pub fn is_any(&self) -> bool {
        matches!(self, Component::Any)
    }

    pub fn is_na(&self) -> bool {
        matches!(self, Component::NotApplicable)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Component::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Component::Any => f.write_str("*"),
            Component::NotApplicable => f.write_str("-"),
            Component::Value(v) => f.write_str(v),
        }
    }
}
