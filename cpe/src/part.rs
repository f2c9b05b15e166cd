use std::{fmt, str::FromStr};

/// The `part` attribute of a CPE name: what kind of platform it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Any,
    Application,
    OperatingSystem,
    Hardware,
}

impl FromStr for Part {
    type Err = String;

    fn from_str(val: &str) -> Result<Self, Self::Err> {
        match val {
            "*" => Ok(Self::Any),
            "a" => Ok(Self::Application),
            "o" => Ok(Self::OperatingSystem),
            "h" => Ok(Self::Hardware),
            "" => Err("empty cpe part".to_owned()),
            other => Err(format!("could not convert '{}' to cpe part", other)),
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Any => "*",
            Self::Application => "a",
            Self::OperatingSystem => "o",
            Self::Hardware => "h",
        };
        f.write_str(s)
    }
}
