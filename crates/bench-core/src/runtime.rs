use std::fmt;

/// Runtime versions an environment can be rebuilt for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuntimeSpec {
    Python2,
    Python3,
}

impl RuntimeSpec {
    pub fn all() -> [Self; 2] {
        [Self::Python2, Self::Python3]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python2 => "python2",
            Self::Python3 => "python3",
        }
    }

    /// Name looked up on `PATH` when no explicit interpreter is configured.
    pub fn executable_name(self) -> &'static str {
        match self {
            Self::Python2 => "python2",
            Self::Python3 => "python3",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "python2" => Some(Self::Python2),
            "python3" => Some(Self::Python3),
            _ => None,
        }
    }
}

impl fmt::Display for RuntimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
