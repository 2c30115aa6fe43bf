use serde::{Deserialize, Serialize};

/// Quality gate level, ordered OK < WARN < ERROR so that folding a set of
/// condition levels is a plain `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Ok,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Ok => "OK",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Level> {
        match s {
            "OK" => Some(Level::Ok),
            "WARN" => Some(Level::Warn),
            "ERROR" => Some(Level::Error),
            _ => None,
        }
    }
}

/// Rating on the A (best) to E (worst) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    A,
    B,
    C,
    D,
    E,
}

impl Rating {
    /// Numeric index persisted as the measure value, A=1 .. E=5.
    pub fn index(self) -> f64 {
        match self {
            Rating::A => 1.0,
            Rating::B => 2.0,
            Rating::C => 3.0,
            Rating::D => 4.0,
            Rating::E => 5.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::A => "A",
            Rating::B => "B",
            Rating::C => "C",
            Rating::D => "D",
            Rating::E => "E",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_max_folds_to_worst() {
        assert_eq!(Level::Ok.max(Level::Warn), Level::Warn);
        assert_eq!(Level::Warn.max(Level::Error), Level::Error);
        assert_eq!(Level::Ok.max(Level::Ok), Level::Ok);
    }

    #[test]
    fn test_rating_index() {
        assert_eq!(Rating::A.index(), 1.0);
        assert_eq!(Rating::E.index(), 5.0);
    }
}
