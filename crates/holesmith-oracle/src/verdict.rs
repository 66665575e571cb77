// verdict.rs
//! Oracle verdicts.

use std::fmt;

/// What an oracle knows about a boolean condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// True under every assignment.
    Valid,
    /// False under every assignment.
    Unsatisfiable,
    /// Both outcomes are possible.
    Contingent,
    Unknown,
}

impl Verdict {
    /// The constant a decided condition can be fixed to.
    pub fn fixed_value(self) -> Option<bool> {
        match self {
            Verdict::Valid => Some(true),
            Verdict::Unsatisfiable => Some(false),
            Verdict::Contingent | Verdict::Unknown => None,
        }
    }

    /// Combine the answers for `f` and for `not f`.
    pub fn classify(formula: SatAnswer, negation: SatAnswer) -> Verdict {
        match (formula, negation) {
            (SatAnswer::Unsat, _) => Verdict::Unsatisfiable,
            (SatAnswer::Unknown, _) | (_, SatAnswer::Unknown) => Verdict::Unknown,
            (SatAnswer::Sat, SatAnswer::Unsat) => Verdict::Valid,
            (SatAnswer::Sat, SatAnswer::Sat) => Verdict::Contingent,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Valid => "VALID",
            Verdict::Unsatisfiable => "UNSATISFIABLE",
            Verdict::Contingent => "CONTINGENT",
            Verdict::Unknown => "UNKNOWN",
        })
    }
}

/// One `check-sat` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatAnswer {
    Sat,
    Unsat,
    Unknown,
}

impl SatAnswer {
    pub fn parse(line: &str) -> Option<SatAnswer> {
        match line.trim() {
            "sat" => Some(SatAnswer::Sat),
            "unsat" => Some(SatAnswer::Unsat),
            "unknown" => Some(SatAnswer::Unknown),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        use SatAnswer::*;
        assert_eq!(Verdict::classify(Unsat, Sat), Verdict::Unsatisfiable);
        assert_eq!(Verdict::classify(Unsat, Unknown), Verdict::Unsatisfiable);
        assert_eq!(Verdict::classify(Sat, Unsat), Verdict::Valid);
        assert_eq!(Verdict::classify(Sat, Sat), Verdict::Contingent);
        assert_eq!(Verdict::classify(Sat, Unknown), Verdict::Unknown);
        assert_eq!(Verdict::classify(Unknown, Unsat), Verdict::Unknown);
    }

    #[test]
    fn fixed_values() {
        assert_eq!(Verdict::Valid.fixed_value(), Some(true));
        assert_eq!(Verdict::Unsatisfiable.fixed_value(), Some(false));
        assert_eq!(Verdict::Contingent.fixed_value(), None);
    }
}
