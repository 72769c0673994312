//! Sign characters for each operation
//!
//! | Operation | delta | patch text |
//! |-----------|-------|------------|
//! | Equal     | `=`   | ` `        |
//! | Delete    | `-`   | `-`        |
//! | Insert    | `+`   | `+`        |

use crate::diff::Operation;

impl Operation {
    /// Parse the leading char of a delta token
    pub fn from_delta_sign(sign: char) -> Option<Self> {
        match sign {
            '=' => Some(Self::Equal),
            '-' => Some(Self::Delete),
            '+' => Some(Self::Insert),
            _ => None,
        }
    }

    /// Leading char of a delta token
    pub fn delta_sign(self) -> char {
        match self {
            Self::Equal => '=',
            Self::Delete => '-',
            Self::Insert => '+',
        }
    }

    /// Parse the leading char of a patch body line
    pub fn from_patch_sign(sign: char) -> Option<Self> {
        match sign {
            ' ' => Some(Self::Equal),
            '-' => Some(Self::Delete),
            '+' => Some(Self::Insert),
            _ => None,
        }
    }

    /// Leading char of a patch body line
    pub fn patch_sign(self) -> char {
        match self {
            Self::Equal => ' ',
            Self::Delete => '-',
            Self::Insert => '+',
        }
    }

    #[cfg(test)]
    pub(crate) fn all() -> &'static [Operation] {
        &[Self::Delete, Self::Insert, Self::Equal]
    }

    /// Check if the operation carries its text in encoded output rather than
    /// a length
    pub fn carries_text(self) -> bool {
        matches!(self, Self::Insert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_signs() {
        assert_eq!(Operation::Equal.delta_sign(), '=');
        assert_eq!(Operation::Delete.delta_sign(), '-');
        assert_eq!(Operation::Insert.delta_sign(), '+');

        assert_eq!(Operation::from_delta_sign(' '), None);
        assert_eq!(Operation::from_delta_sign('*'), None);
    }

    #[test]
    fn test_patch_signs() {
        assert_eq!(Operation::Equal.patch_sign(), ' ');
        assert_eq!(Operation::Delete.patch_sign(), '-');
        assert_eq!(Operation::Insert.patch_sign(), '+');

        assert_eq!(Operation::from_patch_sign('='), None);
        assert_eq!(Operation::from_patch_sign('@'), None);
    }

    #[test]
    fn test_signs_round_trip() {
        for op in Operation::all() {
            assert_eq!(Operation::from_delta_sign(op.delta_sign()), Some(*op));
            assert_eq!(Operation::from_patch_sign(op.patch_sign()), Some(*op));
        }
    }

    #[test]
    fn test_all_operations() {
        let all_ops = Operation::all();
        assert_eq!(all_ops.len(), 3);
        assert!(all_ops.contains(&Operation::Delete));
        assert!(all_ops.contains(&Operation::Insert));
        assert!(all_ops.contains(&Operation::Equal));
    }

    #[test]
    fn test_carries_text() {
        assert!(Operation::Insert.carries_text());
        assert!(!Operation::Delete.carries_text());
        assert!(!Operation::Equal.carries_text());
    }
}
