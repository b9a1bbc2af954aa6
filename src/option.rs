/// Escape character used when none is configured.
pub const DEFAULT_ESCAPE: char = '\\';

/// Options controlling how a LIKE pattern is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeOption {
    pub(crate) escape: char,
    pub(crate) case_insensitive: bool,
    pub(crate) binary: bool,
}

impl Default for LikeOption {
    fn default() -> Self {
        LikeOption {
            escape: DEFAULT_ESCAPE,
            case_insensitive: false,
            binary: false,
        }
    }
}

impl LikeOption {
    /// Character that makes the following pattern character literal.
    pub fn escape(self, escape: char) -> Self {
        LikeOption { escape, ..self }
    }

    /// Match case-insensitively (`ILIKE`).
    pub fn case_insensitive(self, case_insensitive: bool) -> Self {
        LikeOption {
            case_insensitive,
            ..self
        }
    }

    /// Match raw bytes instead of UTF-8 characters.
    ///
    /// Required for binary columns: `_` then stands for one byte and `%` for
    /// any byte sequence, valid UTF-8 or not.
    pub fn binary(self, binary: bool) -> Self {
        LikeOption { binary, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let option = LikeOption::default();
        assert_eq!(option.escape, '\\');
        assert!(!option.case_insensitive);
        assert!(!option.binary);

        let option = option.escape('!').case_insensitive(true).binary(true);
        assert_eq!(option.escape, '!');
        assert!(option.case_insensitive);
        assert!(option.binary);
    }
}
