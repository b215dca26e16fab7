/// Alphabets backing each character-domain category.
pub mod domain {
    /// Base-10 digit characters.
    pub const DIGITS: &[char] = &['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];
    /// Lowercase ASCII letters.
    pub const ALPHA: &[char] = &[
        'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
        's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    ];
    /// Digits followed by lowercase ASCII letters.
    pub const ALPHANUMERIC: &[char] = &[
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h',
        'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    ];

    /// Category label for digit fields.
    pub const LABEL_DIGIT: &str = "digit";
    /// Category label for alphabetic fields.
    pub const LABEL_ALPHA: &str = "alpha";
    /// Category label for alphanumeric fields.
    pub const LABEL_ALPHANUMERIC: &str = "alphanumeric";
}

/// Constants used by insertion position policies.
pub mod position {
    /// Direction bias passed to the position policy for insertions (one past the end is valid).
    pub const INSERTION_DIRECTION: isize = 1;
    /// Standard deviation of the Gaussian-midpoint position policy.
    pub const GAUSSIAN_STD_DEV: f64 = 1.0;
}

/// Constants used by the duplicate generator and its collaborators.
pub mod generator {
    /// Default upper bound on successful modifications per duplicate.
    pub const DEFAULT_MAX_RECORD_MODIFICATIONS: usize = 3;
    /// Default redraw ceiling for the retry-until-eligible field selector.
    pub const DEFAULT_SELECTION_RETRY_LIMIT: usize = 1_000;
    /// Default number of fresh passes attempted after a uniqueness rejection.
    pub const DEFAULT_UNIQUENESS_ATTEMPTS: usize = 10;
    /// Default number of consecutive rounds without a successful modification before giving up.
    pub const DEFAULT_MAX_STALLED_ROUNDS: usize = 100;
    /// Default identifier field excluded from canonical forms.
    pub const DEFAULT_IDENTIFIER_FIELD: &str = "rec_id";
    /// Infix used when formatting duplicate identifiers (`{original}-dup-{n}`).
    pub const DUPLICATE_ID_INFIX: &str = "-dup-";
    /// Offset mixed into per-record RNG seed derivation.
    pub const RECORD_SEED_OFFSET: u64 = 0xD0F1_CA7E;
}
