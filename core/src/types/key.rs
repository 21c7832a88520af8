use nutype::nutype;

/// Same ceiling as a bulk string argument.
pub const MAX_KEY_LENGTH: usize = 512 * 1024 * 1024;

/// A store key. Keys are taken verbatim: the empty string is a key and
/// surrounding whitespace is significant.
#[nutype(
    validate(len_char_max = MAX_KEY_LENGTH),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        AsRef,
        Deref,
        TryFrom,
        Into,
        Hash,
        Borrow,
        Display,
    )
)]
pub struct Key(String);

impl Key {
    /// Validates a raw command argument as a key.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        Self::try_new(raw.to_owned())
    }
}
