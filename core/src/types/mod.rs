pub(crate) mod key;
pub use key::{Key, KeyError, MAX_KEY_LENGTH};
