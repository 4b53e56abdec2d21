//! Argument rules checked before a request reaches the native layer.

use crate::errors::ArgumentError;
use crate::Action;

/// Longest accepted collection name, in characters.
pub const MAX_COLLECTION_NAME_LEN: usize = 64;

/// Check a collection name against the store naming rule.
///
/// The first character must be an ASCII letter or digit. Up to 63 more may
/// follow, each an ASCII letter, digit, `.`, `_`, `-` or `|`. The `|` comes
/// from the historical character class and is accepted for compatibility with
/// names the native side already issued.
pub fn is_valid_collection_name(name: &str) -> bool {
    let Some((first, rest)) = name.as_bytes().split_first() else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && rest.len() < MAX_COLLECTION_NAME_LEN
        && rest.iter().copied().all(is_collection_tail_byte)
}

fn is_collection_tail_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b'|')
}

pub fn validate_collection_name(name: &str) -> Result<(), ArgumentError> {
    if is_valid_collection_name(name) {
        Ok(())
    } else {
        Err(ArgumentError::InvalidCollectionName)
    }
}

pub fn validate_product_id(product_id: &str) -> Result<(), ArgumentError> {
    if product_id.is_empty() {
        return Err(ArgumentError::EmptyProductId {
            method: Action::PurchaseOffer.qualified_name(),
        });
    }
    Ok(())
}
