//! Newtype IDs for type-safe document references.
//!
//! Document IDs are strings chosen by the auth provider (user ids) or by the
//! admin entering a product (item ids). Use the `define_id!` macro to create
//! wrappers that prevent accidentally mixing IDs from different collections.

use thiserror::Error;

/// Maximum length of a document ID in bytes.
pub const MAX_ID_BYTES: usize = 1500;

/// Errors that can occur when parsing a document ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input string is empty or only whitespace.
    #[error("id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("id must be at most {max} bytes")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a path separator.
    #[error("id cannot contain '/'")]
    ContainsSlash,
    /// The input is `.`, `..` or a `__reserved__` name.
    #[error("id '{0}' is reserved")]
    Reserved(String),
}

/// Validate a raw document ID.
///
/// # Errors
///
/// Returns an [`IdError`] describing the first rule the input breaks.
pub fn validate_id(s: &str) -> Result<(), IdError> {
    if s.trim().is_empty() {
        return Err(IdError::Empty);
    }
    if s.len() > MAX_ID_BYTES {
        return Err(IdError::TooLong { max: MAX_ID_BYTES });
    }
    if s.contains('/') {
        return Err(IdError::ContainsSlash);
    }
    if s == "." || s == ".." || (s.len() > 4 && s.starts_with("__") && s.ends_with("__")) {
        return Err(IdError::Reserved(s.to_owned()));
    }
    Ok(())
}

/// Macro to define a type-safe document ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` (deserialization validates the id)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `parse()`, `as_str()`, `into_inner()`
/// - `Display`, `FromStr`, `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use kirana_core::define_id;
/// define_id!(OrderId);
/// define_id!(ReviewId);
///
/// let order_id = OrderId::parse("o-1").unwrap();
/// let review_id = ReviewId::parse("o-1").unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = review_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an ID, validating document-id rules.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is empty, too long, contains a
            /// `/` or is a reserved name.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                $crate::validate_id(s)?;
                Ok(Self(s.to_owned()))
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl ::core::convert::TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(s: String) -> ::core::result::Result<Self, Self::Error> {
                $crate::validate_id(&s)?;
                Ok(Self(s))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Document IDs for the two collections
define_id!(UserId);
define_id!(ItemId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_ids() {
        assert!(ItemId::parse("sku1").is_ok());
        assert!(ItemId::parse("summer-dress_02").is_ok());
        assert!(UserId::parse("Xy7ab9QkT2hQ0").is_ok());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(ItemId::parse(""), Err(IdError::Empty));
        assert_eq!(ItemId::parse("   "), Err(IdError::Empty));
    }

    #[test]
    fn test_parse_rejects_slash() {
        assert_eq!(ItemId::parse("a/b"), Err(IdError::ContainsSlash));
    }

    #[test]
    fn test_parse_rejects_reserved() {
        assert!(matches!(ItemId::parse(".."), Err(IdError::Reserved(_))));
        assert!(matches!(ItemId::parse("__name__"), Err(IdError::Reserved(_))));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let long = "x".repeat(MAX_ID_BYTES + 1);
        assert!(matches!(ItemId::parse(&long), Err(IdError::TooLong { .. })));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ItemId = serde_json::from_str("\"sku1\"").unwrap();
        assert_eq!(ok.as_str(), "sku1");
        assert!(serde_json::from_str::<ItemId>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"sku1\"");
    }
}
