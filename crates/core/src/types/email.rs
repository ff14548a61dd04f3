//! Account email addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string was rejected as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// Nothing left after trimming.
    #[error("email cannot be empty")]
    Empty,
    /// Longer than [`Email::MAX_LENGTH`].
    #[error("email must be at most {max} characters")]
    TooLong {
        /// The limit that was exceeded.
        max: usize,
    },
    /// No `@`, or more than one.
    #[error("email must contain exactly one @")]
    BadSeparator,
    /// Nothing before the `@`.
    #[error("email needs text before the @")]
    EmptyLocalPart,
    /// Nothing after the `@`.
    #[error("email needs a domain after the @")]
    EmptyDomain,
}

/// A lowercased email address with one `@` and non-empty halves.
///
/// Used as the login identifier, so `Owner@Shop.test` and `owner@shop.test`
/// are the same account.
///
/// ```
/// use contentforge_core::Email;
///
/// let email = Email::parse(" Owner@Shop.test ").unwrap();
/// assert_eq!(email.as_str(), "owner@shop.test");
/// assert!(Email::parse("owner@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Validate and normalise `raw`.
    ///
    /// Surrounding whitespace is trimmed and the whole address lowercased.
    /// Only the shape is checked; deliverability is not.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` describing the first problem found.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let (local, domain) = trimmed.split_once('@').ok_or(EmailError::BadSeparator)?;
        if domain.contains('@') {
            return Err(EmailError::BadSeparator);
        }
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// The normalised address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

// Stored as TEXT; rows were validated on the way in.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        for raw in [
            "writer@acme.test",
            "first.last+blog@mail.acme.co.uk",
            "a@b",
        ] {
            assert!(Email::parse(raw).is_ok(), "{raw}");
        }
    }

    #[test]
    fn test_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("acme.test"), Err(EmailError::BadSeparator));
        assert_eq!(Email::parse("a@b@acme.test"), Err(EmailError::BadSeparator));
        assert_eq!(Email::parse("@acme.test"), Err(EmailError::EmptyLocalPart));
        assert_eq!(Email::parse("writer@"), Err(EmailError::EmptyDomain));

        let long = format!("{}@acme.test", "w".repeat(250));
        assert_eq!(Email::parse(&long), Err(EmailError::TooLong { max: 254 }));
    }

    #[test]
    fn test_lowercases_and_trims() {
        let email = Email::parse("  Editor@Blog.ACME.test\n").unwrap();
        assert_eq!(email.as_str(), "editor@blog.acme.test");
        assert_eq!(email.domain(), "blog.acme.test");
        assert_eq!(email.to_string(), "editor@blog.acme.test");
    }

    #[test]
    fn test_deserialize_validates() {
        let email: Email = serde_json::from_str("\"Writer@Acme.test\"").unwrap();
        assert_eq!(email.as_str(), "writer@acme.test");
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"writer@acme.test\"");

        assert!(serde_json::from_str::<Email>("\"not-an-email\"").is_err());
    }
}
