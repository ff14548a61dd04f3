//! Row identifiers.
//!
//! Every table uses a `SERIAL` key. Each gets its own newtype so a
//! `WebsiteId` can never be passed where a `ContentId` is expected.

macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw row ID.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw row ID.
            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    )+};
}

define_id!(
    /// An account.
    UserId,
    /// A website profile.
    WebsiteId,
    /// A generated article or page.
    ContentId,
    /// A product description awaiting review.
    PendingDescriptionId,
    /// A description written to Shopify, kept for revert.
    PublishedProductId,
    /// A stored platform connection.
    PlatformConfigId,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let id = WebsiteId::new(42);
        assert_eq!(id.as_i32(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(WebsiteId::from(42), id);
        assert!(ContentId::new(1) < ContentId::new(2));
    }

    #[test]
    fn test_display_and_json() {
        assert_eq!(PendingDescriptionId::new(7).to_string(), "7");
        assert_eq!(serde_json::to_string(&UserId::new(3)).ok().as_deref(), Some("3"));
        assert_eq!(
            serde_json::from_str::<PlatformConfigId>("9").ok(),
            Some(PlatformConfigId::new(9))
        );
    }
}
