//! Macro for implementing string conversions on status enums
//!
//! Statuses are persisted and exchanged as lowercase strings. The macro
//! generates `as_str`, `Display`, `FromStr` (case-insensitive, surrounding
//! whitespace ignored) and an `ALL` constant listing every variant.
//!
//! # Example
//!
//! ```rust
//! use eventhub_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum DeliveryStatus {
//!     Queued,
//!     Delivered,
//! }
//!
//! impl_status_conversions!(DeliveryStatus {
//!     Queued => "queued",
//!     Delivered => "delivered",
//! });
//!
//! assert_eq!(DeliveryStatus::Queued.as_str(), "queued");
//! assert_eq!(" Delivered ".parse::<DeliveryStatus>(), Ok(DeliveryStatus::Delivered));
//! ```

/// Implements `as_str`, `ALL`, `Display` and `FromStr` for a fieldless enum.
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$enum_name] = &[$(Self::$variant),+];

            /// Lowercase wire representation.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
