//! Canonical catalog of enumerated domain values
//!
//! Single source for every fixed vocabulary the service and the migration
//! client agree on: lifecycle status, shipping status, emitter colors, the
//! seeded manufacturer list, and the mappings applied to legacy records.
//!
//! Wire strings are the exact text stored in the database and exchanged over
//! HTTP (e.g. `"Green Laser"`, not `"GREEN_LASER"`).

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Declares a closed string enum with its wire representation.
///
/// Generates `as_str`, `ALL`, `allowed()`, `Display`, `FromStr` and
/// `Deserialize` (case-sensitive exact match, errors list allowed values).
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire string for this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Comma-separated list of accepted wire strings
            pub fn allowed() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        "'{}' is not one of: {}",
                        other,
                        Self::allowed()
                    ))),
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                $name::from_str(&raw).map_err(|_| {
                    de::Error::custom(format!("'{}' is not one of: {}", raw, Self::allowed()))
                })
            }
        }
    };
}

wire_enum! {
    /// Lifecycle status of a flashlight in the collection
    FlashlightStatus {
        Wanted => "Wanted",
        Ordered => "Ordered",
        Owned => "Owned",
        Sold => "Sold",
    }
}

wire_enum! {
    /// Physical dispatch state; null while nothing has been dispatched
    ShippingStatus {
        Received => "Received",
        Shipped => "Shipped",
        Ordered => "Ordered",
    }
}

wire_enum! {
    /// Emitter color tag
    EmitterColor {
        White => "White",
        Red => "Red",
        Green => "Green",
        Blue => "Blue",
        Uv => "UV",
        Rgb => "RGB",
        GreenLaser => "Green Laser",
        RedLaser => "Red Laser",
    }
}

impl Default for EmitterColor {
    fn default() -> Self {
        EmitterColor::White
    }
}

impl FlashlightStatus {
    /// Shipping status assumed when a record omits one
    ///
    /// An `Ordered` item is in transit; nothing else implies dispatch.
    pub fn implied_shipping_status(&self) -> Option<ShippingStatus> {
        match self {
            FlashlightStatus::Ordered => Some(ShippingStatus::Ordered),
            _ => None,
        }
    }
}

/// Manufacturers seeded into the reference table on first run
pub const KNOWN_MANUFACTURERS: &[&str] = &[
    "Acebeam",
    "Wurkkos",
    "Sofirn",
    "Skilhunt",
    "Olight",
    "Nitecore",
    "Convoy",
    "Emisar",
    "Fireflies",
    "Reylight",
];

/// Suggested form-factor tags (free text is accepted)
pub const FORM_FACTORS: &[&str] = &[
    "Tube",
    "Right Angle",
    "Headlamp",
    "Flat",
    "Compact",
    "Keychain",
    "Multi-Function",
    "Lantern",
];

/// Suggested ingress-protection ratings (free text is accepted)
pub const IP_RATINGS: &[&str] = &[
    "None", "IPX4", "IPX5", "IPX6", "IPX7", "IPX8", "IP54", "IP55", "IP65", "IP66", "IP67",
    "IP68",
];

/// Suggested battery types (free text is accepted)
pub const BATTERY_TYPES: &[&str] = &[
    "AA",
    "AAA",
    "14500",
    "18350",
    "18650",
    "4x 18650",
    "21700",
    "3x 21700",
    "AA/14500",
    "AAA/10440",
    "Built-in",
];

/// Suggested finish groups (free text is accepted)
pub const FINISH_GROUPS: &[&str] = &[
    "MAO",
    "Anodized",
    "Titanium",
    "Copper",
    "Copper+Titanium",
    "Stainless Steel",
    "Brass",
];

// ========================================
// Legacy mappings (migration only)
// ========================================

/// Misspelled manufacturer names found in legacy data
const MANUFACTURER_ALIASES: &[(&str, &str)] = &[("Sofrin", "Sofirn")];

/// Canonical manufacturer name for a possibly-misspelled legacy label
pub fn canonical_manufacturer(name: &str) -> &str {
    let trimmed = name.trim();
    MANUFACTURER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == trimmed)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(trimmed)
}

/// Map a legacy status label onto the four-state lifecycle
///
/// Accepts current wire strings as well as the retired enum keys
/// (`NEW`, `ACTIVE`, `STORAGE`, `RETIRED`, `GIFTED`).
pub fn legacy_status(label: &str) -> Option<FlashlightStatus> {
    if let Ok(status) = label.parse::<FlashlightStatus>() {
        return Some(status);
    }
    match label.trim().to_ascii_uppercase().as_str() {
        "NEW" | "ACTIVE" | "STORAGE" | "RETIRED" => Some(FlashlightStatus::Owned),
        "GIFTED" => Some(FlashlightStatus::Sold),
        "WANTED" => Some(FlashlightStatus::Wanted),
        "ORDERED" => Some(FlashlightStatus::Ordered),
        "OWNED" => Some(FlashlightStatus::Owned),
        "SOLD" => Some(FlashlightStatus::Sold),
        _ => None,
    }
}

/// Map a legacy shipping label (`"In Transit"` etc.) onto the current set
pub fn legacy_shipping_status(label: &str) -> Option<ShippingStatus> {
    match label.trim() {
        "In Transit" | "IN_TRANSIT" => Some(ShippingStatus::Shipped),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_strings_round_trip_through_from_str() {
        for color in EmitterColor::ALL {
            assert_eq!(color.as_str().parse::<EmitterColor>().unwrap(), *color);
        }
        assert_eq!("Green Laser".parse::<EmitterColor>().unwrap(), EmitterColor::GreenLaser);
    }

    #[test]
    fn test_from_str_is_case_sensitive() {
        assert!("owned".parse::<FlashlightStatus>().is_err());
        assert!("white".parse::<EmitterColor>().is_err());
    }

    #[test]
    fn test_unknown_value_lists_allowed_values() {
        let err = "Lost".parse::<FlashlightStatus>().unwrap_err();
        assert!(err.to_string().contains("Wanted, Ordered, Owned, Sold"));
    }

    #[test]
    fn test_serde_uses_wire_strings() {
        let json = serde_json::to_string(&EmitterColor::Uv).unwrap();
        assert_eq!(json, "\"UV\"");
        let status: ShippingStatus = serde_json::from_str("\"Shipped\"").unwrap();
        assert_eq!(status, ShippingStatus::Shipped);
    }

    #[test]
    fn test_deserialize_error_lists_allowed_values() {
        let err = serde_json::from_str::<EmitterColor>("\"Purple\"").unwrap_err();
        assert!(err.to_string().contains("'Purple' is not one of: White, Red"));
    }

    #[test]
    fn test_default_color_is_white() {
        assert_eq!(EmitterColor::default(), EmitterColor::White);
    }

    #[test]
    fn test_only_ordered_implies_shipping() {
        assert_eq!(
            FlashlightStatus::Ordered.implied_shipping_status(),
            Some(ShippingStatus::Ordered)
        );
        assert_eq!(FlashlightStatus::Owned.implied_shipping_status(), None);
        assert_eq!(FlashlightStatus::Sold.implied_shipping_status(), None);
        assert_eq!(FlashlightStatus::Wanted.implied_shipping_status(), None);
    }

    #[test]
    fn test_manufacturer_alias_corrects_misspelling() {
        assert_eq!(canonical_manufacturer("Sofrin"), "Sofirn");
        assert_eq!(canonical_manufacturer(" Acebeam "), "Acebeam");
        assert!(KNOWN_MANUFACTURERS.contains(&canonical_manufacturer("Sofrin")));
    }

    #[test]
    fn test_legacy_status_mapping() {
        assert_eq!(legacy_status("STORAGE"), Some(FlashlightStatus::Owned));
        assert_eq!(legacy_status("RETIRED"), Some(FlashlightStatus::Owned));
        assert_eq!(legacy_status("GIFTED"), Some(FlashlightStatus::Sold));
        assert_eq!(legacy_status("Wanted"), Some(FlashlightStatus::Wanted));
        assert_eq!(legacy_status("Misplaced"), None);
    }

    #[test]
    fn test_legacy_shipping_mapping() {
        assert_eq!(legacy_shipping_status("In Transit"), Some(ShippingStatus::Shipped));
        assert_eq!(legacy_shipping_status("Received"), Some(ShippingStatus::Received));
        assert_eq!(legacy_shipping_status("Lost"), None);
    }
}
