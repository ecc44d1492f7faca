//! Presentation hints attached to descriptors.
//!
//! Enumerated hints serialize as lower-camel-case strings and parse
//! case-insensitively, so `"dateRange"`, `"DateRange"` and `"DATERANGE"`
//! all name [`AggregationType::DateRange`].

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

macro_rules! hint_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The lower-camel-case name used in schema files.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ModelError::UnknownHint {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

hint_enum! {
    /// How values are grouped when a view is grouped by the property.
    GroupingRange {
        #[default]
        Discrete => "discrete",
        Alphanumeric => "alphanumeric",
        Size => "size",
        Dynamic => "dynamic",
        Date => "date",
        Percent => "percent",
        Enumerated => "enumerated",
    }
}

hint_enum! {
    /// How values are summarized when several items are selected.
    AggregationType {
        /// Show a generic "multiple values" placeholder.
        #[default]
        Default => "default",
        First => "first",
        Sum => "sum",
        Average => "average",
        DateRange => "dateRange",
        /// Concatenate distinct values.
        Union => "union",
        Max => "max",
        Min => "min",
    }
}

hint_enum! {
    /// Control used to display the value.
    DrawControl {
        #[default]
        Default => "default",
        BooleanCheckMark => "booleanCheckMark",
        BooleanToggle => "booleanToggle",
        IconList => "iconList",
        MultiLineText => "multiLineText",
        MultiValueText => "multiValueText",
        PercentBar => "percentBar",
        ProgressBar => "progressBar",
        Rating => "rating",
        StaticText => "staticText",
    }
}

hint_enum! {
    /// Control used to edit the value.
    EditControl {
        #[default]
        Default => "default",
        Calendar => "calendar",
        CheckBoxDropList => "checkBoxDropList",
        DropList => "dropList",
        IconList => "iconList",
        MultiLineText => "multiLineText",
        MultiValueText => "multiValueText",
        Rating => "rating",
        Text => "text",
    }
}

hint_enum! {
    /// Control used in a column filter menu.
    FilterControl {
        #[default]
        Default => "default",
        Calendar => "calendar",
        Rating => "rating",
    }
}

/// View flags for a property, serialized as a comma-separated name list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ViewFlags(u32);

impl ViewFlags {
    pub const DEFAULT: Self = Self(0);
    pub const CENTER_ALIGN: Self = Self(0x0001);
    pub const RIGHT_ALIGN: Self = Self(0x0002);
    pub const BEGIN_NEW_GROUP: Self = Self(0x0004);
    pub const FILL_AREA: Self = Self(0x0008);
    pub const SORT_DESCENDING: Self = Self(0x0010);
    pub const SHOW_ONLY_IF_PRESENT: Self = Self(0x0020);
    pub const SHOW_BY_DEFAULT: Self = Self(0x0040);
    pub const SHOW_IN_PRIMARY_LIST: Self = Self(0x0080);
    pub const SHOW_IN_SECONDARY_LIST: Self = Self(0x0100);
    pub const HIDE_LABEL: Self = Self(0x0200);
    pub const HIDDEN: Self = Self(0x0800);
    pub const CAN_WRAP: Self = Self(0x1000);

    const NAMES: &'static [(Self, &'static str)] = &[
        (Self::CENTER_ALIGN, "centerAlign"),
        (Self::RIGHT_ALIGN, "rightAlign"),
        (Self::BEGIN_NEW_GROUP, "beginNewGroup"),
        (Self::FILL_AREA, "fillArea"),
        (Self::SORT_DESCENDING, "sortDescending"),
        (Self::SHOW_ONLY_IF_PRESENT, "showOnlyIfPresent"),
        (Self::SHOW_BY_DEFAULT, "showByDefault"),
        (Self::SHOW_IN_PRIMARY_LIST, "showInPrimaryList"),
        (Self::SHOW_IN_SECONDARY_LIST, "showInSecondaryList"),
        (Self::HIDE_LABEL, "hideLabel"),
        (Self::HIDDEN, "hidden"),
        (Self::CAN_WRAP, "canWrap"),
    ];

    /// Raw bit value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of both flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns true when no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ViewFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("default");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(", "))
    }
}

impl FromStr for ViewFlags {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::DEFAULT;
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case("default") {
                continue;
            }
            let (flag, _) = Self::NAMES
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(part))
                .ok_or_else(|| ModelError::UnknownHint {
                    kind: "ViewFlags",
                    value: part.to_string(),
                })?;
            flags = flags.union(*flag);
        }
        Ok(flags)
    }
}

impl Serialize for ViewFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ViewFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// How a property is displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfo {
    /// Format string applied to the value when rendering it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_format_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_control: Option<DrawControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_control: Option<EditControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_control: Option<FilterControl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_flags: Option<ViewFlags>,
}

/// How a property's label is displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Prompt shown in edit controls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_label: Option<bool>,
}
