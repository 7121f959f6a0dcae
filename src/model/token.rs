//! Closed sets of the icon and color tokens a category can carry.
//!
//! Both are stored as strings in the snapshot. Parsing is total: a token we do not know becomes the
//! designated fallback (`Icon::More`, gray) instead of an error, so data written by other clients
//! always loads.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The icon shown next to a category.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Icon {
    Briefcase,
    Zap,
    Home,
    Car,
    Coffee,
    Shopping,
    Film,
    Heart,
    #[default]
    More,
    School,
    Plane,
    Gift,
    Wifi,
    Phone,
    Tool,
}

impl Icon {
    pub const ALL: [Icon; 15] = [
        Icon::Briefcase,
        Icon::Zap,
        Icon::Home,
        Icon::Car,
        Icon::Coffee,
        Icon::Shopping,
        Icon::Film,
        Icon::Heart,
        Icon::More,
        Icon::School,
        Icon::Plane,
        Icon::Gift,
        Icon::Wifi,
        Icon::Phone,
        Icon::Tool,
    ];

    /// Maps any token to an icon, falling back to `Icon::More`.
    pub fn from_token(token: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|icon| icon.token() == token.trim().to_lowercase())
            .unwrap_or_default()
    }

    pub fn token(&self) -> &'static str {
        match self {
            Icon::Briefcase => "briefcase",
            Icon::Zap => "zap",
            Icon::Home => "home",
            Icon::Car => "car",
            Icon::Coffee => "coffee",
            Icon::Shopping => "shopping",
            Icon::Film => "film",
            Icon::Heart => "heart",
            Icon::More => "more",
            Icon::School => "school",
            Icon::Plane => "plane",
            Icon::Gift => "gift",
            Icon::Wifi => "wifi",
            Icon::Phone => "phone",
            Icon::Tool => "tool",
        }
    }

    /// A single-character glyph for plain text output.
    pub fn glyph(&self) -> char {
        match self {
            Icon::Briefcase => '💼',
            Icon::Zap => '⚡',
            Icon::Home => '🏠',
            Icon::Car => '🚗',
            Icon::Coffee => '☕',
            Icon::Shopping => '🛒',
            Icon::Film => '🎬',
            Icon::Heart => '❤',
            Icon::More => '…',
            Icon::School => '🎓',
            Icon::Plane => '✈',
            Icon::Gift => '🎁',
            Icon::Wifi => '📶',
            Icon::Phone => '📱',
            Icon::Tool => '🔧',
        }
    }
}

/// The hue of a category color.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Hue {
    Red,
    Orange,
    Amber,
    Green,
    Emerald,
    Teal,
    Cyan,
    Blue,
    Indigo,
    Violet,
    Purple,
    Fuchsia,
    Pink,
    Rose,
    #[default]
    Gray,
}

impl Hue {
    pub const ALL: [Hue; 15] = [
        Hue::Red,
        Hue::Orange,
        Hue::Amber,
        Hue::Green,
        Hue::Emerald,
        Hue::Teal,
        Hue::Cyan,
        Hue::Blue,
        Hue::Indigo,
        Hue::Violet,
        Hue::Purple,
        Hue::Fuchsia,
        Hue::Pink,
        Hue::Rose,
        Hue::Gray,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Hue::Red => "red",
            Hue::Orange => "orange",
            Hue::Amber => "amber",
            Hue::Green => "green",
            Hue::Emerald => "emerald",
            Hue::Teal => "teal",
            Hue::Cyan => "cyan",
            Hue::Blue => "blue",
            Hue::Indigo => "indigo",
            Hue::Violet => "violet",
            Hue::Purple => "purple",
            Hue::Fuchsia => "fuchsia",
            Hue::Pink => "pink",
            Hue::Rose => "rose",
            Hue::Gray => "gray",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hue| hue.name() == name)
    }
}

/// A category color: a hue plus a shade, written as `text-<hue>-<shade>`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Color {
    hue: Hue,
    shade: u16,
}

const DEFAULT_SHADE: u16 = 500;

impl Default for Color {
    fn default() -> Self {
        Self::new(Hue::Gray)
    }
}

impl Color {
    pub const fn new(hue: Hue) -> Self {
        Self {
            hue,
            shade: DEFAULT_SHADE,
        }
    }

    pub const fn with_shade(hue: Hue, shade: u16) -> Self {
        Self { hue, shade }
    }

    /// Maps any token to a color. Accepts `text-green-500`, `green-500` and `green`. Anything else
    /// becomes the default gray.
    pub fn from_token(token: &str) -> Self {
        let lower = token.trim().to_lowercase();
        let body = lower.strip_prefix("text-").unwrap_or(&lower);
        let (name, shade) = match body.rsplit_once('-') {
            Some((name, shade)) => match shade.parse::<u16>() {
                Ok(shade) => (name, shade),
                Err(_) => return Self::default(),
            },
            None => (body, DEFAULT_SHADE),
        };
        match Hue::from_name(name) {
            Some(hue) => Self::with_shade(hue, shade),
            None => Self::default(),
        }
    }

    pub fn token(&self) -> String {
        format!("text-{}-{}", self.hue.name(), self.shade)
    }
}

impl Display for Icon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token())
    }
}

impl FromStr for Icon {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Icon::from_token(s))
    }
}

impl FromStr for Color {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Color::from_token(s))
    }
}

impl Serialize for Icon {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for Icon {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Icon::from_token(&s))
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.token())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Color::from_token(&s))
    }
}

impl schemars::JsonSchema for Icon {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "Icon".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        let tokens: Vec<&str> = Icon::ALL.iter().map(|icon| icon.token()).collect();
        schemars::json_schema!({ "type": "string", "enum": tokens })
    }
}

impl schemars::JsonSchema for Color {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "Color".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "description": "A color such as 'indigo' or 'text-indigo-500'."
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_known_tokens() {
        for icon in Icon::ALL {
            assert_eq!(Icon::from_token(icon.token()), icon);
        }
        assert_eq!(Icon::from_token(" Coffee "), Icon::Coffee);
    }

    #[test]
    fn test_icon_unknown_falls_back_to_more() {
        assert_eq!(Icon::from_token("rocket"), Icon::More);
        let icon: Icon = serde_json::from_str(r#""rocket""#).unwrap();
        assert_eq!(icon, Icon::More);
    }

    #[test]
    fn test_color_forms() {
        assert_eq!(
            Color::from_token("text-amber-700"),
            Color::with_shade(Hue::Amber, 700)
        );
        assert_eq!(Color::from_token("indigo"), Color::new(Hue::Indigo));
        assert_eq!(Color::from_token("teal-300").token(), "text-teal-300");
    }

    #[test]
    fn test_color_unknown_falls_back_to_gray() {
        assert_eq!(Color::from_token("#ff00ff"), Color::default());
        assert_eq!(Color::from_token("text-chartreuse-500"), Color::default());
        assert_eq!(Color::from_token("text-red-dark"), Color::default());
        assert_eq!(Color::default().token(), "text-gray-500");
    }

    #[test]
    fn test_color_serde() {
        let color = Color::new(Hue::Green);
        assert_eq!(serde_json::to_string(&color).unwrap(), r#""text-green-500""#);
        let back: Color = serde_json::from_str(r#""text-green-500""#).unwrap();
        assert_eq!(back, color);
    }
}
