use std::collections::HashMap;

use crate::markdown::StyleClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Character format a renderer applies to a span.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HighlightStyle {
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font_family: Option<String>,
    pub point_size: Option<f32>,
}

/// Maps every style class to its format.
#[derive(Debug, Clone)]
pub struct HighlightPalette {
    styles: HashMap<StyleClass, HighlightStyle>,
}

impl Default for HighlightPalette {
    fn default() -> Self {
        let blue = Color::rgb(0x00, 0x00, 0xFF);
        let mut styles = HashMap::new();
        styles.insert(
            StyleClass::Heading1,
            HighlightStyle {
                foreground: Some(blue),
                bold: true,
                point_size: Some(14.0),
                ..HighlightStyle::default()
            },
        );
        styles.insert(
            StyleClass::Heading2,
            HighlightStyle {
                foreground: Some(blue),
                bold: true,
                point_size: Some(12.0),
                ..HighlightStyle::default()
            },
        );
        styles.insert(
            StyleClass::Bold,
            HighlightStyle {
                bold: true,
                ..HighlightStyle::default()
            },
        );
        styles.insert(
            StyleClass::Italic,
            HighlightStyle {
                italic: true,
                ..HighlightStyle::default()
            },
        );
        styles.insert(
            StyleClass::Code,
            HighlightStyle {
                background: Some(Color::rgb(0xF0, 0xF0, 0xF0)),
                font_family: Some("Courier New".to_string()),
                ..HighlightStyle::default()
            },
        );
        styles.insert(
            StyleClass::Link,
            HighlightStyle {
                foreground: Some(blue),
                underline: true,
                ..HighlightStyle::default()
            },
        );
        styles.insert(
            StyleClass::ListItem,
            HighlightStyle {
                foreground: Some(Color::rgb(0xAA, 0x00, 0x00)),
                bold: true,
                ..HighlightStyle::default()
            },
        );
        Self { styles }
    }
}

impl HighlightPalette {
    pub fn style_for(&self, class: StyleClass) -> Option<&HighlightStyle> {
        self.styles.get(&class)
    }

    pub fn insert(&mut self, class: StyleClass, style: HighlightStyle) {
        self.styles.insert(class, style);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ThemeParseError {
    #[error("palette overrides must be a JSON object")]
    InvalidPalette,
    #[error("unknown style class '{0}'")]
    UnknownClass(String),
    #[error("invalid palette entry '{entry}': {reason}")]
    InvalidEntry { entry: String, reason: String },
    #[error("invalid color '{value}': {reason}")]
    InvalidColor {
        value: String,
        reason: ColorParseError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorParseError {
    MissingHash,
    InvalidLength,
    InvalidHex,
}

impl std::fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorParseError::MissingHash => write!(f, "missing leading '#'"),
            ColorParseError::InvalidLength => write!(f, "expected 6 or 8 hex digits"),
            ColorParseError::InvalidHex => write!(f, "contains non-hex digits"),
        }
    }
}

/// Applies overrides of the form `{"code": {"background": "#202020"}}` on top
/// of the default palette. Fields missing from an entry keep their defaults;
/// unknown fields and fields of the wrong JSON type are rejected.
pub fn parse_highlight_palette(
    overrides: &serde_json::Value,
) -> Result<HighlightPalette, ThemeParseError> {
    let map = overrides
        .as_object()
        .ok_or(ThemeParseError::InvalidPalette)?;
    let mut palette = HighlightPalette::default();
    for (name, entry) in map {
        let class = StyleClass::from_key(name)
            .ok_or_else(|| ThemeParseError::UnknownClass(name.clone()))?;
        let base = palette.style_for(class).cloned().unwrap_or_default();
        let style = parse_style(name, entry, base)?;
        palette.insert(class, style);
    }
    Ok(palette)
}

fn parse_style(
    name: &str,
    value: &serde_json::Value,
    mut style: HighlightStyle,
) -> Result<HighlightStyle, ThemeParseError> {
    let map = value
        .as_object()
        .ok_or_else(|| invalid_entry(name, "must be an object"))?;

    for (key, value) in map {
        match key.as_str() {
            "foreground" => {
                style.foreground = Some(parse_color_field(str_field(name, key, value)?)?);
            }
            "background" => {
                style.background = Some(parse_color_field(str_field(name, key, value)?)?);
            }
            "bold" => style.bold = bool_field(name, key, value)?,
            "italic" => style.italic = bool_field(name, key, value)?,
            "underline" => style.underline = bool_field(name, key, value)?,
            "font_family" => {
                style.font_family = Some(str_field(name, key, value)?.to_string());
            }
            "point_size" => {
                let size = value
                    .as_f64()
                    .ok_or_else(|| invalid_entry(name, &format!("'{key}' must be a number")))?;
                style.point_size = Some(size as f32);
            }
            other => return Err(invalid_entry(name, &format!("unknown field '{other}'"))),
        }
    }
    Ok(style)
}

fn str_field<'v>(
    name: &str,
    key: &str,
    value: &'v serde_json::Value,
) -> Result<&'v str, ThemeParseError> {
    value
        .as_str()
        .ok_or_else(|| invalid_entry(name, &format!("'{key}' must be a string")))
}

fn bool_field(name: &str, key: &str, value: &serde_json::Value) -> Result<bool, ThemeParseError> {
    value
        .as_bool()
        .ok_or_else(|| invalid_entry(name, &format!("'{key}' must be a boolean")))
}

fn invalid_entry(name: &str, reason: &str) -> ThemeParseError {
    ThemeParseError::InvalidEntry {
        entry: name.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_color_field(value: &str) -> Result<Color, ThemeParseError> {
    parse_color(value).map_err(|reason| ThemeParseError::InvalidColor {
        value: value.to_string(),
        reason,
    })
}

fn parse_color(input: &str) -> Result<Color, ColorParseError> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix('#')
        .ok_or(ColorParseError::MissingHash)?;
    if hex.len() != 6 && hex.len() != 8 {
        return Err(ColorParseError::InvalidLength);
    }
    let mut components = [0u8; 4];
    for index in 0..(hex.len() / 2) {
        let slice = hex
            .get(index * 2..index * 2 + 2)
            .ok_or(ColorParseError::InvalidHex)?;
        components[index] =
            u8::from_str_radix(slice, 16).map_err(|_| ColorParseError::InvalidHex)?;
    }
    if hex.len() == 6 {
        components[3] = 255;
    }
    Ok(Color {
        r: components[0],
        g: components[1],
        b: components[2],
        a: components[3],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_palette_covers_every_class() {
        let palette = HighlightPalette::default();
        for class in StyleClass::ALL {
            assert!(palette.style_for(class).is_some(), "{class:?}");
        }
        let heading = palette.style_for(StyleClass::Heading1).unwrap();
        assert_eq!(heading.point_size, Some(14.0));
        assert_eq!(heading.foreground, Some(Color::rgb(0, 0, 0xFF)));
    }

    #[test]
    fn overrides_merge_onto_defaults() {
        let value = json!({
            "code": { "background": "#202020CC" },
            "list_item": { "bold": false }
        });
        let palette = parse_highlight_palette(&value).unwrap();

        let code = palette.style_for(StyleClass::Code).unwrap();
        assert_eq!(
            code.background,
            Some(Color {
                r: 0x20,
                g: 0x20,
                b: 0x20,
                a: 0xCC
            })
        );
        assert_eq!(code.font_family.as_deref(), Some("Courier New"));
        assert!(!palette.style_for(StyleClass::ListItem).unwrap().bold);
    }

    #[test]
    fn rejects_unknown_classes_and_bad_colors() {
        assert!(matches!(
            parse_highlight_palette(&json!({ "keyword": {} })),
            Err(ThemeParseError::UnknownClass(_))
        ));
        assert!(matches!(
            parse_highlight_palette(&json!({ "link": { "foreground": "00F" } })),
            Err(ThemeParseError::InvalidColor {
                reason: ColorParseError::MissingHash,
                ..
            })
        ));
        assert!(matches!(
            parse_highlight_palette(&json!([])),
            Err(ThemeParseError::InvalidPalette)
        ));
    }

    #[test]
    fn rejects_fields_of_the_wrong_type() {
        for entry in [
            json!({ "bold": { "bold": "yes" } }),
            json!({ "link": { "foreground": 5 } }),
            json!({ "code": { "point_size": "large" } }),
            json!({ "code": { "font_family": null } }),
            json!({ "italic": { "slant": true } }),
            json!({ "heading1": "big" }),
        ] {
            assert!(
                matches!(
                    parse_highlight_palette(&entry),
                    Err(ThemeParseError::InvalidEntry { .. })
                ),
                "{entry}"
            );
        }
    }
}
