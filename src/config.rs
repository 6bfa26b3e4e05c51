//! Rendering options chosen by the document driver

use crate::escape::attribute;

/// Default encoding written into the XML declaration
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Indentation unit added per nesting level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndentStyle {
    /// No whitespace is added
    #[default]
    None,
    /// Four spaces per level
    Spaces,
    /// One tab per level
    Tab,
}

impl IndentStyle {
    /// Selects a style by name; unrecognized names mean no indentation
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "space" | "spaces" => Self::Spaces,
            "tab" | "tabs" => Self::Tab,
            _ => Self::None,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Spaces => "    ",
            Self::Tab => "\t",
        }
    }

    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Contents of the `<?xml ...?>` declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    /// Declared encoding; blank or absent falls back to UTF-8
    pub encoding: Option<String>,
    /// `standalone="yes"` or `standalone="no"` when set
    pub standalone: Option<bool>,
}

impl Declaration {
    #[must_use]
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    #[must_use]
    pub fn standalone(mut self, standalone: bool) -> Self {
        self.standalone = Some(standalone);
        self
    }

    /// Parses a standalone flag; anything but yes/no/true/false is ignored
    pub fn parse_standalone(value: &str) -> Option<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Some(true),
            "no" | "false" => Some(false),
            _ => None,
        }
    }

    /// Renders the declaration without a trailing newline
    pub fn render(&self) -> String {
        let encoding = self
            .encoding
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_ENCODING);

        let mut out = format!(
            "<?xml {} {}",
            attribute("version", "1.0"),
            attribute("encoding", encoding)
        );
        if let Some(standalone) = self.standalone {
            out.push(' ');
            out.push_str(&attribute(
                "standalone",
                if standalone { "yes" } else { "no" },
            ));
        }
        out.push_str("?>");
        out
    }
}

/// Configuration for rendering a document
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub indent: IndentStyle,
    /// Emit an XML declaration before the first root
    pub declaration: Option<Declaration>,
}

impl Options {
    #[must_use]
    pub fn indent(mut self, indent: IndentStyle) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn declaration(mut self, declaration: Declaration) -> Self {
        self.declaration = Some(declaration);
        self
    }
}

/// When stream events reach listeners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlushPolicy {
    /// Every flush is delivered as soon as it happens
    Immediate,
    /// Events are held until the consumer calls `XmlStream::tick`, then
    /// delivered synchronously
    #[default]
    DeferredFirst,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent_from_name() {
        assert_eq!(IndentStyle::from_name("space"), IndentStyle::Spaces);
        assert_eq!(IndentStyle::from_name("TAB"), IndentStyle::Tab);
        assert_eq!(IndentStyle::from_name("zigzag"), IndentStyle::None);
        assert_eq!(IndentStyle::Spaces.unit(), "    ");
    }

    #[test]
    fn test_declaration_defaults() {
        assert_eq!(
            Declaration::default().render(),
            r#"<?xml version="1.0" encoding="UTF-8"?>"#
        );
    }

    #[test]
    fn test_declaration_encoding_and_standalone() {
        let decl = Declaration::default().encoding("ISO-8859-1").standalone(false);
        assert_eq!(
            decl.render(),
            r#"<?xml version="1.0" encoding="ISO-8859-1" standalone="no"?>"#
        );
    }

    #[test]
    fn test_blank_encoding_falls_back() {
        let decl = Declaration::default().encoding("  ");
        assert!(decl.render().contains(r#"encoding="UTF-8""#));
    }

    #[test]
    fn test_parse_standalone() {
        assert_eq!(Declaration::parse_standalone("yes"), Some(true));
        assert_eq!(Declaration::parse_standalone("false"), Some(false));
        assert_eq!(Declaration::parse_standalone("maybe"), None);
    }
}
