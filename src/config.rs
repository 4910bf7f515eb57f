//! Backend configuration, from the `[output.confluence]` table of `book.toml`.

/// Which side wins when both admonition syntaxes are enabled and could apply to
/// the same content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// Typed admonition quotes win; markers only fire outside any open macro.
    Structural,
    /// A marker paragraph opening an outermost admonition quote wins, and the quote
    /// renders as a plain quote.
    Marker,
}

/// Which admonition syntaxes are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmonitionSyntax {
    /// `> [!kind] title` quotes, via the parser extension.
    Structural,
    /// `!!! kind text` paragraphs.
    Marker,
    Both(Precedence),
}

impl AdmonitionSyntax {
    pub fn structural(&self) -> bool {
        matches!(self, Self::Structural | Self::Both(_))
    }

    pub fn marker(&self) -> bool {
        matches!(self, Self::Marker | Self::Both(_))
    }
}

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    pub syntax: AdmonitionSyntax,
    /// Whether admonition titles and marker content are HTML-escaped.
    pub escape: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            syntax: AdmonitionSyntax::Structural,
            escape: true,
        }
    }
}

impl RenderConfig {
    /// Build a configuration from a lookup of keys within the backend's table.
    pub fn from_lookup<'a, F>(get: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<&'a toml::Value>,
    {
        let escape = match get("escape") {
            Some(toml::Value::Boolean(b)) => *b,
            None => true,
            v => return Err(format!("Unexpected value {:?} for boolean 'escape'", v)),
        };
        let precedence = match get("precedence") {
            Some(toml::Value::String(s)) => Some(match s.as_str() {
                "structural" => Precedence::Structural,
                "marker" => Precedence::Marker,
                other => return Err(format!("Unknown precedence '{other}'")),
            }),
            None => None,
            v => return Err(format!("Unexpected value {:?} for string 'precedence'", v)),
        };
        let syntax = match get("syntax") {
            Some(toml::Value::String(s)) => s.as_str().to_string(),
            None => "structural".to_string(),
            v => return Err(format!("Unexpected value {:?} for string 'syntax'", v)),
        };
        let syntax = match (syntax.as_str(), precedence) {
            ("both", Some(precedence)) => AdmonitionSyntax::Both(precedence),
            ("both", None) => {
                return Err("syntax 'both' requires an explicit 'precedence'".to_string())
            }
            (_, Some(_)) => {
                return Err(format!("'precedence' only applies to syntax 'both', not '{syntax}'"))
            }
            ("structural", None) => AdmonitionSyntax::Structural,
            ("marker", None) => AdmonitionSyntax::Marker,
            (other, None) => return Err(format!("Unknown syntax '{other}'")),
        };
        Ok(Self { syntax, escape })
    }

    /// Build a configuration from the `[output.confluence]` table of a book.
    pub fn from_book(config: &mdbook::Config) -> Result<Self, String> {
        Self::from_lookup(|key| config.get(&format!("output.confluence.{key}")))
    }
}
