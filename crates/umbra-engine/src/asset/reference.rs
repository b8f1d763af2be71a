use std::fmt;

/// Concrete asset location; the asset cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetUri(String);

impl AssetUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the scheme when the URI starts with `scheme://`.
    ///
    /// A scheme is an ASCII letter followed by letters, digits, `+`, `.` or `-`.
    pub fn scheme(&self) -> Option<&str> {
        let (scheme, _) = self.0.split_once("://")?;
        let mut chars = scheme.chars();
        let first = chars.next()?;
        let valid = first.is_ascii_alphabetic()
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'));
        valid.then_some(scheme)
    }

    /// The part after `scheme://`, or the whole string when there is no scheme.
    pub fn path(&self) -> &str {
        match self.scheme() {
            Some(scheme) => &self.0[scheme.len() + 3..],
            None => &self.0,
        }
    }
}

impl fmt::Display for AssetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical reference to an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetRef {
    /// Name resolved through the [`AssetLocator`].
    Alias(String),
    /// Already-resolved location.
    Location(AssetUri),
}

impl AssetRef {
    pub fn alias(name: impl Into<String>) -> Self {
        Self::Alias(name.into())
    }

    pub fn location(uri: impl Into<String>) -> Self {
        Self::Location(AssetUri::new(uri))
    }

    /// Interprets `source` as a location when it carries a URI scheme and as an alias otherwise.
    pub fn parse(source: &str) -> Self {
        let uri = AssetUri::new(source);
        if uri.scheme().is_some() {
            Self::Location(uri)
        } else {
            Self::Alias(source.to_string())
        }
    }
}

/// Resolves aliases to concrete locations.
pub trait AssetLocator {
    fn identify(&self, name: &str, asset_type: &'static str) -> AssetUri;
}

/// Uses the alias itself as the location.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityLocator;

impl AssetLocator for IdentityLocator {
    fn identify(&self, name: &str, _asset_type: &'static str) -> AssetUri {
        AssetUri::new(name)
    }
}

impl<F> AssetLocator for F
where
    F: Fn(&str, &'static str) -> AssetUri,
{
    fn identify(&self, name: &str, asset_type: &'static str) -> AssetUri {
        self(name, asset_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_detection() {
        assert_eq!(AssetUri::new("db://noise").scheme(), Some("db"));
        assert_eq!(AssetUri::new("file:///tmp/a.png").scheme(), Some("file"));
        assert_eq!(AssetUri::new("svn+ssh://host/x").scheme(), Some("svn+ssh"));
        assert_eq!(AssetUri::new("noise.png").scheme(), None);
        assert_eq!(AssetUri::new("1abc://x").scheme(), None);
        assert_eq!(AssetUri::new("a b://x").scheme(), None);
    }

    #[test]
    fn path_strips_scheme() {
        assert_eq!(AssetUri::new("file://shaders/a.wgsl").path(), "shaders/a.wgsl");
        assert_eq!(AssetUri::new("shaders/a.wgsl").path(), "shaders/a.wgsl");
    }

    #[test]
    fn parse_splits_aliases_and_locations() {
        assert_eq!(AssetRef::parse("noise"), AssetRef::alias("noise"));
        assert_eq!(AssetRef::parse("db://noise"), AssetRef::location("db://noise"));
    }

    #[test]
    fn closures_are_locators() {
        let locator = |name: &str, _: &'static str| AssetUri::new(format!("db://{name}"));
        assert_eq!(locator.identify("noise", "TextureAsset").as_str(), "db://noise");
        assert_eq!(IdentityLocator.identify("noise", "TextureAsset").as_str(), "noise");
    }
}
