use std::fmt;

/// Key names used when meta hints are written into a URL or token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaKeys {
    pub id: &'static str,
    pub width: &'static str,
    pub height: &'static str,
    pub resolution: &'static str,
    pub agent: &'static str,
}

/// Meta names inside query strings and project claims
pub const QUERY_META_KEYS: MetaKeys = MetaKeys {
    id: "__id",
    width: "_w",
    height: "_h",
    resolution: "_res",
    agent: "_ua",
};

/// Meta names inside render token claims
pub const CLAIM_META_KEYS: MetaKeys = MetaKeys {
    id: "i",
    width: "w",
    height: "h",
    resolution: "r",
    agent: "u",
};

/// URL layout understood by the rendering service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `/v2/<tenant>/<deck>/<template>[.<version>].<extension>?<query>`, never signed
    Legacy,
    /// `/v2/<project>/<signature>/<query><path>`, unsigned, HMAC or JWT
    ProjectSlug,
    /// `/r/v2/<tenant>/<deck>/<template>[.<version>][.<extension>]?<query>`, unsigned, HMAC or JWT
    RenderSuffix,
    /// `/v2/<project>/_/_<path>?<query>`, never signed
    PathOnly,
}

impl Scheme {
    pub const ALL: [Scheme; 4] = [
        Scheme::Legacy,
        Scheme::ProjectSlug,
        Scheme::RenderSuffix,
        Scheme::PathOnly,
    ];

    pub fn default_host(self) -> &'static str {
        match self {
            Scheme::Legacy => "flayyer.host",
            Scheme::ProjectSlug | Scheme::RenderSuffix => "cdn.flyyer.io",
            Scheme::PathOnly => "flayyer.ai",
        }
    }

    /// Renaming table for meta hints in the query string.
    ///
    /// `None` means the scheme carries no meta hints besides the stamp.
    pub fn meta_keys(self) -> Option<&'static MetaKeys> {
        match self {
            Scheme::Legacy => None,
            Scheme::ProjectSlug | Scheme::RenderSuffix | Scheme::PathOnly => Some(&QUERY_META_KEYS),
        }
    }

    pub fn supports_signing(self) -> bool {
        matches!(self, Scheme::ProjectSlug | Scheme::RenderSuffix)
    }

    /// Whether falsy values are stripped from the whole merged parameter map
    /// rather than only from meta defaults.
    pub(crate) fn filters_variables(self) -> bool {
        matches!(self, Scheme::ProjectSlug)
    }

    pub(crate) fn default_extension(self) -> Option<&'static str> {
        match self {
            Scheme::Legacy => Some("jpeg"),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Legacy => "legacy",
            Scheme::ProjectSlug => "project-slug",
            Scheme::RenderSuffix => "render-suffix",
            Scheme::PathOnly => "path-only",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown url scheme '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_parse_roundtrip() {
        for scheme in Scheme::ALL {
            assert_eq!(scheme.as_str().parse::<Scheme>().unwrap(), scheme);
        }
        assert_eq!("Render-Suffix".parse::<Scheme>().unwrap(), Scheme::RenderSuffix);
        assert!("v3".parse::<Scheme>().is_err());
    }

    #[test]
    fn test_signing_support() {
        assert!(!Scheme::Legacy.supports_signing());
        assert!(Scheme::ProjectSlug.supports_signing());
        assert!(Scheme::RenderSuffix.supports_signing());
        assert!(!Scheme::PathOnly.supports_signing());
    }

    #[test]
    fn test_legacy_has_no_meta_table() {
        assert!(Scheme::Legacy.meta_keys().is_none());
        assert_eq!(Scheme::PathOnly.meta_keys(), Some(&QUERY_META_KEYS));
    }
}
