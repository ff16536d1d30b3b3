//! Theme tags.
//!
//! A room or template allows an ordered list of themes. One of them is the
//! default: the theme its raw block payload was authored against.

/// Theme used when nothing else is known.
pub const DEFAULT_THEME: &str = "default";

/// Ordered theme list with a designated default.
///
/// The default is always a member of the list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Themes {
    allowed: Vec<String>,
    default: String,
}

impl Themes {
    /// Builds a theme list. A default missing from `allowed` is put first.
    /// Empty and duplicate names are dropped.
    #[must_use]
    pub fn new<I, S>(allowed: I, default: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for name in allowed {
            let name = name.into().trim().to_string();
            if !name.is_empty() && !list.contains(&name) {
                list.push(name);
            }
        }

        let default = match default.trim() {
            "" => list.first().cloned().unwrap_or_else(|| DEFAULT_THEME.to_string()),
            d => d.to_string(),
        };
        if !list.contains(&default) {
            list.insert(0, default.clone());
        }

        Self { allowed: list, default }
    }

    /// Parses a comma-joined list.
    #[must_use]
    pub fn parse(joined: &str, default: &str) -> Self {
        Self::new(joined.split(','), default)
    }

    /// Comma-joined list, for persistence.
    #[must_use]
    pub fn joined(&self) -> String {
        self.allowed.join(",")
    }

    /// Allowed themes, in order.
    #[must_use]
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// The default theme.
    #[must_use]
    pub fn default_theme(&self) -> &str {
        &self.default
    }

    /// Returns true if `theme` is allowed.
    #[must_use]
    pub fn allows(&self, theme: &str) -> bool {
        self.allowed.iter().any(|t| t == theme)
    }

    /// Changes the default. Returns false (and changes nothing) if `theme`
    /// is not allowed.
    pub fn set_default(&mut self, theme: &str) -> bool {
        if self.allows(theme) {
            self.default = theme.to_string();
            true
        } else {
            false
        }
    }

    /// Adds a theme at the end of the list.
    pub fn add(&mut self, theme: &str) {
        let theme = theme.trim();
        if !theme.is_empty() && !self.allows(theme) {
            self.allowed.push(theme.to_string());
        }
    }

    /// Removes a theme. The default cannot be removed.
    pub fn remove(&mut self, theme: &str) -> bool {
        if theme == self.default {
            return false;
        }
        let before = self.allowed.len();
        self.allowed.retain(|t| t != theme);
        self.allowed.len() != before
    }
}

impl Default for Themes {
    fn default() -> Self {
        Self::new(Vec::<String>::new(), DEFAULT_THEME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_always_allowed() {
        let themes = Themes::new(["stone", "moss"], "sand");
        assert_eq!(themes.allowed(), ["sand", "stone", "moss"]);
        assert_eq!(themes.default_theme(), "sand");

        let themes = Themes::new(["stone", "moss"], "");
        assert_eq!(themes.default_theme(), "stone");

        let themes = Themes::default();
        assert_eq!(themes.allowed(), [DEFAULT_THEME]);
    }

    #[test]
    fn test_parse_and_join() {
        let themes = Themes::parse("stone, moss,,stone", "moss");
        assert_eq!(themes.joined(), "stone,moss");
        assert_eq!(Themes::parse(&themes.joined(), "moss"), themes);
    }

    #[test]
    fn test_edit() {
        let mut themes = Themes::new(["stone"], "stone");
        themes.add("ice");
        assert!(themes.set_default("ice"));
        assert!(!themes.set_default("lava"));
        assert!(!themes.remove("ice"));
        assert!(themes.remove("stone"));
        assert_eq!(themes.allowed(), ["ice"]);
    }
}
