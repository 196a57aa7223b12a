/// The three names a parser is known by.
///
/// `name` is for humans (fallback output and log messages), `parser` is the
/// registry key matched against the first word of a line, and `template` is the
/// key handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollection {
    name: String,
    parser: String,
    template: String,
}

impl NameCollection {
    pub fn new(
        name: impl Into<String>,
        parser: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parser: parser.into(),
            template: template.into(),
        }
    }

    /// Derives the registry and renderer keys from a display name.
    ///
    /// `"Progress Roll"` gives parser key `progress-roll` and template key
    /// `progress_roll`.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        Self::new(name, lower.replace(' ', "-"), lower.replace([' ', '-'], "_"))
    }

    /// Names of the implicit root scope of a mechanics section.
    pub fn root() -> Self {
        Self::new("Mechanics", "mechanics", "mechanics")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parser(&self) -> &str {
        &self.parser
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}
