//! Pipeline configuration
//!
//! Resolved once per plugin and immutable afterwards. Built through
//! [`PipelineConfig::builder`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;

use crate::runtime::DEFAULT_RTL_FLAG;
use crate::transform::TransformExtension;

/// How the RTL asset is named.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilenameRule {
    /// Insert `.rtl` before the extension: `app/style.css` → `app/style.rtl.css`
    #[default]
    Default,
    /// Token pattern such as `[name]/[filebase].[contenthash].rtl.css`
    Pattern(String),
    /// Replace the first occurrence of `search` in the original name
    Replace { search: String, replace: String },
}

/// Options forwarded verbatim to the directional rewrite engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Mirror direction words inside selectors as well as declarations
    pub auto_rename: bool,
    /// Remove `rtl:` directive comments from the output
    pub clean: bool,
    /// Extra selector substitutions applied when `auto_rename` is on
    pub string_map: Vec<(String, String)>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            auto_rename: false,
            clean: true,
            string_map: Vec::new(),
        }
    }
}

/// Options forwarded verbatim to the minifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifyOptions {
    /// Merge and drop rules, not just whitespace
    pub structural: bool,
    /// Class names, ids and keyframes known to be unused
    pub unused_symbols: BTreeSet<String>,
}

static DEFAULT_MINIFY_OPTIONS: MinifyOptions = MinifyOptions {
    structural: true,
    unused_symbols: BTreeSet::new(),
};

impl Default for MinifyOptions {
    fn default() -> Self {
        DEFAULT_MINIFY_OPTIONS.clone()
    }
}

/// Whether, and how, both variants get minified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MinifyConfig {
    Disabled,
    #[default]
    Defaults,
    Options(MinifyOptions),
}

impl MinifyConfig {
    /// Options to minify with, or `None` when disabled.
    pub fn options(&self) -> Option<&MinifyOptions> {
        match self {
            MinifyConfig::Disabled => None,
            MinifyConfig::Defaults => Some(&DEFAULT_MINIFY_OPTIONS),
            MinifyConfig::Options(options) => Some(options),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, MinifyConfig::Disabled)
    }
}

impl From<bool> for MinifyConfig {
    fn from(enabled: bool) -> Self {
        if enabled {
            MinifyConfig::Defaults
        } else {
            MinifyConfig::Disabled
        }
    }
}

/// Runtime bootstrap patch: pick the stylesheet variant from a global flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFlag {
    pub name: String,
}

impl Default for RuntimeFlag {
    fn default() -> Self {
        Self {
            name: DEFAULT_RTL_FLAG.to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub struct PipelineConfig {
    filename: FilenameRule,
    transform_options: TransformOptions,
    extensions: Vec<Arc<dyn TransformExtension>>,
    diff_only: bool,
    minify: MinifyConfig,
    test: Option<Regex>,
    runtime: Option<RuntimeFlag>,
    unit_timeout: Option<Duration>,
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    pub fn filename(&self) -> &FilenameRule {
        &self.filename
    }

    pub fn transform_options(&self) -> &TransformOptions {
        &self.transform_options
    }

    pub fn extensions(&self) -> &[Arc<dyn TransformExtension>] {
        &self.extensions
    }

    pub fn diff_only(&self) -> bool {
        self.diff_only
    }

    pub fn minify(&self) -> &MinifyConfig {
        &self.minify
    }

    pub fn test(&self) -> Option<&Regex> {
        self.test.as_ref()
    }

    pub fn runtime(&self) -> Option<&RuntimeFlag> {
        self.runtime.as_ref()
    }

    pub fn unit_timeout(&self) -> Option<Duration> {
        self.unit_timeout
    }

    /// Whether a stylesheet gets an RTL counterpart.
    pub fn is_eligible(&self, asset: &str) -> bool {
        self.test.as_ref().is_none_or(|test| test.is_match(asset))
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("filename", &self.filename)
            .field("transform_options", &self.transform_options)
            .field(
                "extensions",
                &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .field("diff_only", &self.diff_only)
            .field("minify", &self.minify)
            .field("test", &self.test.as_ref().map(Regex::as_str))
            .field("runtime", &self.runtime)
            .field("unit_timeout", &self.unit_timeout)
            .finish()
    }
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn filename(mut self, rule: FilenameRule) -> Self {
        self.config.filename = rule;
        self
    }

    /// Token pattern; an empty pattern means the default naming.
    pub fn filename_pattern(self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if pattern.is_empty() {
            self.filename(FilenameRule::Default)
        } else {
            self.filename(FilenameRule::Pattern(pattern))
        }
    }

    pub fn filename_replace(self, search: impl Into<String>, replace: impl Into<String>) -> Self {
        self.filename(FilenameRule::Replace {
            search: search.into(),
            replace: replace.into(),
        })
    }

    pub fn transform_options(mut self, options: TransformOptions) -> Self {
        self.config.transform_options = options;
        self
    }

    /// Append an extension; extensions run in the order they were added.
    pub fn extension(mut self, extension: Arc<dyn TransformExtension>) -> Self {
        self.config.extensions.push(extension);
        self
    }

    pub fn diff_only(mut self, diff_only: bool) -> Self {
        self.config.diff_only = diff_only;
        self
    }

    pub fn minify(mut self, minify: impl Into<MinifyConfig>) -> Self {
        self.config.minify = minify.into();
        self
    }

    pub fn test(mut self, test: Regex) -> Self {
        self.config.test = Some(test);
        self
    }

    pub fn runtime_flag(mut self, flag: RuntimeFlag) -> Self {
        self.config.runtime = Some(flag);
        self
    }

    pub fn unit_timeout(mut self, timeout: Duration) -> Self {
        self.config.unit_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::builder().build();
        assert_eq!(config.filename(), &FilenameRule::Default);
        assert!(!config.diff_only());
        assert!(config.minify().is_enabled());
        assert_eq!(config.minify().options(), Some(&MinifyOptions::default()));
        assert!(config.runtime().is_none());
        assert!(config.transform_options().clean);
    }

    #[test]
    fn test_minify_from_bool() {
        let config = PipelineConfig::builder().minify(false).build();
        assert_eq!(config.minify().options(), None);

        let options = MinifyOptions {
            structural: false,
            ..Default::default()
        };
        let config = PipelineConfig::builder()
            .minify(MinifyConfig::Options(options.clone()))
            .build();
        assert_eq!(config.minify().options(), Some(&options));
    }

    #[test]
    fn test_eligibility() {
        let config = PipelineConfig::builder().build();
        assert!(config.is_eligible("anything.css"));

        let config = PipelineConfig::builder()
            .test(Regex::new(r"^app/").unwrap())
            .build();
        assert!(config.is_eligible("app/main.css"));
        assert!(!config.is_eligible("vendor/lib.css"));
    }

    #[test]
    fn test_empty_pattern_is_default() {
        let config = PipelineConfig::builder().filename_pattern("").build();
        assert_eq!(config.filename(), &FilenameRule::Default);
    }

    #[test]
    fn test_runtime_flag_default_name() {
        let config = PipelineConfig::builder()
            .runtime_flag(RuntimeFlag::default())
            .build();
        assert_eq!(config.runtime().unwrap().name, "IS_RTL");
    }
}
