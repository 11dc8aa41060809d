//! `rtl.json` configuration and its merge with command-line flags

use std::time::Duration;

use camino::Utf8Path;
use eyre::{Result, WrapErr};
use regex::Regex;
use rtl_pipeline::{
    FilenameRule, MinifyConfig, MinifyOptions, PipelineConfig, RuntimeFlag, TransformOptions,
};
use serde::Deserialize;

use crate::args::Args;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub filename: Option<FilenameSetting>,
    pub options: Option<EngineOptions>,
    pub diff_only: Option<bool>,
    pub minify: Option<MinifySetting>,
    pub test: Option<String>,
    pub update_runtime_chunk: Option<bool>,
    pub rtl_flag: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// `"[name].rtl.css"` or `[".css", ".rtl.css"]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FilenameSetting {
    Pattern(String),
    Replace([String; 2]),
}

/// `false` or `{ "structural": false, "unusedSymbols": ["x"] }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MinifySetting {
    Enabled(bool),
    Options(MinifyFileOptions),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct MinifyFileOptions {
    pub structural: bool,
    pub unused_symbols: Vec<String>,
}

impl Default for MinifyFileOptions {
    fn default() -> Self {
        Self {
            structural: true,
            unused_symbols: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EngineOptions {
    pub auto_rename: bool,
    pub clean: bool,
    /// `[search, replace]` pairs
    pub string_map: Vec<[String; 2]>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let defaults = TransformOptions::default();
        Self {
            auto_rename: defaults.auto_rename,
            clean: defaults.clean,
            string_map: Vec::new(),
        }
    }
}

impl ConfigFile {
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs_err::read_to_string(path)?;
        Self::parse(&text).wrap_err_with(|| format!("invalid config file {path}"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Merge with command-line flags, which win over file values.
    pub fn resolve(self, args: &Args) -> Result<PipelineConfig> {
        let mut builder = PipelineConfig::builder();

        if let Some(pattern) = &args.filename {
            builder = builder.filename_pattern(pattern.as_str());
        } else if let Some(setting) = self.filename {
            builder = builder.filename(match setting {
                FilenameSetting::Pattern(pattern) if pattern.is_empty() => FilenameRule::Default,
                FilenameSetting::Pattern(pattern) => FilenameRule::Pattern(pattern),
                FilenameSetting::Replace([search, replace]) => {
                    FilenameRule::Replace { search, replace }
                }
            });
        }

        if let Some(options) = self.options {
            builder = builder.transform_options(TransformOptions {
                auto_rename: options.auto_rename,
                clean: options.clean,
                string_map: options
                    .string_map
                    .into_iter()
                    .map(|[search, replace]| (search, replace))
                    .collect(),
            });
        }

        builder = builder.diff_only(args.diff_only || self.diff_only.unwrap_or(false));

        let minify = match self.minify {
            _ if args.no_minify => MinifyConfig::Disabled,
            None => MinifyConfig::Defaults,
            Some(MinifySetting::Enabled(enabled)) => MinifyConfig::from(enabled),
            Some(MinifySetting::Options(options)) => MinifyConfig::Options(MinifyOptions {
                structural: options.structural,
                unused_symbols: options.unused_symbols.into_iter().collect(),
            }),
        };
        builder = builder.minify(minify);

        if let Some(test) = args.test.as_ref().or(self.test.as_ref()) {
            let test = Regex::new(test).wrap_err_with(|| format!("invalid test pattern `{test}`"))?;
            builder = builder.test(test);
        }

        let flag = args.rtl_flag.clone().or(self.rtl_flag);
        if flag.is_some() || self.update_runtime_chunk == Some(true) {
            let flag = flag.map(|name| RuntimeFlag { name }).unwrap_or_default();
            builder = builder.runtime_flag(flag);
        }

        if let Some(ms) = self.timeout_ms {
            builder = builder.unit_timeout(Duration::from_millis(ms));
        }

        Ok(builder.build())
    }
}

/// Load `args.config` (if any) and merge it with the flags.
pub fn resolve(args: &Args) -> Result<PipelineConfig> {
    let file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    file.resolve(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            dir: "dist".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ConfigFile::parse("{}").unwrap().resolve(&args()).unwrap();
        assert_eq!(config.filename(), &FilenameRule::Default);
        assert_eq!(config.minify(), &MinifyConfig::Defaults);
        assert!(!config.diff_only());
        assert!(config.runtime().is_none());
        assert!(config.test().is_none());
    }

    #[test]
    fn test_full_file() {
        let text = r#"{
            "filename": [".css", ".rtl.css"],
            "options": { "autoRename": true, "stringMap": [["prev", "next"]] },
            "diffOnly": true,
            "minify": { "structural": false, "unusedSymbols": ["old"] },
            "test": "^app/",
            "updateRuntimeChunk": true,
            "timeoutMs": 2500
        }"#;
        let config = ConfigFile::parse(text).unwrap().resolve(&args()).unwrap();

        assert_eq!(
            config.filename(),
            &FilenameRule::Replace {
                search: ".css".to_string(),
                replace: ".rtl.css".to_string()
            }
        );
        let options = config.transform_options();
        assert!(options.auto_rename && options.clean);
        assert_eq!(options.string_map, [("prev".to_string(), "next".to_string())]);
        assert!(config.diff_only());
        let minify = config.minify().options().unwrap();
        assert!(!minify.structural);
        assert!(minify.unused_symbols.contains("old"));
        assert!(config.is_eligible("app/a.css") && !config.is_eligible("lib/a.css"));
        assert_eq!(config.runtime().unwrap().name, "IS_RTL");
        assert_eq!(config.unit_timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_flags_override_file() {
        let text = r#"{ "filename": "[name].css", "minify": true, "rtlFlag": "FILE_FLAG" }"#;
        let args = Args {
            filename: Some("[filebase].rtl.css".to_string()),
            no_minify: true,
            rtl_flag: Some("CLI_FLAG".to_string()),
            ..args()
        };
        let config = ConfigFile::parse(text).unwrap().resolve(&args).unwrap();
        assert_eq!(
            config.filename(),
            &FilenameRule::Pattern("[filebase].rtl.css".to_string())
        );
        assert_eq!(config.minify(), &MinifyConfig::Disabled);
        assert_eq!(config.runtime().unwrap().name, "CLI_FLAG");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(ConfigFile::parse(r#"{ "filenme": "x" }"#).is_err());
        assert!(ConfigFile::parse(r#"{ "options": { "autorename": true } }"#).is_err());
    }

    #[test]
    fn test_invalid_regex() {
        let file = ConfigFile::parse(r#"{ "test": "(" }"#).unwrap();
        assert!(file.resolve(&args()).is_err());
    }
}
