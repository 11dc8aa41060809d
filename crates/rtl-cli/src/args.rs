use camino::Utf8PathBuf;
use clap::Parser;

/// Emit a right-to-left variant next to every stylesheet in a build output directory.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "rtl", version, about)]
pub struct Args {
    /// Build output directory
    pub dir: Utf8PathBuf,

    /// JSON unit manifest: `[{ "id", "name", "files", "runtime" }]`.
    /// Without one, every stylesheet is its own unit.
    #[arg(long)]
    pub manifest: Option<Utf8PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,

    /// Only keep the declarations that changed
    #[arg(long)]
    pub diff_only: bool,

    /// Leave both variants unminified
    #[arg(long)]
    pub no_minify: bool,

    /// Output name pattern, e.g. `[name]/[filebase].[contenthash].rtl.css`
    #[arg(long, value_name = "PATTERN")]
    pub filename: Option<String>,

    /// Only stylesheets whose name matches this regex get an RTL variant
    #[arg(long, value_name = "REGEX")]
    pub test: Option<String>,

    /// Patch runtime chunk loaders to pick the variant from this global flag
    #[arg(long, value_name = "NAME")]
    pub rtl_flag: Option<String>,

    /// Keep running and re-process on changes
    #[arg(short, long)]
    pub watch: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}
