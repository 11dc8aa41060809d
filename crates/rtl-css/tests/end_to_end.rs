use rtl_css::{LightningMinifier, MirrorEngine};
use rtl_pipeline::{
    AssetTable, BuildPlugin, Emit, PipelineConfig, RtlPlugin, TransformOptions, Unit,
};

fn plugin(config: PipelineConfig) -> RtlPlugin<MirrorEngine, LightningMinifier> {
    RtlPlugin::new(config, MirrorEngine, LightningMinifier)
}

#[test_log::test(tokio::test)]
async fn default_build_emits_minified_rtl_variant() {
    let assets = AssetTable::new();
    assets.insert("main.css", ".box { padding-left: 10px }");
    assets.insert("main.js", "void 0");
    let mut units = vec![Unit::new("main", "1").with_files(["main.js", "main.css"])];

    let mut plugin = plugin(PipelineConfig::builder().build());
    let report = plugin.emit(Emit::new(&assets, &mut units)).await.unwrap();

    assert_eq!(report.written, ["main.rtl.css"]);
    assert_eq!(assets.text("main.rtl.css").as_deref(), Some(".box{padding-right:10px}"));
    assert_eq!(assets.text("main.css").as_deref(), Some(".box{padding-left:10px}"));
    assert_eq!(units[0].files, ["main.js", "main.css", "main.rtl.css"]);
}

#[tokio::test]
async fn unminified_build_keeps_source_formatting() {
    let css = ".nav {\n  margin-left: 4px; /* gap */\n  text-align: left;\n}\n";
    let assets = AssetTable::new();
    assets.insert("nav.css", css);
    let mut units = vec![Unit::new("nav", "1").with_files(["nav.css"])];

    let mut plugin = plugin(PipelineConfig::builder().minify(false).build());
    plugin.emit(Emit::new(&assets, &mut units)).await.unwrap();

    assert_eq!(assets.text("nav.css").as_deref(), Some(css));
    assert_eq!(
        assets.text("nav.rtl.css").as_deref(),
        Some(".nav {\n  margin-right: 4px; /* gap */\n  text-align: right;\n}\n")
    );
}

#[tokio::test]
async fn diff_only_build_minifies_the_overrides() {
    let assets = AssetTable::new();
    assets.insert(
        "app.css",
        ".a { padding-left: 1px; color: red }\n.b { color: blue }\n@media print { .c { float: left } }",
    );
    let mut units = vec![Unit::new(0u64, "1").with_files(["app.css"])];

    let mut plugin = plugin(PipelineConfig::builder().diff_only(true).build());
    plugin.emit(Emit::new(&assets, &mut units)).await.unwrap();

    assert_eq!(
        assets.text("app.rtl.css").as_deref(),
        Some(".a{padding-right:1px}@media print{.c{float:right}}")
    );
}

#[tokio::test]
async fn auto_rename_reaches_the_engine() {
    let assets = AssetTable::new();
    assets.insert("a.css", ".pull-left { float: left }");
    let mut units = vec![Unit::new("a", "1").with_files(["a.css"])];

    let config = PipelineConfig::builder()
        .transform_options(TransformOptions {
            auto_rename: true,
            ..Default::default()
        })
        .minify(false)
        .build();
    plugin(config).emit(Emit::new(&assets, &mut units)).await.unwrap();

    assert_eq!(
        assets.text("a.rtl.css").as_deref(),
        Some(".pull-right { float: right }")
    );
}
