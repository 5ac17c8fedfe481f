use bundlemap::core::interfaces::{BundleRegistry, ContentTransform};
use bundlemap::core::models::{Bundle, CodeSettings, EvalTreatment, InputFile, ScriptBundle};
use bundlemap::core::services::{BundleContext, SourceMappingBundler};
use bundlemap::infrastructure::{BannerTransform, InMemoryBundleRegistry, OxcMinifier};
use std::sync::Arc;

struct Harness {
    registry: Arc<InMemoryBundleRegistry>,
    context: BundleContext,
    bundle: Bundle,
}

impl Harness {
    fn new(bundle_path: &str) -> Self {
        let registry = Arc::new(InMemoryBundleRegistry::new());
        let context = BundleContext::new(registry.clone());
        let bundler = Arc::new(SourceMappingBundler::new(Arc::new(OxcMinifier::new())));
        let bundle = Bundle::SourceMapped(ScriptBundle::new(bundle_path, bundler));
        registry.add(bundle.clone());
        Self {
            registry,
            context,
            bundle,
        }
    }

    fn build(&self, files: &[InputFile]) -> String {
        self.bundle.build(&self.context, Some(files)).unwrap()
    }

    fn artifact(&self, path: &str) -> Option<String> {
        self.registry
            .get_bundle_for(path)
            .map(|bundle| bundle.build(&self.context, None).unwrap())
    }
}

#[test]
fn test_single_file_scenario() {
    let harness = Harness::new("/bundle.js");
    let content = harness.build(&[InputFile::new("a.js", "var x=1;")]);

    assert!(content.starts_with("var x=1"), "unexpected output: {}", content);
    assert!(content.contains("//# sourceMappingURL=/bundle.js.map"));
    assert!(!content.contains("//@ sourceMappingURL="));

    let map_text = harness.artifact("/bundle.js.map").expect("map should be published");
    let map = sourcemap::SourceMap::from_slice(map_text.as_bytes()).unwrap();
    assert!(map.sources().any(|source| source == "a.js"));
    assert_eq!(map.get_file(), Some("/bundle.js"));
}

#[test]
fn test_tokens_are_attributed_to_each_file() {
    let harness = Harness::new("/bundle.js");
    let files = [
        InputFile::new("a.js", "var first = 1;\nconsole.log(first);"),
        InputFile::new("b.js", "var second = 2;\nconsole.log(second);"),
    ];
    let content = harness.build(&files);
    assert!(content.find("first").unwrap() < content.find("second").unwrap());

    let map_text = harness.artifact("/bundle.js.map").unwrap();
    let map = sourcemap::SourceMap::from_slice(map_text.as_bytes()).unwrap();
    assert!(map.tokens().any(|t| t.get_source() == Some("a.js")));
    assert!(map.tokens().any(|t| t.get_source() == Some("b.js") && t.get_src_line() == 1));
    assert!(map
        .tokens()
        .all(|t| t.get_source().map_or(true, |s| s == "a.js" || s == "b.js")));
}

#[test]
fn test_syntax_error_returns_annotated_concatenation() {
    let harness = Harness::new("/bundle.js");
    let files = [
        InputFile::new("good.js", "var ok = 1;"),
        InputFile::new("bad.js", "var = ;"),
    ];
    let content = harness.build(&files);

    assert!(content.starts_with("/* An error occurred during minification, see errors below"));
    assert!(content.contains("bad.js(1,"));

    let good_header = content.find("///#source 1 1 good.js").unwrap();
    let good_body = content.find("var ok = 1;").unwrap();
    let bad_header = content.find("///#source 1 1 bad.js").unwrap();
    assert!(good_header < good_body && good_body < bad_header);

    assert!(harness.artifact("/bundle.js.map").is_none());
}

#[test]
fn test_rebuild_overwrites_artifacts() {
    let harness = Harness::new("/bundle.js");
    harness.build(&[InputFile::new("old.js", "var old = 1;")]);
    harness.build(&[InputFile::new("new.js", "var fresh = 1;")]);

    assert_eq!(
        harness.registry.paths(),
        vec!["/bundle.js".to_string(), "/bundle.js.map".to_string()]
    );
    let map_text = harness.artifact("/bundle.js.map").unwrap();
    assert!(map_text.contains("new.js"));
    assert!(!map_text.contains("old.js"));
}

#[test]
fn test_transformed_snapshot_holds_transformed_content() {
    let harness = Harness::new("/bundle.js");
    let banner: Arc<dyn ContentTransform> = Arc::new(BannerTransform::new("/* generated */"));
    let files = [
        InputFile::new("/scripts/app.js", "var app = 1;").with_transform(banner),
        InputFile::new("/scripts/plain.js", "var plain = 1;"),
    ];
    harness.build(&files);

    assert_eq!(
        harness.artifact("/scripts/app.transformed.js").as_deref(),
        Some("/* generated */\nvar app = 1;")
    );
    assert!(harness.artifact("/scripts/plain.transformed.js").is_none());
}

#[test]
fn test_eval_keeps_local_names() {
    let harness = Harness::new("/bundle.js");
    let source = "function lookup(localValue) { return eval('localValue'); }\nlookup(1);";
    let content = harness.build(&[InputFile::new("eval.js", source)]);

    assert!(content.contains("(localValue)"), "parameter was renamed: {}", content);
}

fn build_with_eval_treatment(eval_treatment: EvalTreatment, source: &str) -> String {
    let registry = Arc::new(InMemoryBundleRegistry::new());
    let context = BundleContext::new(registry);
    let bundler = SourceMappingBundler::new(Arc::new(OxcMinifier::new())).with_settings(CodeSettings {
        eval_treatment,
        ..CodeSettings::default()
    });
    bundler
        .build(
            Some(&Bundle::ad_hoc("/bundle.js")),
            Some(&context),
            Some(&[InputFile::new("eval.js", source)]),
        )
        .unwrap()
}

#[test]
fn test_eval_treatment_decides_renaming() {
    let source = "function run(localValue) { return window.eval(localValue); }\nrun('1');";

    let ignored = build_with_eval_treatment(EvalTreatment::Ignore, source);
    let immediate = build_with_eval_treatment(EvalTreatment::MakeImmediateSafe, source);
    let all = build_with_eval_treatment(EvalTreatment::MakeAllSafe, source);

    assert!(!ignored.contains("localValue"), "expected renaming: {}", ignored);
    assert!(!immediate.contains("localValue"), "expected renaming: {}", immediate);
    assert!(all.contains("(localValue)"), "expected original names: {}", all);
}

fn assert_next_file_starts_at_line_zero(first_file: &str) {
    let harness = Harness::new("/bundle.js");
    harness.build(&[
        InputFile::new("a.js", first_file),
        InputFile::new("b.js", "var c = 3;"),
    ]);

    let map_text = harness.artifact("/bundle.js.map").unwrap();
    let map = sourcemap::SourceMap::from_slice(map_text.as_bytes()).unwrap();

    let a_lines: Vec<u32> = map
        .tokens()
        .filter(|t| t.get_source() == Some("a.js"))
        .map(|t| t.get_src_line())
        .collect();
    let b_lines: Vec<u32> = map
        .tokens()
        .filter(|t| t.get_source() == Some("b.js"))
        .map(|t| t.get_src_line())
        .collect();

    assert!(!b_lines.is_empty());
    assert!(b_lines.iter().all(|&line| line == 0), "b.js lines: {:?}", b_lines);
    assert!(a_lines.contains(&1), "a.js lines: {:?}", a_lines);
}

#[test]
fn test_carriage_return_only_file_keeps_later_files_aligned() {
    assert_next_file_starts_at_line_zero("var s = 1;\rvar t = 2;");
}

#[test]
fn test_line_separator_in_string_keeps_lines_aligned() {
    let harness = Harness::new("/bundle.js");
    harness.build(&[
        InputFile::new("a.js", "var s = '\u{2028}';\nvar t = 2;"),
        InputFile::new("b.js", "var c = 3;"),
    ]);

    let map_text = harness.artifact("/bundle.js.map").unwrap();
    let map = sourcemap::SourceMap::from_slice(map_text.as_bytes()).unwrap();
    assert!(map
        .tokens()
        .filter(|t| t.get_source() == Some("a.js"))
        .all(|t| t.get_src_line() <= 1));

    assert_next_file_starts_at_line_zero("var s = '\u{2029}';\nvar t = 2;");
}

#[test]
fn test_without_sources_content() {
    let registry = Arc::new(InMemoryBundleRegistry::new());
    let context = BundleContext::new(registry.clone());
    let bundler = SourceMappingBundler::new(Arc::new(OxcMinifier::new())).with_settings(CodeSettings {
        include_sources_content: false,
        ..CodeSettings::default()
    });
    let bundle = Bundle::ad_hoc("/bundle.js");

    bundler
        .build(Some(&bundle), Some(&context), Some(&[InputFile::new("a.js", "var a = 1;")]))
        .unwrap();

    let map_text = registry
        .get_bundle_for("/bundle.js.map")
        .unwrap()
        .build(&context, None)
        .unwrap();
    assert!(!map_text.contains("var a = 1;"));
}
