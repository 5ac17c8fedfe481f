use bundlemap::cli::{BuildOptions, CliHandler};
use std::path::PathBuf;
use tempfile::tempdir;

fn options(root: PathBuf, outdir: PathBuf, files: &[&str]) -> BuildOptions {
    BuildOptions {
        bundle_path: "~/bundles/site.js".to_string(),
        root,
        outdir,
        config: None,
        app_path: None,
        banner: None,
        files: files.iter().map(PathBuf::from).collect(),
    }
}

#[tokio::test]
async fn test_build_writes_bundle_and_map() {
    let root = tempdir().unwrap();
    let out = tempdir().unwrap();
    std::fs::create_dir_all(root.path().join("scripts")).unwrap();
    std::fs::write(root.path().join("scripts/a.js"), "var alpha = 1;").unwrap();
    std::fs::write(root.path().join("scripts/b.js"), "var beta = alpha + 1;").unwrap();

    let written = CliHandler::new()
        .handle_build_command(options(
            root.path().to_path_buf(),
            out.path().to_path_buf(),
            &["scripts/a.js", "scripts/b.js"],
        ))
        .await
        .unwrap();

    let bundle_file = out.path().join("bundles").join("site.js");
    let map_file = out.path().join("bundles").join("site.js.map");
    assert!(written.contains(&bundle_file));
    assert!(written.contains(&map_file));

    let bundle = std::fs::read_to_string(bundle_file).unwrap();
    assert!(bundle.contains("//# sourceMappingURL=/bundles/site.js.map"));

    let map = std::fs::read_to_string(map_file).unwrap();
    assert!(map.contains("~/scripts/a.js"));
    assert!(map.contains("~/scripts/b.js"));
}

#[tokio::test]
async fn test_build_with_banner_and_app_path() {
    let root = tempdir().unwrap();
    let out = tempdir().unwrap();
    std::fs::write(root.path().join("main.js"), "var main = 1;").unwrap();

    let mut build = options(root.path().to_path_buf(), out.path().to_path_buf(), &["main.js"]);
    build.banner = Some("/* built */".to_string());
    build.app_path = Some("/shop".to_string());

    CliHandler::new().handle_build_command(build).await.unwrap();

    let snapshot = std::fs::read_to_string(out.path().join("main.transformed.js")).unwrap();
    assert_eq!(snapshot, "/* built */\nvar main = 1;");

    let bundle = std::fs::read_to_string(out.path().join("bundles").join("site.js")).unwrap();
    assert!(bundle.contains("//# sourceMappingURL=/shop/bundles/site.js.map"));
}

#[tokio::test]
async fn test_missing_input_fails() {
    let root = tempdir().unwrap();
    let out = tempdir().unwrap();

    let result = CliHandler::new()
        .handle_build_command(options(
            root.path().to_path_buf(),
            out.path().to_path_buf(),
            &["missing.js"],
        ))
        .await;
    assert!(result.is_err());
}
