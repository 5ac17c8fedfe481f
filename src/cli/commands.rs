use crate::config::BundlerConfig;
use crate::core::{interfaces::*, models::*, services::*};
use crate::infrastructure::{BannerTransform, InMemoryBundleRegistry, TokioFileSystemService};
use crate::utils::{BundleError, Logger, Result, Timer};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "bundlemap")]
#[command(about = "bundlemap - minified script bundles with source maps")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Concatenate, minify and source-map script files into one bundle
    Build {
        /// Virtual path of the bundle, e.g. ~/bundles/site.js
        #[arg(short, long)]
        bundle: String,
        /// Root directory input files are relative to
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = "dist")]
        outdir: PathBuf,
        /// Configuration file (defaults to bundlemap.config.json in root)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Application path app-relative virtual paths resolve against
        #[arg(long)]
        app_path: Option<String>,
        /// Banner comment prepended to every input file
        #[arg(long)]
        banner: Option<String>,
        /// Input files, in bundle order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Summarize a source map file
    Inspect {
        /// Path to a .map file
        map: PathBuf,
    },
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self) -> Result<()> {
        // Initialize logging
        Logger::init();

        let cli = Cli::parse();

        match cli.command {
            Commands::Build {
                bundle,
                root,
                outdir,
                config,
                app_path,
                banner,
                files,
            } => {
                let options = BuildOptions {
                    bundle_path: bundle,
                    root,
                    outdir,
                    config,
                    app_path,
                    banner,
                    files,
                };
                self.handle_build_command(options).await.map(|_| ())
            }
            Commands::Inspect { map } => self.handle_inspect_command(&map).await,
        }
    }

    pub async fn handle_build_command(&self, options: BuildOptions) -> Result<Vec<PathBuf>> {
        let _timer = Timer::start("bundlemap build");
        let fs_service = TokioFileSystemService;

        let mut config = BundlerConfig::load(options.config.as_deref(), &options.root)
            .map_err(|e| BundleError::Config(format!("{:#}", e)))?;
        if let Some(app_path) = options.app_path {
            config.application_path = app_path;
        }

        // Read inputs in bundle order
        let banner: Option<Arc<dyn ContentTransform>> = options
            .banner
            .map(|text| Arc::new(BannerTransform::new(text)) as Arc<dyn ContentTransform>);
        let mut files = Vec::with_capacity(options.files.len());
        for path in &options.files {
            let content = fs_service.read_file(&options.root.join(path)).await?;
            let mut file = InputFile::new(virtual_path_for(path), content);
            if let Some(banner) = &banner {
                file = file.with_transform(banner.clone());
            }
            files.push(file);
        }

        let registry = Arc::new(InMemoryBundleRegistry::new());
        let context = BundleContext::new(registry.clone())
            .with_application_path(&config.application_path);
        let bundler = Arc::new(SourceMappingBundler::from_config(&config));
        let bundle = Bundle::SourceMapped(ScriptBundle::new(options.bundle_path.clone(), bundler));
        registry.add(bundle.clone());

        // Minification is CPU-bound, keep it off the async workers
        let build_context = context.clone();
        let content = tokio::task::spawn_blocking(move || bundle.build(&build_context, Some(&files)))
            .await
            .map_err(|e| BundleError::Minification(format!("Build task failed: {}", e)))??;

        let mut written = Vec::new();
        let bundle_file = output_path(&options.outdir, &options.bundle_path);
        fs_service.write_file(&bundle_file, &content).await?;
        written.push(bundle_file);

        for path in registry.paths() {
            if let Some(Bundle::AdHocArtifact(artifact)) = registry.get_bundle_for(&path) {
                let artifact_file = output_path(&options.outdir, &path);
                fs_service.write_file(&artifact_file, &artifact.content()).await?;
                written.push(artifact_file);
            }
        }

        Logger::info(&format!(
            "✅ Built {} ({} bytes, {} file(s) written to {})",
            options.bundle_path,
            content.len(),
            written.len(),
            options.outdir.display()
        ));

        Ok(written)
    }

    async fn handle_inspect_command(&self, map_path: &Path) -> Result<()> {
        let fs_service = TokioFileSystemService;
        let content = fs_service.read_file(map_path).await?;
        let map = sourcemap::SourceMap::from_slice(content.as_bytes())?;

        Logger::info(&format!("🗺️  {}", map_path.display()));
        Logger::info(&format!("  • File: {}", map.get_file().unwrap_or("<none>")));
        Logger::info(&format!("  • Mappings: {}", map.get_token_count()));
        for source in map.sources() {
            Logger::info(&format!("  • Source: {}", source));
        }
        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the build command needs, detached from argument parsing
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub bundle_path: String,
    pub root: PathBuf,
    pub outdir: PathBuf,
    pub config: Option<PathBuf>,
    pub app_path: Option<String>,
    pub banner: Option<String>,
    pub files: Vec<PathBuf>,
}

/// App-relative virtual path for a file given relative to the root
fn virtual_path_for(path: &Path) -> String {
    let relative = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    format!("~/{}", relative)
}

/// Where a virtual path lands under the output directory
fn output_path(outdir: &Path, virtual_path: &str) -> PathBuf {
    let relative = virtual_path.trim_start_matches('~').trim_start_matches('/');
    relative
        .split('/')
        .filter(|part| !part.is_empty() && *part != "..")
        .fold(outdir.to_path_buf(), |acc, part| acc.join(part))
}
