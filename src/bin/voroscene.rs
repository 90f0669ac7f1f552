//! Loads a tessellation export from a directory and prints the scene geometry as JSON.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use anyhow::Context;
    use clap::Parser;
    use std::io::Write;
    use std::path::PathBuf;
    use tracing::info;
    use voroscene::{FileStore, SceneConfig, load_scene};

    #[derive(Parser, Debug)]
    #[command(name = "voroscene", about = "Reconstruct Voronoi cell geometry from text exports")]
    struct Args {
        /// Directory holding the exported resources
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// File name prefix of the export, e.g. `random_points`
        #[arg(short, long)]
        prefix: Option<String>,

        /// JSON file with a scene configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Distance vertices are pulled towards their centroid in the shrunk copy
        #[arg(long)]
        shrink: Option<f64>,

        /// Distance used for the gap copy
        #[arg(long)]
        gap: Option<f64>,

        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    }

    fn scene_config(args: &Args) -> anyhow::Result<SceneConfig> {
        let mut config = match &args.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => SceneConfig::default(),
        };
        if let Some(prefix) = &args.prefix {
            config = config.with_prefix(prefix);
        }
        if let Some(shrink) = args.shrink {
            config = config.with_shrink(shrink);
        }
        if let Some(gap) = args.gap {
            config = config.with_gap(gap);
        }
        Ok(config)
    }

    pub async fn run() -> anyhow::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();

        let args = Args::parse();
        let config = scene_config(&args)?;
        let store = FileStore::new(&args.dir);

        let geometry = load_scene(&store, &config)
            .await
            .with_context(|| format!("loading scene from {}", args.dir.display()))?;
        if let Some(bounds) = geometry.bounds {
            info!(center = ?bounds.center(), size = ?bounds.size(), "scene extent");
        }

        let json = if args.pretty {
            serde_json::to_string_pretty(&geometry)?
        } else {
            serde_json::to_string(&geometry)?
        };

        match &args.output {
            Some(path) => {
                std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), cells = geometry.count_cells(), "wrote scene");
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(json.as_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::run().await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
