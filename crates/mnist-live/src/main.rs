// mnist-live: load MNIST, train the baseline model, keep an SVG chart current

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use mnist_live::chart::{spawn_resize_watch, SvgFileSurface, TrainingChart};
use mnist_live::data::{BatchSource, Resource};
use mnist_live::{telemetry, SessionConfig, SoftmaxRegression, TrainerConfig, TrainingSession};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with trainer settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    validation_batch_size: Option<usize>,

    #[arg(long)]
    epochs: Option<usize>,

    /// File path or http(s) URL
    #[arg(long, value_name = "LOC")]
    train_images: Option<String>,

    #[arg(long, value_name = "LOC")]
    train_labels: Option<String>,

    #[arg(long, value_name = "LOC")]
    test_images: Option<String>,

    #[arg(long, value_name = "LOC")]
    test_labels: Option<String>,

    /// Abort loading a split after this many milliseconds
    #[arg(long, value_name = "MS")]
    fetch_timeout_ms: Option<u64>,

    /// Shuffle seed for reproducible batch order
    #[arg(long)]
    seed: Option<u64>,

    /// Keep an SVG accuracy chart at this path
    #[arg(long, value_name = "FILE")]
    chart: Option<PathBuf>,

    #[arg(long, value_name = "PX", default_value_t = 640.0)]
    width: f64,

    #[arg(long, value_name = "PX", default_value_t = 320.0)]
    height: f64,
}

impl Args {
    fn trainer_config(&self) -> Result<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => TrainerConfig::default(),
        };
        if let Some(n) = self.batch_size {
            config = config.batch_size(n);
        }
        if let Some(n) = self.validation_batch_size {
            config = config.validation_batch_size(n);
        }
        if let Some(n) = self.epochs {
            config = config.epochs(n);
        }
        if let Some(loc) = &self.train_images {
            config = config.train_images(loc.as_str());
        }
        if let Some(loc) = &self.train_labels {
            config = config.train_labels(loc.as_str());
        }
        if let Some(loc) = &self.test_images {
            config = config.test_images(loc.as_str());
        }
        if let Some(loc) = &self.test_labels {
            config = config.test_labels(loc.as_str());
        }
        if let Some(ms) = self.fetch_timeout_ms {
            config = config.fetch_timeout_ms(ms);
        }
        if let Some(seed) = self.seed {
            config = config.seed(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_tracing()?;
    let config = args.trainer_config()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(run(&args, config))
}

async fn run(args: &Args, config: TrainerConfig) -> Result<()> {
    let (mut train, mut test) = match config.seed {
        Some(seed) => (
            BatchSource::seeded(seed),
            BatchSource::seeded(seed.wrapping_add(1)),
        ),
        None => (BatchSource::new(), BatchSource::new()),
    };
    train = train.options(config.load_options());
    test = test.options(config.load_options());

    let client = reqwest::Client::builder()
        .build()
        .context("building http client")?;
    let resource = |location: &str| Resource::parse_with_client(location, &client);

    info!(images = %config.train_images, labels = %config.train_labels, "loading training split");
    info!(images = %config.test_images, labels = %config.test_labels, "loading test split");
    tokio::try_join!(
        async {
            train
                .load(
                    &resource(&config.train_images),
                    &resource(&config.train_labels),
                )
                .await
                .context("loading training split")
        },
        async {
            test.load(
                &resource(&config.test_images),
                &resource(&config.test_labels),
            )
            .await
            .context("loading test split")
        },
    )?;

    let chart = TrainingChart::new();
    let surface = args
        .chart
        .as_ref()
        .map(|path| Arc::new(SvgFileSurface::new(path, args.width, args.height)));
    let watch = surface
        .as_ref()
        .map(|s| spawn_resize_watch(chart.clone(), s.clone()));

    let mut model = SoftmaxRegression::new(train.number_of_rows(), train.number_of_columns());
    let mut session = TrainingSession::new(SessionConfig::from(&config), chart);
    let summary = session.run(&mut train, &mut test, &mut model).await?;

    if let (Some(surface), Some(watch)) = (surface, watch) {
        surface.close();
        watch.await.context("chart resize watch")?;
        info!(path = %surface.path().display(), "chart written");
    }

    info!("{}", session.progress());
    println!("{summary}");
    Ok(())
}
