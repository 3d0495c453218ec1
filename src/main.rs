mod app;
mod headless;

use std::path::PathBuf;

use anyhow::anyhow;
use checkin_graph::data::UserGraph;
use checkin_graph::layout::{FilterThresholds, SimulationConfig, SimulationContext};
use checkin_graph::{Attribute, RangeTable};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON array of user records.
    #[arg(long, default_value = "data/sampled_combined_user_data.json")]
    data: PathBuf,

    /// Seed for cluster anchors and collision jitter.
    #[arg(long)]
    seed: Option<u64>,

    /// Run the layout without a window and print the final positions.
    #[arg(long)]
    headless: bool,

    #[arg(long, default_value_t = 300)]
    steps: usize,

    /// Write headless output here instead of stdout.
    #[arg(long, requires = "headless")]
    output: Option<PathBuf>,

    /// Cluster by connections, duration or frequency on startup.
    #[arg(long)]
    cluster: Option<Attribute>,

    #[arg(long)]
    max_connections: Option<f32>,

    #[arg(long)]
    max_duration: Option<f32>,

    #[arg(long)]
    max_frequency: Option<f32>,
}

/// Startup view shared by the viewer and the headless runner.
#[derive(Clone, Debug, Default)]
pub(crate) struct LayoutOptions {
    pub seed: Option<u64>,
    pub cluster: Option<Attribute>,
    pub thresholds: Option<FilterThresholds>,
    pub config: SimulationConfig,
    pub ranges: RangeTable,
}

impl LayoutOptions {
    fn from_args(args: &Args) -> Self {
        let thresholds = FilterThresholds {
            connections: args.max_connections,
            duration: args.max_duration,
            frequency: args.max_frequency,
        };

        Self {
            seed: args.seed,
            cluster: args.cluster,
            thresholds: (!thresholds.is_empty()).then_some(thresholds),
            ..Self::default()
        }
    }

    pub fn build_context(&self, graph: UserGraph) -> SimulationContext {
        let mut context = match self.seed {
            Some(seed) => SimulationContext::with_seed(graph, self.config.clone(), seed),
            None => SimulationContext::new(graph, self.config.clone()),
        };
        context.set_ranges(self.ranges.clone());

        if let Some(thresholds) = self.thresholds {
            context.set_filter_thresholds(thresholds);
        }
        if let Some(attribute) = self.cluster {
            context.set_cluster_attribute(attribute);
        }
        if self.thresholds.is_some() || self.cluster.is_some() {
            context.reheat(1.0);
        }
        context
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = LayoutOptions::from_args(&args);

    if args.headless {
        return headless::run(&args.data, &options, args.steps, args.output.as_deref());
    }

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "checkin-graph",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(app::CheckinGraphApp::new(
                cc,
                args.data.clone(),
                options.clone(),
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
