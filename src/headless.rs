use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use checkin_graph::data::load_user_graph;

use crate::LayoutOptions;

pub(crate) fn run(
    data: &Path,
    options: &LayoutOptions,
    steps: usize,
    output: Option<&Path>,
) -> Result<()> {
    let graph = load_user_graph(data)?;
    let mut context = options.build_context(graph);

    let taken = context.run(steps);
    log::info!(
        "ran {taken} steps, settled: {}, active users: {}",
        context.is_settled(),
        context.active_nodes().len()
    );

    let snapshot = context.snapshot();
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &snapshot)
                .with_context(|| format!("failed to write layout to {}", path.display()))?;
            writer.flush().context("failed to flush layout output")?;
            log::info!("layout written to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &snapshot)
                .context("failed to write layout to stdout")?;
            writeln!(stdout).context("failed to write layout to stdout")?;
        }
    }

    Ok(())
}
