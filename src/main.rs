use clap::Parser;
use log::info;

use layout_bench::config::{self, LayoutConfig};
use layout_bench::device::SoftwareDevice;
use layout_bench::manager::SceneManager;

/// Vertex buffer layout micro-benchmark.
///
/// The configuration code is a string of dot-separated tokens, e.g.
/// `bsj.de.ai.mg`; unrecognized tokens are ignored. Add `rb` for a
/// batch run that stops after a fixed number of timing reports.
#[derive(Parser, Debug)]
#[command(name = "layout-bench", version, about)]
struct Cli {
    /// Number of object instances. Falls back to the default when not
    /// an integer.
    count: Option<String>,

    /// Layout configuration code.
    #[arg(default_value = config::DEFAULT_CONFIG_CODE)]
    code: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = LayoutConfig::parse(&cli.code);
    let count = cli
        .count
        .as_deref()
        .map(config::parse_instance_count)
        .unwrap_or(config::DEFAULT_INSTANCE_COUNT);
    info!("configuration {:?} ({:?}), {} instances", cli.code, config, count);

    let mut device = SoftwareDevice::new();
    let mut manager = SceneManager::new(&mut device, config, count)?;

    // Batch runs stop after the manager's report limit; otherwise one
    // report interval is enough to exercise the layout end to end.
    loop {
        manager.render_frame(&mut device)?;
        if manager.finished() || (!config.batch && manager.stats().reports() >= 1) {
            break;
        }
    }
    info!(
        "{} frames rendered, {} draw calls pending reset",
        manager.stats().frames(),
        device.draw_calls()
    );

    manager.shutdown(&mut device)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_precedes_code() {
        let cli = Cli::try_parse_from(["layout-bench", "2500", "bsa.de.mg"]).unwrap();
        assert_eq!(cli.count.as_deref(), Some("2500"));
        assert_eq!(cli.code, "bsa.de.mg");
    }

    #[test]
    fn test_defaults_without_arguments() {
        let cli = Cli::try_parse_from(["layout-bench"]).unwrap();
        assert!(cli.count.is_none());
        assert_eq!(cli.code, config::DEFAULT_CONFIG_CODE);
    }
}
