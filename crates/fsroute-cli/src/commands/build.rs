use anyhow::Result;
use colored::Colorize;
use fsroute::{BuildOptions, Config};
use std::path::PathBuf;

pub fn execute(
    mut config: Config,
    src: Option<PathBuf>,
    out: Option<PathBuf>,
    sourcemaps: bool,
) -> Result<()> {
    if let Some(src) = src {
        config.build.src_dir = Some(src);
    }
    if let Some(out) = out {
        config.build.out_dir = out;
    }
    config.build.sourcemaps |= sourcemaps;

    let options = BuildOptions::from_config(&config.build);

    println!("{}", "Building project...".green().bold());
    println!();
    println!("Source: {}", options.src_dir.display().to_string().cyan());
    println!("Output: {}", options.out_dir.display().to_string().cyan());
    println!();

    let report = fsroute::build(&options)?;

    println!(
        "{} {} transpiled, {} copied",
        "✓".green(),
        report.transpiled,
        report.copied
    );
    if report.sourcemaps > 0 {
        println!("{} {} source maps", "✓".green(), report.sourcemaps);
    }

    Ok(())
}
