use anyhow::{Context, Result};
use colored::Colorize;
use fsroute::transform::transform_route;
use fsroute::Config;
use fsroute_router::FileSystemRouter;
use std::path::PathBuf;

/// One line per discovered route: token, pattern, file
pub fn execute(config: Config, dir: Option<PathBuf>, base_path: Option<String>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| config.routing.resolved_routes_dir());
    let base_path = base_path.or(config.routing.base_path);

    let router = FileSystemRouter::new(&dir)
        .with_context(|| format!("Failed to scan {}", dir.display()))?;

    if router.is_empty() {
        println!("  {} No routes in {}", "ℹ".cyan(), dir.display());
        return Ok(());
    }

    for line in route_lines(&router, base_path.as_deref()) {
        println!("  {}", line);
    }
    println!();
    println!("{} {} routes", "✓".green(), router.len());

    Ok(())
}

fn route_lines(router: &FileSystemRouter, base_path: Option<&str>) -> Vec<String> {
    router
        .routes()
        .values()
        .map(|route| {
            format!(
                "{:<30} {:<30} {}",
                route.token,
                transform_route(&route.token, base_path),
                route.relative_path
            )
        })
        .collect()
}
