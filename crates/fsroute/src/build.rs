// File: src/build.rs
// Purpose: Build step: copy the source tree into the output directory, transpiling route modules

use anyhow::{bail, Context, Result};
use quote::quote;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use syn::{Attribute, Item, Meta};
use walkdir::WalkDir;

use crate::config::BuildConfig;

/// Where source maps go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMapMode {
    #[default]
    None,
    /// `<file>.map` next to each transpiled file
    External,
}

/// Build options
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub src_dir: PathBuf,
    pub out_dir: PathBuf,
    pub sourcemaps: SourceMapMode,
}

impl BuildOptions {
    pub fn new(src_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            src_dir: src_dir.into(),
            out_dir: out_dir.into(),
            sourcemaps: SourceMapMode::None,
        }
    }

    pub fn sourcemaps(mut self, mode: SourceMapMode) -> Self {
        self.sourcemaps = mode;
        self
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        let mode = if config.sourcemaps {
            SourceMapMode::External
        } else {
            SourceMapMode::None
        };
        Self::new(config.resolved_src_dir(), config.out_dir.clone()).sourcemaps(mode)
    }
}

/// Counts of what a build wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub transpiled: usize,
    pub copied: usize,
    pub sourcemaps: usize,
}

/// Source-to-source transformation applied to accepted files
pub trait Transpiler {
    fn accepts(&self, path: &Path) -> bool;
    fn transpile(&self, path: &Path, source: &str) -> Result<String>;
}

/// Parses Rust modules, drops `#[cfg(test)]` items and re-emits the rest
#[derive(Debug, Clone, Copy, Default)]
pub struct RustTranspiler;

impl Transpiler for RustTranspiler {
    fn accepts(&self, path: &Path) -> bool {
        path.extension().and_then(|s| s.to_str()) == Some("rs")
    }

    fn transpile(&self, path: &Path, source: &str) -> Result<String> {
        let mut file = syn::parse_file(source)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        file.items.retain(|item| !is_cfg_test(item_attrs(item)));

        Ok(quote!(#file).to_string())
    }
}

fn item_attrs(item: &Item) -> &[Attribute] {
    match item {
        Item::Const(i) => &i.attrs,
        Item::Enum(i) => &i.attrs,
        Item::ExternCrate(i) => &i.attrs,
        Item::Fn(i) => &i.attrs,
        Item::ForeignMod(i) => &i.attrs,
        Item::Impl(i) => &i.attrs,
        Item::Macro(i) => &i.attrs,
        Item::Mod(i) => &i.attrs,
        Item::Static(i) => &i.attrs,
        Item::Struct(i) => &i.attrs,
        Item::Trait(i) => &i.attrs,
        Item::TraitAlias(i) => &i.attrs,
        Item::Type(i) => &i.attrs,
        Item::Union(i) => &i.attrs,
        Item::Use(i) => &i.attrs,
        _ => &[],
    }
}

fn is_cfg_test(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && matches!(attr.parse_args::<Meta>(), Ok(Meta::Path(path)) if path.is_ident("test"))
    })
}

/// Build with the default Rust transpiler
pub fn build(options: &BuildOptions) -> Result<BuildReport> {
    build_with(options, &RustTranspiler)
}

/// Clear the output directory, then copy and transpile the source tree into it
pub fn build_with(options: &BuildOptions, transpiler: &dyn Transpiler) -> Result<BuildReport> {
    let BuildOptions {
        src_dir,
        out_dir,
        sourcemaps,
    } = options;

    if !src_dir.is_dir() {
        bail!("Source directory does not exist: {}", src_dir.display());
    }
    let src = fs::canonicalize(src_dir)
        .with_context(|| format!("Failed to resolve {}", src_dir.display()))?;
    if src.starts_with(resolve_lexically(out_dir)?) {
        bail!(
            "Output directory {} must not contain the source directory {}",
            out_dir.display(),
            src_dir.display()
        );
    }

    tracing::info!(src = %src_dir.display(), out = %out_dir.display(), "Building");

    match fs::remove_dir_all(out_dir) {
        Err(e) if e.kind() != ErrorKind::NotFound => {
            return Err(e)
                .with_context(|| format!("Failed to clear {}", out_dir.display()));
        }
        _ => {}
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let report = copy_and_transpile_dir(src_dir, out_dir, transpiler, *sourcemaps)?;

    tracing::info!(
        transpiled = report.transpiled,
        copied = report.copied,
        sourcemaps = report.sourcemaps,
        "Build complete"
    );
    Ok(report)
}

/// Canonical form of a path that may not exist yet
///
/// The deepest existing ancestor is canonicalized and the missing tail is
/// appended as-is.
fn resolve_lexically(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let mut missing = Vec::new();
    for ancestor in absolute.ancestors() {
        if let Ok(base) = fs::canonicalize(ancestor) {
            return Ok(missing.into_iter().rev().fold(base, |acc: PathBuf, part| acc.join(part)));
        }
        if let Some(name) = ancestor.file_name() {
            missing.push(name.to_owned());
        }
    }
    Ok(absolute)
}

/// Recursively copy `src` into `dst`, transpiling accepted files
///
/// An output directory nested inside `src` is skipped.
pub fn copy_and_transpile_dir(
    src: &Path,
    dst: &Path,
    transpiler: &dyn Transpiler,
    sourcemaps: SourceMapMode,
) -> Result<BuildReport> {
    let mut report = BuildReport::default();
    let skip = fs::canonicalize(dst).ok();

    let walker = WalkDir::new(src).sort_by_file_name().into_iter().filter_entry(|e| {
        skip.as_deref()
            .map_or(true, |skip| fs::canonicalize(e.path()).map_or(true, |p| p != skip))
    });

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        let relative = path.strip_prefix(src)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if !transpiler.accepts(path) {
            fs::copy(path, &target)
                .with_context(|| format!("Failed to copy {}", path.display()))?;
            report.copied += 1;
            continue;
        }

        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut output = transpiler.transpile(path, &source)?;

        if sourcemaps == SourceMapMode::External {
            let map_path = write_sourcemap(&target, relative, &source)?;
            if let Some(name) = map_path.file_name().and_then(|n| n.to_str()) {
                output.push_str(&format!("\n//# sourceMappingURL={}\n", name));
            }
            report.sourcemaps += 1;
        }

        fs::write(&target, output)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        tracing::debug!(file = %relative.display(), "Transpiled");
        report.transpiled += 1;
    }

    Ok(report)
}

fn write_sourcemap(target: &Path, relative: &Path, source: &str) -> Result<PathBuf> {
    let file_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let map_path = target.with_file_name(format!("{}.map", file_name));

    let map = serde_json::json!({
        "version": 3,
        "file": file_name,
        "sources": [relative.to_string_lossy().replace('\\', "/")],
        "sourcesContent": [source],
        "names": [],
        "mappings": "",
    });

    fs::write(&map_path, serde_json::to_string_pretty(&map)?)
        .with_context(|| format!("Failed to write {}", map_path.display()))?;
    Ok(map_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ROUTE: &str = r#"
pub fn handler() -> &'static str { "ok" }

#[cfg(test)]
mod tests {
    #[test]
    fn it_works() {}
}
"#;

    fn source_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("routes/user/[id]")).unwrap();
        fs::write(src.join("routes/index.rs"), ROUTE).unwrap();
        fs::write(src.join("routes/user/[id]/index.rs"), ROUTE).unwrap();
        fs::write(src.join("routes/README.md"), "# routes").unwrap();
        dir
    }

    #[test]
    fn test_strips_test_modules() {
        let out = RustTranspiler.transpile(Path::new("index.rs"), ROUTE).unwrap();
        assert!(out.contains("pub fn handler"));
        assert!(!out.contains("mod tests"));
        assert!(!out.contains("it_works"));
    }

    #[test]
    fn test_syntax_error_names_file() {
        let err = RustTranspiler
            .transpile(Path::new("broken.rs"), "fn (")
            .unwrap_err();
        assert!(err.to_string().contains("broken.rs"));
    }

    #[test]
    fn test_build_copies_and_transpiles() {
        let dir = source_tree();
        let options = BuildOptions::new(dir.path().join("src"), dir.path().join("dist"));

        let report = build(&options).unwrap();

        assert_eq!(
            report,
            BuildReport {
                transpiled: 2,
                copied: 1,
                sourcemaps: 0
            }
        );
        let dist = dir.path().join("dist");
        assert_eq!(fs::read_to_string(dist.join("routes/README.md")).unwrap(), "# routes");
        let index = fs::read_to_string(dist.join("routes/user/[id]/index.rs")).unwrap();
        assert!(!index.contains("cfg"));
    }

    #[test]
    fn test_build_clears_previous_output() {
        let dir = source_tree();
        let dist = dir.path().join("dist");
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join("stale.rs"), "").unwrap();

        build(&BuildOptions::new(dir.path().join("src"), &dist)).unwrap();

        assert!(!dist.join("stale.rs").exists());
    }

    #[test]
    fn test_external_sourcemaps() {
        let dir = source_tree();
        let options = BuildOptions::new(dir.path().join("src"), dir.path().join("dist"))
            .sourcemaps(SourceMapMode::External);

        let report = build(&options).unwrap();
        assert_eq!(report.sourcemaps, 2);

        let dist = dir.path().join("dist");
        let map: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dist.join("routes/index.rs.map")).unwrap())
                .unwrap();
        assert_eq!(map["version"], 3);
        assert_eq!(map["sources"][0], "routes/index.rs");
        assert!(fs::read_to_string(dist.join("routes/index.rs"))
            .unwrap()
            .ends_with("//# sourceMappingURL=index.rs.map\n"));
    }

    #[test]
    fn test_refuses_output_dir_containing_source() {
        let dir = source_tree();
        let src = dir.path().join("src");

        let err = build(&BuildOptions::new(&src, dir.path())).unwrap_err();

        assert!(err.to_string().contains("must not contain the source directory"));
        assert!(src.join("routes/index.rs").exists());
    }

    #[test]
    fn test_refuses_same_dir_through_other_spelling() {
        let dir = source_tree();
        let src = dir.path().join("src");

        let err = build(&BuildOptions::new(&src, src.join("routes/.."))).unwrap_err();

        assert!(err.to_string().contains("must not contain"));
        assert!(src.join("routes/README.md").exists());
    }

    #[test]
    fn test_output_dir_inside_source_is_skipped() {
        let dir = source_tree();
        let src = dir.path().join("src");

        let report = build(&BuildOptions::new(&src, src.join("dist"))).unwrap();

        assert_eq!(report.transpiled, 2);
        assert!(!src.join("dist/dist").exists());
    }

    #[test]
    fn test_missing_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = build(&BuildOptions::new(dir.path().join("nope"), dir.path().join("dist")))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
