//! Command line: validate, normalize and export declared shapes.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::load;
use crate::registry::Registry;
use crate::shape::ShapeType;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// check JSON documents against declared shapes and export bindings or JSON Schema
#[derive(Parser, Debug)]
#[command(name = "shape-idl")]
pub struct CommandLineInterface {
    /// log resolution and progress details to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate each input against a shape and report per file
    Check(CheckOut),
    /// construct an instance and print its canonical JSON, defaults applied
    Normalize(NormalizeOut),
    /// emit the type-hinted binding for a shape
    Binding(BindingOut),
    /// emit a JSON Schema for a shape
    Schema(SchemaOut),
    /// print the identity of every declared shape
    Identity(IdentityOut),
}

#[derive(Args, Debug, Clone)]
struct ShapeSettings {
    /// declaration document (JSON)
    #[arg(long)]
    decl: PathBuf,

    /// name of the declared shape to use
    #[arg(long)]
    shape: String,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    shape_settings: ShapeSettings,

    #[command(flatten)]
    input_settings: InputSettings,
}

#[derive(clap::Parser, Debug)]
struct NormalizeOut {
    #[command(flatten)]
    shape_settings: ShapeSettings,

    /// input .json file
    #[arg(long, short)]
    input: PathBuf,

    /// JSON Pointer to select the subnode to normalize
    #[arg(long)]
    json_pointer: Option<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct BindingOut {
    #[command(flatten)]
    shape_settings: ShapeSettings,

    /// exported name (defaults to the shape name)
    #[arg(long)]
    name: Option<String>,

    /// module the generated classes import `Shape` from
    #[arg(long, default_value = "shape")]
    runtime_module: String,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    shape_settings: ShapeSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct IdentityOut {
    /// declaration document (JSON)
    #[arg(long)]
    decl: PathBuf,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ShapeSettings {
    fn load(&self) -> anyhow::Result<(Registry, ShapeType)> {
        let registry = load_registry(&self.decl)?;
        let shape = registry.require(&self.shape)?.clone();
        Ok((registry, shape))
    }
}

impl InputSettings {
    fn documents(&self, path: &Path) -> anyhow::Result<Vec<serde_json::Value>> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let documents = if self.ndjson {
            source
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| {
                    load::from_str_with_path::<serde_json::Value>(line)
                        .with_context(|| format!("line {}", i + 1))
                })
                .collect::<anyhow::Result<Vec<_>>>()?
        } else {
            vec![load::from_str_with_path::<serde_json::Value>(&source)?]
        };
        documents
            .into_iter()
            .map(|doc| select(doc, self.json_pointer.as_deref()))
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<ExitCode> {
        init_tracing(self.verbose);
        match &self.cmd {
            Command::Check(target) => {
                let (_, shape) = target.shape_settings.load()?;
                let paths = resolve_file_path_patterns(&target.input_settings.input)?;
                tracing::info!(
                    inputs = paths.len(),
                    shape = %target.shape_settings.shape,
                    "checking"
                );

                let results: Vec<(PathBuf, anyhow::Result<usize>)> = paths
                    .into_par_iter()
                    .map(|path| {
                        let result = check_file(&shape, &target.input_settings, &path);
                        (path, result)
                    })
                    .collect();

                let mut failures = 0;
                for (path, result) in &results {
                    match result {
                        Ok(_) => println!("{} {}", "✅".green(), path.display()),
                        Err(error) => {
                            failures += 1;
                            println!("{} {}: {error:#}", "❌".red(), path.display());
                        }
                    }
                }
                if failures > 0 {
                    tracing::warn!(failures, total = results.len(), "some inputs did not conform");
                    return Ok(ExitCode::FAILURE);
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Normalize(target) => {
                let (_, shape) = target.shape_settings.load()?;
                let source = std::fs::read_to_string(&target.input)
                    .with_context(|| format!("failed to read {}", target.input.display()))?;
                let json = load::from_str_with_path::<serde_json::Value>(&source)?;
                let json = select(json, target.json_pointer.as_deref())?;
                let instance = shape.from_json(json)?;
                write_output(target.out.as_deref(), &instance.to_json_pretty())?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Binding(target) => {
                let (_, shape) = target.shape_settings.load()?;
                let name = target.name.as_deref().unwrap_or(&target.shape_settings.shape);
                let mut cg =
                    crate::binding::Codegen::new().with_runtime_module(&target.runtime_module);
                cg.emit(&shape, name)?;
                write_output(target.out.as_deref(), &cg.into_string())?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Schema(target) => {
                let (_, shape) = target.shape_settings.load()?;
                let schema = crate::schema::shape_schema(&shape);
                let schema_src = serde_json::to_string_pretty(&schema)?;
                write_output(target.out.as_deref(), &schema_src)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Identity(target) => {
                let registry = load_registry(&target.decl)?;
                for (name, shape) in registry.iter() {
                    println!("{name} {}", shape.identity());
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_registry(path: &Path) -> anyhow::Result<Registry> {
    load::registry_from_path(path)
        .with_context(|| format!("invalid declarations in {}", path.display()))
}

/// Validate every document in `path`; the count of checked documents on success.
fn check_file(shape: &ShapeType, settings: &InputSettings, path: &Path) -> anyhow::Result<usize> {
    let documents = settings.documents(path)?;
    for (i, doc) in documents.iter().enumerate() {
        let candidate = crate::value::Value::from_json(doc.clone());
        shape.validate(&candidate).map_err(|error| {
            if settings.ndjson {
                anyhow!("document {}: {error}", i + 1)
            } else {
                anyhow!(error)
            }
        })?;
    }
    tracing::debug!(path = %path.display(), documents = documents.len(), "conforms");
    Ok(documents.len())
}

fn select(doc: serde_json::Value, pointer: Option<&str>) -> anyhow::Result<serde_json::Value> {
    match pointer {
        None => Ok(doc),
        Some(pointer) => match doc.pointer(pointer) {
            Some(node) => Ok(node.clone()),
            None => bail!("JSON pointer {pointer} does not match anything"),
        },
    }
}

fn write_output(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{}", text.trim_end());
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
