//! Minimal CLI: extract → (types | check)
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;

use flow_osi::{
    KeyedError, Registry, ValidatorMap, compile_one, read_file, read_registry, validate_any,
    validate_regex, validate_type_of,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// extract Flow type aliases and either print them as JSON or check JSON documents against them
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// extract type aliases and print the registry as JSON
    Types(TypesOut),
    /// validate JSON/NDJSON documents against one type
    Check(CheckIn),
}

#[derive(clap::Parser, Debug)]
struct TypesOut {
    /// Flow-annotated source file
    source: PathBuf,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct TypeSettings {
    /// Flow-annotated source file to extract types from
    #[arg(long, required_unless_present = "registry", conflicts_with = "registry")]
    source: Option<PathBuf>,

    /// registry JSON previously written by `types`
    #[arg(long)]
    registry: Option<PathBuf>,

    /// name of the type alias to check against
    #[arg(long = "type")]
    type_name: String,

    /// validate a custom type name with a regex: NAME=REGEX
    #[arg(long = "pattern", value_parser = parse_pattern)]
    patterns: Vec<(String, Regex)>,

    /// validate a custom type name with a `typeof` check: NAME=TYPEOF (e.g. ID=number)
    #[arg(long = "type-of", value_parser = parse_pair)]
    type_ofs: Vec<(String, String)>,

    /// accept any value for a custom type name
    #[arg(long = "any")]
    any: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckIn {
    #[command(flatten)]
    type_settings: TypeSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// print documents that passed too
    #[arg(short, long)]
    verbose: bool,
}

/// One candidate object and where it came from.
struct Document {
    label: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeSettings {
    fn load_registry(&self) -> Result<Registry> {
        match (&self.source, &self.registry) {
            (_, Some(path)) => Ok(read_registry(path)?),
            (Some(path), None) => Ok(read_file(path)?),
            (None, None) => bail!("either --source or --registry is required"),
        }
    }

    fn validator_map(&self) -> ValidatorMap {
        let mut map = ValidatorMap::new();
        for (name, pattern) in &self.patterns {
            map.insert(name.clone(), validate_regex(pattern.clone()));
        }
        for (name, type_of) in &self.type_ofs {
            map.insert(name.clone(), validate_type_of(type_of.as_str()));
        }
        for name in &self.any {
            map.insert(name.clone(), validate_any());
        }
        map
    }
}

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            if self.ndjson {
                for (index, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let label = format!("{source_path_str}:{}", index + 1);
                    let value = serde_json::from_str::<Value>(line)
                        .with_context(|| format!("failed to parse JSON ({label})"))?;
                    documents.push(Document { label, value });
                }
            } else {
                let value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                documents.push(Document { label: source_path_str, value });
            }
        }
        Ok(documents)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns `false` if any checked document was invalid.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Types(target) => {
                let registry = read_file(&target.source)?;
                let registry_src = serde_json::to_string_pretty(&registry)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &registry_src)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{registry_src}");
                }
                Ok(true)
            }
            Command::Check(target) => {
                let settings = &target.type_settings;
                let registry = settings.load_registry()?;
                let ty = registry.get(&settings.type_name).ok_or_else(|| {
                    let known = registry.names().collect::<Vec<_>>().join(", ");
                    anyhow!("no type alias named `{}` (found: {known})", settings.type_name)
                })?;
                let validator = compile_one(&settings.validator_map(), ty)?;
                let documents = target.input_settings.load()?;
                tracing::info!(documents = documents.len(), ty = %settings.type_name, "checking");

                // validators are pure; order of the report follows input order
                let results: Vec<(&Document, Vec<KeyedError>)> = documents
                    .par_iter()
                    .map(|doc| (doc, validator.validate(&doc.value)))
                    .collect();

                let mut failed = 0usize;
                for (doc, errors) in &results {
                    if errors.is_empty() {
                        if target.verbose {
                            println!("{} {}", "ok".green(), doc.label);
                        }
                        continue;
                    }
                    failed += 1;
                    for error in errors {
                        println!("{}: {}", doc.label.bold(), error.to_string().red());
                    }
                }
                eprintln!("{} of {} documents invalid", failed, results.len());
                Ok(failed == 0)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}

fn parse_pattern(raw: &str) -> Result<(String, Regex), String> {
    let (name, pattern) = parse_pair(raw)?;
    let regex = Regex::new(&pattern).map_err(|e| e.to_string())?;
    Ok((name, regex))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
            out.push(entry?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_arguments_parse() {
        let cli = CommandLineInterface::try_parse_from([
            "flow-osi",
            "check",
            "--source",
            "fixtures/example_types.js",
            "--type",
            "User",
            "--pattern",
            r"PhoneNumber=^\d{10}$",
            "--type-of",
            "ID=number",
            "--any",
            "GUID",
            "-i",
            "a.json",
            "b.json",
        ])
        .unwrap();
        let Command::Check(check) = cli.cmd else { panic!("expected check") };
        assert_eq!(check.type_settings.type_name, "User");
        assert_eq!(check.input_settings.input, ["a.json", "b.json"]);
        let map = check.type_settings.validator_map();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["PhoneNumber", "ID", "GUID"]);
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pattern("X=(").is_err());
        assert_eq!(parse_pair("ID=number").unwrap(), ("ID".to_string(), "number".to_string()));
    }

    #[test]
    fn source_and_registry_are_exclusive() {
        let parsed = CommandLineInterface::try_parse_from([
            "flow-osi", "check", "--source", "a.js", "--registry", "a.json", "--type", "User", "-i",
            "x.json",
        ]);
        assert!(parsed.is_err());
    }
}
