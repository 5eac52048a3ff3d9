use alg_core::{logging, Framework, FrameworkConfig, Pipeline};
use alg_registry::VersionRequest;
use alg_workspace::WorkspaceSummary;
use anyhow::{bail, Context, Result};
use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("alg")
        .version(crate_version!())
        .about("Run registered data-reduction algorithms")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Framework configuration file (TOML)"),
        )
        .subcommand(
            Command::new("list").about("List registered algorithms").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Output as JSON"),
            ),
        )
        .subcommand(
            Command::new("describe")
                .about("Show the properties of an algorithm")
                .arg(Arg::new("name").required(true).help("Algorithm name"))
                .arg(version_arg()),
        )
        .subcommand(
            Command::new("run")
                .about("Run one algorithm")
                .arg(Arg::new("name").required(true).help("Algorithm name"))
                .arg(version_arg())
                .arg(
                    Arg::new("set")
                        .long("set")
                        .short('s')
                        .action(ArgAction::Append)
                        .value_parser(parse_assignment)
                        .help("Property assignment, Name=Value"),
                ),
        )
        .subcommand(
            Command::new("pipeline")
                .about("Run the steps of a TOML pipeline file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Pipeline file"),
                ),
        )
}

fn version_arg() -> Arg {
    Arg::new("version")
        .long("version")
        .short('v')
        .value_parser(value_parser!(u32))
        .help("Algorithm version (default: configured policy)")
}

fn parse_assignment(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected Name=Value, got '{input}'")),
    }
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => FrameworkConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => FrameworkConfig::default(),
    };
    logging::init(&config.logging)?;

    let framework = Framework::builder()
        .config(config)
        .build()
        .context("starting framework")?;
    let result = dispatch(&framework, &matches);
    framework.shutdown();
    result
}

fn dispatch(framework: &Framework, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", args)) => list(framework, args.get_flag("json")),
        Some(("describe", args)) => {
            let name = args.get_one::<String>("name").context("missing name")?;
            describe(framework, name, args.get_one::<u32>("version").copied())
        }
        Some(("run", args)) => {
            let name = args.get_one::<String>("name").context("missing name")?;
            let assignments: Vec<(String, String)> = args
                .get_many::<(String, String)>("set")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            run(framework, name, args.get_one::<u32>("version").copied(), &assignments)
        }
        Some(("pipeline", args)) => {
            let path = args.get_one::<PathBuf>("file").context("missing file")?;
            let pipeline = Pipeline::from_file(path)?;
            let reports = pipeline.run(framework)?;
            for report in &reports {
                println!(
                    "step {}: {} v{} ({} ms)",
                    report.index, report.algorithm, report.version, report.elapsed_ms
                );
            }
            print_summaries(&framework.data_service().summaries());
            Ok(())
        }
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
}

fn list(framework: &Framework, json: bool) -> Result<()> {
    let descriptors = framework.registry().algorithms().descriptors();
    if json {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }
    println!("{:<28} {:>3}  {:<40} MODULE", "NAME", "VER", "CATEGORY");
    for d in &descriptors {
        println!("{:<28} {:>3}  {:<40} {}", d.name, d.version, d.category, d.module);
    }
    Ok(())
}

fn describe(framework: &Framework, name: &str, version: Option<u32>) -> Result<()> {
    let runner = framework.create_algorithm(name, version)?;
    let descriptor = framework
        .registry()
        .algorithms()
        .descriptor(name, VersionRequest::Exact(runner.version()))?;
    println!("{} v{} [{}]", descriptor.name, descriptor.version, descriptor.category);
    if !descriptor.summary.is_empty() {
        println!("  {}", descriptor.summary);
    }
    println!();
    for property in runner.properties().properties() {
        println!(
            "{:<22} {:<7} {:<10} default: {}",
            property.name(),
            property.direction(),
            property.kind(),
            property.default_value()
        );
        if let Some(validator) = property.validator() {
            println!("    validator: {}", validator.describe());
        }
        let allowed = property.allowed_values();
        if !allowed.is_empty() {
            println!("    allowed: {}", allowed.join(", "));
        }
        if !property.documentation().is_empty() {
            println!("    {}", property.documentation());
        }
    }
    Ok(())
}

fn run(
    framework: &Framework,
    name: &str,
    version: Option<u32>,
    assignments: &[(String, String)],
) -> Result<()> {
    let runner = framework
        .run(
            name,
            version,
            assignments.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
        .with_context(|| format!("running {name}"))?;
    println!("{} v{} finished ({})", runner.name(), runner.version(), runner.id());
    for property in runner.properties().properties() {
        if property.direction().is_output() {
            println!("  {} = {}", property.name(), property.value_as_string());
        }
    }
    print_summaries(&framework.data_service().summaries());
    Ok(())
}

fn print_summaries(summaries: &[WorkspaceSummary]) {
    if summaries.is_empty() {
        return;
    }
    println!();
    println!("{:<20} {:<22} {:>8} {:>8}  TITLE", "WORKSPACE", "TYPE", "SPECTRA", "BINS");
    for s in summaries {
        println!(
            "{:<20} {:<22} {:>8} {:>8}  {}",
            s.name, s.workspace_type, s.histogram_count, s.y_length, s.title
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(
            parse_assignment("LogText=a=b"),
            Ok(("LogText".to_string(), "a=b".to_string()))
        );
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("Factor").is_err());
    }
}
