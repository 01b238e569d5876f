use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ddt_artifact::ArtifactStore;
use ddt_core::{
    AssemblyOptions, CachedMonthCatalog, ConfirmationPolicy, HttpGenerationService,
    HttpMonthCatalog, PlanConfig, PlanRunner, ServiceConfig, SharedTranslations, StaticTemplates,
    StepPlanner, Template, TemplateAssembler, TemplateTranslations, UuidIds, WorkPlanWeights,
};
use ddt_schema::SchemaNode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let schema = Arg::new("schema")
        .long("schema")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Schema tree (JSON array of fields)");
    let confirm_only = Arg::new("confirm-only")
        .long("confirm-only")
        .action(ArgAction::SetTrue)
        .help("Plan confirmation without a notConfirmed retry step");
    let store = Arg::new("store")
        .long("store")
        .value_parser(value_parser!(PathBuf))
        .help("Artifact store (JSON)");

    Command::new("ddt")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Dialogue data template pipeline")
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Service configuration (TOML)"),
        )
        .subcommand(
            Command::new("plan")
                .about("Print the generation step plan")
                .arg(schema.clone())
                .arg(confirm_only.clone()),
        )
        .subcommand(
            Command::new("workplan")
                .about("Print the work estimate")
                .arg(schema.clone())
                .arg(
                    Arg::new("base-per-datum")
                        .long("base-per-datum")
                        .default_value("6")
                        .value_parser(value_parser!(usize))
                        .help("Steps counted per field"),
                )
                .arg(
                    Arg::new("steps-per-constraint")
                        .long("steps-per-constraint")
                        .default_value("3")
                        .value_parser(value_parser!(usize))
                        .help("Steps counted per constraint"),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Run the step plan against the generation service")
                .arg(schema.clone())
                .arg(confirm_only)
                .arg(store.clone().required_unless_present("dry-run"))
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Call every step but keep nothing"),
                ),
        )
        .subcommand(
            Command::new("assemble")
                .about("Assemble the final template")
                .arg(schema)
                .arg(store)
                .arg(
                    Arg::new("locale")
                        .long("locale")
                        .required(true)
                        .help("Project locale, e.g. it-IT"),
                )
                .arg(
                    Arg::new("label")
                        .long("label")
                        .default_value("Template")
                        .help("Label of the assembled template"),
                )
                .arg(
                    Arg::new("templates")
                        .long("templates")
                        .value_parser(value_parser!(PathBuf))
                        .help("Reusable templates (JSON array)"),
                )
                .arg(
                    Arg::new("template-translations")
                        .long("template-translations")
                        .value_parser(value_parser!(PathBuf))
                        .help("Template translations (key -> locale -> text)"),
                )
                .arg(
                    Arg::new("source-template")
                        .long("source-template")
                        .help("Template the schema was derived from"),
                )
                .arg(
                    Arg::new("translations-out")
                        .long("translations-out")
                        .default_value("translations.json")
                        .value_parser(value_parser!(PathBuf))
                        .help("Where to write minted translations"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json"));

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ServiceConfig::from_toml_str(&raw)?
        }
        None => ServiceConfig::default(),
    };

    match matches.subcommand() {
        Some(("plan", args)) => {
            let mains = load_schema(args)?;
            print_json(&planner(args).plan(&mains))
        }
        Some(("workplan", args)) => {
            let mains = load_schema(args)?;
            let weights = WorkPlanWeights {
                base_per_datum: *args.get_one::<usize>("base-per-datum").unwrap_or(&6),
                steps_per_constraint: *args.get_one::<usize>("steps-per-constraint").unwrap_or(&3),
            };
            print_json(&StepPlanner::default().work_plan(&mains, weights))
        }
        Some(("generate", args)) => generate(args, config).await,
        Some(("assemble", args)) => assemble(args, config).await,
        _ => bail!("unknown command"),
    }
}

async fn generate(args: &ArgMatches, config: ServiceConfig) -> Result<()> {
    let mains = load_schema(args)?;
    let plan = planner(args).plan(&mains);
    let service = HttpGenerationService::new(config)?;
    let runner = PlanRunner::new(&service);

    if args.get_flag("dry-run") {
        runner.run_dry(&mains, &plan).await?;
        return Ok(());
    }

    let results = runner.run_collect(&mains, &plan).await;
    let mut collected = ArtifactStore::new();
    let summary = collected.record_all(&results)?;

    let Some(path) = args.get_one::<PathBuf>("store") else {
        bail!("--store is required unless --dry-run is set");
    };
    let mut store: ArtifactStore = if path.exists() {
        read_json(path)?
    } else {
        ArtifactStore::new()
    };
    store.merge(collected);
    write_json(path, &store)?;
    info!(
        stored = summary.stored,
        paths = store.len(),
        store = %path.display(),
        "Artifact store updated"
    );

    if summary.skipped > 0 {
        bail!("generation stopped after {} of {} steps", summary.stored, plan.len());
    }
    Ok(())
}

async fn assemble(args: &ArgMatches, config: ServiceConfig) -> Result<()> {
    let mains = load_schema(args)?;
    let store: ArtifactStore = match args.get_one::<PathBuf>("store") {
        Some(path) => read_json(path)?,
        None => {
            warn!("No artifact store given, recovery text will be synthesized");
            ArtifactStore::new()
        }
    };

    let mut templates = StaticTemplates::new();
    if let Some(path) = args.get_one::<PathBuf>("templates") {
        let list: Vec<Template> = read_json(path)?;
        templates = list.into_iter().fold(templates, StaticTemplates::with_template);
    }

    let mut options = AssemblyOptions::default();
    options.project_locale = args.get_one::<String>("locale").cloned();
    if let Some(path) = args.get_one::<PathBuf>("template-translations") {
        let translations: TemplateTranslations = read_json(path)?;
        options = options.with_template_translations(translations);
    }
    if let Some(id) = args.get_one::<String>("source-template") {
        options = options.with_source_template(id.clone());
    }

    let months = CachedMonthCatalog::with_ttl(
        HttpMonthCatalog::new(config)?,
        32,
        Duration::from_secs(3600),
    );
    let ids = UuidIds;
    let translations = SharedTranslations::new();
    let label = args
        .get_one::<String>("label")
        .map_or("Template", String::as_str);

    let template = TemplateAssembler::new(&templates, &months, &ids)
        .assemble(label, &mains, &store, &options, Some(&translations))
        .await?;

    if let Some(out) = args.get_one::<PathBuf>("translations-out") {
        write_json(out, &translations.snapshot())?;
        info!(entries = translations.len(), path = %out.display(), "Translations written");
    }
    print_json(&template)
}

fn planner(args: &ArgMatches) -> StepPlanner {
    let confirmation = if args.get_flag("confirm-only") {
        ConfirmationPolicy::ConfirmOnly
    } else {
        ConfirmationPolicy::ConfirmWithRetry
    };
    StepPlanner::new(PlanConfig { confirmation })
}

fn load_schema(args: &ArgMatches) -> Result<Vec<SchemaNode>> {
    let path = args
        .get_one::<PathBuf>("schema")
        .context("--schema is required")?;
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value)?;
    std::fs::write(path, raw).with_context(|| format!("writing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
