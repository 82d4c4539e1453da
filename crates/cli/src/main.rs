use anyhow::Context;
use clap::{Parser, Subcommand};
use forms_core::{
    constants::DEFAULT_CATALOG_FILE, CoreConfig, Encounter, FormCatalog, FormFileStore, FormRef,
    FormService, FormTranslation, FormView, JsonCatalog, Obs, RegistryUuid, SaveFormResource,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "forms")]
#[command(about = "Clinical form registry CLI")]
struct Cli {
    /// Catalog file (overrides FORMS_CATALOG_FILE)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List published, non-retired form versions
    List,
    /// List the latest published version of every form
    Latest {
        /// Include retired forms
        #[arg(long)]
        include_retired: bool,
        /// Encounter whose observations pin form versions
        #[arg(long)]
        encounter: Option<String>,
    },
    /// Register a new draft form
    CreateForm {
        /// Form name
        name: String,
    },
    /// Save a form layout from a JSON file
    SaveResource {
        /// Form UUID
        form_uuid: String,
        /// File holding the form layout JSON
        json_file: PathBuf,
        /// Existing resource to update
        #[arg(long)]
        resource_uuid: Option<String>,
    },
    /// Publish a form
    Publish {
        /// Form UUID
        form_uuid: String,
    },
    /// Save one locale's translations from a JSON file with `labels` and `concepts`
    Translate {
        /// Form name
        form_name: String,
        /// Form version
        version: String,
        /// Locale, e.g. `fr`
        locale: String,
        /// File holding the translations
        json_file: PathBuf,
    },
    /// Show every locale's translations for a form version
    Translations {
        /// Form name
        form_name: String,
        /// Form version
        version: String,
    },
    /// Record an encounter with form-tagged observations
    AddEncounter {
        /// Encounter UUID
        encounter_uuid: String,
        /// Form field paths of the encounter's observations, e.g. `Vitals.1/pulse`
        form_field_paths: Vec<String>,
    },
}

#[derive(Deserialize)]
struct TranslationFile {
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    concepts: BTreeMap<String, String>,
}

fn open_service(catalog: Option<PathBuf>) -> anyhow::Result<FormService<JsonCatalog>> {
    let cfg = Arc::new(CoreConfig::from_setting_values(
        std::env::var("FORMS_DIRECTORY").ok(),
        std::env::var("FORMS_TRANSLATIONS_DIRECTORY").ok(),
    )?);

    let catalog_file = catalog
        .or_else(|| std::env::var("FORMS_CATALOG_FILE").ok().map(PathBuf::from))
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE));

    let files = FormFileStore::new(cfg.forms_dir())?;
    let catalog = JsonCatalog::open(&catalog_file, files)
        .with_context(|| format!("opening catalog {}", catalog_file.display()))?;

    Ok(FormService::new(cfg, catalog))
}

fn print_forms(forms: &[FormView]) {
    if forms.is_empty() {
        println!("No forms found.");
    }
    for form in forms {
        println!(
            "UUID: {}, Name: {}, Version: {}, Published: {}",
            form.uuid, form.name, form.version, form.published
        );
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("forms=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'forms --help' for commands");
        return Ok(());
    };

    let mut service = open_service(cli.catalog)?;

    match command {
        Commands::List => print_forms(&service.get_all_forms()?),
        Commands::Latest {
            include_retired,
            encounter,
        } => {
            let encounter = encounter.as_deref().map(RegistryUuid::parse).transpose()?;
            let forms = service.get_all_latest_published_forms(include_retired, encounter.as_ref())?;
            print_forms(&forms);
        }
        Commands::CreateForm { name } => {
            let form = service.create_form(&name)?;
            println!("Created form {} version {} with UUID: {}", form.name, form.version, form.uuid);
        }
        Commands::SaveResource {
            form_uuid,
            json_file,
            resource_uuid,
        } => {
            let form_uuid = RegistryUuid::parse(&form_uuid)?;
            let form = service
                .catalog()
                .get_form_by_uuid(&form_uuid)?
                .with_context(|| format!("no form with UUID {form_uuid}"))?;
            let value = std::fs::read_to_string(&json_file)
                .with_context(|| format!("reading {}", json_file.display()))?;

            let saved = service.save_form_resource(SaveFormResource {
                form: FormRef {
                    uuid: form.uuid,
                    name: form.name,
                },
                uuid: resource_uuid.as_deref().map(RegistryUuid::parse).transpose()?,
                value,
            })?;
            println!(
                "Saved resource {} on form {} version {} ({})",
                saved.uuid, saved.form.name, saved.form.version, saved.form.uuid
            );
        }
        Commands::Publish { form_uuid } => {
            let form_uuid = RegistryUuid::parse(&form_uuid)?;
            match service.publish(&form_uuid)? {
                Some(form) => println!("Published form {} version {}", form.name, form.version),
                None => eprintln!("No form with UUID {}", form_uuid),
            }
        }
        Commands::Translate {
            form_name,
            version,
            locale,
            json_file,
        } => {
            let contents = std::fs::read_to_string(&json_file)
                .with_context(|| format!("reading {}", json_file.display()))?;
            let file: TranslationFile = serde_json::from_str(&contents)
                .with_context(|| format!("parsing {}", json_file.display()))?;

            let saved = service.save_translation(FormTranslation {
                form_name,
                version,
                locale,
                labels: file.labels,
                concepts: file.concepts,
            })?;
            println!(
                "Saved {} translations for {} version {}",
                saved.locale, saved.form_name, saved.version
            );
        }
        Commands::Translations { form_name, version } => {
            let translations = service.get_translations(&form_name, &version)?;
            if translations.is_empty() {
                println!("No translations found.");
            } else {
                println!("{}", serde_json::to_string_pretty(&translations)?);
            }
        }
        Commands::AddEncounter {
            encounter_uuid,
            form_field_paths,
        } => {
            let uuid = RegistryUuid::parse(&encounter_uuid)?;
            let observations = form_field_paths
                .into_iter()
                .map(|path| Obs {
                    uuid: RegistryUuid::new(),
                    form_field_path: Some(path),
                    voided: false,
                })
                .collect();
            service
                .catalog_mut()
                .insert_encounter(Encounter { uuid, observations })?;
            println!("Recorded encounter {}", uuid);
        }
    }

    Ok(())
}
