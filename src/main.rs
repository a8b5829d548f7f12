use clap::{Parser, Subcommand};
use folio::catalog::Catalog;
use folio::config::{self, FolioConfig};
use folio::output;
use folio::partners::{Moved, PartnerBoard};
use folio::projects::{ProjectBoard, ProjectDraft};
use folio::store::LocalStore;
use folio::types::{Direction, ProjectType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Portfolio content admin: projects, sections and partners")]
#[command(long_about = "\
Portfolio content admin: projects, sections and partners

Projects come from two sources. The bundled catalog always ships with the
site; the store holds what the admin adds or edits. A stored project whose
id matches a catalog entry replaces it everywhere.

Sections (first match wins):
  Case Studies:   type case_study, or untyped and among the first published
                  entries (3 by default, see [classification])
  Selected Works: every other published entry

Partners are listed by sort order and moved one step at a time.

Run 'folio gen-config' to generate a documented folio.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing folio.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List, edit and publish projects
    #[command(subcommand)]
    Projects(ProjectCommand),
    /// List, add, remove and reorder partners
    #[command(subcommand)]
    Partners(PartnerCommand),
    /// Print a stock folio.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Every project, remote entries first
    List,
    /// Published projects in the case study section
    CaseStudies,
    /// Published projects in the selected works section
    SelectedWorks,
    /// Full detail for one project
    Show { id: String },
    /// Create a project, or edit one when --id is given
    Save(SaveArgs),
    /// Delete a stored project
    Delete { id: String },
    /// Make a project visible on the site
    Publish { id: String },
    /// Hide a project from the site
    Unpublish { id: String },
    /// Upload a cover image and print its public URL
    UploadCover { file: PathBuf },
}

#[derive(clap::Args)]
struct SaveArgs {
    /// Project to edit; omit to create a new one
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    year: Option<String>,
    /// Cover image URL
    #[arg(long, conflicts_with = "cover")]
    image: Option<String>,
    /// Upload this file and use it as the cover image
    #[arg(long)]
    cover: Option<PathBuf>,
    /// Rich-text body (HTML)
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    client: Option<String>,
    /// Grid-span class, e.g. md:col-span-2
    #[arg(long)]
    layout: Option<String>,
    /// Gallery image URL; repeat to set several, replacing the current set
    #[arg(long = "gallery")]
    gallery: Vec<String>,
    /// case_study or selected_work
    #[arg(long = "type")]
    project_type: Option<ProjectType>,
    /// Save without publishing
    #[arg(long)]
    unpublished: bool,
}

#[derive(Subcommand)]
enum PartnerCommand {
    /// Partners in display order
    List,
    /// Upload a logo and add a partner at the end of the list
    Add { name: String, logo: PathBuf },
    /// Remove a partner
    Remove { id: String },
    /// Move a partner one place up or down
    Move { id: String, direction: Direction },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Projects(cmd) => {
            let (config, catalog, store) = open(&cli.config_dir).await?;
            run_projects(cmd, store, catalog, &config).await?;
        }
        Command::Partners(cmd) => {
            let (config, catalog, store) = open(&cli.config_dir).await?;
            run_partners(cmd, store, &catalog, &config).await?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `folio.toml`, the catalog it points at, and the store.
async fn open(
    config_dir: &Path,
) -> Result<(FolioConfig, Catalog, Arc<LocalStore>), Box<dyn std::error::Error>> {
    let config = config::load_config(config_dir)?;
    let catalog = Catalog::resolve(config.catalog.path.as_deref())?;
    let store = LocalStore::open(&config.store.root, config.store.public_url.clone()).await?;
    tracing::debug!(root = %config.store.root.display(), "store ready");
    Ok((config, catalog, Arc::new(store)))
}

async fn run_projects(
    cmd: ProjectCommand,
    store: Arc<LocalStore>,
    catalog: Catalog,
    config: &FolioConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut board = ProjectBoard::new(store, catalog, config.storage.bucket.clone())
        .with_classifier(config.classifier());
    if !board.load().await {
        output::print_store_fallback("projects");
    }

    match cmd {
        ProjectCommand::List => {
            output::print_project_list(board.projects(), |id| board.is_remote(id));
        }
        ProjectCommand::CaseStudies => {
            output::print_section("Case Studies", &board.case_studies());
        }
        ProjectCommand::SelectedWorks => {
            output::print_section("Selected Works", &board.selected_works());
        }
        ProjectCommand::Show { id } => {
            let draft = board.load_for_edit(&id).await?;
            let project = match board.get(&id) {
                Some(p) => p.clone(),
                None => draft.into_project(id.clone()),
            };
            output::print_project_detail(&project, &config.display);
        }
        ProjectCommand::Save(args) => {
            let mut draft = match &args.id {
                Some(id) => board.load_for_edit(id).await?,
                None => ProjectDraft::default(),
            };
            if let Some(path) = &args.cover {
                let bytes = tokio::fs::read(path).await?;
                draft.image = board.upload_cover(&file_name(path), &bytes).await?;
            }
            apply_save_args(&mut draft, args);
            let project = board.save(draft).await?;
            println!("Saved {} ({})", project.title, project.id);
        }
        ProjectCommand::Delete { id } => {
            board.delete(&id).await?;
            println!("Deleted {}", id);
        }
        ProjectCommand::Publish { id } => set_published(&mut board, &id, true).await?,
        ProjectCommand::Unpublish { id } => set_published(&mut board, &id, false).await?,
        ProjectCommand::UploadCover { file } => {
            let bytes = tokio::fs::read(&file).await?;
            let url = board.upload_cover(&file_name(&file), &bytes).await?;
            println!("{}", url);
        }
    }
    Ok(())
}

async fn run_partners(
    cmd: PartnerCommand,
    store: Arc<LocalStore>,
    catalog: &Catalog,
    config: &FolioConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut board = PartnerBoard::new(store, config.storage.bucket.clone());
    if !board.load(catalog).await {
        output::print_store_fallback("partners");
    }

    match cmd {
        PartnerCommand::List => {}
        PartnerCommand::Add { name, logo } => {
            let bytes = tokio::fs::read(&logo).await?;
            let partner = board.add(&name, &file_name(&logo), &bytes).await?;
            println!("Added {} ({})", partner.name, partner.id);
        }
        PartnerCommand::Remove { id } => {
            board.remove(&id).await?;
            println!("Removed {}", id);
        }
        PartnerCommand::Move { id, direction } => {
            if board.move_partner(&id, direction).await? == Moved::Unchanged {
                println!("{} is already at the edge", id);
            }
        }
    }
    output::print_partner_list(board.list());
    Ok(())
}

/// Publish or unpublish, doing nothing when already in the wanted state.
async fn set_published(
    board: &mut ProjectBoard<LocalStore>,
    id: &str,
    published: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let current = board.load_for_edit(id).await?.is_published;
    if current != published {
        board.toggle_publish(id).await?;
    }
    let state = if published { "published" } else { "unpublished" };
    println!("{} is {}", id, state);
    Ok(())
}

fn apply_save_args(draft: &mut ProjectDraft, args: SaveArgs) {
    let fields = [
        (&mut draft.title, args.title),
        (&mut draft.category, args.category),
        (&mut draft.year, args.year),
        (&mut draft.image, args.image),
        (&mut draft.description, args.description),
        (&mut draft.role, args.role),
        (&mut draft.client, args.client),
        (&mut draft.layout_hint, args.layout),
    ];
    for (slot, value) in fields {
        if let Some(value) = value {
            *slot = value;
        }
    }
    if !args.gallery.is_empty() {
        draft.images = args.gallery;
    }
    if let Some(t) = args.project_type {
        draft.project_type = t;
    }
    if args.unpublished {
        draft.is_published = false;
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
