use clap::Parser;
use maze_link::export::plan_pages;
use maze_link::{ConfigurationStore, Defaults, MemoryFragment, RandomSeeds};
use std::error::Error;
use std::path::PathBuf;

/// Canonicalise a maze link and show the configuration it describes.
#[derive(Parser, Debug)]
#[command(name = "maze_link", version)]
struct Cli {
    /// Fragment to decode, with or without the leading '#'. Empty starts from defaults.
    fragment: Option<String>,

    /// JSON file with default shape, algorithm, colour, features and stroke width.
    #[arg(long)]
    defaults: Option<PathBuf>,

    /// Print the share links of an export with this many pages.
    #[arg(long)]
    pages: Option<u32>,

    /// Page address the share links are built on.
    #[arg(long, default_value = "https://amazegen.example/")]
    base_url: String,
}

fn load_defaults(path: Option<&PathBuf>) -> Result<Defaults, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(Defaults::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let defaults = Defaults::from_json(&json)
        .map_err(|e| format!("invalid defaults in {}: {e}", path.display()))?;
    Ok(defaults)
}

fn main() -> Result<(), Box<dyn Error>> {
    // Set up logging; RUST_LOG=debug shows decode and commit decisions
    env_logger::init();

    let cli = Cli::parse();
    let defaults = load_defaults(cli.defaults.as_ref())?;

    let fragment = MemoryFragment::new(cli.fragment.as_deref().unwrap_or_default());
    let store = ConfigurationStore::new(fragment, RandomSeeds, defaults);

    println!("#{}", store.fragment());
    println!("{}", store.configuration().to_json()?);

    if let Some(pages) = cli.pages {
        let plans = plan_pages(store.configuration(), pages, &cli.base_url, &mut RandomSeeds)?;
        for plan in plans {
            println!("{:>3}  {}", plan.page, plan.link);
        }
    }
    Ok(())
}
