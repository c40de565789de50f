// ============================================================================
// closet — command-line front end for the wardrobe inventory
// ============================================================================
// Usage:
//   closet stats                            Show collection statistics
//   closet list [--sort F] [--order asc]    List items
//   closet add --name NAME [...]            Add an item
//   closet stage --name NAME --slider k=v   Stage a record for the next merge
//   closet recommend [--count N]            Suggest catalog items
//   closet backup [--out FILE]              Export everything as JSON
// ============================================================================

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use closet_core::backup::backup_file_name;
use closet_core::query::DEFAULT_SORT_FIELD;
use closet_core::recommend::category_display_name;
use closet_core::schema::{self, Field, NumericField, TextField};
use closet_core::{
    AppStore, ClothingItem, InventoryEngine, ItemInput, NumericInput, PreferenceTone, RedbSlots,
    SearchFilters, SortOrder, StagedRecord,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Personal clothing inventory
#[derive(Parser)]
#[command(name = "closet", version, about = "Record, search and analyse your wardrobe")]
struct Cli {
    /// Path to the database file (default: ~/.closet/closet.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show collection statistics
    Stats,

    /// List items, newest first by default
    List {
        /// Field to sort by (createdAt, updatedAt, name, price, ...)
        #[arg(long, default_value = DEFAULT_SORT_FIELD)]
        sort: String,

        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,

        /// Print the items as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one item as JSON
    Show { id: String },

    /// Add an item
    Add(ItemArgs),

    /// Change some fields of an item
    Update {
        id: String,

        #[command(flatten)]
        item: ItemArgs,
    },

    /// Delete an item
    Delete { id: String },

    /// Search name/color/brand/category, optionally narrowed by filters
    Search {
        query: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        max_price: Option<f64>,

        #[arg(long)]
        min_preference: Option<f64>,
    },

    /// Suggest catalog items from your average preferences
    Recommend {
        #[arg(long, default_value = "3")]
        count: usize,
    },

    /// Stage a record the way the entry page does; merged on next open
    Stage(StageArgs),

    /// Merge staged records now and report what happened
    Merge,

    /// Write a backup file
    Backup {
        /// Output path (default: clothing-app-backup-YYYY-MM-DD.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replace all data with a backup file
    Restore { file: PathBuf },

    /// Delete everything
    Clear {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

/// Item fields accepted by `add` and `update`. Numeric values are passed
/// through as text and coerced by the validator.
#[derive(Args)]
struct ItemArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    silhouette: Option<String>,
    #[arg(long)]
    material: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    fit: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    usage_scene: Option<String>,
    #[arg(long)]
    personal_values: Option<String>,
    #[arg(long)]
    purchase_info: Option<String>,

    #[arg(long)]
    color_hue: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    silhouette_value: Option<String>,
    #[arg(long)]
    material_value: Option<String>,
    #[arg(long)]
    emotion: Option<String>,
    #[arg(long)]
    fit_value: Option<String>,
    #[arg(long)]
    values: Option<String>,
}

impl ItemArgs {
    fn into_input(self) -> ItemInput {
        let num = |v: Option<String>| v.map(NumericInput::Text);
        ItemInput {
            name: self.name,
            color: self.color,
            silhouette: self.silhouette,
            material: self.material,
            brand: self.brand,
            fit: self.fit,
            category: self.category,
            usage_scene: self.usage_scene,
            personal_values: self.personal_values,
            purchase_info: self.purchase_info,
            color_hue: num(self.color_hue),
            price: num(self.price),
            silhouette_value: num(self.silhouette_value),
            material_value: num(self.material_value),
            emotion: num(self.emotion),
            fit_value: num(self.fit_value),
            values: num(self.values),
            preferences: None,
        }
    }
}

#[derive(Args)]
struct StageArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    usage_scene: Option<String>,

    /// Slider value as KEY=VALUE; KEY is a slider id (colorSlider) or a
    /// field name (colorHue). Repeatable.
    #[arg(long = "slider", value_name = "KEY=VALUE")]
    sliders: Vec<String>,
}

fn parse_slider(raw: &str) -> Result<(NumericField, f64)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Slider '{}' must look like KEY=VALUE", raw))?;
    let key = key.trim();
    let field = NumericField::ALL
        .into_iter()
        .find(|f| f.slider_key() == key)
        .or_else(|| match schema::lookup(key) {
            Some(Field::Numeric(f)) => Some(f),
            _ => None,
        })
        .ok_or_else(|| anyhow!("Unknown slider '{}'", key))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid value for {}: {}", key, e))?;
    Ok((field, value))
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("closet_core=info".parse()?))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }
    init_logging()?;

    let cli = Cli::parse();
    let slots = RedbSlots::open(cli.db_path.as_deref())?;
    let db_path = slots.path().display().to_string();
    run(AppStore::new(slots), cli.command, &db_path)
}

/// Staging and merging work on the store directly so that the merge which
/// runs on open never sees a half-written stage. Everything else goes
/// through a fully opened engine.
fn run(store: AppStore, command: Commands, db_path: &str) -> Result<()> {
    match command {
        Commands::Stage(args) => cmd_stage(&store, args),
        Commands::Merge => cmd_merge(InventoryEngine::load(store)),
        Commands::Stats => cmd_stats(&InventoryEngine::open(store), db_path),
        Commands::List { sort, order, json } => {
            cmd_list(&InventoryEngine::open(store), &sort, order, json)
        }
        Commands::Show { id } => cmd_show(&InventoryEngine::open(store), &id),
        Commands::Add(args) => cmd_add(&mut InventoryEngine::open(store), args),
        Commands::Update { id, item } => cmd_update(&mut InventoryEngine::open(store), &id, item),
        Commands::Delete { id } => cmd_delete(&mut InventoryEngine::open(store), &id),
        Commands::Search {
            query,
            category,
            min_price,
            max_price,
            min_preference,
        } => {
            let filters = SearchFilters {
                category,
                min_price,
                max_price,
                min_preference,
            };
            cmd_search(&InventoryEngine::open(store), query.as_deref().unwrap_or(""), &filters)
        }
        Commands::Recommend { count } => cmd_recommend(&InventoryEngine::open(store), count),
        Commands::Backup { out } => cmd_backup(&InventoryEngine::open(store), out),
        Commands::Restore { file } => cmd_restore(&mut InventoryEngine::open(store), &file),
        Commands::Clear { yes } => cmd_clear(&mut InventoryEngine::open(store), yes),
    }
}

fn cmd_stats(engine: &InventoryEngine, db_path: &str) -> Result<()> {
    let stats = engine.get_statistics();
    let tone = PreferenceTone::classify(stats.average_preference);

    println!("=== Closet Stats ===");
    println!("Database: {}", db_path);
    println!();
    println!("Items:              {}", stats.total_items);
    println!(
        "Average preference: {:.1} ({})",
        stats.average_preference,
        tone.as_str()
    );
    println!(
        "Favorite category:  {}",
        stats
            .favorite_category
            .as_deref()
            .map(category_display_name)
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "Price:              min {} / max {} / avg {}",
        stats.price_range.min, stats.price_range.max, stats.price_range.average
    );
    if !stats.category_distribution.is_empty() {
        println!("Categories:");
        for (category, count) in &stats.category_distribution {
            println!("  {:16} {}", category_display_name(category), count);
        }
    }
    Ok(())
}

fn print_table(items: &[ClothingItem]) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    println!(
        "{:<36}  {:<24}  {:<12}  {:>5}  {:>7}  {}",
        "ID", "NAME", "CATEGORY", "PRICE", "OVERALL", "CREATED"
    );
    println!("{}", "-".repeat(110));
    for item in items {
        let name = item.fields.name.chars().take(24).collect::<String>();
        println!(
            "{:<36}  {:<24}  {:<12}  {:>5}  {:>7}  {}",
            item.id,
            name,
            category_display_name(&item.fields.category),
            item.fields.price,
            item.preferences.overall,
            item.created_at
        );
    }
    println!("\nTotal: {} items", items.len());
}

fn cmd_list(engine: &InventoryEngine, sort: &str, order: SortOrder, json: bool) -> Result<()> {
    let items = engine.sort_items(&engine.get_all_items(), sort, order);
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        print_table(&items);
    }
    Ok(())
}

fn cmd_show(engine: &InventoryEngine, id: &str) -> Result<()> {
    let item = engine
        .get_item(id)
        .ok_or_else(|| anyhow!("Item not found: {}", id))?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    Ok(())
}

fn cmd_add(engine: &mut InventoryEngine, args: ItemArgs) -> Result<()> {
    let item = engine.create(&args.into_input())?;
    println!("Added {} ({})", item.id, item.fields.name);
    println!("Overall preference: {}", item.preferences.overall);
    Ok(())
}

fn cmd_update(engine: &mut InventoryEngine, id: &str, args: ItemArgs) -> Result<()> {
    let item = engine.update(id, &args.into_input())?;
    println!("Updated {} ({})", item.id, item.fields.name);
    println!("Overall preference: {}", item.preferences.overall);
    Ok(())
}

fn cmd_delete(engine: &mut InventoryEngine, id: &str) -> Result<()> {
    engine.delete(id)?;
    println!("Deleted {}", id);
    Ok(())
}

fn cmd_search(engine: &InventoryEngine, query: &str, filters: &SearchFilters) -> Result<()> {
    debug!("Searching for '{}' with {:?}", query, filters);
    print_table(&engine.search_items(query, filters));
    Ok(())
}

fn cmd_recommend(engine: &InventoryEngine, count: usize) -> Result<()> {
    let recs = engine.generate_recommendations(count);
    for rec in &recs {
        println!(
            "{}  {} / {}  {} ({})  {}  match {}%",
            rec.id,
            rec.name,
            rec.brand,
            rec.price_display,
            rec.price_range.label(),
            rec.color_name,
            rec.match_score
        );
        println!("    {}", rec.description);
        println!("    {}", rec.url);
    }
    Ok(())
}

fn cmd_stage(store: &AppStore, args: StageArgs) -> Result<()> {
    let mut record = StagedRecord::now().with_text(TextField::Name, args.name);
    let optional = [
        (TextField::Color, args.color),
        (TextField::Brand, args.brand),
        (TextField::Category, args.category),
        (TextField::UsageScene, args.usage_scene),
    ];
    for (field, value) in optional {
        if let Some(value) = value {
            record = record.with_text(field, value);
        }
    }
    for raw in &args.sliders {
        let (field, value) = parse_slider(raw)?;
        record = record.with_slider(field, value);
    }

    let pending = store.stage_record(&record)?;
    println!("Staged record ({} pending)", pending);
    Ok(())
}

fn cmd_merge(mut engine: InventoryEngine) -> Result<()> {
    let report = engine.merge_staged()?;
    println!(
        "Merged staged records: {} added, {} duplicates skipped, {} unreadable",
        report.added, report.duplicates, report.malformed
    );
    Ok(())
}

fn cmd_backup(engine: &InventoryEngine, out: Option<PathBuf>) -> Result<()> {
    let path = out.unwrap_or_else(|| PathBuf::from(backup_file_name(Utc::now().date_naive())));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let backup = engine.write_backup(file)?;
    println!(
        "Wrote {} items to {}",
        backup.data.clothing_items.len(),
        path.display()
    );
    Ok(())
}

fn cmd_restore(engine: &mut InventoryEngine, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let payload: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    engine.restore_backup(payload)?;
    println!("Restored {} items", engine.get_statistics().total_items);
    Ok(())
}

fn cmd_clear(engine: &mut InventoryEngine, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("Refusing to delete everything without --yes");
    }
    engine.clear_all_data()?;
    println!("All data cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use closet_core::store::{MemorySlots, SlotStorage, STAGED_KEY};

    #[test]
    fn test_parse_slider_accepts_both_key_styles() {
        assert_eq!(parse_slider("colorSlider=210").unwrap(), (NumericField::ColorHue, 210.0));
        assert_eq!(parse_slider("fitValue = 30").unwrap(), (NumericField::FitValue, 30.0));
        assert!(parse_slider("name=3").is_err());
        assert!(parse_slider("price").is_err());
        assert!(parse_slider("price=lots").is_err());
    }

    #[test]
    fn test_item_args_become_text_inputs() {
        let cli = Cli::parse_from(["closet", "add", "--name", "Tee", "--price", "30"]);
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        let input = args.into_input();
        assert_eq!(input.name.as_deref(), Some("Tee"));
        assert_eq!(input.price, Some(NumericInput::Text("30".to_string())));
        assert!(input.emotion.is_none());
    }

    #[test]
    fn test_stage_waits_for_merge() {
        let slots = MemorySlots::new();
        let stage = Cli::parse_from(["closet", "stage", "--name", "Kimono", "--slider", "emotionSlider=90"]);
        run(AppStore::new(slots.clone()), stage.command, "memory").unwrap();
        assert!(slots.read_slot(STAGED_KEY).unwrap().is_some());

        let merge = Cli::parse_from(["closet", "merge"]);
        run(AppStore::new(slots.clone()), merge.command, "memory").unwrap();
        assert!(slots.read_slot(STAGED_KEY).unwrap().is_none());

        let items = InventoryEngine::load(AppStore::new(slots)).get_all_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].fields.name, "Kimono");
        assert_eq!(items[0].fields.emotion, 90.0);
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::parse_from(["closet", "list"]);
        match cli.command {
            Commands::List { sort, order, json } => {
                assert_eq!(sort, "createdAt");
                assert_eq!(order, SortOrder::Desc);
                assert!(!json);
            }
            _ => panic!("expected list"),
        }
    }
}
