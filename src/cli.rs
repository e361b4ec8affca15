use std::cmp;
use std::error::Error;
use std::path::PathBuf;

use atty::Stream;
use clap::{Parser, Subcommand};
use maximus_rs::{
    CategoryType, EmbeddedLoader, JsonDirLoader, LibraryConfig, Quote, QueryScope, QuoteLibrary,
    RelatedEntity, avatar_url, slugify, today, unslugify,
};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "maximus-rs", about = "Search and browse the Maximus quote collection", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Log lookups and partition loads to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read `quotes/<type>.json` and `extras.json` from this directory
    /// instead of the compiled-in dataset.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a query, slug or `a|b` term list to quotes.
    Search {
        query: String,
        /// `search` for the global search, or a category type.
        #[arg(short = 't', long = "type", default_value = "search")]
        scope: QueryScope,
        /// Maximum number of quotes to print.
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Highest normalized edit distance that still matches.
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Show one quote with its siblings and the source bio.
    Show {
        #[arg(short = 't', long = "type")]
        category: CategoryType,
        /// Source slug, e.g. `steve-jobs`.
        source: String,
        /// Quote slug, or the quote text itself.
        quote: String,
    },
    /// List related authors (for a topic) or topics (for an author, movie,
    /// book or show).
    Related {
        #[arg(short = 't', long = "type")]
        category: CategoryType,
        /// Source name or slug.
        name: String,
    },
    /// List the sources of a category.
    Directory {
        #[arg(short = 't', long = "type")]
        category: CategoryType,
        /// Only sources whose slug starts with this prefix.
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Suggest source names across every category.
    Suggest {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the quote of the day.
    Daily {
        /// Day number to use instead of today.
        #[arg(long)]
        day: Option<u64>,
    },
    /// Resolve saved quote ids.
    Favorites {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Convert text to a slug, or a slug back to a label.
    Slug {
        #[arg(required = true)]
        text: Vec<String>,
        /// Turn a slug into a display label instead.
        #[arg(long)]
        reverse: bool,
    },
    /// Serve the JSON API.
    #[cfg(feature = "web")]
    Serve {
        /// Socket address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Public base URL used in absolute links.
        #[arg(long)]
        base_url: Option<String>,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = LibraryConfig::default();
    if let Command::Search { threshold: Some(threshold), .. } = &cli.command {
        if !(0.0..=1.0).contains(threshold) {
            return Err(format!("Threshold must be between 0 and 1, got {threshold}").into());
        }
        config.search.threshold = *threshold;
    }
    let library = match &cli.data_dir {
        Some(dir) => QuoteLibrary::with_config(JsonDirLoader::new(dir), config),
        None => QuoteLibrary::with_config(EmbeddedLoader, config),
    };

    match cli.command {
        Command::Search { query, scope, limit, .. } => {
            handle_search(&library, &query, scope, limit, cli.json)
        }
        Command::Show { category, source, quote } => {
            handle_show(&library, category, &source, &quote, cli.json)
        }
        Command::Related { category, name } => handle_related(&library, category, &name, cli.json),
        Command::Directory { category, prefix } => {
            handle_directory(&library, category, prefix.as_deref(), cli.json)
        }
        Command::Suggest { query, limit } => handle_suggest(&library, &query, limit, cli.json),
        Command::Daily { day } => handle_daily(&library, day.unwrap_or_else(today), cli.json),
        Command::Favorites { ids } => handle_favorites(&library, &ids, cli.json),
        Command::Slug { text, reverse } => handle_slug(&text.join(" "), reverse, cli.json),
        #[cfg(feature = "web")]
        Command::Serve { addr, base_url } => {
            let config = maximus_rs::web::WebConfig {
                addr,
                base_url: base_url.unwrap_or_else(|| format!("http://{addr}")),
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(maximus_rs::web::serve(config, library))?;
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("maximus_rs=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_search(
    library: &QuoteLibrary,
    query: &str,
    scope: QueryScope,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if query.trim().is_empty() {
        return Err("Search query cannot be empty".into());
    }
    let limit = cmp::max(1, limit);
    let quotes = library.resolve_query(query, scope)?;
    let total = quotes.len();
    let shown = &quotes[..total.min(limit)];

    if as_json {
        let payload = json!({
            "query": query,
            "type": scope.to_string(),
            "total": total,
            "results": shown,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        if shown.is_empty() {
            println!("No quotes matched \"{query}\" in {scope}.");
            return Ok(());
        }
        println!("{total} quote(s) for \"{query}\" in {scope}:");
        print_quotes(shown);
        if total > shown.len() {
            println!("… {} more (raise --limit to see them)", total - shown.len());
        }
    }
    Ok(())
}

fn handle_show(
    library: &QuoteLibrary,
    category: CategoryType,
    source: &str,
    quote: &str,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let source_slug = slugify(source);
    let quote_slug = slugify(quote);
    let detail = library.resolve_detail(category, &source_slug, &quote_slug)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }
    let Some(found) = &detail.quote else {
        return Err(format!("No quote {quote_slug:?} under {category}/{source_slug}").into());
    };
    println!("\u{201c}{}\u{201d}", found.text);
    println!("  \u{2014} {}", found.author);
    println!("Source: {} ({category})", found.category);
    println!("ID: {}", found.id);
    if category == CategoryType::Author {
        println!("Avatar: {}", avatar_url(&found.category));
    }
    if let Some(bio) = &detail.bio {
        render_markdown_block("About", bio);
    }
    if !detail.related.is_empty() {
        println!("\nMore from {}:", found.category);
        print_quotes(&detail.related);
    }
    Ok(())
}

fn handle_related(
    library: &QuoteLibrary,
    category: CategoryType,
    name: &str,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let scope = QueryScope::Category(category);
    let map = library.store().partition(category)?;
    let key = maximus_rs::find_key_by_slug(map, name)
        .or_else(|| maximus_rs::find_key_by_slug(map, &slugify(name)))
        .unwrap_or(name);
    let quotes = library.resolve_query(key, scope)?;
    let related = library.related_entities(scope, key, &quotes)?;

    if as_json {
        let payload = json!({
            "type": category,
            "name": key,
            "related": related,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_related(key, &related);
    }
    Ok(())
}

fn handle_directory(
    library: &QuoteLibrary,
    category: CategoryType,
    prefix: Option<&str>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let prefix = prefix.map(slugify);
    let entries = library.directory(category, prefix.as_deref())?;

    if as_json {
        let payload = json!({
            "type": category,
            "prefix": prefix,
            "results": entries,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No {category} sources found.");
        return Ok(());
    }
    let width = entries
        .iter()
        .map(|entry| entry.name.chars().count())
        .max()
        .unwrap_or(4)
        .max("NAME".len());
    let mut letter = None;
    for entry in &entries {
        if letter != Some(entry.letter) {
            letter = Some(entry.letter);
            println!("\n[{}]", entry.letter);
        }
        println!("{:<width$}  {:>5}  {}", entry.name, entry.count, entry.slug, width = width);
    }
    Ok(())
}

fn handle_suggest(
    library: &QuoteLibrary,
    query: &str,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let suggestions = library.autocomplete(query, Some(cmp::max(1, limit)))?;

    if as_json {
        let payload = json!({ "query": query, "results": suggestions });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    if suggestions.is_empty() {
        println!("No suggestions for \"{query}\".");
        return Ok(());
    }
    let width = suggestions
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(4)
        .max("NAME".len());
    println!("{:<width$}  {:<8}  {:>5}  {}", "NAME", "TYPE", "COUNT", "LINK", width = width);
    println!("{:-<width$}  {:-<8}  {:->5}  {}", "", "", "", "----", width = width);
    for s in &suggestions {
        println!(
            "{:<width$}  {:<8}  {:>5}  /{}/{}",
            s.name,
            s.category,
            s.count,
            s.category,
            s.slug,
            width = width
        );
    }
    Ok(())
}

fn handle_daily(library: &QuoteLibrary, day: u64, as_json: bool) -> Result<(), Box<dyn Error>> {
    let quote = library
        .daily_quote(day)?
        .ok_or("The daily quote pool is empty")?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&quote)?);
    } else {
        println!("Quote of the day #{day}:");
        print_quotes(std::slice::from_ref(&quote));
    }
    Ok(())
}

fn handle_favorites(library: &QuoteLibrary, ids: &[String], as_json: bool) -> Result<(), Box<dyn Error>> {
    let quotes = library.quotes_by_ids(ids)?;
    if as_json {
        let payload = json!({ "requested": ids.len(), "results": quotes });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    if quotes.is_empty() {
        println!("None of the {} id(s) resolved.", ids.len());
        return Ok(());
    }
    print_quotes(&quotes);
    let stale = ids.len().saturating_sub(quotes.len());
    if stale > 0 {
        println!("({stale} id(s) skipped)");
    }
    Ok(())
}

fn handle_slug(text: &str, reverse: bool, as_json: bool) -> Result<(), Box<dyn Error>> {
    let output = if reverse { unslugify(text) } else { slugify(text) };
    if as_json {
        let payload = json!({ "input": text, "output": output, "reverse": reverse });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("{output}");
    }
    Ok(())
}

fn print_quotes(quotes: &[Quote]) {
    let width = quotes
        .iter()
        .map(|quote| quote.id.len())
        .max()
        .unwrap_or(2)
        .max("ID".len());
    for quote in quotes {
        println!(
            "{:<width$}  \u{201c}{}\u{201d} \u{2014} {}",
            quote.id,
            truncate(&quote.text, 100),
            quote.author,
            width = width
        );
    }
}

fn print_related(name: &str, rows: &[RelatedEntity]) {
    if rows.is_empty() {
        println!("Nothing related to \"{name}\".");
        return;
    }
    let width = rows
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(4)
        .max("NAME".len());
    println!("Related to \"{name}\":");
    println!("{:<width$}  {:<6}  {:>5}  {}", "NAME", "TYPE", "COUNT", "SLUG", width = width);
    println!("{:-<width$}  {:-<6}  {:->5}  {}", "", "", "", "----", width = width);
    for row in rows {
        println!(
            "{:<width$}  {:<6}  {:>5}  {}",
            row.name,
            row.category,
            row.count,
            row.slug,
            width = width
        );
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push('…');
    cut
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
