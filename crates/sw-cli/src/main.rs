//! SafeWeb CLI
//!
//! CLI tool for checking domains against the SafeWeb registry and for
//! hosting the message router outside the browser.

mod registry;
mod serve;

use std::io;
use std::path::Path;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use sw_core::{ClassificationResult, EngineConfig, Router};

#[derive(Parser)]
#[command(name = "sw-cli")]
#[command(about = "SafeWeb domain reputation checker and tools")]
struct Cli {
    /// Registry JSON file (defaults to the bundled registry)
    #[arg(long, global = true)]
    registry: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one or more hostnames
    Check {
        /// Hostnames to classify
        #[arg(required = true)]
        domains: Vec<String>,

        /// Print raw JSON responses
        #[arg(long)]
        json: bool,
    },

    /// Classify the hosts of http(s) URLs
    CheckUrl {
        /// URLs to classify
        #[arg(required = true)]
        urls: Vec<String>,

        /// Print raw JSON responses
        #[arg(long)]
        json: bool,
    },

    /// List or search known-safe sites
    Sites {
        /// Search by domain, name, category or tag
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show registry statistics
    Stats,

    /// Export the registry as JSON
    Export {
        /// Output file
        #[arg(short, long, default_value = "safeweb-database.json")]
        output: String,
    },

    /// Validate a registry file
    Validate {
        /// Registry file to validate
        #[arg(short, long)]
        input: String,
    },

    /// Serve JSON-lines requests from stdin
    Serve,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_env("RUST_LOG")
        .target(env_logger::Target::Stderr)
        .init();

    let registry_path = cli.registry.as_deref();
    let result = match cli.command {
        Commands::Check { domains, json } => cmd_check(registry_path, &domains, json),
        Commands::CheckUrl { urls, json } => cmd_check_url(registry_path, &urls, json),
        Commands::Sites { query } => cmd_sites(registry_path, query.as_deref()),
        Commands::Stats => cmd_stats(registry_path),
        Commands::Export { output } => cmd_export(registry_path, &output),
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Serve => cmd_serve(registry_path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn print_verdict(subject: &str, result: &ClassificationResult) {
    let detail = match (result.matched_record(), result.matched_pattern()) {
        (Some(record), _) => format!(" ({} / {})", record.name, record.category),
        (None, Some(pattern)) => format!(" (pattern {})", pattern),
        (None, None) => String::new(),
    };
    println!("{:<40} {:<9} {}{}", subject, result.status(), result.reason(), detail);
}

fn cmd_check(registry_path: Option<&str>, domains: &[String], json: bool) -> Result<(), String> {
    let router = registry::load_router(registry_path)?;

    for domain in domains {
        let result = router.check_domain(domain);
        if json {
            let text = serde_json::to_string(&result).map_err(|e| e.to_string())?;
            println!("{}", text);
        } else {
            print_verdict(domain, &result);
        }
    }

    Ok(())
}

fn cmd_check_url(registry_path: Option<&str>, urls: &[String], json: bool) -> Result<(), String> {
    let router = registry::load_router(registry_path)?;
    check_urls(&router, urls, json)
}

/// Classify every URL, reporting rejected ones on stderr. Fails when any URL
/// was rejected.
fn check_urls(router: &Router, urls: &[String], json: bool) -> Result<(), String> {
    let mut rejected = 0;

    for url in urls {
        match router.check_url(url) {
            Ok(result) if json => {
                let text = serde_json::to_string(&result).map_err(|e| e.to_string())?;
                println!("{}", text);
            }
            Ok(result) => print_verdict(url, &result),
            Err(e) => {
                eprintln!("{:<40} {}", url, e);
                rejected += 1;
            }
        }
    }

    if rejected > 0 {
        return Err(format!("{} of {} URLs could not be checked", rejected, urls.len()));
    }
    Ok(())
}

fn cmd_sites(registry_path: Option<&str>, query: Option<&str>) -> Result<(), String> {
    let router = registry::load_router(registry_path)?;
    let sites = router.classifier().registry();

    let rows: Vec<_> = match query {
        Some(query) => sites.search(query),
        None => sites.all().iter().map(|(d, r)| (d.as_str(), r)).collect(),
    };

    for (domain, record) in &rows {
        println!("{:<28} {:<22} {:<16} {}", domain, record.name, record.category, record.tags.join(", "));
    }
    println!();
    println!("{} of {} sites", rows.len(), sites.len());

    Ok(())
}

fn cmd_stats(registry_path: Option<&str>) -> Result<(), String> {
    let router = registry::load_router(registry_path)?;
    let stats = router.stats();
    let cache = router.cache_stats();

    println!("Registry:");
    println!("  Safe sites:  {}", stats.total_safe);
    println!("  Categories:  {}", stats.total_categories);
    println!("  Patterns:    {}", stats.total_patterns);
    println!("  Cache:       {} entries ({} hits, {} misses)", cache.entries, cache.hits, cache.misses);
    println!();

    println!("Categories:");
    for (category, count) in router.classifier().registry().categories() {
        println!("  {:<20} {}", category, count);
    }

    Ok(())
}

fn cmd_export(registry_path: Option<&str>, output: &str) -> Result<(), String> {
    let config = registry::load_config(registry_path)?;
    let classifier = config.build().map_err(|e| e.to_string())?;

    let snapshot = EngineConfig::from_classifier(&classifier, &config.version, &config.description);
    let text = snapshot.to_json_pretty().map_err(|e| e.to_string())?;
    registry::write_text(Path::new(output), &text)?;

    println!("Exported {} sites and {} patterns to '{}'", snapshot.sites.len(), snapshot.patterns.len(), output);
    Ok(())
}

fn cmd_validate(input: &str) -> Result<(), String> {
    let config = registry::load_config(Some(input))?;
    let classifier = config
        .build()
        .map_err(|e| format!("Invalid registry: {}", e))?;

    let registry = classifier.registry();
    println!("Registry '{}' is valid", input);
    println!("  Version:     {}", config.version);
    println!("  Sites:       {}", registry.len());
    println!("  Categories:  {}", registry.category_count());
    println!("  Patterns:    {}", classifier.patterns().len());

    let shadowed: Vec<&str> = registry
        .all()
        .keys()
        .filter(|domain| classifier.patterns().matches_any(domain).is_some())
        .map(String::as_str)
        .collect();
    if !shadowed.is_empty() {
        println!();
        println!("Warning: {} site(s) match a dangerous pattern and will classify as not-safe:", shadowed.len());
        for domain in shadowed {
            println!("  {}", domain);
        }
    }

    Ok(())
}

fn cmd_serve(registry_path: Option<&str>) -> Result<(), String> {
    let router: Router = registry::load_router(registry_path)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve::run_serve(&router, stdin.lock(), stdout.lock())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_check_urls_accepts_http_hosts() {
        let router = Router::bundled().unwrap();
        assert!(check_urls(&router, &urls(&["https://youtube.com/", "http://unknown.xyz"]), false).is_ok());
        assert_eq!(router.cache_stats().entries, 2);
    }

    #[test]
    fn test_check_urls_fails_on_unsupported_url() {
        let router = Router::bundled().unwrap();
        let err = check_urls(&router, &urls(&["https://youtube.com/", "chrome://extensions"]), true).unwrap_err();
        assert_eq!(err, "1 of 2 URLs could not be checked");
        assert_eq!(router.cache_stats().entries, 1);
    }
}
