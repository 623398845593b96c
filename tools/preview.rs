/// Preview: interactive composition shell for checking definitions.
///
/// Usage: preview [--config <forge.ron>] [--custom <layer.json>] [--seed <n>]
///
/// Commands:
///   traps                              list trap keys
///   caches                             list cache keys
///   trap <key> [location] [trigger#]   compose a trap
///   cache <key>                        compose a cache
///   triggers <category>                show a category's trigger list
///   classify <name>                    classify a category string
///   hints <key> [location]             draw a hint set for a trap or cache
///   seed <n>                           reseed the engine
///   help                               list commands
///   quit                               exit

use std::io::{self, BufRead, Write};
use trap_forge::core::pipeline::TrapForge;
use trap_forge::schema::definition::DefinitionKind;
use trap_forge::schema::hint::Location;
use trap_forge::schema::result::{CacheRequest, ComposedResult, TrapRequest};

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let mut builder = TrapForge::builder();
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                builder = builder.config_path(&args[i]);
            }
            "--custom" if i + 1 < args.len() => {
                i += 1;
                builder = builder.custom_layer_path(&args[i]);
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().ok();
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }

    let mut forge = match builder.build() {
        Ok(forge) => forge,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };
    let default_location = forge.config().default_location;

    println!(
        "Loaded {} traps and {} caches",
        forge.store().traps().len(),
        forge.store().caches().len()
    );
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "traps" => {
                for (key, trap) in forge.store().traps() {
                    println!("  {:<20} {} [{}]", key, trap.name, trap.category);
                }
            }
            "caches" => {
                for (key, cache) in forge.store().caches() {
                    println!("  {:<20} {} [{}]", key, cache.name, cache.category);
                }
            }
            "trap" => {
                if parts.len() < 2 {
                    println!("Usage: trap <key> [floor|wall|ceiling|other] [trigger#]");
                    continue;
                }
                let location = match parse_location(parts.get(2).copied(), default_location) {
                    Some(location) => location,
                    None => continue,
                };
                let mut request = TrapRequest::new(parts[1]).location(location);
                if let Some(index) = parts.get(3) {
                    let category = match forge.store().trap(parts[1]) {
                        Ok(trap) => trap.category.clone(),
                        Err(e) => {
                            println!("ERROR: {}", e);
                            continue;
                        }
                    };
                    let triggers = forge.triggers_for(&category);
                    match index.parse::<usize>().ok().and_then(|n| triggers.get(n)) {
                        Some(trigger) => request = request.trigger(trigger.clone()),
                        None => {
                            println!("No trigger #{} for '{}' ({} available)", index, category, triggers.len());
                            continue;
                        }
                    }
                }
                match forge.compose_trap(&request) {
                    Ok(result) => print_result(&result),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "cache" => {
                if parts.len() < 2 {
                    println!("Usage: cache <key>");
                    continue;
                }
                match forge.compose_cache(&CacheRequest::new(parts[1])) {
                    Ok(result) => print_result(&result),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "triggers" => {
                if parts.len() < 2 {
                    println!("Usage: triggers <category>");
                    println!("  Categories: {}", forge.store().category_keys().join(", "));
                    continue;
                }
                let category = parts[1..].join(" ");
                let classification = forge.classify(&category);
                println!("'{}' resolves to '{}'", category, classification.key());
                for (n, trigger) in forge.triggers_for(&category).iter().enumerate() {
                    println!("  {}: {}", n, trigger);
                }
            }
            "classify" => {
                if parts.len() < 2 {
                    println!("Usage: classify <name>");
                    continue;
                }
                let name = parts[1..].join(" ");
                let classification = forge.classify(&name);
                if classification.is_subcategory() {
                    println!("primary: {}, subcategory: {}", classification.primary, classification.key());
                } else {
                    println!("primary: {}", classification.primary);
                }
            }
            "hints" => {
                if parts.len() < 2 {
                    println!("Usage: hints <key> [floor|wall|ceiling|other]");
                    continue;
                }
                let location = match parse_location(parts.get(2).copied(), default_location) {
                    Some(location) => location,
                    None => continue,
                };
                let kind = if forge.store().trap(parts[1]).is_ok() {
                    DefinitionKind::Trap
                } else {
                    DefinitionKind::Cache
                };
                match forge.select_hints(kind, parts[1], location) {
                    Ok(hints) if hints.is_empty() => println!("No hints at {}.", location),
                    Ok(hints) => {
                        for (tier, text) in hints.present() {
                            println!("  {:>4}: {}", tier.label(), text);
                        }
                    }
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Usage: seed <n>");
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => {
                        forge.reseed(s);
                        println!("Seed set to {}", s);
                    }
                    Err(_) => println!("Invalid seed: {}", parts[1]),
                }
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for commands.", cmd);
            }
        }
    }
}

fn parse_location(arg: Option<&str>, default: Location) -> Option<Location> {
    match arg {
        None => Some(default),
        Some(s) => {
            let location = Location::from_key(s);
            if location.is_none() {
                println!("Unknown location: {} (floor, wall, ceiling, other)", s);
            }
            location
        }
    }
}

fn print_result(result: &ComposedResult) {
    println!("\n--- {} ({}) ---", result.name, result.kind);
    println!("{}", result.flavor);
    if let (Some(save), Some(dc)) = (result.save_type, result.hidden_dc) {
        println!("  save: {} DC {}", save, dc);
    }
    if let Some(formula) = &result.damage_formula {
        println!(
            "  damage: {} {}",
            formula,
            result.damage_type.as_deref().unwrap_or("")
        );
    }
    if let Some(text) = &result.fail_text {
        println!("  fail: {}", text);
    }
    if let Some(text) = &result.success_text {
        println!("  success: {}", text);
    }
    match result.macro_argument() {
        Ok(argument) => println!("  macro: {}", argument),
        Err(e) => println!("  macro: unavailable ({})", e),
    }
    println!("--- End ---\n");
}

fn print_usage() {
    println!("Usage: preview [--config <forge.ron>] [--custom <layer.json>] [--seed <n>]");
}

fn print_help() {
    println!("Commands:");
    println!("  traps                              list trap keys");
    println!("  caches                             list cache keys");
    println!("  trap <key> [location] [trigger#]   compose a trap");
    println!("  cache <key>                        compose a cache");
    println!("  triggers <category>                show a category's trigger list");
    println!("  classify <name>                    classify a category string");
    println!("  hints <key> [location]             draw a hint set");
    println!("  seed <n>                           reseed the engine");
    println!("  help                               this list");
    println!("  quit                               exit");
}
