use anyhow::Result;
use clap::{Parser, Subcommand};
use trapcycle_core::{Fraction, TimeSpan};
use trapcycle_mini::{evaluate, evaluate_seeded, parse};

#[derive(Parser)]
#[command(name = "trapcycle-mini")]
#[command(about = "Mini notation parser and evaluator for trapcycle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a mini notation pattern
    Validate {
        /// Pattern to validate
        pattern: String,
    },
    /// Generate AST for a pattern
    Ast {
        /// Pattern to parse
        pattern: String,

        /// Output format (json or debug)
        #[arg(short, long, default_value = "debug")]
        output_format: String,
    },
    /// Evaluate a pattern and show events
    Eval {
        /// Pattern to evaluate
        pattern: String,

        /// Start cycle (default: 0)
        #[arg(short, long, default_value = "0")]
        from: f64,

        /// Duration in cycles (default: 1)
        #[arg(short, long, default_value = "1")]
        duration: f64,

        /// Seed for `?` so repeated runs agree
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output format (json or debug)
        #[arg(long, default_value = "debug")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { pattern } => match parse(&pattern) {
            Ok(_) => {
                println!("✓ Pattern is valid");
                Ok(())
            }
            Err(e) => fail(&pattern, e),
        },
        Commands::Ast {
            pattern,
            output_format,
        } => match parse(&pattern) {
            Ok(ast) => {
                match output_format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&ast)?),
                    _ => println!("{:#?}", ast),
                }
                Ok(())
            }
            Err(e) => fail(&pattern, e),
        },
        Commands::Eval {
            pattern,
            from,
            duration,
            seed,
            format,
        } => {
            let ast = match parse(&pattern) {
                Ok(ast) => ast,
                Err(e) => return fail(&pattern, e),
            };
            let pat = match seed {
                Some(seed) => evaluate_seeded(&ast, seed),
                None => evaluate(&ast),
            };

            let begin = Fraction::from_float(from);
            let end = Fraction::from_float(from + duration);
            let haps = pat.query(TimeSpan::new(begin, end));

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&haps)?),
                _ => {
                    println!("Events: {}", haps.len());
                    for (i, hap) in haps.iter().enumerate() {
                        println!("  [{}] {} | {}", i, hap.whole_or_part(), hap.value);
                    }
                }
            }
            Ok(())
        }
    }
}

fn fail(source: &str, e: trapcycle_mini::ParseError) -> Result<()> {
    eprintln!("✗ Parse error: {}", e);
    let span = e.span();
    eprintln!("  {}", source);
    eprintln!("  {}{}", " ".repeat(span.start), "^".repeat(span.len().max(1)));
    std::process::exit(1);
}
