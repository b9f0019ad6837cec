use std::env;
use std::process;

use sprig_core::error::ERROR_TAG;
use sprig_core::Runtime;
use tracing_subscriber::EnvFilter;

use sprig_lang::cli::USAGE;
use sprig_lang::{parse_args, repl, run_input, Command};

fn help() -> ! {
    println!("{}", USAGE);
    println!();
    println!("Options:");
    println!("  --repl                Start the REPL, or enter it after running a script in the same context");
    println!("  -e CODE               Evaluate CODE and print the result");
    println!("  --max-depth N         Limit nested function and macro applications (SPRIG_MAX_DEPTH)");
    println!("  --no-builtins         Start without the core built-ins (SPRIG_NO_BUILTINS)");
    println!("  --version             Show version");
    println!("  -h, --help            Show this help");
    println!();
    println!("Logging is controlled by SPRIG_LOG (default: warn).");
    process::exit(0);
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("SPRIG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = match parse_args(env::args().skip(1)) {
        Ok(Command::Run(cli)) => cli,
        Ok(Command::Help) => help(),
        Ok(Command::Version) => {
            println!("sprig {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Err(msg) => {
            eprintln!("{} {}", ERROR_TAG, msg);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    let runtime = Runtime::shared(cli.eval_options());
    match run_input(&runtime, &cli) {
        Ok(Some(value)) => {
            if cli.code.is_some() {
                println!("{}", value);
            }
        }
        Ok(None) => {}
        Err(err) => {
            repl::print_formatted_error(&err);
            process::exit(1);
        }
    }

    if cli.wants_repl() {
        repl::interactive_repl(runtime);
    }
}
