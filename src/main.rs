use clap::Parser;
use tracing::{debug, info, Level};

use tailrec::{fact, fib, mult, power, product};

#[derive(Parser)]
#[command(
    name = "tailrec",
    version,
    about = "Evaluate a few recurrences in constant stack space"
)]
struct Cli {
    /// Also run `mult(6, 123000)`, which is 123000 iterations deep
    #[arg(long)]
    stress: bool,

    /// Log more to stderr (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn max_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(max_level(cli.verbose))
        .init();

    if cli.stress {
        info!(x = 6, y = 123_000, "running repeated-addition depth test");
        let result = mult(6, 123_000);
        debug!(x = 6, y = 123_000, result, "mult");
        println!("6 * 123000 = {}", result);
    }

    let result = power(3, 10);
    debug!(x = 3, y = 10, result, "power");
    println!("3 ^ 10 = {}", result);

    let result = product(8, 15);
    debug!(x = 8, y = 15, result, "product");
    println!("8 * 9 * ... * 15 = {}", result);

    let result = fact(10);
    debug!(n = 10, result, "fact");
    println!("10! = {}", result);

    let result = fib(50);
    debug!(n = 50, result, "fib");
    println!("50th Fibonacci number is {}", result);
}
