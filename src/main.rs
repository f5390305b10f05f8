use clap::Parser;
use std::io::Read;

use rashell::{Executor, Shell};

#[derive(Parser)]
#[command(name = "rashell")]
#[command(about = "A POSIX-compatible interactive shell core")]
#[command(version)]
struct Cli {
    /// Execute the script from the command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Exit immediately if a command exits with non-zero status
    #[arg(short = 'e', long = "errexit")]
    errexit: bool,

    /// Treat unset variables as an error when expanding
    #[arg(short = 'u', long = "nounset")]
    nounset: bool,

    /// Print each command to stderr before it runs
    #[arg(short = 'x', long = "xtrace")]
    xtrace: bool,

    /// Set the shell's working directory before running the script
    #[arg(long = "cwd")]
    cwd: Option<String>,

    /// Positional parameters made available to the script as $1, $2, …
    #[arg(long = "args", num_args = 0.., value_delimiter = ' ')]
    script_args: Vec<String>,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("rashell: cannot read script file: {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("rashell: no script provided; use -c 'script', a script file, or pipe via stdin");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let mut shell = Shell::new("rashell");
    if let Some(cwd) = cli.cwd {
        shell.set_var("PWD", cwd);
    }
    if !cli.script_args.is_empty() {
        shell.positional_mut().params = cli.script_args;
    }
    shell.options.errexit = cli.errexit;
    shell.options.nounset = cli.nounset;
    shell.options.xtrace = cli.xtrace;

    let mut executor = Executor::new();
    let status = executor.execute(&script, &mut shell);
    std::process::exit(status);
}
