//! `trap` (spec.md §4.4): install/remove trap handlers; `trap -l` lists
//! signal names; `trap -p sig` prints the current action; an empty action
//! removes; `-` resets to default.

use nix::sys::signal::Signal;

use crate::builtins::BuiltinContext;
use crate::errors::ExecError;
use crate::trap::{install_os_default, install_os_handler, install_os_ignore, PseudoSignal, TrapAction};

fn parse_target(name: &str) -> Option<Result<Signal, PseudoSignal>> {
    if let Some(p) = PseudoSignal::parse(name) {
        return Some(Err(p));
    }
    let upper = name.to_ascii_uppercase();
    let with_prefix = if upper.starts_with("SIG") { upper } else { format!("SIG{}", upper) };
    if let Ok(n) = name.parse::<i32>() {
        return Signal::try_from(n).ok().map(Ok);
    }
    Signal::iterator().find(|s| s.as_str() == with_prefix).map(Ok)
}

pub fn trap(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.first().map(String::as_str) == Some("-l") {
        for s in Signal::iterator() {
            println!("{}", s.as_str());
        }
        return Ok(0);
    }

    if args.first().map(String::as_str) == Some("-p") {
        for name in &args[1..] {
            match parse_target(name) {
                Some(Ok(sig)) => print_action(name, ctx.shell.traps.signal_action(sig)),
                Some(Err(p)) => print_action(name, ctx.shell.traps.pseudo_action(p)),
                None => eprintln!("{}: trap: {}: invalid signal specification", ctx.shell.shell_name, name),
            }
        }
        return Ok(0);
    }

    if args.is_empty() {
        for (sig, action) in ctx.shell.traps.iter_signals() {
            if let TrapAction::Action(body) = action {
                println!("trap -- '{}' {}", body, sig.as_str());
            }
        }
        for (p, action) in ctx.shell.traps.iter_pseudo() {
            if let TrapAction::Action(body) = action {
                println!("trap -- '{}' {}", body, p.name());
            }
        }
        return Ok(0);
    }

    let action_str = &args[0];
    let action = match action_str.as_str() {
        "-" => TrapAction::Default,
        "" => TrapAction::Ignore,
        other => TrapAction::Action(other.to_string()),
    };

    for name in &args[1..] {
        match parse_target(name) {
            Some(Ok(sig)) => {
                ctx.shell.traps.set_signal(sig, action.clone());
                match &action {
                    TrapAction::Default => {
                        let _ = install_os_default(sig);
                    }
                    TrapAction::Ignore => {
                        let _ = install_os_ignore(sig);
                    }
                    TrapAction::Action(_) => {
                        let _ = install_os_handler(sig);
                    }
                }
            }
            Some(Err(p)) => ctx.shell.traps.set_pseudo(p, action.clone()),
            None => {
                eprintln!("{}: trap: {}: invalid signal specification", ctx.shell.shell_name, name);
                return Ok(1);
            }
        }
    }
    Ok(0)
}

fn print_action(name: &str, action: Option<&TrapAction>) {
    match action {
        Some(TrapAction::Action(body)) => println!("trap -- '{}' {}", body, name),
        Some(TrapAction::Ignore) => println!("trap -- '' {}", name),
        _ => {}
    }
}
