//! `set`/`shopt` (spec.md §3 `Shell` options, §4.4 "other built-ins").
//! Grounded on the teacher's `src/interpreter/builtins/set_cmd.rs` and
//! `shopt_cmd.rs` option tables, narrowed to the options
//! `ShellOptions`/`ShoptOptions` (`src/shell.rs`) actually carry.

use crate::builtins::BuiltinContext;
use crate::errors::ExecError;
use crate::shell::{Shell, ShellOptions, ShoptOptions};

fn set_option(options: &mut ShellOptions, name: &str, value: bool) -> bool {
    match name {
        "errexit" => options.errexit = value,
        "errtrace" => options.errtrace = value,
        "pipefail" => options.pipefail = value,
        "xtrace" => options.xtrace = value,
        "noexec" => options.noexec = value,
        "nounset" => options.nounset = value,
        "noclobber" => options.noclobber = value,
        "noglob" => options.noglob = value,
        "verbose" => options.verbose = value,
        "posix" => options.posix = value,
        "allexport" => options.allexport = value,
        "monitor" => options.monitor = value,
        _ => return false,
    }
    true
}

fn short_flag(c: char) -> Option<&'static str> {
    match c {
        'e' => Some("errexit"),
        'u' => Some("nounset"),
        'x' => Some("xtrace"),
        'v' => Some("verbose"),
        'f' => Some("noglob"),
        'C' => Some("noclobber"),
        'a' => Some("allexport"),
        'n' => Some("noexec"),
        'm' => Some("monitor"),
        'T' | 'E' | 'b' | 'h' | 'B' | 'H' | 'P' | 'p' => Some(""),
        _ => None,
    }
}

/// `set [-eux] [+eux] [-o name] [+o name] [--] [args…]`. Positional
/// arguments (after `--` or when no option flags are given) replace `$1…`
/// on the current frame (spec.md's `PositionalParams`).
pub fn set_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let shell = &mut *ctx.shell;
    if args.is_empty() {
        let mut names: Vec<&String> = shell.env.keys().collect();
        names.sort();
        for name in names {
            println!("{}={}", name, shell.env[name]);
        }
        return Ok(0);
    }

    let mut i = 0;
    let mut positional_start = None;
    while i < args.len() {
        let arg = &args[i];
        if arg == "--" {
            positional_start = Some(i + 1);
            break;
        }
        if let Some(rest) = arg.strip_prefix("-o") {
            apply_o(shell, if rest.is_empty() { args.get(i + 1).map(|s| { i += 1; s.as_str() }) } else { Some(rest) }, true);
        } else if let Some(rest) = arg.strip_prefix("+o") {
            apply_o(shell, if rest.is_empty() { args.get(i + 1).map(|s| { i += 1; s.as_str() }) } else { Some(rest) }, false);
        } else if let Some(flags) = arg.strip_prefix('-') {
            if flags.is_empty() {
                positional_start = Some(i + 1);
                break;
            }
            for c in flags.chars() {
                if let Some(name) = short_flag(c) {
                    set_option(&mut shell.options, name, true);
                }
            }
        } else if let Some(flags) = arg.strip_prefix('+') {
            for c in flags.chars() {
                if let Some(name) = short_flag(c) {
                    set_option(&mut shell.options, name, false);
                }
            }
        } else {
            positional_start = Some(i);
            break;
        }
        i += 1;
    }

    if let Some(start) = positional_start {
        shell.positional_mut().params = args[start..].to_vec();
    }
    Ok(0)
}

fn apply_o(shell: &mut Shell, name: Option<&str>, value: bool) {
    let Some(name) = name else { return };
    if name.is_empty() {
        print_o_table(shell);
        return;
    }
    set_option(&mut shell.options, name, value);
}

fn print_o_table(shell: &Shell) {
    for name in [
        "allexport", "errexit", "errtrace", "noclobber", "noexec", "noglob",
        "nounset", "pipefail", "posix", "verbose", "xtrace", "monitor",
    ] {
        let value = match name {
            "allexport" => shell.options.allexport,
            "errexit" => shell.options.errexit,
            "errtrace" => shell.options.errtrace,
            "noclobber" => shell.options.noclobber,
            "noexec" => shell.options.noexec,
            "noglob" => shell.options.noglob,
            "nounset" => shell.options.nounset,
            "pipefail" => shell.options.pipefail,
            "posix" => shell.options.posix,
            "verbose" => shell.options.verbose,
            "xtrace" => shell.options.xtrace,
            "monitor" => shell.options.monitor,
            _ => false,
        };
        println!("{:<15}{}", name, if value { "on" } else { "off" });
    }
}

fn shopt_names() -> &'static [&'static str] {
    &[
        "extglob", "dotglob", "nullglob", "failglob", "globstar",
        "nocaseglob", "nocasematch", "expand_aliases", "lastpipe", "xpg_echo",
    ]
}

fn get_shopt(opts: &ShoptOptions, name: &str) -> Option<bool> {
    Some(match name {
        "extglob" => opts.extglob,
        "dotglob" => opts.dotglob,
        "nullglob" => opts.nullglob,
        "failglob" => opts.failglob,
        "globstar" => opts.globstar,
        "nocaseglob" => opts.nocaseglob,
        "nocasematch" => opts.nocasematch,
        "expand_aliases" => opts.expand_aliases,
        "lastpipe" => opts.lastpipe,
        "xpg_echo" => opts.xpg_echo,
        _ => return None,
    })
}

fn set_shopt(opts: &mut ShoptOptions, name: &str, value: bool) -> bool {
    match name {
        "extglob" => opts.extglob = value,
        "dotglob" => opts.dotglob = value,
        "nullglob" => opts.nullglob = value,
        "failglob" => opts.failglob = value,
        "globstar" => opts.globstar = value,
        "nocaseglob" => opts.nocaseglob = value,
        "nocasematch" => opts.nocasematch = value,
        "expand_aliases" => opts.expand_aliases = value,
        "lastpipe" => opts.lastpipe = value,
        "xpg_echo" => opts.xpg_echo = value,
        _ => return false,
    }
    true
}

/// `shopt [-s|-u] [name…]`: `-s` sets, `-u` unsets, no flag lists current
/// state (or a single name's state with `-q` for the quiet/exit-status
/// form).
pub fn shopt_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let shell = &mut *ctx.shell;
    let mut mode = None; // Some(true) = -s, Some(false) = -u
    let mut quiet = false;
    let mut names = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-s" => mode = Some(true),
            "-u" => mode = Some(false),
            "-q" => quiet = true,
            "-p" => {}
            _ => names.push(arg.clone()),
        }
    }

    if names.is_empty() {
        if !quiet {
            for name in shopt_names() {
                let v = get_shopt(&shell.shopt, name).unwrap_or(false);
                println!("{}\t{}", name, if v { "on" } else { "off" });
            }
        }
        return Ok(0);
    }

    let mut status = 0;
    for name in &names {
        match mode {
            Some(value) => {
                if !set_shopt(&mut shell.shopt, name, value) {
                    status = 1;
                }
            }
            None => match get_shopt(&shell.shopt, name) {
                Some(v) => {
                    if !quiet {
                        println!("{}\t{}", name, if v { "on" } else { "off" });
                    }
                    if !v {
                        status = 1;
                    }
                }
                None => status = 1,
            },
        }
    }
    Ok(status)
}
