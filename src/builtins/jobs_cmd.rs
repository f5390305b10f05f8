//! `jobs`/`fg`/`bg`/`wait`/`disown`/`kill` (spec.md §4.4 "Background /
//! foreground built-ins … operate on the job table (see §5)"). Grounded
//! on `examples/magicant-yash-rs/yash-env/src/job.rs` for the
//! id/pid/status vocabulary, adapted to this crate's `JobTable`
//! (`src/job.rs`).

use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::builtins::BuiltinContext;
use crate::errors::ExecError;
use crate::job::JobState;

/// Resolves a `%N`/bare-number/`$!`-style job spec to a job id.
fn resolve_job_id(ctx: &BuiltinContext, spec: &str) -> Option<u32> {
    let spec = spec.strip_prefix('%').unwrap_or(spec);
    if spec.is_empty() || spec == "%" || spec == "+" {
        return ctx.shell.jobs.current().map(|j| j.id);
    }
    spec.parse().ok()
}

pub fn jobs(ctx: &mut BuiltinContext, _args: &[String]) -> Result<i32, ExecError> {
    ctx.shell.jobs.poll();
    for job in ctx.shell.jobs.iter() {
        if job.disowned {
            continue;
        }
        println!("[{}]  {}\t{}", job.id, job.status, job.command_text);
    }
    Ok(0)
}

pub fn fg(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let Some(id) = args.first().and_then(|s| resolve_job_id(ctx, s)).or_else(|| ctx.shell.jobs.current().map(|j| j.id)) else {
        eprintln!("{}: fg: no current job", ctx.shell.shell_name);
        return Ok(1);
    };
    let Some(job) = ctx.shell.jobs.get(id) else {
        eprintln!("{}: fg: {}: no such job", ctx.shell.shell_name, id);
        return Ok(1);
    };
    let pid = job.pid;
    println!("{}", job.command_text);
    let _ = signal::kill(pid, Signal::SIGCONT);
    let status = match waitpid(pid, None) {
        Ok(ws) => JobState::from_wait_status(ws),
        Err(_) => JobState::Done(0),
    };
    if let Some(job) = ctx.shell.jobs.get_mut(id) {
        job.status = status;
    }
    Ok(status.exit_code())
}

pub fn bg(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    let Some(id) = args.first().and_then(|s| resolve_job_id(ctx, s)).or_else(|| ctx.shell.jobs.current().map(|j| j.id)) else {
        eprintln!("{}: bg: no current job", ctx.shell.shell_name);
        return Ok(1);
    };
    let Some(job) = ctx.shell.jobs.get_mut(id) else {
        eprintln!("{}: bg: {}: no such job", ctx.shell.shell_name, id);
        return Ok(1);
    };
    job.status = JobState::Running;
    let pid = job.pid;
    println!("[{}] {}", id, job.command_text);
    let _ = signal::kill(pid, Signal::SIGCONT);
    Ok(0)
}

/// `wait [pid|%job…]`: blocks until the named jobs (or, with no operand,
/// every job) finish, returning the last-waited status — spec.md §5's
/// "synchronously via `wait`" suspension point.
pub fn wait_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.is_empty() {
        let pids: Vec<Pid> = ctx.shell.jobs.iter().filter(|j| !j.status.is_finished()).map(|j| j.pid).collect();
        let mut last = 0;
        for pid in pids {
            if let Ok(ws) = waitpid(pid, None) {
                last = JobState::from_wait_status(ws).exit_code();
            }
            if let Some(job) = ctx.shell.jobs.find_by_pid_mut(pid) {
                job.status = JobState::Done(last);
            }
        }
        return Ok(last);
    }

    let mut last = 0;
    for spec in args {
        let Some(id) = resolve_job_id(ctx, spec) else { continue };
        let Some(job) = ctx.shell.jobs.get(id) else { continue };
        let pid = job.pid;
        if job.status.is_finished() {
            last = job.status.exit_code();
            continue;
        }
        last = match waitpid(pid, None) {
            Ok(ws) => JobState::from_wait_status(ws).exit_code(),
            Err(_) => 0,
        };
        if let Some(job) = ctx.shell.jobs.get_mut(id) {
            job.status = JobState::Done(last);
        }
    }
    Ok(last)
}

pub fn disown(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.is_empty() {
        if let Some(id) = ctx.shell.jobs.current().map(|j| j.id) {
            ctx.shell.jobs.disown(id);
        }
        return Ok(0);
    }
    for spec in args {
        if let Some(id) = resolve_job_id(ctx, spec) {
            ctx.shell.jobs.disown(id);
        }
    }
    Ok(0)
}

fn parse_signal(spec: &str) -> Option<Signal> {
    let name = spec.trim_start_matches('-');
    if let Ok(n) = name.parse::<i32>() {
        return Signal::try_from(n).ok();
    }
    let upper = name.to_ascii_uppercase();
    let with_prefix = if upper.starts_with("SIG") { upper } else { format!("SIG{}", upper) };
    Signal::iterator().find(|s| s.as_str() == with_prefix)
}

/// `kill [-SIG] pid|%job…`.
pub fn kill_cmd(ctx: &mut BuiltinContext, args: &[String]) -> Result<i32, ExecError> {
    if args.first().map(String::as_str) == Some("-l") {
        for s in Signal::iterator() {
            println!("{}", s.as_str());
        }
        return Ok(0);
    }

    let mut sig = Signal::SIGTERM;
    let mut rest = args;
    if let Some(first) = args.first() {
        if first.starts_with('-') {
            match parse_signal(first) {
                Some(s) => {
                    sig = s;
                    rest = &args[1..];
                }
                None => {
                    eprintln!("{}: kill: {}: invalid signal specification", ctx.shell.shell_name, first);
                    return Ok(1);
                }
            }
        }
    }

    let mut status = 0;
    for target in rest {
        let pid = if let Some(id) = target.strip_prefix('%').and_then(|s| s.parse::<u32>().ok()) {
            ctx.shell.jobs.get(id).map(|j| j.pid)
        } else {
            target.parse::<i32>().ok().map(Pid::from_raw)
        };
        match pid {
            Some(pid) => {
                if signal::kill(pid, sig).is_err() {
                    status = 1;
                }
            }
            None => {
                eprintln!("{}: kill: {}: arguments must be process or job IDs", ctx.shell.shell_name, target);
                status = 1;
            }
        }
    }
    Ok(status)
}
