//! The executor (spec.md §4.4): walks the optimized `ScriptNode` directly
//! (see `crate::chain`'s doc comment — the flattened `CommandChain` view is
//! diagnostic-only), forking for pipelines, background jobs, subshells, and
//! external commands via `nix`, the same fork/pipe/dup2/waitpid vocabulary
//! `examples/magicant-yash-rs`'s `yash-env/src/system/real.rs` wraps behind
//! its `System` trait.
//!
//! Control flow (`break`/`continue`/`return`/`exit`) unwinds as `ExecError`
//! rather than threaded flags, per `crate::errors`'s `ControlFlowError`
//! shape. `Executor` implements `expand::CommandRunner` (so `$(...)`/`<(...)`
//! can re-enter execution) and `builtins::Invoker` (so `eval`/`.`/`command`
//! can re-enter dispatch), closing the two trait seams those modules leave
//! open to avoid a circular module dependency.

use std::ffi::CString;
use std::os::fd::FromRawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{close, dup2, fork, pipe, ForkResult, Pid};

use crate::arena::{CommandMemoryPool, ExpansionMemoryPool, PipelineMemoryPool};
use crate::arith;
use crate::ast::types::*;
use crate::builtins::{BuiltinContext, BuiltinRegistry, Invoker};
use crate::errors::{BreakError, ContinueError, ExecError, ExitError, ShellError};
use crate::expand::{self, CommandRunner, DefaultSuggester, Suggester};
use crate::glob_match;
use crate::redirection::{self, ResolvedRedirection};
use crate::shell::{PositionalParams, Shell, ShellFunction};
use crate::trap::{self, PseudoSignal, TrapAction};

/// The executor (spec.md §4.4): built-in/external dispatch, pipeline and
/// background-job forking, redirection save/restore around compound
/// commands, and the control-flow unwind for loops/functions/`exit`.
pub struct Executor {
    builtins: BuiltinRegistry,
    suggester: Box<dyn Suggester>,
    command_pool: CommandMemoryPool,
    pipeline_pool: PipelineMemoryPool,
    expansion_pool: ExpansionMemoryPool,
    /// Re-entrancy guard: a trap body must not itself re-fire ERR/DEBUG.
    in_trap: bool,
    /// Depth counter suppressing `errexit` while evaluating the condition
    /// of `if`/`while`/`until` (bash exempts these from `set -e`).
    errexit_suppress: u32,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        let builtins = BuiltinRegistry::new();
        let candidates: Vec<String> = builtins.names().map(|s| s.to_string()).collect();
        Self {
            builtins,
            suggester: Box::new(DefaultSuggester { candidates }),
            command_pool: CommandMemoryPool::new(),
            pipeline_pool: PipelineMemoryPool::new(),
            expansion_pool: ExpansionMemoryPool::new(),
            in_trap: false,
            errexit_suppress: 0,
        }
    }

    // -----------------------------------------------------------------
    // External interfaces (spec.md §6)
    // -----------------------------------------------------------------

    /// Tokenizes, parses, optimizes, and runs `source` in `shell`.
    pub fn execute(&mut self, source: &str, shell: &mut Shell) -> i32 {
        self.command_pool.reset();
        self.pipeline_pool.reset();
        self.expansion_pool.reset();
        let result = crate::parser::parse(source)
            .map_err(|e| ExecError::from(ShellError::Other(e.to_string())))
            .and_then(|mut script| {
                crate::ast::optimizer::optimize(&mut script);
                self.run_statement_list(&script.statements, shell)
            });
        self.finish(result, shell)
    }

    /// Runs an already-parsed (and not yet optimized) script.
    pub fn execute_ast(&mut self, mut script: ScriptNode, shell: &mut Shell) -> i32 {
        self.command_pool.reset();
        self.pipeline_pool.reset();
        self.expansion_pool.reset();
        crate::ast::optimizer::optimize(&mut script);
        let result = self.run_statement_list(&script.statements, shell);
        self.finish(result, shell)
    }

    /// `.`/`source FILE [args…]` entry point for hosts embedding this
    /// crate directly (the `.`/`source` built-ins call back through
    /// `Invoker::run_script` instead, to stay on the same call stack as
    /// the function/loop they were invoked from).
    pub fn source_file(&mut self, path: &Path, positional_args: &[String], shell: &mut Shell) -> i32 {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{}: {}: {}", shell.shell_name, path.display(), e);
                return 1;
            }
        };
        let pushed = !positional_args.is_empty();
        if pushed {
            shell.positional_stack.push(PositionalParams { params: positional_args.to_vec() });
        }
        let status = self.execute(&contents, shell);
        if pushed {
            shell.positional_stack.pop();
        }
        status
    }

    fn finish(&mut self, result: Result<i32, ExecError>, shell: &mut Shell) -> i32 {
        let status = match result {
            Ok(s) => s,
            Err(e) => {
                report_error(&e, shell);
                e.exit_code()
            }
        };
        shell.last_exit_code = status;
        status
    }

    // -----------------------------------------------------------------
    // Statement / pipeline walking
    // -----------------------------------------------------------------

    fn run_statement_list(&mut self, stmts: &[StatementNode], shell: &mut Shell) -> Result<i32, ExecError> {
        let mut status = 0;
        for stmt in stmts {
            self.check_pending_traps(shell)?;
            shell.jobs.poll();
            status = self.run_statement(stmt, shell)?;
        }
        Ok(status)
    }

    /// Same as `run_statement_list` but with `errexit` suppressed for the
    /// duration — used for `if`/`while`/`until` condition lists.
    fn run_condition(&mut self, stmts: &[StatementNode], shell: &mut Shell) -> Result<i32, ExecError> {
        self.errexit_suppress += 1;
        let result = self.run_statement_list(stmts, shell);
        self.errexit_suppress -= 1;
        result
    }

    fn run_statement(&mut self, stmt: &StatementNode, shell: &mut Shell) -> Result<i32, ExecError> {
        if stmt.background {
            return self.run_statement_background(stmt, shell);
        }
        self.run_and_or_list(stmt, shell)
    }

    fn run_and_or_list(&mut self, stmt: &StatementNode, shell: &mut Shell) -> Result<i32, ExecError> {
        let mut status = self.run_pipeline(&stmt.pipelines[0], shell)?;
        self.after_command(status, shell)?;
        for (i, op) in stmt.operators.iter().enumerate() {
            let run_next = match op {
                StatementOperator::And => status == 0,
                StatementOperator::Or => status != 0,
                StatementOperator::Semi => true,
            };
            if run_next {
                status = self.run_pipeline(&stmt.pipelines[i + 1], shell)?;
                self.after_command(status, shell)?;
            }
        }
        Ok(status)
    }

    /// Updates `$?`, fires `ERR`, and raises `errexit` as an `ExitError`
    /// unwind (spec.md §4.4, §7).
    fn after_command(&mut self, status: i32, shell: &mut Shell) -> Result<(), ExecError> {
        shell.last_exit_code = status;
        if status != 0 {
            self.fire_err_trap(shell);
            if shell.options.errexit && self.errexit_suppress == 0 {
                return Err(ExitError { status }.into());
            }
        }
        Ok(())
    }

    fn fire_err_trap(&mut self, shell: &mut Shell) {
        if self.in_trap {
            return;
        }
        if let Some(TrapAction::Action(body)) = shell.traps.pseudo_action(PseudoSignal::Err).cloned() {
            self.in_trap = true;
            let _ = self.run_source(&body, shell);
            self.in_trap = false;
        }
    }

    fn fire_debug_trap(&mut self, shell: &mut Shell) {
        if self.in_trap {
            return;
        }
        if let Some(TrapAction::Action(body)) = shell.traps.pseudo_action(PseudoSignal::Debug).cloned() {
            self.in_trap = true;
            let _ = self.run_source(&body, shell);
            self.in_trap = false;
        }
    }

    fn check_pending_traps(&mut self, shell: &mut Shell) -> Result<(), ExecError> {
        if self.in_trap {
            return Ok(());
        }
        let pending: Vec<TrapAction> = shell
            .traps
            .iter_signals()
            .filter(|(sig, _)| trap::take_pending(**sig))
            .map(|(_, action)| action.clone())
            .collect();
        for action in pending {
            if let TrapAction::Action(body) = action {
                self.in_trap = true;
                let _ = self.run_source(&body, shell);
                self.in_trap = false;
            }
        }
        Ok(())
    }

    /// The name of `stmt`'s command, if it is simple enough (single
    /// pipeline, single non-negated command, no preceding function
    /// shadowing it) for spec.md §4.4's "builtins may not run in the
    /// background" rule to apply.
    fn bare_builtin_name<'a>(&self, stmt: &'a StatementNode, shell: &Shell) -> Option<&'a str> {
        if stmt.pipelines.len() != 1 {
            return None;
        }
        let pipeline = &stmt.pipelines[0];
        if pipeline.negated || pipeline.commands.len() != 1 {
            return None;
        }
        let CommandNode::Simple(cmd) = &pipeline.commands[0] else { return None };
        if !cmd.assignments.is_empty() {
            return None;
        }
        let word = cmd.name.as_ref()?;
        let name = match word.parts.as_slice() {
            [WordPart::Literal(l)] => l.value.as_str(),
            _ => return None,
        };
        if shell.functions.contains_key(name) || !self.builtins.has(name) {
            return None;
        }
        Some(name)
    }

    fn run_statement_background(&mut self, stmt: &StatementNode, shell: &mut Shell) -> Result<i32, ExecError> {
        if let Some(name) = self.bare_builtin_name(stmt, shell) {
            return Err(ShellError::BuiltinBackground(name.to_string()).into());
        }
        let cmd_text = stmt.source_text.clone().unwrap_or_else(|| "<job>".to_string());
        match unsafe { fork() }.map_err(io_err)? {
            ForkResult::Child => {
                let _ = nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0));
                let status = match self.run_and_or_list(stmt, shell) {
                    Ok(s) => s,
                    Err(e) => {
                        report_error(&e, shell);
                        e.exit_code()
                    }
                };
                std::process::exit(status);
            }
            ForkResult::Parent { child } => {
                let _ = nix::unistd::setpgid(child, child);
                let id = shell.jobs.add(child, child, cmd_text);
                shell.last_bg_pid = Some(child.as_raw() as u32);
                println!("[{}] {}", id, child);
                Ok(0)
            }
        }
    }

    fn run_pipeline(&mut self, pipeline: &PipelineNode, shell: &mut Shell) -> Result<i32, ExecError> {
        if pipeline.commands.len() == 1 {
            let status = self.run_command(&pipeline.commands[0], shell)?;
            return Ok(if pipeline.negated { (status != 0) as i32 } else { status });
        }

        let n = pipeline.commands.len();
        if n - 1 > 16 {
            return Err(ShellError::TooManyPipes.into());
        }

        let mut pipes: Vec<(i32, i32)> = Vec::with_capacity(n - 1);
        for _ in 0..n - 1 {
            let (r, w) = pipe().map_err(io_err)?;
            pipes.push((r, w));
        }

        let mut pids = Vec::with_capacity(n);
        for i in 0..n {
            let _ = self.pipeline_pool.stage(i);
            match unsafe { fork() }.map_err(io_err)? {
                ForkResult::Child => {
                    if i > 0 {
                        let _ = dup2(pipes[i - 1].0, 0);
                    }
                    if i < n - 1 {
                        let _ = dup2(pipes[i].1, 1);
                    }
                    for &(r, w) in &pipes {
                        let _ = close(r);
                        let _ = close(w);
                    }
                    let status = match self.run_command(&pipeline.commands[i], shell) {
                        Ok(s) => s,
                        Err(e) => {
                            report_error(&e, shell);
                            e.exit_code()
                        }
                    };
                    std::process::exit(status);
                }
                ForkResult::Parent { child } => pids.push(child),
            }
        }
        for &(r, w) in &pipes {
            let _ = close(r);
            let _ = close(w);
        }

        let mut statuses = Vec::with_capacity(n);
        for pid in &pids {
            statuses.push(wait_for(*pid));
        }
        let result = if shell.options.pipefail {
            statuses.iter().rev().find(|&&s| s != 0).copied().unwrap_or(0)
        } else {
            *statuses.last().unwrap_or(&0)
        };
        Ok(if pipeline.negated { (result == 0) as i32 } else { result })
    }

    fn run_command(&mut self, node: &CommandNode, shell: &mut Shell) -> Result<i32, ExecError> {
        match node {
            CommandNode::Simple(cmd) => self.run_simple_command(cmd, shell),
            CommandNode::Compound(c) => self.run_compound(c, shell),
            CommandNode::FunctionDef(f) => {
                shell
                    .functions
                    .insert(f.name.clone(), ShellFunction { name: f.name.clone(), body: (*f.body).clone() });
                Ok(0)
            }
        }
    }

    // -----------------------------------------------------------------
    // Simple commands: assignment, expansion, dispatch (spec.md §4.4)
    // -----------------------------------------------------------------

    fn run_simple_command(&mut self, cmd: &SimpleCommandNode, shell: &mut Shell) -> Result<i32, ExecError> {
        if let Some(line) = cmd.line {
            shell.current_line = line;
        }

        let mut assigned: Vec<(String, String)> = Vec::with_capacity(cmd.assignments.len());
        for a in &cmd.assignments {
            let value = self.expand_assignment(a, shell)?;
            assigned.push((a.name.clone(), value));
        }

        if cmd.name.is_none() {
            for (name, value) in assigned {
                shell.set_var(&name, value);
            }
            return Ok(0);
        }

        // Assignments preceding a command name apply only for its duration.
        let mut saved: Vec<(String, Option<String>)> = Vec::with_capacity(assigned.len());
        for (name, value) in &assigned {
            saved.push((name.clone(), shell.env.get(name).cloned()));
            shell.set_var(name, value.clone());
        }

        let result = self.dispatch_named_command(cmd, &assigned, shell);

        for (name, old) in saved {
            match old {
                Some(v) => {
                    shell.env.insert(name, v);
                }
                None => {
                    shell.env.remove(&name);
                }
            }
        }
        shell.close_pending_procsub_fds();
        result
    }

    fn dispatch_named_command(
        &mut self,
        cmd: &SimpleCommandNode,
        assigned: &[(String, String)],
        shell: &mut Shell,
    ) -> Result<i32, ExecError> {
        let name_word = cmd.name.as_ref().unwrap();
        let mut argv = expand::expand_word(name_word, shell, self)?;
        for a in &cmd.args {
            argv.extend(expand::expand_word(a, shell, self)?);
        }

        if argv.is_empty() {
            return Ok(0);
        }

        if shell.options.xtrace {
            self.print_xtrace(assigned, &argv, shell);
        }

        let redirs = self.resolve_redirections(&cmd.redirections, shell)?;
        let name = argv.remove(0);
        self.dispatch_resolved(&name, &argv, shell, false, &redirs)
    }

    fn print_xtrace(&self, assigned: &[(String, String)], argv: &[String], shell: &Shell) {
        let mut line = String::new();
        for (k, v) in assigned {
            line.push_str(&format!("{}={} ", k, v));
        }
        line.push_str(&argv.join(" "));
        eprintln!("{}{}", shell.ps4, line);
    }

    fn expand_assignment(&mut self, a: &AssignmentNode, shell: &mut Shell) -> Result<String, ExecError> {
        if let Some(items) = &a.array {
            // No real array storage (SPEC_FULL.md's documented
            // simplification): the elements are space-joined into one
            // scalar, which round-trips through `$var` the way a caller
            // reading a non-array-aware `$var` would see it in bash.
            let mut parts = Vec::new();
            for w in items {
                parts.extend(expand::expand_word(w, shell, self)?);
            }
            return Ok(parts.join(" "));
        }
        let value = match &a.value {
            Some(w) => expand::expand_word_no_split(w, shell, self)?,
            None => String::new(),
        };
        if a.append {
            let existing = shell.get_var(&a.name).unwrap_or("").to_string();
            return Ok(existing + &value);
        }
        Ok(value)
    }

    /// Resolves redirection targets to strings (spec.md's `Expander`
    /// boundary), allocating a free fd up front for any `{var}>file` form
    /// so the variable can be bound before the redirection itself is
    /// applied.
    fn resolve_redirections<'a>(
        &mut self,
        redirs: &'a [RedirectionNode],
        shell: &mut Shell,
    ) -> Result<Vec<ResolvedRedirection<'a>>, ExecError> {
        let mut out = Vec::with_capacity(redirs.len());
        for node in redirs {
            let (target_text, heredoc_body) = match &node.target {
                RedirectionTarget::Word(w) => (expand::expand_word_no_split(w, shell, self)?, None),
                RedirectionTarget::HereDoc(h) => {
                    let body = if h.quoted {
                        literal_text(&h.content)
                    } else {
                        expand::expand_word_no_split(&h.content, shell, self)?
                    };
                    let body = if h.strip_tabs { strip_leading_tabs(&body) } else { body };
                    (String::new(), Some(body))
                }
            };
            let fd_override = match &node.fd_variable {
                Some(var) => {
                    let fd = allocate_free_fd()?;
                    shell.set_var(var, fd.to_string());
                    Some(fd)
                }
                None => None,
            };
            out.push(ResolvedRedirection { node, target_text, heredoc_body, fd_override });
        }
        Ok(out)
    }

    /// Saves and restores the fds a redirection list touches around
    /// `body` (spec.md §4.5: compound commands and function calls apply
    /// redirections in-process, not via fork, so their other side effects
    /// — variable assignments, `cd`, `return` — are visible to the
    /// caller).
    fn run_with_redirections(
        &mut self,
        redirs: &[ResolvedRedirection],
        shell: &mut Shell,
        body: impl FnOnce(&mut Self, &mut Shell) -> Result<i32, ExecError>,
    ) -> Result<i32, ExecError> {
        if redirs.is_empty() {
            return body(self, shell);
        }
        let mut saved: Vec<(i32, i32)> = Vec::with_capacity(redirs.len());
        for r in redirs {
            let fd = r.fd_override.or(r.node.fd).unwrap_or_else(|| redirection::default_fd(r.node.operator));
            let copy = nix::unistd::dup(fd).unwrap_or(-1);
            saved.push((fd, copy));
            if let Err(e) = redirection::apply(r, shell) {
                restore_fds(&saved);
                return Err(e.into());
            }
        }
        let result = body(self, shell);
        restore_fds(&saved);
        result
    }

    // -----------------------------------------------------------------
    // Compound commands (spec.md §4.4)
    // -----------------------------------------------------------------

    fn run_compound(&mut self, node: &CompoundCommandNode, shell: &mut Shell) -> Result<i32, ExecError> {
        match node {
            CompoundCommandNode::If(n) => self.run_if(n, shell),
            CompoundCommandNode::For(n) => self.run_for(n, shell),
            CompoundCommandNode::CStyleFor(n) => self.run_cstyle_for(n, shell),
            CompoundCommandNode::While(n) => self.run_while_until(&n.condition, &n.body, &n.redirections, shell, false),
            CompoundCommandNode::Until(n) => self.run_while_until(&n.condition, &n.body, &n.redirections, shell, true),
            CompoundCommandNode::Case(n) => self.run_case(n, shell),
            CompoundCommandNode::Subshell(n) => self.run_subshell(n, shell),
            CompoundCommandNode::Group(n) => {
                let redirs = self.resolve_redirections(&n.redirections, shell)?;
                self.run_with_redirections(&redirs, shell, |this, shell| this.run_statement_list(&n.body, shell))
            }
            CompoundCommandNode::ArithmeticCommand(n) => self.run_arith_command(n, shell),
            CompoundCommandNode::ConditionalCommand(n) => self.run_conditional_command(n, shell),
        }
    }

    fn run_if(&mut self, n: &IfNode, shell: &mut Shell) -> Result<i32, ExecError> {
        let redirs = self.resolve_redirections(&n.redirections, shell)?;
        self.run_with_redirections(&redirs, shell, |this, shell| {
            for clause in &n.clauses {
                let cond = this.run_condition(&clause.condition, shell)?;
                if cond == 0 {
                    return this.run_statement_list(&clause.body, shell);
                }
            }
            if let Some(else_body) = &n.else_body {
                return this.run_statement_list(else_body, shell);
            }
            Ok(0)
        })
    }

    fn run_for(&mut self, n: &ForNode, shell: &mut Shell) -> Result<i32, ExecError> {
        let redirs = self.resolve_redirections(&n.redirections, shell)?;
        self.run_with_redirections(&redirs, shell, |this, shell| {
            let values: Vec<String> = match &n.words {
                Some(words) => {
                    let mut out = Vec::new();
                    for w in words {
                        out.extend(expand::expand_word(w, shell, this)?);
                    }
                    out
                }
                None => shell.positional().params.clone(),
            };
            let mut status = 0;
            for value in values {
                shell.set_var(&n.variable, value);
                match this.run_statement_list(&n.body, shell) {
                    Ok(s) => status = s,
                    Err(ExecError::Break(b)) => {
                        if b.levels > 1 {
                            return Err(BreakError { levels: b.levels - 1, status: b.status }.into());
                        }
                        status = b.status;
                        break;
                    }
                    Err(ExecError::Continue(c)) => {
                        if c.levels > 1 {
                            return Err(ContinueError { levels: c.levels - 1, status: c.status }.into());
                        }
                        status = c.status;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(status)
        })
    }

    fn run_cstyle_for(&mut self, n: &CStyleForNode, shell: &mut Shell) -> Result<i32, ExecError> {
        let redirs = self.resolve_redirections(&n.redirections, shell)?;
        self.run_with_redirections(&redirs, shell, |this, shell| {
            if let Some(init) = &n.init {
                arith::eval(&init.expression, shell)?;
            }
            let mut status = 0;
            loop {
                if let Some(cond) = &n.condition {
                    if arith::eval(&cond.expression, shell)? == 0 {
                        break;
                    }
                }
                match this.run_statement_list(&n.body, shell) {
                    Ok(s) => status = s,
                    Err(ExecError::Break(b)) => {
                        if b.levels > 1 {
                            return Err(BreakError { levels: b.levels - 1, status: b.status }.into());
                        }
                        status = b.status;
                        break;
                    }
                    Err(ExecError::Continue(c)) => {
                        if c.levels > 1 {
                            return Err(ContinueError { levels: c.levels - 1, status: c.status }.into());
                        }
                        status = c.status;
                    }
                    Err(e) => return Err(e),
                }
                if let Some(update) = &n.update {
                    arith::eval(&update.expression, shell)?;
                }
            }
            Ok(status)
        })
    }

    fn run_while_until(
        &mut self,
        condition: &[StatementNode],
        body: &[StatementNode],
        redirections: &[RedirectionNode],
        shell: &mut Shell,
        until: bool,
    ) -> Result<i32, ExecError> {
        let redirs = self.resolve_redirections(redirections, shell)?;
        self.run_with_redirections(&redirs, shell, |this, shell| {
            let mut status = 0;
            loop {
                let cond = this.run_condition(condition, shell)?;
                let should_run = if until { cond != 0 } else { cond == 0 };
                if !should_run {
                    break;
                }
                match this.run_statement_list(body, shell) {
                    Ok(s) => status = s,
                    Err(ExecError::Break(b)) => {
                        if b.levels > 1 {
                            return Err(BreakError { levels: b.levels - 1, status: b.status }.into());
                        }
                        status = b.status;
                        break;
                    }
                    Err(ExecError::Continue(c)) => {
                        if c.levels > 1 {
                            return Err(ContinueError { levels: c.levels - 1, status: c.status }.into());
                        }
                        status = c.status;
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(status)
        })
    }

    fn run_case(&mut self, n: &CaseNode, shell: &mut Shell) -> Result<i32, ExecError> {
        let redirs = self.resolve_redirections(&n.redirections, shell)?;
        self.run_with_redirections(&redirs, shell, |this, shell| {
            let word = expand::expand_word_no_split(&n.word, shell, this)?;
            let mut status = 0;
            let mut i = 0;
            let mut fell_through = false;
            while i < n.items.len() {
                let item = &n.items[i];
                let mut matched = fell_through;
                if !matched {
                    for pat in &item.patterns {
                        let pattern = expand::expand_word_no_split(pat, shell, this)?;
                        if glob_match::matches(&pattern, &word) {
                            matched = true;
                            break;
                        }
                    }
                }
                if matched {
                    status = this.run_statement_list(&item.body, shell)?;
                    match item.terminator {
                        CaseTerminator::DoubleSemi => return Ok(status),
                        CaseTerminator::SemiAnd => {
                            fell_through = true;
                            i += 1;
                            continue;
                        }
                        CaseTerminator::SemiSemiAnd => {
                            fell_through = false;
                            i += 1;
                            continue;
                        }
                    }
                }
                fell_through = false;
                i += 1;
            }
            Ok(status)
        })
    }

    fn run_subshell(&mut self, n: &SubshellNode, shell: &mut Shell) -> Result<i32, ExecError> {
        match unsafe { fork() }.map_err(io_err)? {
            ForkResult::Child => {
                let status = match self.resolve_redirections(&n.redirections, shell) {
                    Ok(redirs) => {
                        let mut failed = None;
                        for r in &redirs {
                            if let Err(e) = redirection::apply(r, shell) {
                                failed = Some(e);
                                break;
                            }
                        }
                        match failed {
                            Some(e) => {
                                eprintln!("{}: {}", shell.shell_name, e);
                                1
                            }
                            None => match self.run_statement_list(&n.body, shell) {
                                Ok(s) => s,
                                Err(e) => {
                                    report_error(&e, shell);
                                    e.exit_code()
                                }
                            },
                        }
                    }
                    Err(e) => {
                        report_error(&e, shell);
                        e.exit_code()
                    }
                };
                std::process::exit(status);
            }
            ForkResult::Parent { child } => Ok(wait_for(child)),
        }
    }

    fn run_arith_command(&mut self, n: &ArithmeticCommandNode, shell: &mut Shell) -> Result<i32, ExecError> {
        let redirs = self.resolve_redirections(&n.redirections, shell)?;
        self.run_with_redirections(&redirs, shell, |_this, shell| {
            let v = arith::eval(&n.expression.expression, shell)?;
            Ok(if v != 0 { 0 } else { 1 })
        })
    }

    fn run_conditional_command(&mut self, n: &ConditionalCommandNode, shell: &mut Shell) -> Result<i32, ExecError> {
        let redirs = self.resolve_redirections(&n.redirections, shell)?;
        self.run_with_redirections(&redirs, shell, |this, shell| {
            let result = this.eval_conditional(&n.expression, shell)?;
            Ok(if result { 0 } else { 1 })
        })
    }

    fn eval_conditional(&mut self, expr: &ConditionalExpressionNode, shell: &mut Shell) -> Result<bool, ExecError> {
        match expr {
            ConditionalExpressionNode::Word(w) => {
                let v = expand::expand_word_no_split(&w.word, shell, self)?;
                Ok(!v.is_empty())
            }
            ConditionalExpressionNode::Not(n) => Ok(!self.eval_conditional(&n.operand, shell)?),
            ConditionalExpressionNode::And(a) => {
                Ok(self.eval_conditional(&a.left, shell)? && self.eval_conditional(&a.right, shell)?)
            }
            ConditionalExpressionNode::Or(o) => {
                Ok(self.eval_conditional(&o.left, shell)? || self.eval_conditional(&o.right, shell)?)
            }
            ConditionalExpressionNode::Group(g) => self.eval_conditional(&g.expression, shell),
            ConditionalExpressionNode::Unary(u) => {
                let operand = expand::expand_word_no_split(&u.operand, shell, self)?;
                Ok(eval_unary_cond(u.operator, &operand, shell))
            }
            ConditionalExpressionNode::Binary(b) => {
                let left = expand::expand_word_no_split(&b.left, shell, self)?;
                let right = expand::expand_word_no_split(&b.right, shell, self)?;
                Ok(eval_binary_cond(b.operator, &left, &right))
            }
        }
    }

    // -----------------------------------------------------------------
    // Command dispatch (spec.md §4.4 steps 1-7)
    // -----------------------------------------------------------------

    fn dispatch_resolved(
        &mut self,
        name: &str,
        args: &[String],
        shell: &mut Shell,
        skip_functions: bool,
        redirs: &[ResolvedRedirection],
    ) -> Result<i32, ExecError> {
        self.fire_debug_trap(shell);

        if shell.options.noexec {
            return Ok(0);
        }

        // `exec` applies redirections to the shell itself (or replaces
        // the process image) before anything else sees it — a generic
        // "fork builtins with redirections" rule would defeat its purpose.
        if name == "exec" {
            return self.do_exec(args, shell, redirs);
        }

        if !skip_functions {
            if let Some(func) = shell.functions.get(name).cloned() {
                return self.call_function(&func, args, shell, redirs);
            }
        }

        if self.builtins.has(name) {
            return if redirs.is_empty() {
                self.invoke_builtin(name, args, shell)
            } else {
                self.run_builtin_in_fork(name, args, shell, redirs)
            };
        }

        // Auto-`cd`: a bare directory name with no arguments (teacher's
        // zsh-style convenience, SPEC_FULL.md "Supplemental features").
        if args.is_empty() && !name.is_empty() && !name.contains(' ') && !self.resolve_has_slash_collision(name) {
            let candidate =
                if name.starts_with('/') || name.starts_with("./") || name.starts_with("../") {
                    PathBuf::from(name)
                } else {
                    shell.cwd().join(name)
                };
            if candidate.is_dir() {
                return self.invoke_builtin("cd", std::slice::from_ref(&name.to_string()), shell);
            }
        }

        // Suffix alias: `foo.py` -> `python foo.py` if a `.py -> python`
        // association exists and the file actually exists (teacher's
        // zsh-style convenience).
        if let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) {
            if Path::new(name).exists() {
                if let Some(prefix) = shell.suffix_aliases.get(ext).cloned() {
                    let mut parts = prefix.split_whitespace();
                    if let Some(prefix_cmd) = parts.next() {
                        let mut full_args: Vec<String> = parts.map(str::to_string).collect();
                        full_args.push(name.to_string());
                        full_args.extend(args.iter().cloned());
                        return self.dispatch_resolved(prefix_cmd, &full_args, shell, false, redirs);
                    }
                }
            }
        }

        match self.resolve_external(name, shell) {
            Some(path) => self.run_external(&path, name, args, shell, redirs),
            None => {
                if name.contains('/') && Path::new(name).exists() {
                    eprintln!("{}: {}: Permission denied", shell.shell_name, name);
                    return Ok(126);
                }
                eprintln!("{}: {}: command not found", shell.shell_name, name);
                if let Some(msg) = self.suggester.suggest(name) {
                    eprintln!("{}", msg);
                }
                Ok(127)
            }
        }
    }

    fn resolve_has_slash_collision(&self, name: &str) -> bool {
        self.builtins.has(name) || name.contains('/')
    }

    fn invoke_builtin(&mut self, name: &str, args: &[String], shell: &mut Shell) -> Result<i32, ExecError> {
        self.with_builtin_ctx(shell, |registry, ctx| registry.invoke(ctx, name, args))
    }

    /// Runs `f` with a `BuiltinContext` wired to `self` as the re-entrant
    /// `Invoker`, working around the aliasing that would otherwise result
    /// from borrowing `self.builtins` and `self` (as `&mut dyn Invoker`)
    /// at once: the registry is moved out for the duration of the call.
    fn with_builtin_ctx<R>(
        &mut self,
        shell: &mut Shell,
        f: impl FnOnce(&BuiltinRegistry, &mut BuiltinContext) -> R,
    ) -> R {
        let registry = std::mem::take(&mut self.builtins);
        let result = {
            let mut ctx = BuiltinContext { shell, invoker: self };
            f(&registry, &mut ctx)
        };
        self.builtins = registry;
        result
    }

    /// Built-in with redirections (spec.md §4.4 step 6): forked so the
    /// redirected invocation's other side effects (e.g. `cd`) cannot leak
    /// into the parent shell.
    fn run_builtin_in_fork(
        &mut self,
        name: &str,
        args: &[String],
        shell: &mut Shell,
        redirs: &[ResolvedRedirection],
    ) -> Result<i32, ExecError> {
        match unsafe { fork() }.map_err(io_err)? {
            ForkResult::Child => {
                for r in redirs {
                    if let Err(e) = redirection::apply(r, shell) {
                        eprintln!("{}: {}", shell.shell_name, e);
                        std::process::exit(1);
                    }
                }
                let status = match self.invoke_builtin(name, args, shell) {
                    Ok(s) => s,
                    Err(e) => {
                        report_error(&e, shell);
                        e.exit_code()
                    }
                };
                std::process::exit(status);
            }
            ForkResult::Parent { child } => Ok(wait_for(child)),
        }
    }

    fn call_function(
        &mut self,
        func: &ShellFunction,
        args: &[String],
        shell: &mut Shell,
        redirs: &[ResolvedRedirection],
    ) -> Result<i32, ExecError> {
        shell.positional_stack.push(PositionalParams { params: args.to_vec() });
        shell.in_function_depth += 1;
        let result = self.run_with_redirections(redirs, shell, |this, shell| this.run_compound(&func.body, shell));
        shell.in_function_depth -= 1;
        shell.positional_stack.pop();
        match result {
            Err(ExecError::Return(r)) => Ok(r.status),
            other => other,
        }
    }

    fn do_exec(&mut self, args: &[String], shell: &mut Shell, redirs: &[ResolvedRedirection]) -> Result<i32, ExecError> {
        if args.is_empty() {
            for r in redirs {
                redirection::apply(r, shell)?;
            }
            return Ok(0);
        }
        let name = &args[0];
        let rest = &args[1..];
        let path = self
            .resolve_external(name, shell)
            .ok_or_else(|| ShellError::CommandNotFound(name.clone()))?;
        for r in redirs {
            redirection::apply(r, shell)?;
        }
        for (k, v) in shell.child_env() {
            std::env::set_var(k, v);
        }
        self.command_pool.reset();
        let argv = build_cstrings(&mut self.command_pool, name, rest);
        let c_path = CString::new(path.as_os_str().as_bytes()).unwrap_or_default();
        let err = nix::unistd::execv(&c_path, &argv);
        Err(ShellError::Other(format!("exec: {}: {:?}", name, err)).into())
    }

    fn run_external(
        &mut self,
        path: &Path,
        name: &str,
        args: &[String],
        shell: &mut Shell,
        redirs: &[ResolvedRedirection],
    ) -> Result<i32, ExecError> {
        match unsafe { fork() }.map_err(io_err)? {
            ForkResult::Child => {
                for r in redirs {
                    if let Err(e) = redirection::apply(r, shell) {
                        eprintln!("{}: {}", shell.shell_name, e);
                        std::process::exit(1);
                    }
                }
                for (k, v) in shell.child_env() {
                    std::env::set_var(k, v);
                }
                self.command_pool.reset();
                let argv = build_cstrings(&mut self.command_pool, name, args);
                let c_path = CString::new(path.as_os_str().as_bytes()).unwrap_or_default();
                let _ = nix::unistd::execv(&c_path, &argv);
                eprintln!("{}: {}: {}", shell.shell_name, name, std::io::Error::last_os_error());
                std::process::exit(126);
            }
            ForkResult::Parent { child } => Ok(wait_for(child)),
        }
    }

    fn resolve_external(&self, name: &str, shell: &Shell) -> Option<PathBuf> {
        if name.contains('/') {
            let p = PathBuf::from(name);
            return if is_executable_file(&p) { Some(p) } else { None };
        }
        let path_var = shell.get_var("PATH").unwrap_or("").to_string();
        for dir in path_var.split(':') {
            if dir.is_empty() {
                continue;
            }
            let candidate = Path::new(dir).join(name);
            if is_executable_file(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// `CommandRunner` (spec.md §6, `expand.rs`'s seam for `$(...)`/`<(...)`)
// ---------------------------------------------------------------------------

impl CommandRunner for Executor {
    fn run_captured(&mut self, body: &ScriptNode, shell: &mut Shell) -> Result<(String, i32), ShellError> {
        let (read_end, write_end) = pipe().map_err(|e| ShellError::System("pipe", std::io::Error::from(e)))?;
        match unsafe { fork() }.map_err(|e| ShellError::System("fork", std::io::Error::from(e)))? {
            ForkResult::Child => {
                let _ = close(read_end);
                let _ = dup2(write_end, 1);
                let _ = close(write_end);
                let status = match self.run_statement_list(&body.statements, shell) {
                    Ok(s) => s,
                    Err(e) => {
                        report_error(&e, shell);
                        e.exit_code()
                    }
                };
                use std::io::Write;
                let _ = std::io::stdout().flush();
                std::process::exit(status);
            }
            ForkResult::Parent { child } => {
                let _ = close(write_end);
                let mut buf = Vec::new();
                {
                    use std::io::Read;
                    let mut f = unsafe { std::fs::File::from_raw_fd(read_end) };
                    let _ = f.read_to_end(&mut buf);
                }
                let status = wait_for(child);
                let mut text = String::from_utf8_lossy(&buf).into_owned();
                while text.ends_with('\n') {
                    text.pop();
                }
                Ok((text, status))
            }
        }
    }

    fn run_process_substitution(
        &mut self,
        body: &ScriptNode,
        direction: ProcessDirection,
        shell: &mut Shell,
    ) -> Result<String, ShellError> {
        let (read_end, write_end) = pipe().map_err(|e| ShellError::System("pipe", std::io::Error::from(e)))?;
        match unsafe { fork() }.map_err(|e| ShellError::System("fork", std::io::Error::from(e)))? {
            ForkResult::Child => {
                match direction {
                    ProcessDirection::Output => {
                        let _ = close(write_end);
                        let _ = dup2(read_end, 0);
                        let _ = close(read_end);
                    }
                    ProcessDirection::Input => {
                        let _ = close(read_end);
                        let _ = dup2(write_end, 1);
                        let _ = close(write_end);
                    }
                }
                let status = match self.run_statement_list(&body.statements, shell) {
                    Ok(s) => s,
                    Err(e) => {
                        report_error(&e, shell);
                        e.exit_code()
                    }
                };
                std::process::exit(status);
            }
            ForkResult::Parent { .. } => match direction {
                ProcessDirection::Output => {
                    let _ = close(read_end);
                    shell.pending_procsub_fds.push(write_end);
                    Ok(format!("/dev/fd/{}", write_end))
                }
                ProcessDirection::Input => {
                    let _ = close(write_end);
                    shell.pending_procsub_fds.push(read_end);
                    Ok(format!("/dev/fd/{}", read_end))
                }
            },
        }
    }

    fn push_expansion_scope(&mut self) -> usize {
        self.expansion_pool.push()
    }

    fn pop_expansion_scope(&mut self, mark: usize) {
        self.expansion_pool.pop(mark);
    }
}

// ---------------------------------------------------------------------------
// `Invoker` (spec.md §4.4, `builtins/mod.rs`'s seam for eval/source/command)
// ---------------------------------------------------------------------------

impl Invoker for Executor {
    fn run_source(&mut self, source: &str, shell: &mut Shell) -> Result<i32, ExecError> {
        let mut script = crate::parser::parse(source).map_err(|e| ShellError::Other(e.to_string()))?;
        crate::ast::optimizer::optimize(&mut script);
        self.run_statement_list(&script.statements, shell)
    }

    fn run_script(&mut self, script: &ScriptNode, shell: &mut Shell) -> Result<i32, ExecError> {
        self.run_statement_list(&script.statements, shell)
    }

    fn dispatch_command(
        &mut self,
        name: &str,
        args: &[String],
        shell: &mut Shell,
        skip_functions: bool,
    ) -> Result<i32, ExecError> {
        self.dispatch_resolved(name, args, shell, skip_functions, &[])
    }

    fn resolve_path(&self, name: &str, shell: &Shell) -> Option<PathBuf> {
        self.resolve_external(name, shell)
    }
}

// ---------------------------------------------------------------------------
// `[[ ... ]]` conditional evaluation (spec.md's `ConditionalExpressionNode`)
// ---------------------------------------------------------------------------

fn eval_binary_cond(op: CondBinaryOperator, left: &str, right: &str) -> bool {
    use CondBinaryOperator::*;
    match op {
        Eq | EqEq => glob_match::matches(right, left),
        Ne => !glob_match::matches(right, left),
        Match => regex_lite::Regex::new(right).map(|re| re.is_match(left)).unwrap_or(false),
        Lt => left < right,
        Gt => left > right,
        NumEq => cond_num(left) == cond_num(right),
        NumNe => cond_num(left) != cond_num(right),
        NumLt => cond_num(left) < cond_num(right),
        NumLe => cond_num(left) <= cond_num(right),
        NumGt => cond_num(left) > cond_num(right),
        NumGe => cond_num(left) >= cond_num(right),
        Nt => cond_mtime(left) > cond_mtime(right),
        Ot => cond_mtime(left) < cond_mtime(right),
        Ef => cond_same_file(left, right),
    }
}

fn eval_unary_cond(op: CondUnaryOperator, operand: &str, shell: &Shell) -> bool {
    use CondUnaryOperator::*;
    match op {
        A | E => Path::new(operand).exists(),
        B => std::fs::symlink_metadata(operand)
            .map(|m| {
                use std::os::unix::fs::FileTypeExt;
                m.file_type().is_block_device()
            })
            .unwrap_or(false),
        C => std::fs::symlink_metadata(operand)
            .map(|m| {
                use std::os::unix::fs::FileTypeExt;
                m.file_type().is_char_device()
            })
            .unwrap_or(false),
        D => Path::new(operand).is_dir(),
        F => Path::new(operand).is_file(),
        G => std::fs::metadata(operand)
            .map(|m| {
                use std::os::unix::fs::PermissionsExt;
                m.permissions().mode() & 0o2000 != 0
            })
            .unwrap_or(false),
        H | L => std::fs::symlink_metadata(operand).map(|m| m.file_type().is_symlink()).unwrap_or(false),
        K => std::fs::metadata(operand)
            .map(|m| {
                use std::os::unix::fs::PermissionsExt;
                m.permissions().mode() & 0o1000 != 0
            })
            .unwrap_or(false),
        P => std::fs::metadata(operand)
            .map(|m| {
                use std::os::unix::fs::FileTypeExt;
                m.file_type().is_fifo()
            })
            .unwrap_or(false),
        R => std::fs::metadata(operand).is_ok(),
        S => std::fs::metadata(operand).map(|m| m.len() > 0).unwrap_or(false),
        T => operand.parse::<i32>().map(|fd| unsafe { libc::isatty(fd) == 1 }).unwrap_or(false),
        U => std::fs::metadata(operand)
            .map(|m| {
                use std::os::unix::fs::PermissionsExt;
                m.permissions().mode() & 0o4000 != 0
            })
            .unwrap_or(false),
        W => std::fs::metadata(operand).map(|m| !m.permissions().readonly()).unwrap_or(false),
        X => std::fs::metadata(operand)
            .map(|m| {
                use std::os::unix::fs::PermissionsExt;
                m.permissions().mode() & 0o111 != 0
            })
            .unwrap_or(false),
        UpperG => std::fs::metadata(operand)
            .map(|m| {
                use std::os::unix::fs::MetadataExt;
                m.gid() == unsafe { libc::getegid() }
            })
            .unwrap_or(false),
        N => std::fs::metadata(operand)
            .map(|m| m.modified().ok().zip(m.accessed().ok()).map(|(mt, at)| mt > at).unwrap_or(false))
            .unwrap_or(false),
        UpperO => std::fs::metadata(operand)
            .map(|m| {
                use std::os::unix::fs::MetadataExt;
                m.uid() == unsafe { libc::geteuid() }
            })
            .unwrap_or(false),
        UpperS => std::fs::metadata(operand)
            .map(|m| {
                use std::os::unix::fs::FileTypeExt;
                m.file_type().is_socket()
            })
            .unwrap_or(false),
        Z => operand.is_empty(),
        LowerN => !operand.is_empty(),
        LowerO => cond_option_is_set(operand, shell),
        V | UpperR => shell.get_var(operand).is_some(),
    }
}

fn cond_option_is_set(name: &str, shell: &Shell) -> bool {
    match name {
        "errexit" => shell.options.errexit,
        "errtrace" => shell.options.errtrace,
        "pipefail" => shell.options.pipefail,
        "xtrace" => shell.options.xtrace,
        "noexec" => shell.options.noexec,
        "nounset" => shell.options.nounset,
        "noclobber" => shell.options.noclobber,
        "noglob" => shell.options.noglob,
        "verbose" => shell.options.verbose,
        "posix" => shell.options.posix,
        "allexport" => shell.options.allexport,
        "monitor" => shell.options.monitor,
        "interactive" => shell.options.interactive,
        _ => false,
    }
}

fn cond_num(s: &str) -> i64 {
    s.trim().parse().unwrap_or(0)
}

fn cond_mtime(path: &str) -> std::time::SystemTime {
    std::fs::metadata(path).and_then(|m| m.modified()).unwrap_or(std::time::SystemTime::UNIX_EPOCH)
}

fn cond_same_file(a: &str, b: &str) -> bool {
    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => {
            use std::os::unix::fs::MetadataExt;
            ma.dev() == mb.dev() && ma.ino() == mb.ino()
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Small free functions
// ---------------------------------------------------------------------------

fn literal_text(word: &WordNode) -> String {
    let mut s = String::new();
    for part in &word.parts {
        match part {
            WordPart::Literal(l) => s.push_str(&l.value),
            WordPart::SingleQuoted(sq) => s.push_str(&sq.value),
            WordPart::Escaped(e) => s.push_str(&e.value),
            WordPart::DoubleQuoted(dq) => s.push_str(&literal_text(&WordNode { parts: dq.parts.clone() })),
            _ => {}
        }
    }
    s
}

fn strip_leading_tabs(body: &str) -> String {
    let had_trailing_newline = body.ends_with('\n');
    let mut out: String = body.lines().map(|l| l.trim_start_matches('\t')).collect::<Vec<_>>().join("\n");
    if had_trailing_newline {
        out.push('\n');
    }
    out
}

/// Allocates a free fd above 2 for `{var}>file` redirections, via the same
/// "open a throwaway descriptor, `F_DUPFD` it up, close the throwaway"
/// trick programs use to query the lowest free fd without a dedicated
/// syscall for it.
fn allocate_free_fd() -> Result<i32, ShellError> {
    use nix::fcntl::{fcntl, open, FcntlArg, OFlag};
    use nix::sys::stat::Mode;
    let tmp = open("/dev/null", OFlag::O_RDONLY, Mode::empty())
        .map_err(|e| ShellError::System("fd allocation", std::io::Error::from(e)))?;
    let real = fcntl(tmp, FcntlArg::F_DUPFD(10)).map_err(|e| ShellError::System("fd allocation", std::io::Error::from(e)));
    let _ = close(tmp);
    real
}

fn restore_fds(saved: &[(i32, i32)]) {
    for &(target, copy) in saved {
        if copy >= 0 {
            let _ = dup2(copy, target);
            let _ = close(copy);
        }
    }
}

fn build_cstrings(pool: &mut CommandMemoryPool, name: &str, args: &[String]) -> Vec<CString> {
    let mut out = Vec::with_capacity(args.len() + 1);
    if let Some(c) = pool.alloc_cstring(name) {
        out.push(c.clone());
    }
    for a in args {
        if let Some(c) = pool.alloc_cstring(a) {
            out.push(c.clone());
        }
    }
    out
}

fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

fn wait_for(pid: Pid) -> i32 {
    match waitpid(pid, None) {
        Ok(WaitStatus::Exited(_, code)) => code,
        Ok(WaitStatus::Signaled(_, sig, _)) => 128 + sig as i32,
        _ => 0,
    }
}

fn report_error(e: &ExecError, shell: &Shell) {
    match e {
        ExecError::Shell(se) => eprintln!("{}: {}", shell.shell_name, se),
        ExecError::Io(ioe) => eprintln!("{}: {}", shell.shell_name, ioe),
        _ => {}
    }
}

fn io_err(e: nix::errno::Errno) -> ExecError {
    ShellError::System("fork/pipe", std::io::Error::from(e)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_and_false_chain() {
        let mut shell = Shell::new("test");
        let mut exec = Executor::new();
        assert_eq!(exec.execute("true && echo ok", &mut shell), 0);
        assert_eq!(exec.execute("false || echo ok", &mut shell), 0);
    }

    #[test]
    fn exit_status_reflects_last_pipeline() {
        let mut shell = Shell::new("test");
        let mut exec = Executor::new();
        assert_eq!(exec.execute("false", &mut shell), 1);
        assert_eq!(shell.last_exit_code, 1);
    }

    #[test]
    fn if_else_chooses_the_right_branch() {
        let mut shell = Shell::new("test");
        let mut exec = Executor::new();
        assert_eq!(exec.execute("if false; then exit 5; else exit 0; fi", &mut shell), 0);
    }

    #[test]
    fn variable_assignment_is_visible_after_the_statement() {
        let mut shell = Shell::new("test");
        let mut exec = Executor::new();
        exec.execute("FOO=bar", &mut shell);
        assert_eq!(shell.get_var("FOO"), Some("bar"));
    }

    #[test]
    fn for_loop_break_unwinds_one_level() {
        let mut shell = Shell::new("test");
        let mut exec = Executor::new();
        let status = exec.execute("for i in 1 2 3; do if [ \"$i\" = 2 ]; then break; fi; done", &mut shell);
        assert_eq!(status, 0);
    }

    #[test]
    fn arithmetic_command_status_reflects_truthiness() {
        let mut shell = Shell::new("test");
        let mut exec = Executor::new();
        assert_eq!(exec.execute("(( 1 + 1 ))", &mut shell), 0);
        assert_eq!(exec.execute("(( 0 ))", &mut shell), 1);
    }

    #[test]
    fn command_not_found_reports_127() {
        let mut shell = Shell::new("test");
        let mut exec = Executor::new();
        assert_eq!(exec.execute("this_command_does_not_exist_xyz", &mut shell), 127);
    }
}
