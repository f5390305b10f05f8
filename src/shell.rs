//! Process-wide shell state (spec.md §3 "Shell").
//!
//! Everything an executor or built-in needs to read or mutate lives here:
//! environment, aliases, directory stack, job table, trap table, shell
//! options, and the last exit code. Passed explicitly as `&mut Shell` to
//! every executor/built-in entry point rather than hidden behind a
//! thread-local or singleton (spec.md §9, "Global mutable state").

use std::collections::HashMap;
use std::path::PathBuf;

use crate::job::JobTable;
use crate::trap::TrapTable;

/// Boolean `set -o` options named explicitly in spec.md §3, plus the
/// teacher's broader set kept per SPEC_FULL.md's "Supplemental features".
#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub errexit: bool,
    pub errtrace: bool,
    pub pipefail: bool,
    pub xtrace: bool,
    pub noexec: bool,
    pub nounset: bool,
    pub noclobber: bool,
    pub noglob: bool,
    pub verbose: bool,
    pub posix: bool,
    pub allexport: bool,
    pub monitor: bool,
    pub interactive: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            errexit: false,
            errtrace: false,
            pipefail: false,
            xtrace: false,
            noexec: false,
            nounset: false,
            noclobber: false,
            noglob: false,
            verbose: false,
            posix: false,
            allexport: false,
            monitor: false,
            interactive: false,
        }
    }
}

/// `shopt` options: a separate namespace from `set -o`, bash-style.
#[derive(Debug, Clone, Default)]
pub struct ShoptOptions {
    pub extglob: bool,
    pub dotglob: bool,
    pub nullglob: bool,
    pub failglob: bool,
    pub globstar: bool,
    pub nocaseglob: bool,
    pub nocasematch: bool,
    pub expand_aliases: bool,
    pub lastpipe: bool,
    pub xpg_echo: bool,
}

/// A user-defined shell function: name -> parsed body, recalled by the
/// command-resolution step ahead of the external `PATH` search.
#[derive(Debug, Clone)]
pub struct ShellFunction {
    pub name: String,
    pub body: crate::ast::types::CompoundCommandNode,
}

/// One stack frame of positional parameters, pushed by function calls and
/// `source_file`/`.` so `$1 $2 … $@ $#` resolve to the right scope.
#[derive(Debug, Clone, Default)]
pub struct PositionalParams {
    pub params: Vec<String>,
}

/// Process-wide shell state (spec.md §3).
pub struct Shell {
    pub env: HashMap<String, String>,
    /// Variables not exported to the environment of spawned children.
    pub locals: HashMap<String, String>,
    pub exported: std::collections::HashSet<String>,
    pub readonly: std::collections::HashSet<String>,
    pub aliases: HashMap<String, String>,
    /// zsh-style extension -> command-prefix associations (spec.md §4.4 step 5).
    pub suffix_aliases: HashMap<String, String>,
    pub functions: HashMap<String, ShellFunction>,
    pub dir_stack: Vec<PathBuf>,
    pub jobs: JobTable,
    pub traps: TrapTable,
    pub options: ShellOptions,
    pub shopt: ShoptOptions,
    pub last_exit_code: i32,
    pub current_line: usize,
    pub shell_name: String,
    pub positional_stack: Vec<PositionalParams>,
    /// `$$` — fixed for the process lifetime.
    pub pid: u32,
    /// `$!` — pid of the most recently backgrounded job.
    pub last_bg_pid: Option<u32>,
    /// Name->message pairs from the `Suggester` collaborator's last call,
    /// kept only for tests; production code calls the trait directly.
    pub in_function_depth: u32,
    /// `set -x` prefix, bash default `+ `.
    pub ps4: String,
    /// Read ends of `<(...)` / write ends of `>(...)` process-substitution
    /// pipes opened for the command currently being expanded, kept open
    /// past the fork so the spawned consumer can still open
    /// `/dev/fd/N` (spec.md §3 `ProcessSub`). Closed by the executor once
    /// the enclosing simple command has been dispatched.
    pub pending_procsub_fds: Vec<i32>,
}

impl Shell {
    pub fn new(shell_name: impl Into<String>) -> Self {
        let mut env: HashMap<String, String> = std::env::vars().collect();
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        env.entry("PWD".to_string()).or_insert_with(|| cwd.to_string_lossy().into_owned());
        env.entry("IFS".to_string()).or_insert_with(|| " \t\n".to_string());
        let exported: std::collections::HashSet<String> = env.keys().cloned().collect();

        Self {
            env,
            locals: HashMap::new(),
            exported,
            readonly: std::collections::HashSet::new(),
            aliases: HashMap::new(),
            suffix_aliases: HashMap::new(),
            functions: HashMap::new(),
            dir_stack: vec![cwd],
            jobs: JobTable::new(),
            traps: TrapTable::new(),
            options: ShellOptions::default(),
            shopt: ShoptOptions::default(),
            last_exit_code: 0,
            current_line: 0,
            shell_name: shell_name.into(),
            positional_stack: vec![PositionalParams::default()],
            pid: std::process::id(),
            last_bg_pid: None,
            in_function_depth: 0,
            ps4: "+ ".to_string(),
            pending_procsub_fds: Vec::new(),
        }
    }

    /// Closes any process-substitution pipe fds left open by the most
    /// recently expanded command, once that command has been dispatched.
    pub fn close_pending_procsub_fds(&mut self) {
        for fd in self.pending_procsub_fds.drain(..) {
            let _ = nix::unistd::close(fd);
        }
    }

    /// Look up a variable, preferring the topmost local/positional scope.
    pub fn get_var(&self, name: &str) -> Option<&str> {
        match name {
            "?" => None, // callers read last_exit_code directly
            _ => self.locals.get(name).or_else(|| self.env.get(name)).map(|s| s.as_str()),
        }
    }

    pub fn set_var(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if self.exported.contains(name) || self.options.allexport {
            self.exported.insert(name.to_string());
            self.env.insert(name.to_string(), value);
        } else {
            self.env.insert(name.to_string(), value);
        }
    }

    pub fn unset_var(&mut self, name: &str) {
        self.env.remove(name);
        self.locals.remove(name);
        self.exported.remove(name);
    }

    pub fn export(&mut self, name: &str) {
        self.exported.insert(name.to_string());
    }

    pub fn positional(&self) -> &PositionalParams {
        self.positional_stack.last().expect("positional stack never empty")
    }

    pub fn positional_mut(&mut self) -> &mut PositionalParams {
        self.positional_stack.last_mut().expect("positional stack never empty")
    }

    /// The environment block handed to a spawned child: exported vars only.
    pub fn child_env(&self) -> Vec<(String, String)> {
        self.exported
            .iter()
            .filter_map(|name| self.env.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    pub fn cwd(&self) -> PathBuf {
        self.env
            .get("PWD")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")))
    }
}
