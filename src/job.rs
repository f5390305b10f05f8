//! Job table: tracks background processes (spec.md §3 "Job Table", §4.4
//! "Background execution", §5 "Ordering guarantees").
//!
//! Grounded on `examples/magicant-yash-rs/yash-env/src/job.rs`'s
//! `Job`/`JobSet` shape, narrowed to the fields spec.md names: id, pid,
//! status, command text. No process-group job-control subtlety beyond what
//! `fg`/`bg` need (see `Job::pgid`).

use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
    Done(i32),
    Signaled(i32),
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "Running"),
            JobState::Stopped => write!(f, "Stopped"),
            JobState::Done(code) => write!(f, "Done({})", code),
            JobState::Signaled(sig) => write!(f, "Terminated(signal {})", sig),
        }
    }
}

impl JobState {
    pub fn from_wait_status(status: WaitStatus) -> Self {
        match status {
            WaitStatus::Exited(_, code) => JobState::Done(code),
            WaitStatus::Signaled(_, sig, _) => JobState::Signaled(sig as i32),
            WaitStatus::Stopped(..) => JobState::Stopped,
            _ => JobState::Running,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, JobState::Done(_) | JobState::Signaled(_))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            JobState::Done(code) => *code,
            JobState::Signaled(sig) => 128 + sig,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: u32,
    pub pid: Pid,
    /// Process group id, for `fg`/`bg`/`kill -- -pgid`.
    pub pgid: Pid,
    pub status: JobState,
    pub command_text: String,
    /// Set once `disown` has been called; the job is no longer reported by
    /// `jobs` but its exit status is still reaped.
    pub disowned: bool,
}

/// Tracks background processes (spec.md §3 "Job Table").
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
    next_id: u32,
}

impl JobTable {
    pub fn new() -> Self {
        Self { jobs: Vec::new(), next_id: 1 }
    }

    /// Registers a newly started background process, returning its job id.
    pub fn add(&mut self, pid: Pid, pgid: Pid, command_text: impl Into<String>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(Job {
            id,
            pid,
            pgid,
            status: JobState::Running,
            command_text: command_text.into(),
            disowned: false,
        });
        id
    }

    pub fn get(&self, id: u32) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub fn find_by_pid_mut(&mut self, pid: Pid) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.pid == pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn disown(&mut self, id: u32) -> bool {
        if let Some(job) = self.get_mut(id) {
            job.disowned = true;
            true
        } else {
            false
        }
    }

    /// The job most recently added that is still running — bash's `%%`/`%+`.
    pub fn current(&self) -> Option<&Job> {
        self.jobs.iter().rev().find(|j| !j.status.is_finished())
    }

    /// Removes every job whose process has already been reaped and whose
    /// completion has been reported (bash drops `Done` jobs from `jobs`
    /// lazily, after the next prompt; here, after the next `checkJob` poll).
    pub fn reap_reported(&mut self) {
        self.jobs.retain(|j| !(j.status.is_finished() && j.disowned));
    }

    /// Polls every running job with `WNOHANG`, updating status in place.
    /// Called at the safe points spec.md §5 names: between commands, after
    /// `wait` returns, before a new chain.
    pub fn poll(&mut self) {
        use nix::sys::wait::{waitpid, WaitPidFlag};
        for job in &mut self.jobs {
            if job.status.is_finished() {
                continue;
            }
            match waitpid(job.pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(_) => {}
                Ok(status) => job.status = JobState::from_wait_status(status),
            }
        }
    }
}
