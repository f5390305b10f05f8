//! Redirection engine (spec.md §4.5): applies file/fd redirections and
//! heredoc pipes in the child process (or, for `exec` with only
//! redirections, in the shell itself — spec.md §4.4).
//!
//! Grounded on the fork/dup2 vocabulary `examples/magicant-yash-rs`'s
//! `yash-env/src/system/real.rs` wraps behind its `System` trait, scoped
//! down to exactly the operations spec.md §4.5 lists.

use std::net::{TcpStream, ToSocketAddrs, UdpSocket};
use std::os::fd::{AsRawFd, IntoRawFd, RawFd};

use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2, pipe, write};

use crate::ast::types::{RedirectionNode, RedirectionOperator, RedirectionTarget};
use crate::errors::ShellError;
use crate::shell::Shell;

/// A redirection with its target already expanded to a concrete string
/// (spec.md's `Redirection { kind, fd?, target, heredoc_body? }`, after
/// the `Expander` has run).
pub struct ResolvedRedirection<'a> {
    pub node: &'a RedirectionNode,
    pub target_text: String,
    pub heredoc_body: Option<String>,
    /// Overrides `node.fd` when the source used the `{varname}>file`
    /// fd-variable form: the executor allocates a free descriptor up
    /// front (so it can bind `varname` to it) and threads it through here
    /// rather than mutating the (shared, immutable) parsed AST node.
    pub fd_override: Option<i32>,
}

/// Default fd per spec.md §3 "Redirection": 0 for input kinds, 1 for
/// output kinds, unless an explicit fd (possibly preceded by a literal `2`
/// in source) overrides it.
pub(crate) fn default_fd(op: RedirectionOperator) -> i32 {
    use RedirectionOperator::*;
    match op {
        Less | DLess | DLessDash | TLess | LessGreat | LessAnd => 0,
        Great | DGreat | GreatAnd | Clobber | AndGreat | AndDGreat => 1,
        #[allow(unreachable_patterns)]
        _ => 1,
    }
}

fn target_fd(r: &ResolvedRedirection) -> i32 {
    r.fd_override.or(r.node.fd).unwrap_or_else(|| default_fd(r.node.operator))
}

/// Applies one redirection to the current process's fd table. Called in a
/// forked child for ordinary commands/pipelines, or directly in the shell
/// process for `exec` with only redirections (spec.md §4.4).
pub fn apply(r: &ResolvedRedirection, shell: &Shell) -> Result<(), ShellError> {
    use RedirectionOperator::*;
    let fd = target_fd(r);
    match r.node.operator {
        Less => open_and_dup(&r.target_text, OFlag::O_RDONLY, Mode::empty(), fd),
        Great | Clobber => {
            if r.node.operator == Great && shell.options.noclobber && !r.target_text.starts_with("/dev/") {
                if std::path::Path::new(&r.target_text).exists() {
                    return Err(ShellError::NoClobber(r.target_text.clone()));
                }
            }
            open_and_dup(
                &r.target_text,
                OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
                Mode::from_bits_truncate(0o644),
                fd,
            )
        }
        DGreat => open_and_dup(
            &r.target_text,
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
            Mode::from_bits_truncate(0o644),
            fd,
        ),
        LessGreat => open_and_dup(
            &r.target_text,
            OFlag::O_RDWR | OFlag::O_CREAT,
            Mode::from_bits_truncate(0o644),
            fd,
        ),
        AndGreat => open_and_dup(
            &r.target_text,
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            Mode::from_bits_truncate(0o644),
            fd,
        )
        .and_then(|_| dup_fd(1, 2)),
        AndDGreat => open_and_dup(
            &r.target_text,
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
            Mode::from_bits_truncate(0o644),
            fd,
        )
        .and_then(|_| dup_fd(1, 2)),
        GreatAnd | LessAnd => apply_fd_dup(&r.target_text, fd),
        DLess | DLessDash => apply_heredoc(r.heredoc_body.as_deref().unwrap_or(""), fd),
        TLess => apply_herestring(&r.target_text, fd),
    }
}

fn open_and_dup(path: &str, flags: OFlag, mode: Mode, target_fd: i32) -> Result<(), ShellError> {
    if let Some(dev) = parse_dev_net_path(path) {
        return open_dev_net(&dev, target_fd);
    }
    let fd = open(path, flags, mode).map_err(|e| io_err(path, e))?;
    dup2(fd, target_fd).map_err(|e| io_err(path, e))?;
    let _ = close(fd);
    Ok(())
}

fn dup_fd(src: i32, dst: i32) -> Result<(), ShellError> {
    dup2(src, dst).map_err(|e| io_err("dup2", e))?;
    Ok(())
}

/// `N>&M` / `N<&M` (duplicate) and `N>&-` / `N<&-` (close), per spec.md
/// §4.5. The target text is the raw word after the `&`: digits or `-`.
fn apply_fd_dup(target: &str, fd: i32) -> Result<(), ShellError> {
    if target == "-" {
        let _ = close(fd);
        return Ok(());
    }
    let src: i32 = target
        .parse()
        .map_err(|_| ShellError::InvalidRedirection(format!("invalid fd target: {}", target)))?;
    dup2(src, fd).map_err(|e| io_err("dup2", e))?;
    Ok(())
}

/// Heredoc / herestring: a pipe, a forked writer child, the parent
/// duplicates the read end over fd 0 (spec.md §4.5).
fn apply_heredoc(body: &str, fd: i32) -> Result<(), ShellError> {
    write_via_pipe(body.as_bytes(), fd)
}

fn apply_herestring(text: &str, fd: i32) -> Result<(), ShellError> {
    let mut body = text.to_string();
    body.push('\n');
    write_via_pipe(body.as_bytes(), fd)
}

/// Forks a writer so a heredoc body larger than the pipe buffer can never
/// deadlock the parent (spec.md §5, §9 "Heredoc writer").
fn write_via_pipe(body: &[u8], target_fd: i32) -> Result<(), ShellError> {
    use nix::sys::wait::waitpid;
    use nix::unistd::{fork, ForkResult};

    let (read_end, write_end) = pipe().map_err(|e| io_err("pipe", e))?;
    match unsafe { fork() }.map_err(|e| io_err("fork", e))? {
        ForkResult::Child => {
            let _ = close(read_end);
            let mut remaining = body;
            while !remaining.is_empty() {
                match write(unsafe { std::os::fd::BorrowedFd::borrow_raw(write_end) }, remaining) {
                    Ok(0) => break,
                    Ok(n) => remaining = &remaining[n..],
                    Err(nix::errno::Errno::EINTR) => continue,
                    Err(_) => break,
                }
            }
            let _ = close(write_end);
            std::process::exit(0);
        }
        ForkResult::Parent { child } => {
            let _ = close(write_end);
            dup2(read_end, target_fd).map_err(|e| io_err("dup2", e))?;
            let _ = close(read_end);
            let _ = waitpid(child, None);
            Ok(())
        }
    }
}

fn io_err(what: &str, e: nix::errno::Errno) -> ShellError {
    match e {
        nix::errno::Errno::ENOENT => ShellError::NoSuchFile(what.to_string()),
        nix::errno::Errno::EACCES => ShellError::NotExecutable(what.to_string()),
        _ => ShellError::System("redirection", std::io::Error::from(e)),
    }
}

// ---------------------------------------------------------------------------
// /dev/tcp and /dev/udp virtual paths (spec.md §4.5, §6)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevNetPath {
    pub host: String,
    pub port: u16,
    pub is_tcp: bool,
}

/// Parses spec.md §6's exact grammar:
/// `"/dev/tcp/" HOST "/" PORT | "/dev/udp/" HOST "/" PORT`.
pub fn parse_dev_net_path(path: &str) -> Option<DevNetPath> {
    let (is_tcp, rest) = if let Some(r) = path.strip_prefix("/dev/tcp/") {
        (true, r)
    } else if let Some(r) = path.strip_prefix("/dev/udp/") {
        (false, r)
    } else {
        return None;
    };

    let (host, port_str) = if let Some(bracket_end) = rest.find(']') {
        if !rest.starts_with('[') {
            return None;
        }
        let host = rest[1..bracket_end].to_string();
        let remainder = rest.get(bracket_end + 1..)?;
        let port_str = remainder.strip_prefix('/')?;
        (host, port_str)
    } else {
        let slash = rest.find('/')?;
        (rest[..slash].to_string(), &rest[slash + 1..])
    };

    let port: u16 = port_str.parse().ok()?;
    if port == 0 {
        return None;
    }
    Some(DevNetPath { host, port, is_tcp })
}

fn open_dev_net(dev: &DevNetPath, target_fd: i32) -> Result<(), ShellError> {
    let addr = format!("{}:{}", dev.host, dev.port);
    let raw_fd: RawFd = if dev.is_tcp {
        let stream = connect_first(&addr).map_err(|e| {
            ShellError::Other(format!("/dev/tcp/{}/{}: {}", dev.host, dev.port, e))
        })?;
        stream.into_raw_fd()
    } else {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .and_then(|s| {
                s.connect(&addr)?;
                Ok(s)
            })
            .map_err(|e| ShellError::Other(format!("/dev/udp/{}/{}: {}", dev.host, dev.port, e)))?;
        socket.into_raw_fd()
    };
    dup2(raw_fd, target_fd).map_err(|e| io_err("dup2", e))?;
    let _ = close(raw_fd);
    Ok(())
}

fn connect_first(addr: &str) -> std::io::Result<TcpStream> {
    let mut last_err = None;
    for socket_addr in addr.to_socket_addrs()? {
        match TcpStream::connect(socket_addr) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address resolved")))
}

/// Opens one end of a process-substitution pipe and returns a
/// `/dev/fd/N`-style path referencing the *other* end, which stays open
/// in this process (spec.md §3 `ProcessSub`). The caller owns `keep_fd`
/// and is responsible for closing it once the consuming command exits.
pub fn open_process_substitution_pipe() -> Result<(RawFd, RawFd), ShellError> {
    let (read_end, write_end) = pipe().map_err(|e| io_err("pipe", e))?;
    Ok((read_end.into_raw_fd(), write_end.into_raw_fd()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_ipv4() {
        let p = parse_dev_net_path("/dev/tcp/127.0.0.1/8080").unwrap();
        assert_eq!(p.host, "127.0.0.1");
        assert_eq!(p.port, 8080);
        assert!(p.is_tcp);
    }

    #[test]
    fn parses_udp_ipv6() {
        let p = parse_dev_net_path("/dev/udp/[::1]/53").unwrap();
        assert_eq!(p.host, "::1");
        assert_eq!(p.port, 53);
        assert!(!p.is_tcp);
    }

    #[test]
    fn rejects_non_dev_net_path() {
        assert!(parse_dev_net_path("/tmp/foo").is_none());
    }

    #[test]
    fn rejects_port_zero() {
        assert!(parse_dev_net_path("/dev/tcp/localhost/0").is_none());
    }
}
