//! The `Expander` collaborator (spec.md §6): `expand(word, context) ->
//! sequence of bytes`. spec.md scopes expansion *semantics* out of the
//! core ("the expander is an injected dependency"), but a shell that
//! cannot expand `$VAR`, `$(cmd)`, `~`, `{a,b}`, or a glob cannot run the
//! end-to-end scenarios in spec.md §8 — so this module is the default
//! implementation SPEC_FULL.md §6 commits to, wired behind the same
//! `Expander` trait a future alternative expansion engine could replace.
//!
//! Command and process substitution need to invoke the executor
//! recursively (`$(cmd)` runs `cmd` and captures its stdout); rather than
//! a circular module dependency, the executor hands the expander a
//! `&mut dyn CommandRunner` for the duration of one expansion call,
//! mirroring the teacher's `CommandSubstitutionFn` callback in
//! `src/interpreter/word_expansion.rs` (`Box<dyn Fn(&str, &mut
//! InterpreterState) -> ExecResult>`) but as a trait object instead of a
//! boxed closure, since this crate's runner also needs to open real pipes
//! for process substitution.

use std::path::PathBuf;

use crate::arith;
use crate::ast::types::*;
use crate::errors::ShellError;
use crate::glob_match;
use crate::shell::Shell;

/// Callback surface the expander needs from the executor. Implemented by
/// `crate::executor::Executor`.
pub trait CommandRunner {
    /// Runs `body` as a subshell, returning its captured stdout (bash
    /// strips trailing newlines) and exit status.
    fn run_captured(&mut self, body: &ScriptNode, shell: &mut Shell) -> Result<(String, i32), ShellError>;

    /// Runs `body` as a background process wired to one end of a pipe,
    /// returning a `/dev/fd/N`-style path for the other end (spec.md §3
    /// `ProcessSub`). The fd stays open in this process until the caller
    /// (the executor, after the enclosing simple command finishes) closes
    /// it via `shell.jobs` bookkeeping — see `Shell::pending_procsub_fds`.
    fn run_process_substitution(
        &mut self,
        body: &ScriptNode,
        direction: ProcessDirection,
        shell: &mut Shell,
    ) -> Result<String, ShellError>;

    /// Enters a nested expansion scope (spec.md §4.6 `ExpansionMemoryPool`):
    /// one per `expand_word`/`expand_word_no_split` call, since each of
    /// those can recurse into command/arithmetic substitution that
    /// allocates its own scratch strings. Default no-op for callers (e.g.
    /// tests) that don't care about arena bookkeeping; `Executor` backs
    /// this with a real `ExpansionMemoryPool`.
    fn push_expansion_scope(&mut self) -> usize {
        0
    }

    /// Releases everything allocated since the matching `push_expansion_scope`.
    fn pop_expansion_scope(&mut self, _mark: usize) {}
}

/// `Suggester`: typo correction for "command not found" (spec.md §6).
pub trait Suggester {
    fn suggest(&self, unknown_name: &str) -> Option<String>;
}

/// Default suggester: Levenshtein distance against `PATH` executables and
/// builtin names, bash-completion style. Grounded on the same idea as
/// `did-you-mean`-style corrections; kept intentionally small since
/// spec.md scopes this as "optional" ("may emit").
pub struct DefaultSuggester {
    pub candidates: Vec<String>,
}

impl Suggester for DefaultSuggester {
    fn suggest(&self, unknown_name: &str) -> Option<String> {
        let mut best: Option<(usize, &str)> = None;
        for candidate in &self.candidates {
            let dist = edit_distance(unknown_name, candidate);
            if dist <= 2 && best.map(|(d, _)| dist < d).unwrap_or(true) {
                best = Some((dist, candidate));
            }
        }
        best.map(|(_, name)| format!("{}: command not found. Did you mean '{}'?", unknown_name, name))
    }
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let cur = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = cur;
        }
    }
    row[b.len()]
}

/// `ConfigLoader`: `loadConfig() -> new config` (spec.md §6). No
/// file-backed implementation ships with this crate — config loading is
/// explicitly out of scope (spec.md §1) — but the trait is the seam an
/// enclosing shell's `reload` built-in would call through.
pub trait ConfigLoader {
    fn load_config(&self) -> crate::shell::ShellOptions;
}

/// One output field plus whether any byte in it came from a quoted or
/// escaped source. A field that is entirely unquoted is eligible for IFS
/// splitting and pathname expansion; anything touched by quoting is not
/// split further and (per spec.md's open question) never re-glob-matched.
#[derive(Debug, Clone)]
struct Piece {
    text: String,
    quoted: bool,
}

/// Expands a single `Word` into zero or more argv/redirection-target
/// strings: brace expansion, then parameter/command/arithmetic expansion,
/// then field splitting, then pathname expansion — bash's order.
pub fn expand_word(
    word: &WordNode,
    shell: &mut Shell,
    runner: &mut dyn CommandRunner,
) -> Result<Vec<String>, ShellError> {
    let mark = runner.push_expansion_scope();
    let result = expand_word_scoped(word, shell, runner);
    runner.pop_expansion_scope(mark);
    result
}

fn expand_word_scoped(
    word: &WordNode,
    shell: &mut Shell,
    runner: &mut dyn CommandRunner,
) -> Result<Vec<String>, ShellError> {
    let mut out = Vec::new();
    for alt in expand_braces(word) {
        let pieces = expand_parts(&alt.parts, shell, runner)?;
        let fields = split_fields(&pieces, shell);
        for field in fields {
            out.extend(glob_expand_field(field, shell));
        }
    }
    Ok(out)
}

/// Expands a word the way a redirection target or heredoc delimiter is
/// expanded: no field splitting, no pathname expansion, brace expansion
/// still applies bash-compatibly only to plain words (redirection targets
/// skip it). Returns the single resulting string.
pub fn expand_word_no_split(
    word: &WordNode,
    shell: &mut Shell,
    runner: &mut dyn CommandRunner,
) -> Result<String, ShellError> {
    let mark = runner.push_expansion_scope();
    let result = expand_parts(&word.parts, shell, runner).map(|pieces| pieces.into_iter().map(|p| p.text).collect());
    runner.pop_expansion_scope(mark);
    result
}

// ---------------------------------------------------------------------------
// Brace expansion
// ---------------------------------------------------------------------------

fn expand_braces(word: &WordNode) -> Vec<WordNode> {
    for (i, part) in word.parts.iter().enumerate() {
        if let WordPart::BraceExpansion(brace) = part {
            let alternatives = brace_alternatives(brace);
            let mut out = Vec::new();
            for alt_parts in alternatives {
                let mut parts = word.parts[..i].to_vec();
                parts.extend(alt_parts);
                parts.extend(word.parts[i + 1..].to_vec());
                let spliced = WordNode { parts };
                out.extend(expand_braces(&spliced));
            }
            return out;
        }
    }
    vec![word.clone()]
}

fn brace_alternatives(brace: &BraceExpansionPart) -> Vec<Vec<WordPart>> {
    let mut out = Vec::new();
    for item in &brace.items {
        match item {
            BraceItem::Word { word } => out.push(word.parts.clone()),
            BraceItem::Range { start, end, step, .. } => {
                for text in expand_range(start, end, *step) {
                    out.push(vec![WordPart::Literal(LiteralPart { value: text })]);
                }
            }
        }
    }
    out
}

fn expand_range(start: &BraceRangeValue, end: &BraceRangeValue, step: Option<i64>) -> Vec<String> {
    match (start, end) {
        (BraceRangeValue::Number(s), BraceRangeValue::Number(e)) => {
            let step = step.unwrap_or(1).unsigned_abs().max(1) as i64;
            let mut out = Vec::new();
            if s <= e {
                let mut v = *s;
                while v <= *e {
                    out.push(v.to_string());
                    v += step;
                }
            } else {
                let mut v = *s;
                while v >= *e {
                    out.push(v.to_string());
                    v -= step;
                }
            }
            out
        }
        (BraceRangeValue::Char(s), BraceRangeValue::Char(e)) => {
            let step = step.unwrap_or(1).unsigned_abs().max(1) as u32;
            let (s, e) = (*s as u32, *e as u32);
            let mut out = Vec::new();
            if s <= e {
                let mut v = s;
                while v <= e {
                    if let Some(c) = char::from_u32(v) {
                        out.push(c.to_string());
                    }
                    v += step;
                }
            } else {
                let mut v = s;
                while v >= e {
                    if let Some(c) = char::from_u32(v) {
                        out.push(c.to_string());
                    }
                    if v < step {
                        break;
                    }
                    v -= step;
                }
            }
            out
        }
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Part expansion
// ---------------------------------------------------------------------------

fn expand_parts(
    parts: &[WordPart],
    shell: &mut Shell,
    runner: &mut dyn CommandRunner,
) -> Result<Vec<Piece>, ShellError> {
    let mut out = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        expand_part(part, i == 0, shell, runner, &mut out)?;
    }
    Ok(out)
}

fn expand_part(
    part: &WordPart,
    is_first: bool,
    shell: &mut Shell,
    runner: &mut dyn CommandRunner,
    out: &mut Vec<Piece>,
) -> Result<(), ShellError> {
    match part {
        WordPart::Literal(l) => out.push(Piece { text: l.value.clone(), quoted: false }),
        WordPart::Glob(g) => out.push(Piece { text: g.pattern.clone(), quoted: false }),
        WordPart::SingleQuoted(s) => out.push(Piece { text: s.value.clone(), quoted: true }),
        WordPart::Escaped(e) => out.push(Piece { text: e.value.clone(), quoted: true }),
        WordPart::DoubleQuoted(dq) => {
            let inner = expand_parts(&dq.parts, shell, runner)?;
            let text: String = inner.into_iter().map(|p| p.text).collect();
            out.push(Piece { text, quoted: true });
        }
        WordPart::TildeExpansion(t) => {
            out.push(Piece { text: expand_tilde(t, shell), quoted: true });
        }
        WordPart::ParameterExpansion(p) => {
            let text = expand_parameter(p, shell, runner)?;
            out.push(Piece { text, quoted: false });
        }
        WordPart::CommandSubstitution(c) => {
            let (mut text, _status) = runner.run_captured(&c.body, shell)?;
            while text.ends_with('\n') {
                text.pop();
            }
            out.push(Piece { text, quoted: false });
        }
        WordPart::ArithmeticExpansion(a) => {
            let value = arith::eval(&a.expression.expression, shell)?;
            out.push(Piece { text: value.to_string(), quoted: false });
        }
        WordPart::ProcessSubstitution(p) => {
            let path = runner.run_process_substitution(&p.body, p.direction, shell)?;
            out.push(Piece { text: path, quoted: true });
        }
        WordPart::BraceExpansion(_) => {
            // Already resolved by `expand_braces` before this pass runs.
            let _ = is_first;
        }
    }
    Ok(())
}

fn expand_tilde(t: &TildeExpansionPart, shell: &Shell) -> String {
    match &t.user {
        None => shell.get_var("HOME").unwrap_or("/").to_string(),
        Some(user) if user.is_empty() => shell.get_var("HOME").unwrap_or("/").to_string(),
        Some(user) => {
            // No nss lookup dependency; fall back to /home/<user>, the
            // common case, consistent with the teacher's sandboxed
            // default layout.
            format!("/home/{}", user)
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter expansion
// ---------------------------------------------------------------------------

fn expand_parameter(
    p: &ParameterExpansionPart,
    shell: &mut Shell,
    runner: &mut dyn CommandRunner,
) -> Result<String, ShellError> {
    let raw = lookup_parameter(&p.parameter, shell);
    match &p.operation {
        None => {
            check_nounset(&p.parameter, raw.is_none(), shell)?;
            Ok(raw.unwrap_or_default())
        }
        Some(op) => apply_operation(&p.parameter, raw, op, shell, runner),
    }
}

/// `nounset`/`set -u` (spec.md §3 `Shell.nounset`): referencing an unset
/// parameter is an error, except through the forms that define their own
/// unset handling (`:-`, `:=`, `:?`, `:+`) and the always-set special
/// parameters.
fn check_nounset(name: &str, is_unset: bool, shell: &Shell) -> Result<(), ShellError> {
    if is_unset && shell.options.nounset && !matches!(name, "?" | "$" | "#" | "@" | "*" | "!" | "0") {
        Err(ShellError::Other(format!("{}: unbound variable", name)))
    } else {
        Ok(())
    }
}

fn lookup_parameter(name: &str, shell: &Shell) -> Option<String> {
    match name {
        "?" => Some(shell.last_exit_code.to_string()),
        "$" => Some(shell.pid.to_string()),
        "#" => Some(shell.positional().params.len().to_string()),
        "@" | "*" => Some(shell.positional().params.join(" ")),
        "!" => shell.last_bg_pid.map(|p| p.to_string()),
        "0" => Some(shell.shell_name.clone()),
        "RANDOM" => Some((rand::random::<u16>() % 32768).to_string()),
        n if n.chars().all(|c| c.is_ascii_digit()) && !n.is_empty() => {
            let idx: usize = n.parse().unwrap_or(0);
            shell.positional().params.get(idx.saturating_sub(1)).cloned()
        }
        _ => shell.get_var(name).map(|s| s.to_string()),
    }
}

fn apply_operation(
    name: &str,
    raw: Option<String>,
    op: &ParameterOperation,
    shell: &mut Shell,
    runner: &mut dyn CommandRunner,
) -> Result<String, ShellError> {
    match op {
        ParameterOperation::Inner(inner) => apply_inner(name, raw, inner, shell, runner),
        ParameterOperation::Indirection(ind) => {
            let target_name = raw.unwrap_or_default();
            let resolved = lookup_parameter(&target_name, shell);
            match &ind.inner_op {
                Some(inner_op) => apply_inner(&target_name, resolved, inner_op, shell, runner),
                None => {
                    check_nounset(&target_name, resolved.is_none(), shell)?;
                    Ok(resolved.unwrap_or_default())
                }
            }
        }
        ParameterOperation::ArrayKeys(keys) => {
            // No real array storage; treat `${!arr[@]}` as the single
            // scalar index 0 if the variable is set, matching how this
            // crate represents arrays as `name[idx]`-keyed scalars.
            let _ = keys.star;
            if shell.get_var(&keys.array).is_some() {
                Ok("0".to_string())
            } else {
                Ok(String::new())
            }
        }
        ParameterOperation::VarNamePrefix(prefix) => {
            let mut names: Vec<&str> = shell
                .env
                .keys()
                .chain(shell.locals.keys())
                .map(|s| s.as_str())
                .filter(|n| n.starts_with(&prefix.prefix))
                .collect();
            names.sort_unstable();
            names.dedup();
            let sep = if prefix.star { " " } else { " " };
            Ok(names.join(sep))
        }
    }
}

fn apply_inner(
    name: &str,
    raw: Option<String>,
    op: &InnerParameterOperation,
    shell: &mut Shell,
    runner: &mut dyn CommandRunner,
) -> Result<String, ShellError> {
    use InnerParameterOperation::*;
    let is_unset = raw.is_none();
    let is_empty = raw.as_deref().map(str::is_empty).unwrap_or(true);
    let handles_unset_itself = matches!(op, DefaultValue(_) | AssignDefault(_) | ErrorIfUnset(_) | UseAlternative(_));
    if !handles_unset_itself {
        check_nounset(name, is_unset, shell)?;
    }
    match op {
        Length(_) => Ok(raw.unwrap_or_default().chars().count().to_string()),
        LengthSliceError(_) | BadSubstitution(_) => Ok(String::new()),
        DefaultValue(d) => {
            if is_unset || (d.check_empty && is_empty) {
                Ok(expand_word_no_split(&d.word, shell, runner)?)
            } else {
                Ok(raw.unwrap_or_default())
            }
        }
        AssignDefault(d) => {
            if is_unset || (d.check_empty && is_empty) {
                let value = expand_word_no_split(&d.word, shell, runner)?;
                shell.set_var(name, value.clone());
                Ok(value)
            } else {
                Ok(raw.unwrap_or_default())
            }
        }
        ErrorIfUnset(d) => {
            if is_unset || (d.check_empty && is_empty) {
                let msg = match &d.word {
                    Some(w) => expand_word_no_split(w, shell, runner)?,
                    None => "parameter null or not set".to_string(),
                };
                Err(ShellError::Other(format!("{}: {}", name, msg)))
            } else {
                Ok(raw.unwrap_or_default())
            }
        }
        UseAlternative(d) => {
            if is_unset || (d.check_empty && is_empty) {
                Ok(String::new())
            } else {
                Ok(expand_word_no_split(&d.word, shell, runner)?)
            }
        }
        Substring(s) => {
            let text = raw.unwrap_or_default();
            let chars: Vec<char> = text.chars().collect();
            let len = chars.len() as i64;
            let mut offset = arith::eval(&s.offset.expression, shell)?;
            if offset < 0 {
                offset = (len + offset).max(0);
            }
            let offset = offset.min(len) as usize;
            let count = match &s.length {
                None => chars.len() - offset,
                Some(l) => {
                    let mut n = arith::eval(&l.expression, shell)?;
                    if n < 0 {
                        n = (len - offset as i64 + n).max(0);
                    }
                    n.max(0) as usize
                }
            };
            Ok(chars.into_iter().skip(offset).take(count).collect())
        }
        PatternRemoval(p) => {
            let text = raw.unwrap_or_default();
            let pattern = expand_word_no_split(&p.pattern, shell, runner)?;
            match p.side {
                PatternRemovalSide::Prefix => match glob_match::match_prefix_len(&pattern, &text, p.greedy) {
                    Some(n) => Ok(text[n..].to_string()),
                    None => Ok(text),
                },
                PatternRemovalSide::Suffix => match glob_match::match_suffix_len(&pattern, &text, p.greedy) {
                    Some(n) => Ok(text[..n].to_string()),
                    None => Ok(text),
                },
            }
        }
        PatternReplacement(p) => {
            let text = raw.unwrap_or_default();
            let pattern = expand_word_no_split(&p.pattern, shell, runner)?;
            let replacement = match &p.replacement {
                Some(w) => expand_word_no_split(w, shell, runner)?,
                None => String::new(),
            };
            let anchored_pattern = match p.anchor {
                Some(PatternAnchor::Start) => format!("{}*", pattern),
                Some(PatternAnchor::End) => format!("*{}", pattern),
                None => pattern,
            };
            if p.all {
                let matches = glob_match::find_all(&anchored_pattern, &text);
                Ok(splice_matches(&text, &matches, &replacement))
            } else {
                match glob_match::find_first(&anchored_pattern, &text) {
                    Some((s, e)) => Ok(splice_matches(&text, &[(s, e)], &replacement)),
                    None => Ok(text),
                }
            }
        }
        CaseModification(c) => {
            let text = raw.unwrap_or_default();
            Ok(apply_case_modification(&text, c))
        }
        Transform(t) => Ok(apply_transform(raw.unwrap_or_default(), t.operator)),
    }
}

fn splice_matches(text: &str, matches: &[(usize, usize)], replacement: &str) -> String {
    let mut out = String::new();
    let mut last = 0;
    for &(s, e) in matches {
        out.push_str(&text[last..s]);
        out.push_str(replacement);
        last = e;
    }
    out.push_str(&text[last..]);
    out
}

fn apply_case_modification(text: &str, c: &CaseModificationOp) -> String {
    let should_apply = |ch: char| -> bool {
        match &c.pattern {
            None => true,
            Some(w) => {
                let pat: String = w
                    .parts
                    .iter()
                    .filter_map(|p| match p {
                        WordPart::Literal(l) => Some(l.value.clone()),
                        _ => None,
                    })
                    .collect();
                glob_match::matches(&pat, &ch.to_string())
            }
        }
    };
    let transform = |ch: char| -> char {
        match c.direction {
            CaseDirection::Upper => ch.to_ascii_uppercase(),
            CaseDirection::Lower => ch.to_ascii_lowercase(),
        }
    };
    if c.all {
        text.chars().map(|ch| if should_apply(ch) { transform(ch) } else { ch }).collect()
    } else {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => {
                let rest: String = chars.collect();
                let first = if should_apply(first) { transform(first) } else { first };
                format!("{}{}", first, rest)
            }
            None => String::new(),
        }
    }
}

fn apply_transform(text: String, op: TransformOperator) -> String {
    match op {
        TransformOperator::U => text.to_ascii_uppercase(),
        TransformOperator::L => text.to_ascii_lowercase(),
        TransformOperator::Q => shell_quote(&text),
        TransformOperator::LowerK | TransformOperator::K => text,
        _ => text,
    }
}

fn shell_quote(text: &str) -> String {
    if text.is_empty() {
        return "''".to_string();
    }
    if text.chars().all(|c| c.is_alphanumeric() || "_./-".contains(c)) {
        return text.to_string();
    }
    format!("'{}'", text.replace('\'', "'\\''"))
}

// ---------------------------------------------------------------------------
// Field splitting (IFS)
// ---------------------------------------------------------------------------

fn split_fields(pieces: &[Piece], shell: &Shell) -> Vec<String> {
    if pieces.is_empty() {
        return Vec::new();
    }
    let ifs: Vec<char> = shell.get_var("IFS").unwrap_or(" \t\n").chars().collect();
    if ifs.is_empty() {
        // IFS='' disables splitting entirely: join everything verbatim.
        return vec![pieces.iter().map(|p| p.text.clone()).collect()];
    }
    let whitespace_ifs: Vec<char> = ifs.iter().copied().filter(|c| c.is_whitespace()).collect();

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut current_has_content = false;
    let mut any_unquoted = false;

    for piece in pieces {
        if piece.quoted {
            current.push_str(&piece.text);
            current_has_content = true;
            continue;
        }
        any_unquoted = true;
        let mut chars = piece.text.chars().peekable();
        while let Some(c) = chars.next() {
            if ifs.contains(&c) {
                if whitespace_ifs.contains(&c) {
                    // Collapse runs of whitespace IFS characters.
                    while chars.peek().map(|n| whitespace_ifs.contains(n)).unwrap_or(false) {
                        chars.next();
                    }
                }
                fields.push(std::mem::take(&mut current));
                current_has_content = false;
            } else {
                current.push(c);
                current_has_content = true;
            }
        }
    }
    if current_has_content || !any_unquoted || !fields.is_empty() {
        fields.push(current);
    }
    // Leading/trailing whitespace-only splits produce an empty field in
    // the loop above when the word starts/ends exactly on IFS; bash drops
    // those rather than producing an empty leading/trailing argument
    // unless the split character was non-whitespace.
    if fields.len() > 1 {
        if fields.first().map(String::is_empty).unwrap_or(false) {
            fields.remove(0);
        }
    }
    if fields.is_empty() {
        fields.push(String::new());
    }
    fields
}

// ---------------------------------------------------------------------------
// Pathname (glob) expansion
// ---------------------------------------------------------------------------

fn glob_expand_field(field: String, shell: &Shell) -> Vec<String> {
    if shell.options.noglob || shell.shopt.nullglob && field.is_empty() {
        return vec![field];
    }
    if !contains_glob_meta(&field) {
        return vec![field];
    }
    let base = shell.cwd();
    let pattern_path = if PathBuf::from(&field).is_absolute() {
        field.clone()
    } else {
        base.join(&field).to_string_lossy().into_owned()
    };
    match glob::glob(&pattern_path) {
        Ok(paths) => {
            let mut matched: Vec<String> = paths
                .filter_map(Result::ok)
                .filter_map(|p| {
                    if PathBuf::from(&field).is_absolute() {
                        Some(p.to_string_lossy().into_owned())
                    } else {
                        p.strip_prefix(&base).ok().map(|p| p.to_string_lossy().into_owned())
                    }
                })
                .collect();
            if matched.is_empty() {
                if shell.shopt.nullglob {
                    Vec::new()
                } else if shell.shopt.failglob {
                    vec![field]
                } else {
                    vec![field]
                }
            } else {
                matched.sort();
                matched
            }
        }
        Err(_) => vec![field],
    }
}

fn contains_glob_meta(s: &str) -> bool {
    s.contains('*') || s.contains('?') || s.contains('[')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::Shell;

    struct NoopRunner;
    impl CommandRunner for NoopRunner {
        fn run_captured(&mut self, _body: &ScriptNode, _shell: &mut Shell) -> Result<(String, i32), ShellError> {
            Ok((String::new(), 0))
        }
        fn run_process_substitution(
            &mut self,
            _body: &ScriptNode,
            _direction: ProcessDirection,
            _shell: &mut Shell,
        ) -> Result<String, ShellError> {
            Ok("/dev/fd/63".to_string())
        }
    }

    #[test]
    fn literal_word_passes_through() {
        let mut shell = Shell::new("test");
        let mut runner = NoopRunner;
        let word = WordNode { parts: vec![WordPart::Literal(LiteralPart { value: "hello".into() })] };
        assert_eq!(expand_word(&word, &mut shell, &mut runner).unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn unquoted_spaces_split_into_fields() {
        let mut shell = Shell::new("test");
        let mut runner = NoopRunner;
        let word = WordNode { parts: vec![WordPart::Literal(LiteralPart { value: "a b  c".into() })] };
        assert_eq!(
            expand_word(&word, &mut shell, &mut runner).unwrap(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn double_quoted_preserves_spaces() {
        let mut shell = Shell::new("test");
        let mut runner = NoopRunner;
        let word = WordNode {
            parts: vec![WordPart::DoubleQuoted(DoubleQuotedPart {
                parts: vec![WordPart::Literal(LiteralPart { value: "a b  c".into() })],
            })],
        };
        assert_eq!(expand_word(&word, &mut shell, &mut runner).unwrap(), vec!["a b  c".to_string()]);
    }

    #[test]
    fn variable_expansion() {
        let mut shell = Shell::new("test");
        shell.set_var("FOO", "bar");
        let mut runner = NoopRunner;
        let word = WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: "FOO".into(),
                operation: None,
            })],
        };
        assert_eq!(expand_word(&word, &mut shell, &mut runner).unwrap(), vec!["bar".to_string()]);
    }

    #[test]
    fn default_value_operation() {
        let mut shell = Shell::new("test");
        let mut runner = NoopRunner;
        let op = ParameterOperation::Inner(InnerParameterOperation::DefaultValue(DefaultValueOp {
            word: WordNode { parts: vec![WordPart::Literal(LiteralPart { value: "fallback".into() })] },
            check_empty: true,
        }));
        let word = WordNode {
            parts: vec![WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: "UNSET".into(),
                operation: Some(op),
            })],
        };
        assert_eq!(expand_word(&word, &mut shell, &mut runner).unwrap(), vec!["fallback".to_string()]);
    }
}
