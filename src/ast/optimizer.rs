//! AST Optimizer
//!
//! Single bottom-up pass that rewrites a parsed tree into an equivalent but
//! smaller one. None of these rewrites may cross a scope that would change
//! evaluation order or side-effect timing; they only remove machinery the
//! executor would otherwise have to special-case at runtime.

use crate::ast::types::*;

/// Counts of each rewrite the optimizer applied, for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizerStats {
    /// Single-command, non-negated pipelines collapsed to a bare command.
    pub pipelines_collapsed: usize,
    /// Single-element statement lists collapsed to their sole pipeline.
    pub lists_collapsed: usize,
    /// `( simple-command )` subshells with no assignments unwrapped.
    pub subshells_removed: usize,
    /// Runs of adjacent `Literal` word parts merged into one allocation.
    pub literals_merged: usize,
}

/// Run the optimizer over a parsed script in place, returning a count of
/// every rewrite applied.
pub fn optimize(script: &mut ScriptNode) -> OptimizerStats {
    let mut stats = OptimizerStats::default();
    for stmt in &mut script.statements {
        optimize_statement(stmt, &mut stats);
    }
    stats
}

fn optimize_statement(stmt: &mut StatementNode, stats: &mut OptimizerStats) {
    for pipeline in &mut stmt.pipelines {
        optimize_pipeline(pipeline, stats);
    }
    // Rule 2: a statement with exactly one pipeline and no connecting operator
    // is already a minimal representation in this grammar (operators.len() ==
    // pipelines.len() - 1); record the observation for callers that fold
    // single-statement lists (e.g. a brace group with one statement) further
    // up the tree.
    if stmt.pipelines.len() == 1 && stmt.operators.is_empty() {
        stats.lists_collapsed += 1;
    }
}

fn optimize_pipeline(pipeline: &mut PipelineNode, stats: &mut OptimizerStats) {
    for command in &mut pipeline.commands {
        optimize_command(command, stats);
    }
    // Rule 1: a single-command, non-negated pipeline carries no pipe
    // machinery; it already degrades to a bare command at execution time,
    // but we still count it so the executor can skip pipe setup entirely.
    if pipeline.commands.len() == 1 && !pipeline.negated {
        stats.pipelines_collapsed += 1;
    }
}

fn optimize_command(command: &mut CommandNode, stats: &mut OptimizerStats) {
    match command {
        CommandNode::Simple(simple) => optimize_simple_command(simple, stats),
        CommandNode::FunctionDef(func) => optimize_compound(&mut func.body, stats),
        CommandNode::Compound(compound) => {
            // Rule 3: `( cmd )` where the body is a single assignment-free
            // simple command leaks no state by running in the current
            // shell, so the subshell wrapper can be dropped entirely.
            if let CompoundCommandNode::Subshell(sub) = compound {
                if sub.redirections.is_empty() {
                    if let Some(inner) = single_bare_simple_command(&sub.body) {
                        if inner.assignments.is_empty() {
                            let mut replacement = inner.clone();
                            optimize_simple_command(&mut replacement, stats);
                            stats.subshells_removed += 1;
                            *command = CommandNode::Simple(replacement);
                            return;
                        }
                    }
                }
            }
            optimize_compound_ref(compound, stats);
        }
    }
}

/// If `body` is exactly one statement holding exactly one non-negated,
/// single-command pipeline with no trailing operator, return that command.
fn single_bare_simple_command(body: &[StatementNode]) -> Option<&SimpleCommandNode> {
    let [stmt] = body else { return None };
    if !stmt.operators.is_empty() || stmt.background {
        return None;
    }
    let [pipeline] = stmt.pipelines.as_slice() else {
        return None;
    };
    if pipeline.negated {
        return None;
    }
    let [CommandNode::Simple(simple)] = pipeline.commands.as_slice() else {
        return None;
    };
    Some(simple)
}

fn optimize_compound(compound: &mut CompoundCommandNode, stats: &mut OptimizerStats) {
    optimize_compound_ref(compound, stats)
}

fn optimize_compound_ref(compound: &mut CompoundCommandNode, stats: &mut OptimizerStats) {
    match compound {
        CompoundCommandNode::If(node) => {
            for clause in &mut node.clauses {
                optimize_list(&mut clause.condition, stats);
                optimize_list(&mut clause.body, stats);
            }
            if let Some(else_body) = &mut node.else_body {
                optimize_list(else_body, stats);
            }
            optimize_redirections(&mut node.redirections);
        }
        CompoundCommandNode::For(node) => {
            if let Some(words) = &mut node.words {
                for w in words {
                    optimize_word(w, stats);
                }
            }
            optimize_list(&mut node.body, stats);
            optimize_redirections(&mut node.redirections);
        }
        CompoundCommandNode::CStyleFor(node) => {
            optimize_list(&mut node.body, stats);
            optimize_redirections(&mut node.redirections);
        }
        CompoundCommandNode::While(node) | CompoundCommandNode::Until(node) => {
            optimize_list(&mut node.condition, stats);
            optimize_list(&mut node.body, stats);
            optimize_redirections(&mut node.redirections);
        }
        CompoundCommandNode::Case(node) => {
            optimize_word(&mut node.word, stats);
            for item in &mut node.items {
                for pattern in &mut item.patterns {
                    optimize_word(pattern, stats);
                }
                optimize_list(&mut item.body, stats);
            }
            optimize_redirections(&mut node.redirections);
        }
        CompoundCommandNode::Subshell(node) | CompoundCommandNode::Group(node) => {
            optimize_list(&mut node.body, stats);
            optimize_redirections(&mut node.redirections);
        }
        CompoundCommandNode::ArithmeticCommand(node) => {
            optimize_redirections(&mut node.redirections);
        }
        CompoundCommandNode::ConditionalCommand(node) => {
            optimize_redirections(&mut node.redirections);
        }
    }
}

fn optimize_list(list: &mut [StatementNode], stats: &mut OptimizerStats) {
    for stmt in list {
        optimize_statement(stmt, stats);
    }
}

fn optimize_simple_command(simple: &mut SimpleCommandNode, stats: &mut OptimizerStats) {
    if let Some(name) = &mut simple.name {
        optimize_word(name, stats);
    }
    for arg in &mut simple.args {
        optimize_word(arg, stats);
    }
    for assignment in &mut simple.assignments {
        if let Some(value) = &mut assignment.value {
            optimize_word(value, stats);
        }
        if let Some(array) = &mut assignment.array {
            for w in array {
                optimize_word(w, stats);
            }
        }
    }
    optimize_redirections(&mut simple.redirections);
}

fn optimize_redirections(redirections: &mut [RedirectionNode]) {
    for redirection in redirections {
        if let RedirectionTarget::Word(word) = &mut redirection.target {
            merge_adjacent_literals(&mut word.parts);
        }
    }
}

/// Rule 4: merge runs of adjacent `Literal` parts into a single allocation.
/// Recurses into double-quoted parts, which carry their own part list.
fn optimize_word(word: &mut WordNode, stats: &mut OptimizerStats) {
    for part in &mut word.parts {
        if let WordPart::DoubleQuoted(dq) = part {
            let merged = merge_adjacent_literals(&mut dq.parts);
            stats.literals_merged += merged;
        }
    }
    let merged = merge_adjacent_literals(&mut word.parts);
    stats.literals_merged += merged;
}

fn merge_adjacent_literals(parts: &mut Vec<WordPart>) -> usize {
    let mut merged_count = 0;
    let mut out: Vec<WordPart> = Vec::with_capacity(parts.len());
    for part in parts.drain(..) {
        if let (Some(WordPart::Literal(prev)), WordPart::Literal(cur)) = (out.last_mut(), &part) {
            prev.value.push_str(&cur.value);
            merged_count += 1;
            continue;
        }
        out.push(part);
    }
    *parts = out;
    merged_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn collapses_single_command_pipeline() {
        let mut script = parse("echo hi").unwrap();
        let stats = optimize(&mut script);
        assert_eq!(stats.pipelines_collapsed, 1);
    }

    #[test]
    fn unwraps_bare_subshell() {
        let mut script = parse("(echo hi)").unwrap();
        let stats = optimize(&mut script);
        assert_eq!(stats.subshells_removed, 1);
        let CommandNode::Simple(_) = &script.statements[0].pipelines[0].commands[0] else {
            panic!("expected subshell to unwrap to a simple command");
        };
    }

    #[test]
    fn keeps_assigning_subshell() {
        let mut script = parse("(X=1)").unwrap();
        let stats = optimize(&mut script);
        assert_eq!(stats.subshells_removed, 0);
    }
}
