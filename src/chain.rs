//! `CommandChain` / `ParsedCommand` (spec.md §3): the flat, executor-facing
//! view of a parsed chain — "when the enclosing shell wants to execute the
//! parsed tree, it converts the root into a flat `CommandChain`".
//!
//! The teacher's interpreter never flattens: it walks `StatementNode` /
//! `PipelineNode` directly (`src/interpreter/interpreter.rs`), and
//! `src/executor.rs` in this crate does the same for actual execution,
//! since the tree already carries everything the walk needs and flattening
//! would just be extra bookkeeping on every recursive call. `CommandChain`
//! exists here as the separate read-only *surface* spec.md §3 names: a
//! cheap derived view used by diagnostics (`set -x` history, the AST
//! pretty-printer's flat-chain mode) and by tests that want to assert
//! chain shape without matching on the full AST. Building one does not
//! consume or replace the tree it was built from.

use crate::ast::types::*;

/// spec.md §3 `CommandChain.operators` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Pipe,
    Semi,
    Bg,
}

/// spec.md §3 `ParsedCommand.kind` — resolved at chain-build time from the
/// AST shape alone (name resolution against the builtin table happens
/// later, in the executor, since it needs `&Shell`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Simple,
    Compound,
    Function,
}

/// One node of a flattened chain: a command plus enough of its source
/// shape to execute or display it without walking back into the AST.
#[derive(Debug, Clone)]
pub struct ParsedCommand<'a> {
    pub command: &'a CommandNode,
    pub negated: bool,
    pub kind: CommandKind,
}

/// spec.md §3 `CommandChain { commands, operators }`, with
/// `len(operators) == len(commands) - 1` (a trailing background `&`
/// collapses onto the last operator as `Bg` rather than appending an empty
/// slot, per spec.md's own parenthetical).
#[derive(Debug, Clone)]
pub struct CommandChain<'a> {
    pub commands: Vec<ParsedCommand<'a>>,
    pub operators: Vec<Operator>,
}

impl<'a> CommandChain<'a> {
    /// Flattens one `StatementNode` (a list of pipelines joined by
    /// `&&`/`||`/`;`) into a `CommandChain`. Each pipeline contributes one
    /// `ParsedCommand` per stage, joined internally by `Operator::Pipe`;
    /// `StatementOperator`s from the source become `And`/`Or`/`Semi`
    /// between pipelines. If the statement runs in the background, the
    /// final operator slot (or, for a single-pipeline statement, an
    /// otherwise-empty operator list) records `Operator::Bg`.
    pub fn from_statement(stmt: &'a StatementNode) -> Self {
        let mut commands = Vec::new();
        let mut operators = Vec::new();

        for (i, pipeline) in stmt.pipelines.iter().enumerate() {
            for (j, command) in pipeline.commands.iter().enumerate() {
                let kind = match command {
                    CommandNode::Simple(_) => CommandKind::Simple,
                    CommandNode::Compound(_) => CommandKind::Compound,
                    CommandNode::FunctionDef(_) => CommandKind::Function,
                };
                commands.push(ParsedCommand {
                    command,
                    negated: pipeline.negated && j == 0,
                    kind,
                });
                if j + 1 < pipeline.commands.len() {
                    operators.push(Operator::Pipe);
                }
            }
            if i + 1 < stmt.pipelines.len() {
                let op = match stmt.operators.get(i) {
                    Some(StatementOperator::And) => Operator::And,
                    Some(StatementOperator::Or) => Operator::Or,
                    _ => Operator::Semi,
                };
                operators.push(op);
            }
        }

        if stmt.background {
            if operators.is_empty() && commands.len() <= 1 {
                // Single bare command backgrounded: no operator slot exists
                // yet (len(operators) == len(commands) - 1 == 0), so there
                // is nothing to overwrite; the executor reads `background`
                // off the chain directly via `CommandChain::is_background`.
            } else if let Some(last) = operators.last_mut() {
                *last = Operator::Bg;
            }
        }

        Self { commands, operators }
    }

    pub fn is_background(&self, source: &StatementNode) -> bool {
        source.background
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn first_stmt(src: &str) -> ScriptNode {
        parse(src).unwrap()
    }

    #[test]
    fn pipeline_joins_stages_with_pipe_operator() {
        let script = first_stmt("a | b | c");
        let chain = CommandChain::from_statement(&script.statements[0]);
        assert_eq!(chain.commands.len(), 3);
        assert_eq!(chain.operators, vec![Operator::Pipe, Operator::Pipe]);
    }

    #[test]
    fn and_or_semi_preserved_between_pipelines() {
        let script = first_stmt("a && b || c; d");
        let chain = CommandChain::from_statement(&script.statements[0]);
        assert_eq!(chain.commands.len(), 4);
        assert_eq!(
            chain.operators,
            vec![Operator::And, Operator::Or, Operator::Semi]
        );
    }

    #[test]
    fn operators_len_is_commands_len_minus_one() {
        let script = first_stmt("a | b && c");
        let chain = CommandChain::from_statement(&script.statements[0]);
        assert_eq!(chain.operators.len(), chain.commands.len() - 1);
    }
}
