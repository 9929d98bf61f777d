//! Local score file parser and writer for the bnsl network structure learner.
//!
//! A score file lists the local score of every variable for every candidate parent set:
//!
//! ```text
//! c comments start with a c
//! p scores 3
//! 0 1.0
//! 0 2.0 1
//! 0 3.5 2 1
//! ...
//! ```
//!
//! The header gives the number of variables. Each following line contains a variable, its score
//! and the variable's parents. Variables are 0-based. Every variable needs a score for each of the
//! `2^(n-1)` sets of other variables, given exactly once.

use std::{io, mem::replace};

use bnsl_types::{
    scores::parent_code_count, set::compact, ParentCode, ScoreTable, Var, VarSet,
};

use anyhow::Error;
use thiserror::Error;

mod random;

pub use random::random_scores;

/// Possible errors while parsing a score file.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {}: Unexpected input in score file: '{}'", line, unexpected)]
    UnexpectedInput { line: usize, unexpected: String },
    #[error("line {}: Invalid header syntax: {}", line, header)]
    InvalidHeader { line: usize, header: String },
    #[error("line {}: Scores given before the header", line)]
    MissingHeader { line: usize },
    #[error("line {}: Duplicated header", line)]
    DuplicateHeader { line: usize },
    #[error(
        "line {}: {} variables exceed the supported maximum of {}",
        line,
        var_count,
        max_count
    )]
    TooManyVars {
        line: usize,
        var_count: usize,
        max_count: usize,
    },
    #[error(
        "line {}: Variable {} out of range for {} variables",
        line,
        var,
        var_count
    )]
    VarOutOfRange {
        line: usize,
        var: usize,
        var_count: usize,
    },
    #[error("line {}: Variable {} listed as its own parent", line, var)]
    SelfParent { line: usize, var: usize },
    #[error("line {}: Parent {} listed twice", line, parent)]
    DuplicateParent { line: usize, parent: usize },
    #[error("line {}: Missing score", line)]
    IncompleteLine { line: usize },
    #[error("line {}: Invalid score: '{}'", line, score)]
    InvalidScore { line: usize, score: String },
    #[error(
        "line {}: Score of variable {} with parents {} given twice",
        line,
        var,
        parents
    )]
    DuplicateScore {
        line: usize,
        var: usize,
        parents: VarSet,
    },
    #[error(
        "{} scores missing, e.g. variable {} with parents {}",
        missing,
        var,
        parents
    )]
    MissingScores {
        missing: usize,
        var: usize,
        parents: VarSet,
    },
    #[error("Parser invoked after a previous error")]
    PreviousError,
}

/// Variable count present in a score file header.
#[derive(Copy, Clone, Debug)]
pub struct ScoreFileHeader {
    pub var_count: usize,
}

/// Parser for score files.
///
/// The input is consumed line by line. The table is allocated when the header is parsed.
#[derive(Default)]
pub struct ScoreFileParser {
    table: ScoreTable,
    header: Option<ScoreFileHeader>,
    /// Whether a score was given, for each entry of `table`.
    present: Vec<bool>,
    present_count: usize,
    /// Largest accepted variable count.
    var_limit: Option<usize>,

    line_number: usize,
    error: bool,
}

impl ScoreFileParser {
    /// Create a new score file parser.
    pub fn new() -> ScoreFileParser {
        ScoreFileParser::default()
    }

    /// Reject headers with more than `limit` variables before allocating the table.
    pub fn set_var_limit(&mut self, limit: usize) {
        self.var_limit = Some(limit);
    }

    /// Parse the given input and check that all scores are present.
    pub fn parse(input: impl io::Read) -> Result<ScoreTable, Error> {
        use io::BufRead;

        let buffer = io::BufReader::new(input);
        let mut parser = Self::new();

        for line in buffer.lines() {
            parser.parse_line(&line?)?;
        }

        Ok(parser.finish()?)
    }

    /// Parse a single line of input.
    ///
    /// If this method returns an error, the parser is in an invalid state and cannot parse further
    /// lines.
    pub fn parse_line(&mut self, line: &str) -> Result<(), ParserError> {
        if self.error {
            return Err(ParserError::PreviousError);
        }
        self.line_number += 1;

        let result = self.parse_line_inner(line);
        if result.is_err() {
            self.error = true;
        }
        result
    }

    /// Finish parsing and return the complete table.
    pub fn finish(&mut self) -> Result<ScoreTable, ParserError> {
        if self.error {
            return Err(ParserError::PreviousError);
        }

        if self.header.is_none() {
            return Err(ParserError::MissingHeader {
                line: self.line_number,
            });
        }

        if let Some(position) = self.present.iter().position(|&present| !present) {
            let row_len = self.table.row_len();
            let var = Var::from_index(position / row_len);
            let code = ParentCode::from_code((position % row_len) as _);
            return Err(ParserError::MissingScores {
                missing: self.present.len() - self.present_count,
                var: var.index(),
                parents: code.expand(var),
            });
        }

        self.present.clear();
        self.present_count = 0;
        Ok(replace(&mut self.table, ScoreTable::default()))
    }

    /// Return the header data if already parsed.
    pub fn header(&self) -> Option<ScoreFileHeader> {
        self.header
    }

    /// Number of scores parsed so far.
    pub fn score_count(&self) -> usize {
        self.present_count
    }

    fn parse_line_inner(&mut self, line: &str) -> Result<(), ParserError> {
        let mut tokens = line.split_whitespace();

        let first = match tokens.next() {
            None => return Ok(()),
            Some(token) => token,
        };

        match first {
            "c" => Ok(()),
            _ if first.starts_with('c') => Ok(()),
            "p" => self.parse_header(line, tokens),
            _ => self.parse_score(first, tokens),
        }
    }

    fn parse_header<'a>(
        &mut self,
        line: &str,
        mut values: impl Iterator<Item = &'a str>,
    ) -> Result<(), ParserError> {
        if self.header.is_some() {
            return Err(ParserError::DuplicateHeader {
                line: self.line_number,
            });
        }

        let line_number = self.line_number;
        let invalid_header = || ParserError::InvalidHeader {
            line: line_number,
            header: line.trim().to_owned(),
        };

        if values.next() != Some("scores") {
            return Err(invalid_header());
        }

        let var_count: usize = values
            .next()
            .and_then(|value| value.parse().ok())
            .ok_or_else(invalid_header)?;

        if values.next().is_some() {
            return Err(invalid_header());
        }

        let max_count = self
            .var_limit
            .map_or(Var::max_count(), |limit| limit.min(Var::max_count()));

        if var_count > max_count {
            return Err(ParserError::TooManyVars {
                line: self.line_number,
                var_count,
                max_count,
            });
        }

        self.header = Some(ScoreFileHeader { var_count });
        self.table = ScoreTable::new(var_count);
        self.present = vec![false; var_count * parent_code_count(var_count)];
        self.present_count = 0;

        Ok(())
    }

    fn parse_score<'a>(
        &mut self,
        first: &str,
        mut values: impl Iterator<Item = &'a str>,
    ) -> Result<(), ParserError> {
        let var_count = match self.header {
            None => {
                return Err(ParserError::MissingHeader {
                    line: self.line_number,
                })
            }
            Some(header) => header.var_count,
        };

        let var = self.parse_var(first, var_count)?;

        let score_str = values.next().ok_or(ParserError::IncompleteLine {
            line: self.line_number,
        })?;
        let score = match score_str.parse::<f64>() {
            Ok(score) if score.is_finite() => score,
            _ => {
                return Err(ParserError::InvalidScore {
                    line: self.line_number,
                    score: score_str.to_owned(),
                })
            }
        };

        let mut parents = VarSet::empty();
        for value in values {
            let parent = self.parse_var(value, var_count)?;
            if parent == var {
                return Err(ParserError::SelfParent {
                    line: self.line_number,
                    var: var.index(),
                });
            }
            if parents.contains(parent) {
                return Err(ParserError::DuplicateParent {
                    line: self.line_number,
                    parent: parent.index(),
                });
            }
            parents = parents.with(parent);
        }

        let position = var.index() * self.table.row_len() + compact(var, parents).index();
        if replace(&mut self.present[position], true) {
            return Err(ParserError::DuplicateScore {
                line: self.line_number,
                var: var.index(),
                parents,
            });
        }
        self.present_count += 1;
        self.table.set_score(var, parents, score);

        Ok(())
    }

    fn parse_var(&self, value: &str, var_count: usize) -> Result<Var, ParserError> {
        let index: usize = value.parse().map_err(|_| ParserError::UnexpectedInput {
            line: self.line_number,
            unexpected: value.to_owned(),
        })?;
        if index >= var_count {
            return Err(ParserError::VarOutOfRange {
                line: self.line_number,
                var: index,
                var_count,
            });
        }
        Ok(Var::from_index(index))
    }
}

/// Write a score file header.
///
/// Can be used with [`write_score_lines`] to implement incremental writing.
pub fn write_scores_header(target: &mut impl io::Write, header: ScoreFileHeader) -> io::Result<()> {
    writeln!(target, "p scores {var_count}", var_count = header.var_count)
}

/// Write all scores of the given variables without header.
///
/// Scores are written in shortest round-trip formatting, so reading them back gives the exact same
/// values.
pub fn write_score_lines(
    target: &mut impl io::Write,
    table: &ScoreTable,
    vars: impl IntoIterator<Item = Var>,
) -> io::Result<()> {
    for var in vars {
        for (code, score) in table.row(var).iter().enumerate() {
            itoa::write(&mut *target, var.index())?;
            write!(target, " {}", score)?;
            for parent in ParentCode::from_code(code as _).expand(var) {
                target.write_all(b" ")?;
                itoa::write(&mut *target, parent.index())?;
            }
            target.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Write a complete score table as score file.
pub fn write_scores(target: &mut impl io::Write, table: &ScoreTable) -> io::Result<()> {
    write_scores_header(
        &mut *target,
        ScoreFileHeader {
            var_count: table.var_count(),
        },
    )?;
    write_score_lines(
        &mut *target,
        table,
        (0..table.var_count()).map(Var::from_index),
    )
}
