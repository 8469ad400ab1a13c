//! DIMACS CNF parser and writer for the tern SAT solver.
//!
//! The parser accepts the usual DIMACS CNF conventions: `c` lines are comments, a single
//! `p cnf <vars> <clauses>` problem line precedes all clauses, clauses are zero-terminated
//! sequences of signed integers and may span multiple lines, and a line starting with `%` ends
//! the input (as found in the SATLIB benchmark files). Literals whose variable exceeds the
//! problem line's variable count are a hard error.

use std::io;

use tern_formula::{CnfFormula, Lit, Var};

use thiserror::Error;

/// Possible errors while parsing a DIMACS CNF formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("IO error while reading DIMACS CNF input")]
    Io(#[from] io::Error),
    #[error("line {}: clause before DIMACS CNF problem line", line)]
    MissingHeader { line: usize },
    #[error("line {}: invalid problem line: {}", line, header)]
    InvalidHeader { line: usize, header: String },
    #[error("line {}: unexpected token in DIMACS CNF input: '{}'", line, token)]
    UnexpectedToken { line: usize, token: String },
    #[error(
        "line {}: literal {} outside the problem line's {} variables",
        line,
        literal,
        var_count
    )]
    LitOutOfRange {
        line: usize,
        literal: isize,
        var_count: usize,
    },
    #[error("line {}: unterminated clause", line)]
    UnterminatedClause { line: usize },
    #[error(
        "formula has {} clauses while the problem line specifies {}",
        clause_count,
        header_clause_count
    )]
    ClauseCount {
        clause_count: usize,
        header_clause_count: usize,
    },
}

/// Variable and clause count of a DIMACS CNF problem line.
#[derive(Copy, Clone, Debug)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

/// Parse a complete DIMACS CNF input into a formula.
pub fn parse_dimacs(input: impl io::Read) -> Result<CnfFormula, ParserError> {
    use io::BufRead;

    let mut formula = CnfFormula::new();
    let mut clause: Vec<Lit> = vec![];
    let mut header: Option<DimacsHeader> = None;
    let mut clause_count = 0;
    let mut line_number = 0;

    for line in io::BufReader::new(input).lines() {
        let line = line?;
        line_number += 1;
        let body = line.trim_start();

        if body.is_empty() || body.starts_with('c') {
            continue;
        }
        if body.starts_with('%') {
            break;
        }
        if body.starts_with('p') {
            if header.is_some() {
                return Err(ParserError::UnexpectedToken {
                    line: line_number,
                    token: "p".to_owned(),
                });
            }
            let parsed = parse_header(body, line_number)?;
            formula.set_var_count(parsed.var_count);
            header = Some(parsed);
            continue;
        }

        let header = match header {
            Some(ref header) => header,
            None => return Err(ParserError::MissingHeader { line: line_number }),
        };

        for token in body.split_whitespace() {
            let number: isize = token.parse().map_err(|_| ParserError::UnexpectedToken {
                line: line_number,
                token: token.to_owned(),
            })?;

            if number == 0 {
                formula.add_clause(&clause);
                clause.clear();
                clause_count += 1;
            } else {
                if number.abs() as usize > header.var_count {
                    return Err(ParserError::LitOutOfRange {
                        line: line_number,
                        literal: number,
                        var_count: header.var_count,
                    });
                }
                clause.push(Lit::from_dimacs(number));
            }
        }
    }

    if !clause.is_empty() {
        return Err(ParserError::UnterminatedClause { line: line_number });
    }

    match header {
        None => Err(ParserError::MissingHeader { line: line_number }),
        Some(header) if clause_count != header.clause_count => Err(ParserError::ClauseCount {
            clause_count,
            header_clause_count: header.clause_count,
        }),
        Some(_) => Ok(formula),
    }
}

fn parse_header(body: &str, line: usize) -> Result<DimacsHeader, ParserError> {
    let invalid = || ParserError::InvalidHeader {
        line,
        header: body.to_owned(),
    };

    let mut fields = body.split_whitespace();

    if fields.next() != Some("p") || fields.next() != Some("cnf") {
        return Err(invalid());
    }

    let var_count: usize = fields
        .next()
        .and_then(|value| value.parse().ok())
        .ok_or_else(invalid)?;

    if var_count > Var::max_count() {
        return Err(invalid());
    }

    let clause_count = fields
        .next()
        .and_then(|value| value.parse().ok())
        .ok_or_else(invalid)?;

    if fields.next().is_some() {
        return Err(invalid());
    }

    Ok(DimacsHeader {
        var_count,
        clause_count,
    })
}

/// Write a formula as DIMACS CNF.
pub fn write_dimacs(target: &mut impl io::Write, formula: &CnfFormula) -> io::Result<()> {
    writeln!(target, "p cnf {} {}", formula.var_count(), formula.len())?;
    for clause in formula.iter() {
        for &lit in clause {
            itoa::write(&mut *target, lit.to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use tern_formula::cnf::strategy::cnf_formula;
    use tern_formula::cnf_formula;

    fn parse_str(input: &str) -> Result<CnfFormula, ParserError> {
        parse_dimacs(input.as_bytes())
    }

    #[test]
    fn parses_simple_formula() {
        let formula = parse_str("c example\np cnf 3 2\n1 -2 0\n2 3 -1 0\n").unwrap();

        assert_eq!(formula, cnf_formula![1, -2; 2, 3, -1;]);
        assert_eq!(formula.var_count(), 3);
    }

    #[test]
    fn clause_may_span_lines() {
        let formula = parse_str("p cnf 4 1\n1 2\n  3\n4 0\n").unwrap();

        assert_eq!(formula, cnf_formula![1, 2, 3, 4;]);
    }

    #[test]
    fn percent_ends_input() {
        let formula = parse_str("p cnf 2 1\n1 2 0\n%\n0\n").unwrap();

        assert_eq!(formula.len(), 1);
    }

    #[test]
    fn header_var_count_wins_over_occurring_vars() {
        let formula = parse_str("p cnf 5 1\n1 2 0\n").unwrap();

        assert_eq!(formula.var_count(), 5);
    }

    #[test]
    fn rejects_out_of_range_literal() {
        match parse_str("p cnf 2 1\n1 -3 0\n") {
            Err(ParserError::LitOutOfRange {
                literal, var_count, ..
            }) => {
                assert_eq!(literal, -3);
                assert_eq!(var_count, 2);
            }
            result => panic!("expected out of range error, got {:?}", result.map(|_| ())),
        }
    }

    #[test]
    fn rejects_missing_header() {
        assert!(matches!(
            parse_str("1 2 0\n"),
            Err(ParserError::MissingHeader { line: 1 })
        ));
    }

    #[test]
    fn rejects_unterminated_clause() {
        assert!(matches!(
            parse_str("p cnf 2 1\n1 2\n"),
            Err(ParserError::UnterminatedClause { .. })
        ));
    }

    #[test]
    fn rejects_clause_count_mismatch() {
        assert!(matches!(
            parse_str("p cnf 2 2\n1 2 0\n"),
            Err(ParserError::ClauseCount {
                clause_count: 1,
                header_clause_count: 2,
            })
        ));
    }

    #[test]
    fn rejects_garbage_tokens() {
        assert!(matches!(
            parse_str("p cnf 2 1\n1 x 0\n"),
            Err(ParserError::UnexpectedToken { .. })
        ));
    }

    proptest! {
        #[test]
        fn write_parse_roundtrip(formula in cnf_formula(1..100usize, 0..500, 0..10)) {
            let mut buffer = vec![];
            write_dimacs(&mut buffer, &formula).unwrap();

            let parsed = parse_dimacs(&buffer[..]).unwrap();

            prop_assert_eq!(parsed, formula);
        }
    }
}
