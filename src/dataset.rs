//! Questionnaire style input: every point answers every question with yes or no.

use std::path::Path;

use bitvec::vec::BitVec;

use crate::error::{Result, TanglesError};

/// Points x questions matrix of binary answers.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerMatrix {
    rows: Vec<BitVec>,
    num_questions: usize,
}

impl AnswerMatrix {
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<AnswerMatrix> {
        let rows: Vec<BitVec> = rows.into_iter().map(BitVec::from_iter).collect();
        AnswerMatrix::from_bit_rows(rows)
    }

    pub fn from_bit_rows(rows: Vec<BitVec>) -> Result<AnswerMatrix> {
        let first = rows.first().ok_or(TanglesError::NoPoints)?;
        let num_questions = first.len();
        if num_questions == 0 {
            return Err(TanglesError::NoCuts);
        }
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != num_questions)
        {
            return Err(TanglesError::Parse {
                line: index + 1,
                message: format!("expected {} answers, found {}", num_questions, row.len()),
            });
        }
        Ok(AnswerMatrix {
            rows,
            num_questions,
        })
    }

    /// Parses one point per line. Answers are separated by commas, semicolons
    /// or whitespace. Empty lines and lines starting with `#` are skipped.
    pub fn parse(input: &str) -> Result<AnswerMatrix> {
        let mut rows = Vec::new();
        let mut num_questions = None;

        for (idx, line) in input.lines().enumerate() {
            let line_number = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let row = line
                .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(|token| parse_answer(token, line_number))
                .collect::<Result<BitVec>>()?;

            match num_questions {
                None => num_questions = Some(row.len()),
                Some(expected) if expected != row.len() => {
                    return Err(TanglesError::Parse {
                        line: line_number,
                        message: format!("expected {} answers, found {}", expected, row.len()),
                    });
                }
                Some(_) => {}
            }
            rows.push(row);
        }

        AnswerMatrix::from_bit_rows(rows)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<AnswerMatrix> {
        let input = std::fs::read_to_string(path)?;
        AnswerMatrix::parse(&input)
    }

    pub fn rows(&self) -> &[BitVec] {
        &self.rows
    }

    pub fn num_points(&self) -> usize {
        self.rows.len()
    }

    pub fn num_questions(&self) -> usize {
        self.num_questions
    }

    /// The answers every point gave to one question.
    pub fn column(&self, question: usize) -> BitVec {
        self.rows.iter().map(|row| row[question]).collect()
    }
}

fn parse_answer(token: &str, line: usize) -> Result<bool> {
    match token.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "-1" | "false" | "no" | "n" => Ok(false),
        other => Err(TanglesError::Parse {
            line,
            message: format!("cannot read {other:?} as an answer"),
        }),
    }
}
