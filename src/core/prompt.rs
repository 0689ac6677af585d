//! Operator interaction seam.
//!
//! Core operations ask questions through [`Prompter`] so they stay usable
//! without a terminal.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{Result, ValidationError};

/// Questions the core may ask the operator.
pub trait Prompter {
    /// Yes/no question.
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;

    /// Hidden input such as a token.
    fn secret(&self, question: &str) -> Result<String>;

    /// Free text with an optional default.
    fn input(&self, question: &str, default: Option<&str>) -> Result<String>;
}

/// A scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Text(String),
}

/// Answers from a queue; confirms fall back to their default when it runs dry.
#[derive(Debug, Default)]
pub struct Scripted {
    answers: RefCell<VecDeque<Answer>>,
    asked: RefCell<Vec<String>>,
}

impl Scripted {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Prompter accepting every default.
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Questions asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.answers.borrow().len()
    }

    fn next(&self, question: &str) -> Option<Answer> {
        self.asked.borrow_mut().push(question.to_string());
        self.answers.borrow_mut().pop_front()
    }
}

impl Prompter for Scripted {
    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        Ok(match self.next(question) {
            Some(Answer::Yes) => true,
            Some(Answer::No) => false,
            Some(Answer::Text(t)) => matches!(t.trim(), "y" | "Y" | "yes"),
            None => default,
        })
    }

    fn secret(&self, question: &str) -> Result<String> {
        match self.next(question) {
            Some(Answer::Text(t)) => Ok(t),
            _ => Err(ValidationError::NonInteractive(question.to_string()).into()),
        }
    }

    fn input(&self, question: &str, default: Option<&str>) -> Result<String> {
        match (self.next(question), default) {
            (Some(Answer::Text(t)), _) => Ok(t),
            (_, Some(d)) => Ok(d.to_string()),
            _ => Err(ValidationError::NonInteractive(question.to_string()).into()),
        }
    }
}
