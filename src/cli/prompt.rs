//! Interactive questions for values not given on the command line

use anyhow::{bail, Result};
use console::{style, Term};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Invalid answers tolerated before giving up (guards against a closed stdin)
const MAX_ATTEMPTS: usize = 5;

pub struct Prompter {
    term: Term,
}

impl Prompter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn ask(&self, question: &str) -> Result<String> {
        self.term.write_str(&format!("{} ", style(question).bold()))?;
        Ok(self.term.read_line()?.trim().to_string())
    }

    fn complain(&self, message: &str) -> Result<()> {
        self.term
            .write_line(&format!("{} {}", style("Error:").red(), message))?;
        Ok(())
    }

    pub fn heading(&self, title: &str) -> Result<()> {
        self.term
            .write_line(&format!("\n{}", style(format!("=== {} ===", title)).cyan()))?;
        Ok(())
    }

    /// Ask for a number until `accept` is satisfied. Empty input takes `default`.
    pub fn number<T>(
        &self,
        question: &str,
        default: Option<T>,
        accept: impl Fn(&T) -> bool,
        rule: &str,
    ) -> Result<T>
    where
        T: FromStr + Display + Copy,
    {
        let question = match default {
            Some(d) => format!("{} (default {}):", question, d),
            None => format!("{}:", question),
        };
        for _ in 0..MAX_ATTEMPTS {
            let answer = self.ask(&question)?;
            match parse_answer(&answer, default, &accept, rule) {
                Ok(value) => return Ok(value),
                Err(message) => self.complain(&message)?,
            }
        }
        bail!("No valid answer after {} attempts", MAX_ATTEMPTS)
    }

    /// Ask for an existing directory. Empty input takes `default`.
    pub fn folder(&self, question: &str, default: &Path) -> Result<PathBuf> {
        let question = format!("{} (default {}):", question, default.display());
        for _ in 0..MAX_ATTEMPTS {
            let answer = self.ask(&question)?;
            let path = if answer.is_empty() {
                default.to_path_buf()
            } else {
                PathBuf::from(answer)
            };
            if path.is_dir() {
                return Ok(path);
            }
            self.complain("The folder does not exist. Please try again.")?;
        }
        bail!("No valid folder after {} attempts", MAX_ATTEMPTS)
    }

    /// Free-text question where an empty answer means "skip".
    pub fn optional(&self, question: &str) -> Result<Option<String>> {
        let answer = self.ask(question)?;
        Ok(Some(answer).filter(|a| !a.is_empty()))
    }
}

/// Validate one answer; the error is the message to show before asking again.
fn parse_answer<T>(
    answer: &str,
    default: Option<T>,
    accept: impl Fn(&T) -> bool,
    rule: &str,
) -> Result<T, String>
where
    T: FromStr + Copy,
{
    if answer.is_empty() {
        return default.ok_or_else(|| "An answer is required.".to_string());
    }
    match answer.parse::<T>() {
        Ok(value) if accept(&value) => Ok(value),
        Ok(_) => Err(rule.to_string()),
        Err(_) => Err("Please enter a valid number.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive(n: &usize) -> bool {
        *n > 0
    }

    #[test]
    fn test_empty_answer_takes_default() {
        assert_eq!(parse_answer("", Some(5usize), positive, "positive"), Ok(5));
        assert!(parse_answer::<usize>("", None, positive, "positive").is_err());
    }

    #[test]
    fn test_rule_violation_and_garbage() {
        assert_eq!(
            parse_answer("0", Some(5usize), positive, "Please enter a positive number."),
            Err("Please enter a positive number.".to_string())
        );
        assert_eq!(
            parse_answer("five", Some(5usize), positive, "positive"),
            Err("Please enter a valid number.".to_string())
        );
        assert_eq!(parse_answer("12", None, positive, "positive"), Ok(12usize));
    }

    #[test]
    fn test_negative_gap_is_not_a_number() {
        assert!(parse_answer::<u32>("-1", Some(2), |_| true, "non-negative").is_err());
    }
}
