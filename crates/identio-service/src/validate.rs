//! Composable validation rule-chains.
//!
//! A [`Validator`] is an ordered list of rules evaluated until the first
//! failure, so a rejection always names exactly one violated rule and the
//! report is deterministic. New rule-sets are built by chaining existing
//! rules; nothing here needs modification to compose a new set.

use strum::{AsRefStr, IntoStaticStr};
use validator::ValidateEmail;

/// Characters accepted in usernames.
const USERNAME_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.-_";

/// A violated validation rule.
///
/// Variant names double as stable machine-readable keys (snake_case via
/// [`AsRefStr`]) that transports map to localized messages; the `Display`
/// text is for logs and diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(thiserror::Error, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RuleViolation {
    /// Username shorter than 3 characters.
    #[error("username must be at least 3 characters")]
    UsernameTooShort,
    /// Username longer than 32 characters.
    #[error("username must be at most 32 characters")]
    UsernameTooLong,
    /// Username contains a character outside letters, digits, `.`, `-`, `_`.
    #[error("username must only contain letters, digits, dots, dashes and underscores")]
    UsernameInvalidChars,
    /// Password shorter than 8 characters.
    #[error("password must be at least 8 characters")]
    PasswordTooShort,
    /// Password longer than 64 characters.
    #[error("password must be at most 64 characters")]
    PasswordTooLong,
    /// Password lacks an uppercase letter.
    #[error("password must contain at least one uppercase letter")]
    PasswordNeedsUppercase,
    /// Password lacks a lowercase letter.
    #[error("password must contain at least one lowercase letter")]
    PasswordNeedsLowercase,
    /// Password lacks a digit.
    #[error("password must contain at least one digit")]
    PasswordNeedsDigit,
    /// Password lacks a symbol.
    #[error("password must contain at least one symbol")]
    PasswordNeedsSymbol,
    /// Password too close to the username or email.
    #[error("password is too similar to the username or email")]
    PasswordTooSimilar,
    /// Email address does not parse.
    #[error("email address is not valid")]
    EmailInvalid,
    /// Email address exceeds the accepted length.
    #[error("email address is too long")]
    EmailTooLong,
}

type Check = Box<dyn Fn(&str) -> Result<(), RuleViolation> + Send + Sync>;

/// Ordered, fail-fast chain of validation rules.
#[derive(Default)]
pub struct Validator {
    checks: Vec<Check>,
}

impl Validator {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule to the chain.
    pub fn rule(
        mut self,
        check: impl Fn(&str) -> Result<(), RuleViolation> + Send + Sync + 'static,
    ) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Runs the chain, reporting the first violated rule.
    pub fn validate(&self, text: &str) -> Result<(), RuleViolation> {
        for check in &self.checks {
            check(text)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.checks.len())
            .finish()
    }
}

/// Rule: at least `min` characters.
pub fn min_length(
    min: usize,
    violation: RuleViolation,
) -> impl Fn(&str) -> Result<(), RuleViolation> + Send + Sync {
    move |text| {
        if text.chars().count() < min {
            Err(violation)
        } else {
            Ok(())
        }
    }
}

/// Rule: at most `max` characters.
pub fn max_length(
    max: usize,
    violation: RuleViolation,
) -> impl Fn(&str) -> Result<(), RuleViolation> + Send + Sync {
    move |text| {
        if text.chars().count() > max {
            Err(violation)
        } else {
            Ok(())
        }
    }
}

/// Rule: every character drawn from `allowed`.
pub fn allowed_chars(
    allowed: &'static str,
    violation: RuleViolation,
) -> impl Fn(&str) -> Result<(), RuleViolation> + Send + Sync {
    move |text| {
        if text.chars().all(|c| allowed.contains(c)) {
            Ok(())
        } else {
            Err(violation)
        }
    }
}

/// Rule: at least one character satisfying `predicate`.
pub fn requires(
    predicate: fn(char) -> bool,
    violation: RuleViolation,
) -> impl Fn(&str) -> Result<(), RuleViolation> + Send + Sync {
    move |text| {
        if text.chars().any(predicate) {
            Ok(())
        } else {
            Err(violation)
        }
    }
}

/// Rule: similarity to every attribute stays at or below `max_similarity`.
pub fn not_similar_to(
    attributes: Vec<String>,
    max_similarity: f64,
    violation: RuleViolation,
) -> impl Fn(&str) -> Result<(), RuleViolation> + Send + Sync {
    move |text| {
        for attribute in &attributes {
            if ratio(text, attribute) > max_similarity {
                return Err(violation);
            }
        }
        Ok(())
    }
}

/// Normalized overlap ratio of two strings, in `[0, 1]`.
///
/// Where `T` is the combined character count and `M` counts greedily
/// matched common characters (each character of `a` consumed at most
/// once), the ratio is `2*M / T`: 1 for identical strings, 0 for strings
/// with nothing in common. This is a cheap multiset-overlap heuristic, not
/// an edit distance: it deliberately overestimates the similarity of
/// strings sharing the same characters in any order (anagrams score 1) and
/// ignores character positions entirely.
pub fn ratio(a: &str, b: &str) -> f64 {
    let total = (a.chars().count() + b.chars().count()) as f64;
    if total == 0.0 {
        return 0.0;
    }

    let mut remaining: Vec<char> = a.chars().collect();
    let mut matches = 0.0;
    for ch in b.chars() {
        if let Some(position) = remaining.iter().position(|&c| c == ch) {
            remaining.remove(position);
            matches += 1.0;
        }
    }

    2.0 * matches / total
}

/// The username rule-set: length in `[3, 32]`, ASCII letters, digits,
/// `.`, `-`, `_`.
pub fn username_rules() -> Validator {
    Validator::new()
        .rule(min_length(3, RuleViolation::UsernameTooShort))
        .rule(max_length(32, RuleViolation::UsernameTooLong))
        .rule(allowed_chars(
            USERNAME_CHARS,
            RuleViolation::UsernameInvalidChars,
        ))
}

/// The password rule-set: length in `[8, 64]`, one uppercase, one
/// lowercase, one digit, one symbol, and not too similar to any of
/// `similar_to` (typically the username and email).
pub fn password_rules(similar_to: &[&str], max_similarity: f64) -> Validator {
    let attributes = similar_to.iter().map(|s| (*s).to_owned()).collect();

    Validator::new()
        .rule(min_length(8, RuleViolation::PasswordTooShort))
        .rule(max_length(64, RuleViolation::PasswordTooLong))
        .rule(requires(
            char::is_uppercase,
            RuleViolation::PasswordNeedsUppercase,
        ))
        .rule(requires(
            char::is_lowercase,
            RuleViolation::PasswordNeedsLowercase,
        ))
        .rule(requires(char::is_numeric, RuleViolation::PasswordNeedsDigit))
        .rule(requires(
            |c| !c.is_alphanumeric(),
            RuleViolation::PasswordNeedsSymbol,
        ))
        .rule(not_similar_to(
            attributes,
            max_similarity,
            RuleViolation::PasswordTooSimilar,
        ))
}

/// Validates an email address: RFC shape and at most `max_length`
/// characters.
pub fn validate_email(email: &str, max_length: usize) -> Result<(), RuleViolation> {
    if !email.validate_email() {
        return Err(RuleViolation::EmailInvalid);
    }
    if email.chars().count() > max_length {
        return Err(RuleViolation::EmailTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_boundaries() {
        let rules = username_rules();

        assert_eq!(rules.validate("ab"), Err(RuleViolation::UsernameTooShort));
        assert_eq!(
            rules.validate(&"a".repeat(33)),
            Err(RuleViolation::UsernameTooLong)
        );
        assert_eq!(rules.validate("abc"), Ok(()));
        assert_eq!(rules.validate(&"a".repeat(32)), Ok(()));
    }

    #[test]
    fn username_rejects_forbidden_characters() {
        let rules = username_rules();

        assert_eq!(
            rules.validate("has space"),
            Err(RuleViolation::UsernameInvalidChars)
        );
        assert_eq!(
            rules.validate("user@host"),
            Err(RuleViolation::UsernameInvalidChars)
        );
        assert_eq!(rules.validate("dot.dash-under_score9"), Ok(()));
    }

    #[test]
    fn password_reports_first_violated_rule() {
        let rules = password_rules(&[], 0.7);

        assert_eq!(rules.validate("aB1!"), Err(RuleViolation::PasswordTooShort));
        assert_eq!(
            rules.validate(&"aB1!".repeat(17)),
            Err(RuleViolation::PasswordTooLong)
        );
        assert_eq!(
            rules.validate("lower1!lower"),
            Err(RuleViolation::PasswordNeedsUppercase)
        );
        assert_eq!(
            rules.validate("UPPER1!UPPER"),
            Err(RuleViolation::PasswordNeedsLowercase)
        );
        assert_eq!(
            rules.validate("NoDigits!"),
            Err(RuleViolation::PasswordNeedsDigit)
        );
        assert_eq!(
            rules.validate("NoSymbol1"),
            Err(RuleViolation::PasswordNeedsSymbol)
        );
        assert_eq!(rules.validate("Str0ng!Pass"), Ok(()));
    }

    #[test]
    fn password_similarity_uses_the_greedy_ratio() {
        let rules = password_rules(&["alice", "alice@example.com"], 0.7);

        // ratio("alice!A1", "alice") = 2*5 / (8+5) ≈ 0.77, over the 0.7 cap.
        assert_eq!(
            rules.validate("alice!A1"),
            Err(RuleViolation::PasswordTooSimilar)
        );
        assert_eq!(rules.validate("Str0ng!Pass"), Ok(()));
    }

    #[test]
    fn ratio_matches_the_documented_heuristic() {
        assert_eq!(ratio("abc", "abc"), 1.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        // Anagrams score 1: the heuristic ignores order.
        assert_eq!(ratio("abc", "cba"), 1.0);
        // Each character of the first operand is consumed at most once.
        assert_eq!(ratio("aa", "aaaa"), 2.0 * 2.0 / 6.0);
        assert_eq!(ratio("", ""), 0.0);
    }

    #[test]
    fn email_shape_and_length() {
        assert_eq!(validate_email("alice@example.com", 100), Ok(()));
        assert_eq!(
            validate_email("not-an-email", 100),
            Err(RuleViolation::EmailInvalid)
        );
        // Valid shape, but 109 characters in total.
        let long = format!("alice@{}.{}.com", "a".repeat(63), "a".repeat(35));
        assert_eq!(validate_email(&long, 100), Err(RuleViolation::EmailTooLong));
    }

    #[test]
    fn violations_expose_stable_keys() {
        assert_eq!(RuleViolation::PasswordTooSimilar.as_ref(), "password_too_similar");
        assert_eq!(RuleViolation::UsernameTooShort.as_ref(), "username_too_short");
    }
}
