/// Intermediate representation shared by the formatting stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Finished markup. Later stages pass it through untouched.
    Block(String),
    /// One source line, not yet escaped.
    Raw(String),
    /// One escaped line whose inline markup is still pending.
    Line(String),
}

/// Regex helper: every pattern in this crate is a compile-time literal.
macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        #[expect(
            clippy::expect_used,
            reason = "Static regex pattern validated at compile time"
        )]
        fn $name() -> &'static regex::Regex {
            static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            RE.get_or_init(|| {
                regex::Regex::new($pattern).expect("Static regex pattern is guaranteed to be valid")
            })
        }
    };
}

pub(crate) use static_regex;
