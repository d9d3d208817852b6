use crate::errors::{CompileError, MatchError};
use crate::machine::compiler::Compiler;
use crate::machine::pretty;
use crate::machine::program::Program;
use crate::matcher::Matcher;

/// Glue composing a [`Compiler`] and a [`Matcher`]: one value that compiles
/// glob patterns and recognizes targets against the latest one.
pub struct Glob {
    compiler: Compiler,
}

impl Glob {
    pub fn new() -> Glob {
        Glob {
            compiler: Compiler::new(),
        }
    }

    pub fn with_pattern(pattern: impl AsRef<[u8]>) -> Result<Glob, CompileError> {
        let mut glob = Glob::new();
        glob.compile(pattern)?;
        Ok(glob)
    }

    pub fn compile(&mut self, pattern: impl AsRef<[u8]>) -> Result<(), CompileError> {
        self.compiler.compile(pattern)
    }

    pub fn program(&self) -> &Program {
        self.compiler.program()
    }

    /// Matches `target` against the most recently compiled pattern. The
    /// matcher view is rebound to the compiler's current program on every
    /// call, so recompiling never leaves a stale view behind.
    pub fn matches(&self, target: impl AsRef<[u8]>) -> Result<bool, MatchError> {
        Matcher::new(self.compiler.program()).matches(target)
    }

    pub fn pretty_print(&self) -> String {
        pretty::pretty_print(self.compiler.program())
    }
}

impl Default for Glob {
    fn default() -> Glob {
        Glob::new()
    }
}

#[cfg(test)]
mod test {
    use super::Glob;
    use crate::errors::CompileError;
    use pretty_assertions::assert_eq;

    #[test]
    fn compile_then_match() {
        let glob = Glob::with_pattern("*bar").expect("should compile");
        assert_eq!(Ok(true), glob.matches("foobar"));
        assert_eq!(Ok(false), glob.matches("barfoo"));
    }

    #[test]
    fn recompiling_rebinds_the_match_view() {
        let mut glob = Glob::with_pattern("a").expect("should compile");
        assert_eq!(Ok(true), glob.matches("a"));
        glob.compile("b").expect("should compile");
        assert_eq!(Ok(false), glob.matches("a"));
        assert_eq!(Ok(true), glob.matches("b"));
    }

    #[test]
    fn failed_compiles_keep_the_previous_program() {
        let mut glob = Glob::with_pattern("abc").expect("should compile");
        let before = glob.program().as_bytes().to_vec();
        assert_eq!(
            glob.compile("[x"),
            Err(CompileError::UnterminatedClass(String::from("[x")))
        );
        assert_eq!(glob.program().as_bytes(), &before[..]);
        assert_eq!(Ok(true), glob.matches("abc"));
    }

    #[test]
    fn nothing_compiled_means_an_empty_program() {
        let glob = Glob::new();
        assert!(glob.program().is_empty());
        assert_eq!(Ok(true), glob.matches(""));
        assert_eq!(Ok(false), glob.matches("x"));
    }

    #[test]
    fn pretty_print_reads_the_current_program() {
        let glob = Glob::with_pattern("a?").expect("should compile");
        let dump = glob.pretty_print();
        assert!(dump.starts_with("[   0] op: #"));
        assert!(dump.contains("op: ?"));
    }
}
