use log::{debug, trace};
use memchr::{memchr, memchr3};

use crate::errors::CompileError;
use crate::machine::program::{
    encode_length, hex_digit, pack_bitset, Program, LENGTH_SIZE, MAX_PROGRAM, TAG_BITSET,
    TAG_CLASS, TAG_CLASS_END, TAG_HEADER, TAG_LITERAL, TAG_ONE, TAG_RANGE,
};
use crate::utf8;
use crate::utf8::Utf8Cursor;

/// Compiles glob patterns into bytecode programs. Each successful compile
/// replaces the previously held program; a failed compile leaves it intact.
pub struct Compiler {
    program: Program,
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler {
            program: Program::default(),
        }
    }

    /// The last successfully compiled program; empty before the first
    /// compile and after compiling an empty pattern.
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn compile(&mut self, pattern: impl AsRef<[u8]>) -> Result<(), CompileError> {
        let pattern = pattern.as_ref();
        if !utf8::validate(pattern) {
            return Err(CompileError::InvalidEncoding);
        }
        let mut em = Emitter::new();
        em.emit(TAG_HEADER);
        em.emit_padding(LENGTH_SIZE);
        let mut i = 0;
        while i < pattern.len() {
            let consumed = match pattern[i] {
                b'?' | b'*' => {
                    em.emit(pattern[i]);
                    1
                }
                b'[' => compile_class(&mut em, pattern, i)?,
                _ => compile_literal(&mut em, pattern, i),
            };
            if em.emitted() > MAX_PROGRAM {
                return Err(CompileError::ProgramTooLarge(suffix(pattern, i)));
            }
            i += consumed;
        }
        if em.emitted() > 1 + LENGTH_SIZE {
            let n = em.emitted() - (1 + LENGTH_SIZE);
            em.emit_length_at(1, n);
        } else {
            // an empty pattern compiles to an empty program
            em.clear();
        }
        debug!(
            "compiled {} pattern bytes into {} program bytes",
            pattern.len(),
            em.emitted()
        );
        self.program = Program::from_compiled(em.into_bytes());
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Compiler {
        Compiler::new()
    }
}

// Pattern tail used in error messages. The pattern has already been
// validated and elements begin on code point boundaries.
fn suffix(pattern: &[u8], from: usize) -> String {
    String::from_utf8_lossy(&pattern[from..]).into_owned()
}

// A literal run extends to the next metacharacter or the end of the pattern;
// any byte run qualifies, so this cannot fail.
fn compile_literal(em: &mut Emitter, pattern: &[u8], from: usize) -> usize {
    em.emit(TAG_LITERAL);
    let len_at = em.emitted();
    em.emit_padding(LENGTH_SIZE);
    let rest = &pattern[from..];
    let n = memchr3(b'?', b'*', b'[', rest).unwrap_or(rest.len());
    em.emit_bytes(&rest[..n]);
    em.emit_length_at(len_at, n);
    n
}

// Compiles one character class, `pattern[from]` being the opening '['.
// Returns the pattern bytes consumed through the closing ']'.
fn compile_class(em: &mut Emitter, pattern: &[u8], from: usize) -> Result<usize, CompileError> {
    let start = em.emitted();
    let mut p = from + 1;
    let mut invert = false;
    if p < pattern.len() && (pattern[p] == b'!' || pattern[p] == b'^') {
        invert = true;
        p += 1;
    }
    // a ']' in the first member position is a literal member, not the terminator
    let mut leading_close = false;
    if p < pattern.len() && pattern[p] == b']' {
        leading_close = true;
        p += 1;
    }
    let close = match memchr(b']', &pattern[p..]) {
        Some(off) => p + off,
        None => return Err(CompileError::UnterminatedClass(suffix(pattern, from))),
    };
    if pattern[p..close].iter().all(u8::is_ascii) {
        trace!("class at pattern byte {} takes the bitset path", from);
        // membership is built by FLIPPING bits: a member listed twice
        // toggles back out of the set, and negation starts from all-set
        let mut bits: u128 = if invert { !0 } else { 0 };
        if leading_close {
            bits ^= 1 << b']';
        }
        while pattern[p] != b']' {
            let c1 = pattern[p];
            p += 1;
            if pattern[p] == b'-' && pattern[p + 1] != b']' {
                let c3 = pattern[p + 1];
                for c in c1..=c3 {
                    bits ^= 1 << c;
                }
                p += 2;
            } else {
                bits ^= 1 << c1;
            }
        }
        em.emit(TAG_BITSET);
        em.emit_packed_bitset(bits);
        Ok(p + 1 - from)
    } else {
        trace!("class at pattern byte {} takes the interpreted path", from);
        em.emit(TAG_CLASS);
        em.emit(hex_digit(u8::from(invert)));
        let len_at = em.emitted();
        em.emit_padding(LENGTH_SIZE);
        if leading_close {
            em.emit(TAG_ONE);
            em.emit(b']');
        }
        let term = u32::from(b']');
        let mut u = Utf8Cursor::at(pattern, p);
        while let Some(c1) = u.peek().filter(|&c| c != term) {
            u.advance_one_codepoint();
            // a '-' continues into a range unless the terminator follows it
            if u.peek() == Some(u32::from(b'-')) && peek_past(u) != Some(term) {
                u.advance_one_codepoint();
                if let Some(c3) = u.peek() {
                    u.advance_one_codepoint();
                    em.emit(TAG_RANGE);
                    em.emit_code_point(c1);
                    em.emit_code_point(c3);
                }
            } else {
                em.emit(TAG_ONE);
                em.emit_code_point(c1);
            }
        }
        em.emit(TAG_CLASS_END);
        let oplen = em.emitted() - start - (1 + 1 + LENGTH_SIZE + 1);
        em.emit_length_at(len_at, oplen);
        Ok(u.pos() + 1 - from)
    }
}

// The code point one past the cursor's current one.
fn peek_past(mut u: Utf8Cursor) -> Option<u32> {
    if u.at_end() {
        return None;
    }
    u.advance_one_codepoint();
    u.peek()
}

// Append-only program buffer with the back-patching the length fields need.
struct Emitter {
    fsm: Vec<u8>,
}

impl Emitter {
    fn new() -> Emitter {
        Emitter {
            fsm: Vec::with_capacity(MAX_PROGRAM),
        }
    }

    fn emitted(&self) -> usize {
        self.fsm.len()
    }

    fn emit(&mut self, b: u8) {
        self.fsm.push(b);
    }

    fn emit_bytes(&mut self, bytes: &[u8]) {
        self.fsm.extend_from_slice(bytes);
    }

    fn emit_padding(&mut self, n: usize) {
        for _ in 0..n {
            self.fsm.push(b'_');
        }
    }

    fn emit_code_point(&mut self, c: u32) {
        utf8::push_code_point(&mut self.fsm, c);
    }

    fn emit_packed_bitset(&mut self, bits: u128) {
        pack_bitset(&mut self.fsm, bits);
    }

    fn emit_length_at(&mut self, at: usize, n: usize) {
        let [hi, lo] = encode_length(n);
        self.fsm[at] = hi;
        self.fsm[at + 1] = lo;
    }

    fn clear(&mut self) {
        self.fsm.clear();
    }

    fn into_bytes(self) -> Vec<u8> {
        self.fsm
    }
}
