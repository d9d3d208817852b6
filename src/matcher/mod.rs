use log::trace;
use memchr::memmem;

use crate::errors::MatchError;
use crate::machine::program::{
    bitset_test, decode_length_at, hex_value, Program, BITSET_SIZE, LENGTH_SIZE, TAG_ANY,
    TAG_BITSET, TAG_CLASS, TAG_CLASS_END, TAG_FLOAT, TAG_HEADER, TAG_LITERAL, TAG_ONE, TAG_RANGE,
};
use crate::utf8;
use crate::utf8::Utf8Cursor;

/// Interprets a compiled program against target text. The program is trusted
/// to be well formed; only the target is validated.
pub struct Matcher<'a> {
    program: &'a Program,
}

impl<'a> Matcher<'a> {
    pub fn new(program: &'a Program) -> Matcher<'a> {
        Matcher { program }
    }

    /// One left-to-right pass over program and target. A failed element ends
    /// the whole match; nothing is ever retried.
    pub fn matches(&self, target: impl AsRef<[u8]>) -> Result<bool, MatchError> {
        let target = target.as_ref();
        if !utf8::validate(target) {
            return Err(MatchError::InvalidEncoding);
        }
        let fsm = self.program.as_bytes();
        let end = self.program.end();
        let mut ti = Utf8Cursor::new(target);
        let mut anchored = true;
        let mut invert = false;
        let mut next = 0;
        let mut pc = 0;
        while pc < end {
            let op = fsm[pc];
            pc += 1;
            match op {
                TAG_HEADER => pc += LENGTH_SIZE,
                TAG_ANY => match ti.peek() {
                    Some(_) => {
                        ti.advance_one_codepoint();
                        anchored = true;
                    }
                    // nothing left for '?' to consume
                    None => return Ok(false),
                },
                TAG_FLOAT => anchored = false,
                TAG_CLASS => {
                    invert = hex_value(fsm[pc]) != 0;
                    next = pc + 1 + LENGTH_SIZE + decode_length_at(fsm, pc + 1) + 1;
                    pc += 1 + LENGTH_SIZE;
                }
                TAG_BITSET => {
                    let set = &fsm[pc..pc + BITSET_SIZE];
                    if !scan(&mut ti, anchored, |c| c < 128 && bitset_test(set, c)) {
                        return Ok(false);
                    }
                    anchored = true;
                    pc += BITSET_SIZE;
                }
                TAG_ONE => {
                    let (m, n) = utf8::decode_code_point(&fsm[pc..]);
                    pc += n;
                    if scan(&mut ti, anchored, |c| (c == m) != invert) {
                        anchored = true;
                        pc = next;
                    }
                }
                TAG_RANGE => {
                    let (lo, n) = utf8::decode_code_point(&fsm[pc..]);
                    pc += n;
                    let (hi, n) = utf8::decode_code_point(&fsm[pc..]);
                    pc += n;
                    if scan(&mut ti, anchored, |c| (lo <= c && c <= hi) != invert) {
                        anchored = true;
                        pc = next;
                    }
                }
                // every member op fell through: the class matched nothing
                TAG_CLASS_END => return Ok(false),
                TAG_LITERAL => {
                    let n = decode_length_at(fsm, pc);
                    let lit = &fsm[pc + LENGTH_SIZE..pc + LENGTH_SIZE + n];
                    let from = ti.pos();
                    if anchored {
                        if !target[from..].starts_with(lit) {
                            return Ok(false);
                        }
                        ti.advance_bytes(n);
                    } else {
                        match memmem::find(&target[from..], lit) {
                            Some(at) => ti.set_pos(from + at + n),
                            None => return Ok(false),
                        }
                    }
                    anchored = true;
                    pc += LENGTH_SIZE + n;
                }
                _ => unreachable!("corrupt program: tag {:#04x} at offset {}", op, pc - 1),
            }
        }
        // all target text consumed, or the pattern ended still floating
        // ("ab*" accepts "abZZZ")
        let matched = ti.at_end() || !anchored;
        trace!(
            "consumed {} of {} target bytes, matched: {}",
            ti.pos(),
            target.len(),
            matched
        );
        Ok(matched)
    }
}

// One class-member test under the current match mode. Anchored tests only at
// the cursor; floating walks forward to the first code point that passes. A
// successful test consumes the matched code point.
fn scan(ti: &mut Utf8Cursor, anchored: bool, test: impl Fn(u32) -> bool) -> bool {
    if anchored {
        match ti.peek() {
            Some(c) if test(c) => {
                ti.advance_one_codepoint();
                true
            }
            _ => false,
        }
    } else {
        let mut probe = *ti;
        while let Some(c) = probe.peek() {
            probe.advance_one_codepoint();
            if test(c) {
                *ti = probe;
                return true;
            }
        }
        false
    }
}
