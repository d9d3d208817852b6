use std::fmt::Write;

use crate::machine::program::{
    decode_length_at, Program, BITSET_SIZE, LENGTH_SIZE, TAG_BITSET, TAG_CLASS, TAG_HEADER,
    TAG_LITERAL, TAG_ONE, TAG_RANGE,
};
use crate::utf8;

/// Renders a compiled program one op per line: byte offset, tag, then the
/// tag's fields. Reporting only; matching never consults this.
pub fn pretty_print(program: &Program) -> String {
    let fsm = program.as_bytes();
    let end = program.end();
    let mut out = String::new();
    let mut pc = 0;
    while pc < end {
        let op = fsm[pc];
        pc += 1;
        let _ = write!(out, "[{:4}] op: {}", pc - 1, op as char);
        match op {
            TAG_HEADER => {
                let _ = write!(out, " len: {}", decode_length_at(fsm, pc));
                pc += LENGTH_SIZE;
            }
            TAG_CLASS => {
                let _ = write!(
                    out,
                    " mod: {} len: {}",
                    fsm[pc] as char,
                    decode_length_at(fsm, pc + 1)
                );
                pc += 1 + LENGTH_SIZE;
            }
            TAG_BITSET => {
                out.push_str(" val: ");
                for &b in &fsm[pc..pc + BITSET_SIZE] {
                    out.push(b as char);
                }
                pc += BITSET_SIZE;
            }
            TAG_ONE => {
                out.push_str(" val: ");
                let (c, n) = utf8::decode_code_point(&fsm[pc..]);
                pc += n;
                render(&mut out, c);
            }
            TAG_RANGE => {
                out.push_str(" val: ");
                let (lo, n) = utf8::decode_code_point(&fsm[pc..]);
                pc += n;
                render(&mut out, lo);
                out.push(' ');
                let (hi, n) = utf8::decode_code_point(&fsm[pc..]);
                pc += n;
                render(&mut out, hi);
            }
            TAG_LITERAL => {
                let n = decode_length_at(fsm, pc);
                let _ = write!(out, " len: {} val:", n);
                let lit = &fsm[pc + LENGTH_SIZE..pc + LENGTH_SIZE + n];
                // runs of ASCII stay unbroken; every U+XXXX form is set off
                // by a space, as is each switch between the two renderings
                let mut state = Spacing::None;
                let mut at = 0;
                while at < lit.len() {
                    let (c, w) = utf8::decode_code_point(&lit[at..]);
                    at += w;
                    let now = if c < 128 { Spacing::Ascii } else { Spacing::Unicode };
                    if now != state || state == Spacing::Unicode {
                        out.push(' ');
                    }
                    state = now;
                    render(&mut out, c);
                }
                pc += LENGTH_SIZE + n;
            }
            // '?', '*' and ']' carry no payload
            _ => {}
        }
        out.push('\n');
    }
    out
}

#[derive(PartialEq, Clone, Copy)]
enum Spacing {
    None,
    Ascii,
    Unicode,
}

// ASCII code points print as themselves, the rest as U+XXXX with 4, 5 or 6
// hex digits depending on magnitude.
fn render(out: &mut String, c: u32) {
    if c < 128 {
        out.push(c as u8 as char);
    } else {
        let w: usize = if c < 0x10000 {
            4
        } else if c < 0x100000 {
            5
        } else {
            6
        };
        let _ = write!(out, "U+{:0w$X}", c, w = w);
    }
}

#[cfg(test)]
mod test {
    use super::pretty_print;
    use crate::machine::compiler::Compiler;
    use pretty_assertions::assert_eq;

    fn pp(pat: &str) -> String {
        let mut comp = Compiler::new();
        comp.compile(pat).expect("should compile");
        pretty_print(comp.program())
    }

    #[test]
    fn dumps_each_op_with_its_offset() {
        assert_eq!(
            pp("ab*[A-C]"),
            "[   0] op: # len: 39\n\
             [   3] op: = len: 2 val: ab\n\
             [   8] op: *\n\
             [   9] op: { val: 000000000000000e0000000000000000\n"
        );
    }

    #[test]
    fn renders_interpreted_classes_and_code_points() {
        assert_eq!(
            pp("[\u{44f}-\u{451}]?"),
            "[   0] op: # len: 11\n\
             [   3] op: [ mod: 0 len: 5\n\
             [   7] op: - val: U+044F U+0451\n\
             [  12] op: ]\n\
             [  13] op: ?\n"
        );
    }

    #[test]
    fn spaces_literal_values_on_rendering_switches() {
        assert_eq!(
            pp("a\u{42f}b"),
            "[   0] op: # len: 7\n\
             [   3] op: = len: 4 val: a U+042F b\n"
        );
    }

    #[test]
    fn empty_program_prints_nothing() {
        assert_eq!(pp(""), "");
    }
}
