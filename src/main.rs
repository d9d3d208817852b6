use std::env;
use std::process;

use uniglob::Glob;

fn main() {
    env_logger::init();
    let (pattern, target) = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(2);
        }
    };
    let glob = match Glob::with_pattern(&pattern) {
        Ok(glob) => glob,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };
    print!("{}", glob.pretty_print());
    match glob.matches(&target) {
        Ok(matched) => println!("Result is {}", matched),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}

fn parse_args() -> Result<(String, String), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        Err(String::from("Need 2 args: <pattern> <target>"))
    } else {
        Ok((args[1].clone(), args[2].clone()))
    }
}
