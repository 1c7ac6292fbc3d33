// SPDX-License-Identifier: MIT
//! Small CLI driving [`bbsort`] over whitespace-separated numbers.
//!
//! Reads `f64` values, one or more per line, from the files named on the
//! command line, or from standard input if no paths are given. Prints the
//! sorted sequence, one value per line. Pass `--top-k N` to print only the
//! `N` smallest values instead of the full sort.

use std::io::Read;

fn main() {
    let mut args = std::env::args_os().skip(1).peekable();
    let mut top_k: Option<usize> = None;
    let mut paths = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--top-k" {
            let n = args
                .next()
                .expect("--top-k requires an argument")
                .into_string()
                .expect("--top-k argument must be valid UTF-8")
                .parse()
                .expect("--top-k argument must be a non-negative integer");
            top_k = Some(n);
        } else {
            paths.push(arg);
        }
    }

    let mut text = String::new();
    if paths.is_empty() {
        std::io::stdin()
            .lock()
            .read_to_string(&mut text)
            .expect("failed to read standard input");
    } else {
        for path in &paths {
            let mut chunk = String::new();
            std::fs::File::open(path)
                .and_then(|mut f| f.read_to_string(&mut chunk))
                .unwrap_or_else(|e| panic!("failed to read {path:?}: {e}"));
            text.push(' ');
            text.push_str(&chunk);
        }
    }

    let values: Vec<f64> = text
        .split_whitespace()
        .map(|tok| tok.parse().unwrap_or_else(|e| panic!("not a number: {tok:?} ({e})")))
        .collect();

    let sorted = match top_k {
        Some(k) => bbsort::top_k(&values, k).expect("sort failed"),
        None => {
            let mut values = values;
            bbsort::sort(&mut values).expect("sort failed");
            values
        }
    };

    for v in sorted {
        println!("{v}");
    }
}
