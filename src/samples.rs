//! Built-in demonstration programs.
//!
//! These double as smoke tests for the engine: every sample with an
//! `expected` output must halt and produce exactly that output.

/// A named `///` program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub name: &'static str,
    pub description: &'static str,
    pub program: &'static str,
    /// Output of the program, or `None` if it never halts.
    pub expected: Option<&'static str>,
}

const SAMPLES: &[Sample] = &[
    Sample {
        name: "hello-world-0",
        description: "Plain text is printed as-is",
        program: "Hello, world!",
        expected: Some("Hello, world!"),
    },
    Sample {
        name: "hello-world-1",
        description: "A single substitution rewrites the rest of the program",
        program: "/ world! world!/Hello,/ world! world! world!",
        expected: Some("Hello, world!"),
    },
    Sample {
        name: "hello-world-2",
        description: "A substitution rewrites a later substitution",
        program: "/foo/Hello, world!//bar/foo/bar",
        expected: Some("Hello, world!"),
    },
    Sample {
        name: "hello-world-3",
        description: "Substitutions that never match are harmless",
        program: "Hello, /foo/bar/World/asdf/qwer/!",
        expected: Some("Hello, World!"),
    },
    Sample {
        name: "hello-world-4",
        description: "Chained substitutions build the output piece by piece",
        program: "/-/World//--/Hello//--W/--, w/---!",
        expected: Some("Hello, world!"),
    },
    Sample {
        name: "hello-world-5",
        description: "Escaped slashes and backslashes inside patterns",
        program: r"/foo/Hello, world!//B\/\\R/foo/B/\R",
        expected: Some("Hello, world!"),
    },
    Sample {
        name: "binary-to-unary",
        description: "Converts the binary number 100010 into 34 stars",
        program: "/1/0*//*0/0**//0//100010",
        expected: Some("**********************************"),
    },
    Sample {
        name: "thue-morse",
        description: "First 16 terms of the Thue-Morse sequence",
        program: r"/*/\/.\\0\/,\\,0,\\,1\/\/.\\1\/,\\,1,\\,0\/\/,\\,\/.\//****/.//.0",
        expected: Some("0110100110010110"),
    },
    Sample {
        name: "fibonacci",
        description: "First ten Fibonacci numbers in unary",
        program: r"/!/\/.\\0\/,\\,0,\\,1\/\/.\\1\/,\\,0\/\/,\\,\/.\/\/+\\+\/=\\=.\\1-\/\/=\\=\/+\\+\//!!!!!!!!!/.///+\+///-/\\\///0/1//1/*/++.1",
        expected: Some(
            "*/*/**/***/*****/********/*************/*********************/**********************************/*******************************************************",
        ),
    },
    Sample {
        name: "foobar",
        description: "The replacement contains the pattern, so the program grows forever",
        program: "/foo/foobar/foo",
        expected: None,
    },
    Sample {
        name: "abba",
        description: "Never halts even though the replacement does not contain the pattern",
        program: "/ab/bbaa/abb",
        expected: None,
    },
];

pub fn all() -> &'static [Sample] {
    SAMPLES
}

pub fn find(name: &str) -> Option<&'static Sample> {
    SAMPLES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{execute, Halt};

    #[test]
    fn halting_samples_produce_their_expected_output() {
        for sample in all().iter().filter(|s| s.expected.is_some()) {
            let bounded = execute(sample.program, 0).run_bounded(1_000_000);
            assert_eq!(bounded.halt, Some(Halt::Empty), "{} did not halt", sample.name);
            assert_eq!(Some(bounded.output.as_str()), sample.expected, "{}", sample.name);
        }
    }

    #[test]
    fn non_halting_samples_stay_silent() {
        for sample in all().iter().filter(|s| s.expected.is_none()) {
            let bounded = execute(sample.program, 0).run_bounded(10_000);
            assert_eq!(bounded.halt, None, "{} halted", sample.name);
            assert!(bounded.output.is_empty(), "{}", sample.name);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find("Thue-Morse").map(|s| s.name), Some("thue-morse"));
        assert!(find("missing").is_none());
    }
}
