#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|source: &str| {
    // Anything that reads must print back to an equal tree
    if let Ok(program) = funlisp::parse_program(source) {
        for sexp in program {
            assert_eq!(funlisp::parse(&sexp.to_string()), Ok(sexp));
        }
    }
});
