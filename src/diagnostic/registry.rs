/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str,  // one-liner for `druid explain`
    pub long: &'static str,   // full explanation for `druid explain CODE`
}

/// Stable codes for every runtime error.
pub static REGISTRY: &[ErrorEntry] = &[
    ErrorEntry {
        code: "DRD-R001",
        short: "duplicate declaration",
        long: r#"## DRD-R001: duplicate declaration

A name was declared twice in the same scope, or two functions share a name.

    var a, a;

Each frame (the program, or one function call) has its own names, so a
function may declare a variable that also exists at program level.
"#,
    },
    ErrorEntry {
        code: "DRD-R002",
        short: "undefined variable",
        long: r#"## DRD-R002: undefined variable

A variable was read or assigned without a `var` declaration in the current
scope. Function bodies cannot see program-level variables; pass them as
arguments instead.

    var a;
    a = b + 1;   // b was never declared
"#,
    },
    ErrorEntry {
        code: "DRD-R003",
        short: "uninitialized variable",
        long: r#"## DRD-R003: uninitialized variable

The variable is declared but has never been given a value.

    var a, b;
    b = a;       // a has no value yet
"#,
    },
    ErrorEntry {
        code: "DRD-R004",
        short: "undefined function",
        long: r#"## DRD-R004: undefined function

No user function or built-in has this name. Built-ins are `print`,
`println` and `len`.
"#,
    },
    ErrorEntry {
        code: "DRD-R005",
        short: "wrong number of arguments",
        long: r#"## DRD-R005: wrong number of arguments

Functions must be called with exactly as many arguments as they declare
parameters.
"#,
    },
    ErrorEntry {
        code: "DRD-R006",
        short: "missing return",
        long: r#"## DRD-R006: missing return

A function body ran to the end without reaching a `return` statement.
Every function must return a value.

    def log(x) { print(x); }          // error when called
    def log(x) { print(x); return x; } // ok
"#,
    },
    ErrorEntry {
        code: "DRD-R007",
        short: "type error",
        long: r#"## DRD-R007: type error

A value of the wrong kind was used: negating a non-Integer, indexing
something that is not an Array, or using a non-Integer index.
"#,
    },
    ErrorEntry {
        code: "DRD-R008",
        short: "undefined operator",
        long: r#"## DRD-R008: undefined operator

Both operands of `+ - * /` must be of the same kind, and the operator must
exist for that kind:

    Integer   + - * /
    String    +           (concatenation)
    Array     + -         (concatenation, remove one match per element)
    Hash      (none)
"#,
    },
    ErrorEntry {
        code: "DRD-R009",
        short: "division by zero",
        long: r#"## DRD-R009: division by zero

Integer division by zero aborts the run.
"#,
    },
    ErrorEntry {
        code: "DRD-R010",
        short: "index out of range",
        long: r#"## DRD-R010: index out of range

Array indices start at 0 and must be less than the array length. Negative
indices are not supported.
"#,
    },
    ErrorEntry {
        code: "DRD-R011",
        short: "cyclic dependency",
        long: r#"## DRD-R011: cyclic dependency

A derive-binding (`<-`) would make a variable depend on itself, directly or
through other derived variables.

    var a, b;
    a = 1;
    b <- a;
    a <- b;      // a -> b -> a

The binding is rejected and every variable keeps its previous value and
dependencies.
"#,
    },
    ErrorEntry {
        code: "DRD-R012",
        short: "undefined signal type",
        long: r#"## DRD-R012: undefined signal type

Only `$file(path)` signals exist.
"#,
    },
    ErrorEntry {
        code: "DRD-R013",
        short: "unsupported operation",
        long: r#"## DRD-R013: unsupported operation

Hash literals such as `{'k': 1}` parse but cannot be evaluated yet.
"#,
    },
    ErrorEntry {
        code: "DRD-R014",
        short: "signal failed",
        long: r#"## DRD-R014: signal failed

A signal could not produce its value, for example a `$file` whose path does
not exist or is not valid UTF-8.
"#,
    },
    ErrorEntry {
        code: "DRD-R015",
        short: "output failed",
        long: r#"## DRD-R015: output failed

A built-in could not write to the program output.
"#,
    },
];

/// Look up an error entry by code (e.g. `"DRD-R011"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code == code)
}
