//! Ordered catalog of known build-failure signatures.
//!
//! Catalog order is a priority list, not a ranking: the first matching entry
//! wins, so narrow signatures (a specific incompatible-pointer string, the
//! KernelSU MODULE_IMPORT_NS marker) must stay ahead of broad ones like a
//! bare "deprecated" or "-Werror". Keep that ordering when editing.

use crate::models::{Classification, ErrorBlock, Signature};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Category reported when no catalog entry matches.
pub const DEFAULT_CATEGORY: &str = "Uncommon Error";

/// Advice reported when no catalog entry matches.
pub const DEFAULT_SUGGESTION: &str =
    "Please follow the compilation output error results and try to resolve using search engines";

/// The fixed signature table, highest priority first.
pub const SIGNATURES: &[Signature] = &[
    Signature {
        pattern: r"No such file or directory",
        category: "Missing Header or Source File",
        suggestion: "Check if the file path is correct, or if required development libraries are missing (e.g., libssl-dev, zlib1g-dev).",
    },
    Signature {
        pattern: r"undefined reference to",
        category: "Link Error: Missing Library or Function",
        suggestion: "Check if required libraries are missing (e.g., -lssl, -lcrypto), if library paths are in LDFLAGS/LDLIBS, or if function names are misspelled.",
    },
    Signature {
        pattern: r"unrecognized command line option",
        category: "Compiler Option Not Supported",
        suggestion: "Your compiler version may be too old or too new. Check the options passed to the compiler in the Makefile for compatibility with your compiler version. Consider upgrading or downgrading the toolchain.",
    },
    Signature {
        pattern: r"misleading-indentation",
        category: "Code Indentation Does Not Match Logic",
        suggestion: "This is a code style/logic potential error. Add braces '{}' after 'if', 'for', 'while' statements to clarify code block scope. Or disable this warning (not recommended).",
    },
    Signature {
        pattern: r"type specifier missing",
        category: "C Language Type Declaration Missing",
        suggestion: "Variable or function declarations may be missing types (e.g., 'int'). For kernel modules, it could be missing headers or ordering issues, or API changes between kernel versions.",
    },
    Signature {
        pattern: r"make\[\d+\]:.*Error \d+",
        category: "Makefile Build Error",
        suggestion: "This is a Makefile rule execution failure. Check the specific error messages above, usually a subcommand (e.g., 'gcc', 'ld', 'sh') returned a non-zero status code.",
    },
    Signature {
        pattern: r"target emulation unknown",
        category: "Linker Emulation Mode Error",
        suggestion: "Your linker (ld) does not recognize the specific emulation mode. Check if LLVM and GNU toolchains are mixed, or ensure LD variable correctly points to LLVM's lld.",
    },
    Signature {
        pattern: r"cannot open.*\.gz",
        category: "File Missing (Configuration May Not Be Generated)",
        suggestion: "Check if 'make defconfig' or your device-specific config has been run. If 'make mrproper' was executed previously, reconfiguration is needed.",
    },
    Signature {
        pattern: r"makes pointer from integer without a cast",
        category: "Type Conversion Error (Pointer and Integer)",
        suggestion: "This is a severe type mismatch. Usually the function return type does not match the expected type (e.g., returning int but expecting pointer). May need to modify source code or use a more compatible compiler.",
    },
    Signature {
        pattern: r"MODULE_IMPORT_NS\(VFS_internal_I_am_really_a_filesystem_and_am_NOT_a_driver\)",
        category: "Clang Version Anomaly",
        suggestion: "This is a compiler and KernelSU compatibility issue, usually occurs with KernelSU official version and SukiSU-Ultra. For official version, you can choose the old v0.9.5 version; for SukiSU-Ultra, it is generally recommended to switch to a different KernelSU branch.",
    },
    Signature {
        pattern: r"not found \(required by clang\)",
        category: "Clang Version Anomaly",
        suggestion: "The current build system version is too old. If using 20.04, please use 22.04, otherwise use latest.",
    },
    Signature {
        pattern: r"multiple definition of 'yylloc'",
        category: "Kernel Defect",
        suggestion: "Modify YYLTYPE yylloc to extern YYLTYPE yylloc in scripts/dtc/dtc-lexer.lex.c_shipped",
    },
    Signature {
        pattern: r"assembler command failed with exit code 1",
        category: "Clang Compiler Error",
        suggestion: "Switch to a different Clang compiler version",
    },
    Signature {
        pattern: r"incompatible pointer types passing 'atomic_long_t \*'",
        category: "Source Code Pointer Type Error",
        suggestion: "Usually occurs after manual patching of cred.h, replace atomic_inc_not_zero with atomic_long_inc_not_zero in the code",
    },
    Signature {
        pattern: r"-Werror",
        category: "Warning Treated as Error",
        suggestion: "The compiler is treating warnings as errors due to -Werror flag. Either fix the underlying warning, or temporarily remove -Werror from CFLAGS/KBUILD_CFLAGS in the Makefile to allow compilation with warnings.",
    },
    Signature {
        pattern: r"implicit declaration of function",
        category: "Implicit Function Declaration",
        suggestion: "A function is being used without being declared first. Include the proper header file, or add a function declaration/prototype before use. This may also indicate an API change in newer kernel versions.",
    },
    Signature {
        pattern: r"array subscript.*is outside array bounds",
        category: "Array Index Out of Bounds",
        suggestion: "Accessing an array element outside its declared size. Check array bounds and ensure indices are within valid range [0, size-1]. This could be a buffer overflow risk.",
    },
    Signature {
        pattern: r"division by zero",
        category: "Division by Zero",
        suggestion: "Code attempts to divide by zero. Add proper checks to ensure the divisor is not zero before performing division operations.",
    },
    Signature {
        pattern: r"null pointer dereference",
        category: "Null Pointer Dereference",
        suggestion: "Attempting to access memory through a null pointer. Add null checks before dereferencing pointers, or ensure proper initialization before use.",
    },
    Signature {
        pattern: r"incompatible implicit declaration",
        category: "Incompatible Implicit Declaration",
        suggestion: "Function was implicitly declared with a signature that doesn't match its actual definition. Include the correct header or add a proper function prototype.",
    },
    Signature {
        pattern: r"unused variable",
        category: "Unused Variable",
        suggestion: "A variable is declared but never used. Either use the variable, remove it, or mark it with __maybe_unused attribute to suppress the warning.",
    },
    Signature {
        pattern: r"uninitialized variable",
        category: "Uninitialized Variable",
        suggestion: "A variable is being used before being initialized. Initialize the variable at declaration or before first use.",
    },
    Signature {
        pattern: r"dereferencing pointer to incomplete type",
        category: "Dereferencing Incomplete Type",
        suggestion: "Attempting to access members of a struct/union that hasn't been fully defined. Include the header file containing the complete type definition.",
    },
    Signature {
        pattern: r"conflicting types",
        category: "Conflicting Types",
        suggestion: "A function or variable has been declared with different types in different places. Ensure all declarations match the definition exactly.",
    },
    Signature {
        pattern: r"redefinition of ",
        category: "Symbol Redefinition",
        suggestion: "A function, variable, or macro has been defined multiple times. Check for duplicate definitions or include guards in header files.",
    },
    Signature {
        pattern: r"deprecated",
        category: "Deprecated API Usage",
        suggestion: "Using a deprecated function or feature. Update the code to use the recommended replacement API or suppress with -Wno-deprecated-declarations (not recommended for long-term).",
    },
    Signature {
        pattern: r"overflow in conversion",
        category: "Integer Overflow in Conversion",
        suggestion: "A value is being converted to a type that cannot hold it. Check value ranges and use appropriate data types or add bounds checking.",
    },
    Signature {
        pattern: r"shift count overflow",
        category: "Bit Shift Overflow",
        suggestion: "The shift amount exceeds the bit width of the type. Ensure shift counts are less than the type's bit width (e.g., < 32 for int32).",
    },
    Signature {
        pattern: r"cast from pointer to integer of different size",
        category: "Pointer to Integer Size Mismatch",
        suggestion: "Converting a pointer to an integer type with different size. Use uintptr_t or intptr_t types which are guaranteed to hold pointer values.",
    },
    Signature {
        pattern: r"variable length array",
        category: "Variable Length Array (VLA) Used",
        suggestion: "Using VLA which may cause stack overflow. Consider using dynamic allocation (kmalloc/vmalloc for kernel) instead, or ensure size is bounded.",
    },
    Signature {
        pattern: r"taking address of temporary",
        category: "Address of Temporary Value",
        suggestion: "Attempting to take the address of a temporary/rvalue. Store the value in a variable first, then take its address.",
    },
    Signature {
        pattern: r"control reaches end of non-void function",
        category: "Missing Return Statement",
        suggestion: "A non-void function may reach the end without returning a value. Add a return statement at the end of all code paths.",
    },
    Signature {
        pattern: r"comparison of integer expressions of different signedness",
        category: "Signed/Unsigned Comparison",
        suggestion: "Comparing signed and unsigned integers. Cast one operand to match the other's type, or ensure consistent types throughout.",
    },
    Signature {
        pattern: r"result of operation is still indeterminate",
        category: "Sequence Point Violation",
        suggestion: "Undefined behavior due to multiple modifications between sequence points. Break the expression into multiple statements.",
    },
    Signature {
        pattern: r"stack-protector",
        category: "Stack Protection Enabled But Failed",
        suggestion: "Stack smashing detected or stack protector instrumentation failed. Check for buffer overflows in the code, or disable with -fno-stack-protector (not recommended).",
    },
    Signature {
        pattern: r"clock skew detected",
        category: "Clock Skew Detected",
        suggestion: "File timestamps are in the future. Synchronize system clock or touch the affected files to update timestamps.",
    },
];

// Signatures compiled once, preserving table order.
static COMPILED: Lazy<Vec<(Regex, &'static Signature)>> = Lazy::new(|| {
    SIGNATURES
        .iter()
        .map(|sig| {
            let regex = RegexBuilder::new(sig.pattern)
                .case_insensitive(true)
                .build()
                .expect("Invalid signature pattern");
            (regex, sig)
        })
        .collect()
});

/// Classify one error block against the catalog.
///
/// Pure function of (catalog, block text): scans top-to-bottom and returns
/// the first match, or the default classification when nothing matches.
pub fn classify(block: &ErrorBlock) -> Classification {
    let text = block.text();
    for (regex, sig) in COMPILED.iter() {
        if regex.is_match(&text) {
            return Classification {
                category: sig.category.to_string(),
                suggestion: sig.suggestion.to_string(),
            };
        }
    }
    Classification {
        category: DEFAULT_CATEGORY.to_string(),
        suggestion: DEFAULT_SUGGESTION.to_string(),
    }
}
