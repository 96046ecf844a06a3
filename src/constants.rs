//! Constants used throughout microtemplate

/// Default pattern for HTML-escaped interpolation: `<%- expr %>`
pub const DEFAULT_ESCAPE: &str = r"<%-([\s\S]+?)%>";

/// Default pattern for raw interpolation: `<%= expr %>`
pub const DEFAULT_INTERPOLATE: &str = r"<%=([\s\S]+?)%>";

/// Default pattern for embedded statements: `<% stmt %>`
pub const DEFAULT_EVALUATE: &str = r"<%([\s\S]+?)%>";

/// Parameter name used when no `variable` is configured
pub const DEFAULT_VARIABLE: &str = "obj";

/// Settings file extensions understood by `TemplateSettings::load`
pub const SETTINGS_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// STDIN indicator for CLI arguments
pub const STDIN_INDICATOR: &str = "-";

/// Names reserved by the generated function body
pub mod generated {
    /// Output accumulator
    pub const ACCUMULATOR: &str = "__p";
    /// Scratch slot holding the last interpolated value
    pub const SCRATCH: &str = "__t";
    /// Name of the bound utility object providing `escape`
    pub const UTILITY: &str = "_";
    /// Declares the accumulator and the `print` helper
    pub const PRELUDE: &str =
        "var __t,__p='',print=function(...__a){__p+=__a.join('');};\n";
    /// Returns the accumulator
    pub const EPILOGUE: &str = "return __p;\n";
}

/// Limits of the embedded statement interpreter
pub mod limits {
    /// Maximum nesting of function calls before a `RangeError`
    pub const MAX_CALL_DEPTH: usize = 64;
    /// Maximum nesting of statements and expressions accepted by the parser
    pub const MAX_NESTING_DEPTH: usize = 512;
    /// Longest string, in bytes, a script may build
    pub const MAX_STRING_LENGTH: usize = (1 << 29) - 24;
    /// Largest value `length` may take on an array
    pub const MAX_ARRAY_LENGTH: f64 = 4_294_967_295.0;
    /// Number of slots an array may grow to
    pub const MAX_ARRAY_ELEMENTS: usize = 1 << 22;
}

/// Exit codes
pub mod exit_codes {
    pub const FAILURE: i32 = 1;
}

/// Verbosity levels
pub mod verbosity {
    pub const OFF: u8 = 0;
    pub const INFO: u8 = 1;
    pub const DEBUG: u8 = 2;
    pub const TRACE: u8 = 3;
}
