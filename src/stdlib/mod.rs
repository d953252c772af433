//! Phase 4, sub-pass 3's lookup table: the standard-library registry.
//!
//! Bare calls like `println(...)` and qualified ones like `math.sqrt(...)`
//! don't resolve through the symbol table — there is no `VAR`/`FUNCTION`
//! declaration backing them. The registry is a small, explicit map from
//! surface name to a canonical `std.<module>.<name>` form plus a
//! per-backend lowering, consulted by the preprocessor's stdlib-call
//! sub-pass and later by the emitter.

use std::collections::HashMap;

/// One resolvable library entry: the module and bare name a caller writes,
/// the canonical name every backend keys off of, and how each backend
/// spells it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdlibFunction {
    pub module: String,
    pub name: String,
    pub canonical: String,
    pub backend_map: HashMap<String, String>,
}

impl StdlibFunction {
    fn new(module: &str, name: &str, canonical: &str, backend_map: &[(&str, &str)]) -> Self {
        StdlibFunction {
            module: module.to_string(),
            name: name.to_string(),
            canonical: canonical.to_string(),
            backend_map: backend_map.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StdlibModule {
    pub name: String,
    functions: HashMap<String, StdlibFunction>,
}

impl StdlibModule {
    fn new(name: &str) -> Self {
        StdlibModule {
            name: name.to_string(),
            functions: HashMap::new(),
        }
    }

    fn register(&mut self, function: StdlibFunction) {
        self.functions.insert(function.name.clone(), function);
    }
}

/// The full registry: qualified `module.name` calls plus a separate map
/// for bare builtins (`println(...)`, not `io.println(...)`).
#[derive(Debug, Clone, Default)]
pub struct StdlibRegistry {
    modules: HashMap<String, StdlibModule>,
    builtins: HashMap<String, StdlibFunction>,
}

impl StdlibRegistry {
    pub fn new() -> Self {
        StdlibRegistry {
            modules: HashMap::new(),
            builtins: HashMap::new(),
        }
    }

    /// The registry shipped by default: `io` and `math`, mirroring the
    /// reference implementation's own default modules.
    pub fn with_defaults() -> Self {
        let mut registry = StdlibRegistry::new();
        registry.register_module(io_module());
        registry.register_module(math_module());
        registry
    }

    pub fn register_module(&mut self, module: StdlibModule) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn register_builtin(&mut self, function: StdlibFunction) {
        self.builtins.insert(function.name.clone(), function);
    }

    /// Resolves a qualified call, `module.method(...)`.
    pub fn resolve_call(&self, module: &str, method: &str) -> Option<&StdlibFunction> {
        self.modules.get(module).and_then(|m| m.functions.get(method))
    }

    /// Resolves a bare call, `method(...)`, against the builtin table.
    pub fn resolve_builtin(&self, name: &str) -> Option<&StdlibFunction> {
        self.builtins.get(name)
    }

    pub fn get_backend_mapping(&self, canonical: &str, backend: &str) -> Option<&str> {
        self.find_by_canonical(canonical)
            .and_then(|f| f.backend_map.get(backend))
            .map(|s| s.as_str())
    }

    /// `true` for any canonical name under `std.io.`, the set of calls the
    /// emitter must treat as having observable side effects.
    pub fn is_io_call(&self, canonical: &str) -> bool {
        canonical.starts_with("std.io.")
    }

    fn find_by_canonical(&self, canonical: &str) -> Option<&StdlibFunction> {
        self.modules
            .values()
            .flat_map(|m| m.functions.values())
            .chain(self.builtins.values())
            .find(|f| f.canonical == canonical)
    }
}

fn io_module() -> StdlibModule {
    let mut module = StdlibModule::new("io");
    for name in ["println", "print", "eprintln"] {
        module.register(StdlibFunction::new(
            "io",
            name,
            &format!("std.io.{name}"),
            &[("c", "printf"), ("zig", "std.debug.print")],
        ));
    }
    module
}

fn math_module() -> StdlibModule {
    let mut module = StdlibModule::new("math");
    let unary = [
        ("sqrt", "sqrt", "sqrt"),
        ("abs", "fabs", "fabs"),
        ("floor", "floor", "floor"),
        ("ceil", "ceil", "ceil"),
        ("sin", "sin", "sin"),
        ("cos", "cos", "cos"),
        ("tan", "tan", "tan"),
        ("log", "log", "log"),
        ("exp", "exp", "exp"),
    ];
    for (name, c_name, zig_name) in unary {
        let canonical = format!("std.math.{name}");
        module.register(StdlibFunction::new(
            "math",
            name,
            &canonical,
            &[("c", c_name), ("zig", &format!("@{zig_name}"))],
        ));
    }
    let binary = [("min", "fmin", "min"), ("max", "fmax", "max")];
    for (name, c_name, zig_name) in binary {
        let canonical = format!("std.math.{name}");
        module.register(StdlibFunction::new(
            "math",
            name,
            &canonical,
            &[("c", c_name), ("zig", &format!("@{zig_name}"))],
        ));
    }
    module
}

/// Typed bare-builtin variants (`sqrt_f32`, `sqrt_f64`, ...) that map to the
/// same canonical/backend entries as their `math.` counterpart, the way
/// the reference implementation registers them alongside the module.
pub fn default_registry() -> StdlibRegistry {
    let mut registry = StdlibRegistry::with_defaults();
    let math = registry.modules.get("math").cloned().unwrap_or_default();
    for function in math.functions.values() {
        for suffix in ["f32", "f64"] {
            let mut typed = function.clone();
            typed.name = format!("{}_{}", function.name, suffix);
            registry.register_builtin(typed);
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_qualified_io_call() {
        let registry = default_registry();
        let f = registry.resolve_call("io", "println").expect("println registered");
        assert_eq!(f.canonical, "std.io.println");
        assert!(registry.is_io_call(&f.canonical));
    }

    #[test]
    fn resolves_qualified_math_call_with_backend_mapping() {
        let registry = default_registry();
        let f = registry.resolve_call("math", "sqrt").expect("sqrt registered");
        assert_eq!(f.canonical, "std.math.sqrt");
        assert_eq!(registry.get_backend_mapping(&f.canonical, "c"), Some("sqrt"));
        assert_eq!(registry.get_backend_mapping(&f.canonical, "zig"), Some("@sqrt"));
    }

    #[test]
    fn resolves_typed_builtin_variants() {
        let registry = default_registry();
        let f = registry.resolve_builtin("sqrt_f64").expect("sqrt_f64 registered");
        assert_eq!(f.canonical, "std.math.sqrt");
    }

    #[test]
    fn unknown_call_resolves_to_none() {
        let registry = default_registry();
        assert!(registry.resolve_call("io", "nope").is_none());
        assert!(registry.resolve_builtin("nope").is_none());
    }

    #[test]
    fn non_io_canonical_is_not_an_io_call() {
        let registry = default_registry();
        assert!(!registry.is_io_call("std.math.sqrt"));
    }
}
