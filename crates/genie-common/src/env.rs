/// Environment lookups used by the client configs.
///
/// Client configs are built by `from_lookup` from a variable lookup function, so
/// parsing can be exercised without touching the real process environment.
/// [`process_env`] is the production lookup.

pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Read a variable and parse it, falling back to `default` when unset or invalid.
pub fn parse_var<T: std::str::FromStr>(lookup: Lookup<'_>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Read a variable, treating blank values as unset.
pub fn non_empty_var(lookup: Lookup<'_>, name: &str) -> Option<String> {
    lookup(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
