/// Start command construction and validation
use crate::error::{Error, Result};
use crate::game::installer::types::OsType;
use crate::game::launcher::manifest::{ServerManifest, JAVA_PLACEHOLDER};
use crate::game::launcher::types::LaunchOptions;
use dunce::canonicalize;
use std::path::{Component, Path, PathBuf};

const MAX_TEMPLATE_TOKENS: usize = 80;
const MAX_TOKEN_LEN: usize = 1024;
const BLOCKED_SHELL_TOKENS: &[&str] = &["|", "||", "&&", ";"];

fn has_control_chars(s: &str) -> bool {
    s.contains(['\0', '\r', '\n'])
}

pub fn validate_java_path(java_path: &str) -> Result<()> {
    if java_path.trim().is_empty() {
        return Err(Error::Manifest("Java path cannot be empty.".into()));
    }
    if has_control_chars(java_path) {
        return Err(Error::Manifest(format!(
            "Java path {:?} contains unsupported characters.",
            java_path
        )));
    }
    Ok(())
}

/// Reject templates that are anything other than a literal `{java} ...` argv.
pub fn validate_start_template(template: &[String]) -> Result<()> {
    if template.is_empty() {
        return Err(Error::Manifest("Start command is empty.".into()));
    }
    if template.len() > MAX_TEMPLATE_TOKENS {
        return Err(Error::Manifest(format!(
            "Start command contains too many arguments ({} > {}).",
            template.len(),
            MAX_TEMPLATE_TOKENS
        )));
    }
    if template[0] != JAVA_PLACEHOLDER {
        return Err(Error::Manifest(format!(
            "Start command is invalid. First token must be '{}', got {:?}.",
            JAVA_PLACEHOLDER, template[0]
        )));
    }
    for token in template {
        if token.trim().is_empty() {
            return Err(Error::Manifest("Start command contains an empty token.".into()));
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(Error::Manifest(format!(
                "Start command token exceeds supported length ({} chars).",
                token.len()
            )));
        }
        if has_control_chars(token) {
            return Err(Error::Manifest(format!(
                "Start command token {:?} contains unsupported characters.",
                token
            )));
        }
        if BLOCKED_SHELL_TOKENS.contains(&token.as_str()) {
            return Err(Error::Manifest(format!(
                "Start command contains blocked shell token {:?}.",
                token
            )));
        }
    }
    Ok(())
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn looks_absolute(raw: &str, path: &Path) -> bool {
    let bytes = raw.as_bytes();
    path.is_absolute()
        || path.has_root()
        || raw.starts_with('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Resolve a template path token against the instance directory, refusing anything outside it.
fn resolve_under_instance_dir(token: &str, instance_dir: &Path) -> Result<PathBuf> {
    let cleaned = token.trim().trim_matches(|c| c == '"' || c == '\'');
    let rel = Path::new(cleaned);
    if cleaned.is_empty() || looks_absolute(cleaned, rel) {
        return Err(Error::Manifest(format!(
            "Start command path {:?} is absolute, which is blocked for security.",
            token
        )));
    }

    let root = canonicalize(instance_dir).unwrap_or_else(|_| normalize_lexically(instance_dir));
    let candidate = normalize_lexically(&root.join(rel));
    let escaped = || {
        Error::Manifest(format!(
            "Start command path {:?} escapes the server directory {}.",
            token,
            root.display()
        ))
    };
    if !candidate.starts_with(&root) {
        return Err(escaped());
    }
    let real = resolve_existing_prefix(&candidate);
    if !real.starts_with(&root) {
        return Err(escaped());
    }
    Ok(real)
}

/// Canonicalize the longest existing ancestor of `path` and re-append the rest.
fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut base = path.to_path_buf();
    let mut rest = Vec::new();
    loop {
        if let Ok(real) = canonicalize(&base) {
            return rest.iter().rev().fold(real, |acc, part| acc.join(part));
        }
        match (base.file_name().map(|n| n.to_os_string()), base.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name);
                base = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Check that argfile (`@path`) and `-jar` targets stay inside `instance_dir`.
pub fn validate_start_paths(template: &[String], instance_dir: &Path) -> Result<()> {
    for (idx, token) in template.iter().enumerate() {
        if let Some(argfile) = token.strip_prefix('@') {
            if !argfile.is_empty() {
                resolve_under_instance_dir(argfile, instance_dir)?;
            }
        }
        if token == "-jar" {
            if let Some(target) = template.get(idx + 1) {
                let jar = resolve_under_instance_dir(target, instance_dir)?;
                let is_jar = jar
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"));
                if !is_jar {
                    return Err(Error::Manifest(format!(
                        "Start command '-jar' target {:?} must be a .jar file.",
                        target
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Substitute `{java}` and inject memory and JVM flags right after it.
pub fn apply_launch_options(template: &[String], options: &LaunchOptions) -> Vec<String> {
    let mut command: Vec<String> = Vec::with_capacity(template.len() + options.jvm_args.len() + 2);
    let mut insert_at = None;
    for token in template {
        if token == JAVA_PLACEHOLDER {
            command.push(options.java_path.clone());
            if insert_at.is_none() {
                insert_at = Some(command.len());
            }
        } else {
            command.push(token.clone());
        }
    }

    if let Some(at) = insert_at {
        let mut extra = Vec::new();
        if let Some(xms) = options.xms.as_deref().filter(|v| !v.is_empty()) {
            extra.push(format!("-Xms{}", xms));
        }
        if let Some(xmx) = options.xmx.as_deref().filter(|v| !v.is_empty()) {
            extra.push(format!("-Xmx{}", xmx));
        }
        extra.extend(options.jvm_args.iter().cloned());
        command.splice(at..at, extra);
    }
    command
}

pub fn build_start_command_for(
    manifest: &ServerManifest,
    os: OsType,
    options: &LaunchOptions,
) -> Result<Vec<String>> {
    validate_java_path(&options.java_path)?;
    let template = manifest.start.select(os);
    validate_start_template(template)?;
    Ok(apply_launch_options(template, options))
}

/// Build the argv for the host OS.
pub fn build_start_command(manifest: &ServerManifest, options: &LaunchOptions) -> Result<Vec<String>> {
    build_start_command_for(manifest, OsType::current(), options)
}
